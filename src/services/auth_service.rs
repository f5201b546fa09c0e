//! Account registration, login, password hashing and bearer-token handling.

use std::time::{SystemTime, UNIX_EPOCH};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::{Stores, models::ParticipantEntity, storage::StorageError},
    dto::auth::{LoginRequest, LoginResponse, ParticipantProfile, RegisterRequest},
    error::{AppError, ServiceError},
    state::{SharedState, stage::Role},
};

/// Claims carried by issued session tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Directory id of the authenticated account.
    pub sub: Uuid,
    /// Role the token was issued for.
    pub role: Role,
    /// Expiration as a unix timestamp in seconds.
    pub exp: usize,
}

/// Hash a plaintext password with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| ServiceError::Credential(err.to_string()))
}

/// Verify a plaintext password against a stored hash.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, ServiceError> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|err| ServiceError::Credential(err.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Sign a session token for an account.
pub fn sign_token(config: &AppConfig, id: Uuid, role: Role) -> Result<String, ServiceError> {
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|err| ServiceError::Credential(err.to_string()))?
        .as_secs()
        + config.token_ttl_secs();
    let claims = Claims {
        sub: id,
        role,
        exp: expiration as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret().as_bytes()),
    )
    .map_err(|err| ServiceError::Credential(err.to_string()))
}

/// Verify a session token and return its claims.
pub fn verify_token(config: &AppConfig, token: &str) -> Result<Claims, ServiceError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret().as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ServiceError::Unauthorized("invalid token".to_string()))
}

/// Create a participant account at the registration stage.
pub async fn register(
    state: &SharedState,
    request: RegisterRequest,
) -> Result<ParticipantProfile, ServiceError> {
    let stores = state.require_stores().await?;
    let password_hash = hash_password(&request.password)?;
    let participant = ParticipantEntity::register(request.name, request.email, password_hash);
    let profile = ParticipantProfile::from(participant.clone());

    stores
        .directory
        .insert(participant)
        .await
        .map_err(|err| match err {
            StorageError::Duplicate { message } => ServiceError::Conflict(message),
            other => ServiceError::Unavailable(other),
        })?;

    info!(participant = %profile.id, "participant registered");
    Ok(profile)
}

/// Authenticate an account and issue a session token.
///
/// Participants may pick their cohort at login; the choice is persisted so
/// broadcasts address them correctly. A wrong email and a wrong password are
/// indistinguishable in the returned error.
pub async fn login(
    state: &SharedState,
    request: LoginRequest,
) -> Result<LoginResponse, ServiceError> {
    let stores = state.require_stores().await?;
    let mut participant = stores
        .directory
        .find_by_email(request.email)
        .await?
        .ok_or_else(|| ServiceError::Unauthorized("invalid credentials".to_string()))?;

    if !verify_password(&request.password, &participant.password_hash)? {
        return Err(ServiceError::Unauthorized("invalid credentials".to_string()));
    }

    if participant.role == Role::Participant
        && let Some(cohort) = request.cohort
        && cohort != participant.cohort
    {
        stores.directory.update_cohort(participant.id, cohort).await?;
        participant.cohort = cohort;
    }

    let token = sign_token(state.config(), participant.id, participant.role)?;
    Ok(LoginResponse {
        token,
        participant: ParticipantProfile::from(participant),
    })
}

/// Create the configured admin accounts when they do not exist yet.
///
/// Runs after every storage (re)connection, so a wiped database grows its
/// admin accounts back without operator action.
pub async fn seed_admins(config: &AppConfig, stores: &Stores) {
    for admin in config.seed_admins() {
        match stores.directory.find_by_email(admin.email.clone()).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                let password_hash = match hash_password(&admin.password) {
                    Ok(hash) => hash,
                    Err(err) => {
                        warn!(email = %admin.email, error = %err, "failed to hash seed admin password");
                        continue;
                    }
                };
                let mut account = ParticipantEntity::register(
                    admin.name.clone(),
                    admin.email.clone(),
                    password_hash,
                );
                account.role = Role::Admin;
                match stores.directory.insert(account).await {
                    Ok(()) => info!(email = %admin.email, "seeded admin account"),
                    Err(err) => {
                        warn!(email = %admin.email, error = %err, "failed to seed admin account");
                    }
                }
            }
            Err(err) => {
                warn!(email = %admin.email, error = %err, "failed to look up seed admin");
            }
        }
    }
}

/// Axum middleware validating the `Authorization: Bearer <token>` header.
///
/// Valid claims are injected into the request extensions for handlers and the
/// admin guard to read.
pub async fn auth_middleware(
    State(state): State<SharedState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = match header_value {
        Some(value) if value.starts_with("Bearer ") => &value[7..],
        _ => {
            return Err(AppError::Unauthorized("missing bearer token".to_string()));
        }
    };

    let claims = verify_token(state.config(), token)?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Axum middleware restricting a route to admin tokens.
///
/// Must run after [`auth_middleware`].
pub async fn admin_middleware(request: Request<Body>, next: Next) -> Result<Response, AppError> {
    let claims = request
        .extensions()
        .get::<Claims>()
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;

    if claims.role != Role::Admin {
        return Err(AppError::Forbidden("admin role required".to_string()));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::memory::MemoryStores,
        state::{AppState, stage::{Cohort, Stage}},
    };

    async fn harness() -> (SharedState, MemoryStores) {
        let state = AppState::new(AppConfig::default());
        let stores = MemoryStores::new();
        state.install_stores(stores.stores()).await;
        (state, stores)
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "ada".to_string(),
            email: email.to_string(),
            password: "secret-password".to_string(),
        }
    }

    #[test]
    fn password_round_trip() {
        let hash = hash_password("hunter42").unwrap();
        assert!(verify_password("hunter42", &hash).unwrap());
        assert!(!verify_password("hunter43", &hash).unwrap());
    }

    #[test]
    fn token_round_trip_preserves_claims() {
        let config = AppConfig::default();
        let id = Uuid::new_v4();
        let token = sign_token(&config, id, Role::Admin).unwrap();
        let claims = verify_token(&config, &token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn garbage_token_is_rejected() {
        let config = AppConfig::default();
        assert!(matches!(
            verify_token(&config, "not-a-token"),
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn register_creates_a_registered_participant() {
        let (state, stores) = harness().await;
        let profile = register(&state, register_request("ada@example.com")).await.unwrap();

        assert_eq!(profile.role, Role::Participant);
        assert_eq!(profile.stage, Stage::Registered);
        let stored = stores.directory.get(profile.id).unwrap();
        assert_ne!(stored.password_hash, "secret-password");
    }

    #[tokio::test]
    async fn duplicate_email_registration_conflicts() {
        let (state, _stores) = harness().await;
        register(&state, register_request("ada@example.com")).await.unwrap();

        let result = register(&state, register_request("ada@example.com")).await;
        assert!(matches!(result, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn login_issues_a_token_and_applies_the_cohort_choice() {
        let (state, stores) = harness().await;
        let profile = register(&state, register_request("ada@example.com")).await.unwrap();

        let response = login(
            &state,
            LoginRequest {
                email: "ada@example.com".to_string(),
                password: "secret-password".to_string(),
                cohort: Some(Cohort(2)),
            },
        )
        .await
        .unwrap();

        assert_eq!(response.participant.id, profile.id);
        assert_eq!(response.participant.cohort, Cohort(2));
        assert_eq!(stores.directory.get(profile.id).unwrap().cohort, Cohort(2));

        let claims = verify_token(state.config(), &response.token).unwrap();
        assert_eq!(claims.sub, profile.id);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_fail_alike() {
        let (state, _stores) = harness().await;
        register(&state, register_request("ada@example.com")).await.unwrap();

        let wrong_password = login(
            &state,
            LoginRequest {
                email: "ada@example.com".to_string(),
                password: "wrong".to_string(),
                cohort: None,
            },
        )
        .await;
        let unknown_email = login(
            &state,
            LoginRequest {
                email: "ghost@example.com".to_string(),
                password: "whatever".to_string(),
                cohort: None,
            },
        )
        .await;

        for result in [wrong_password, unknown_email] {
            match result {
                Err(ServiceError::Unauthorized(message)) => {
                    assert_eq!(message, "invalid credentials");
                }
                other => panic!("expected unauthorized, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn seed_admins_creates_accounts_once() {
        let stores = MemoryStores::new();
        let bundle = stores.stores();
        let config = AppConfig::with_seed_admins(vec![crate::config::SeedAdmin {
            name: "game master".to_string(),
            email: "gm@example.com".to_string(),
            password: "opening-night".to_string(),
        }]);

        seed_admins(&config, &bundle).await;
        seed_admins(&config, &bundle).await;

        let admin = crate::dao::Directory::find_by_email(
            &stores.directory,
            "gm@example.com".to_string(),
        )
        .await
        .unwrap()
        .expect("admin should be seeded");
        assert_eq!(admin.role, Role::Admin);
        assert!(verify_password("opening-night", &admin.password_hash).unwrap());
    }
}
