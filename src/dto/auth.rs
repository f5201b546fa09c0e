use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::ParticipantEntity,
    state::stage::{Cohort, Role, Stage, validate_cohort},
};

/// Payload for creating a new participant account.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// Display name.
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    /// Login email, unique across the directory.
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    /// Plaintext password, hashed before storage.
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
}

/// Payload for logging in; participants may pick their cohort here.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// Login email.
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    /// Plaintext password.
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub password: String,
    /// Optional cohort re-assignment applied at login for participants.
    #[validate(custom(function = "validate_cohort"))]
    pub cohort: Option<Cohort>,
}

/// Profile slice of a participant record safe to return to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ParticipantProfile {
    /// Directory id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Account role.
    pub role: Role,
    /// Competition cohort.
    pub cohort: Cohort,
    /// Current competition stage.
    pub stage: Stage,
}

impl From<ParticipantEntity> for ParticipantProfile {
    fn from(entity: ParticipantEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            email: entity.email,
            role: entity.role,
            cohort: entity.cohort,
            stage: entity.stage,
        }
    }
}

/// Successful login: a bearer token plus the account profile.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    /// Signed JWT to present as `Authorization: Bearer <token>`.
    pub token: String,
    /// Profile of the authenticated account.
    pub participant: ParticipantProfile,
}

/// Generic acknowledgement message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    /// Human readable confirmation.
    pub message: String,
}
