//! Supervises the MongoDB connection, toggling degraded mode as connectivity
//! comes and goes.

use std::{sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::{
    dao::{
        Stores,
        mongodb::{
            MongoDirectory, MongoManager, MongoQuestionBank, MongoResultLog, connect,
            ensure_indexes,
        },
    },
    services::auth_service,
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Keep the shared state supplied with a healthy store bundle.
///
/// While the database is unreachable the bundle stays uninstalled and handlers
/// answer in degraded mode; reconnects re-run index creation and admin seeding
/// before the bundle is installed again.
pub async fn run(state: SharedState, uri: String, db_name: Option<String>) {
    let mut delay = INITIAL_DELAY;
    let mut manager: Option<MongoManager> = None;

    loop {
        if let Some(active) = manager.as_ref() {
            match active.ping().await {
                Ok(()) => {
                    // Healthy connection: reset the retry backoff and avoid
                    // hammering the database with pings.
                    delay = INITIAL_DELAY;
                    sleep(HEALTH_POLL_INTERVAL).await;
                }
                Err(err) => {
                    warn!(error = %err, "MongoDB ping failed; entering degraded mode");
                    state.clear_stores().await;
                    manager = None;
                    sleep(delay).await;
                    delay = (delay * 2).min(MAX_DELAY);
                }
            }
            continue;
        }

        match connect(&uri, db_name.as_deref()).await {
            Ok(new_manager) => match ensure_indexes(&new_manager.database()).await {
                Ok(()) => {
                    let stores = Stores {
                        directory: Arc::new(MongoDirectory::new(new_manager.clone())),
                        questions: Arc::new(MongoQuestionBank::new(new_manager.clone())),
                        results: Arc::new(MongoResultLog::new(new_manager.clone())),
                    };
                    auth_service::seed_admins(state.config(), &stores).await;
                    state.install_stores(stores).await;
                    info!("connected to MongoDB; leaving degraded mode");
                    manager = Some(new_manager);
                    delay = INITIAL_DELAY;
                }
                Err(err) => {
                    error!(error = %err, "failed to ensure MongoDB indexes; retrying");
                    sleep(delay).await;
                    delay = (delay * 2).min(MAX_DELAY);
                }
            },
            Err(err) => {
                warn!(error = %err, "MongoDB connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}
