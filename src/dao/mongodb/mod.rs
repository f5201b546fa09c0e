mod directory;
mod models;
mod questions;
mod results;

pub use directory::MongoDirectory;
pub use questions::MongoQuestionBank;
pub use results::MongoResultLog;

use std::time::Duration;

use mongodb::{Client, Database, IndexModel, bson::doc, options::ClientOptions, options::IndexOptions};
use thiserror::Error;
use tokio::time::sleep;

use crate::dao::storage::StorageError;

const DEFAULT_DB: &str = "quiz_arena";
const PARTICIPANT_COLLECTION: &str = "participants";
const QUESTION_COLLECTION: &str = "questions";
const RESULT_COLLECTION: &str = "results";

/// Result alias for MongoDB DAO operations.
pub type MongoResult<T> = Result<T, MongoDaoError>;

/// Errors raised by the MongoDB persistence layer.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The connection string could not be parsed.
    #[error("invalid MongoDB URI `{uri}`")]
    InvalidUri {
        /// Offending URI.
        uri: String,
        /// Driver error.
        #[source]
        source: mongodb::error::Error,
    },
    /// Client construction failed before any network traffic.
    #[error("failed to construct MongoDB client")]
    ClientConstruction {
        /// Driver error.
        #[source]
        source: mongodb::error::Error,
    },
    /// The initial ping never succeeded within the retry budget.
    #[error("MongoDB did not answer the initial ping after {attempts} attempts")]
    InitialPing {
        /// Number of ping attempts made.
        attempts: u32,
        /// Driver error from the last attempt.
        #[source]
        source: mongodb::error::Error,
    },
    /// A health-check ping failed on an established connection.
    #[error("MongoDB health ping failed")]
    HealthPing {
        /// Driver error.
        #[source]
        source: mongodb::error::Error,
    },
    /// Creating a required index failed.
    #[error("failed to ensure index `{index}` on `{collection}`")]
    EnsureIndex {
        /// Target collection.
        collection: &'static str,
        /// Index name.
        index: &'static str,
        /// Driver error.
        #[source]
        source: mongodb::error::Error,
    },
    /// A read query failed.
    #[error("query on `{collection}` failed")]
    Query {
        /// Target collection.
        collection: &'static str,
        /// Driver error.
        #[source]
        source: mongodb::error::Error,
    },
    /// A write operation failed.
    #[error("write on `{collection}` failed")]
    Write {
        /// Target collection.
        collection: &'static str,
        /// Driver error.
        #[source]
        source: mongodb::error::Error,
    },
}

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        StorageError::unavailable(err.to_string(), err)
    }
}

/// Whether a driver error is a unique-index violation (duplicate key).
pub(crate) fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == 11000,
        _ => false,
    }
}

struct RetryPolicy;

impl RetryPolicy {
    const MAX_ATTEMPTS: u32 = 10;
    const INITIAL_DELAY_MS: u64 = 250;

    fn initial_delay() -> Duration {
        Duration::from_millis(Self::INITIAL_DELAY_MS)
    }

    fn next_delay(current: Duration) -> Duration {
        (current * 2).min(Duration::from_secs(5))
    }
}

/// Handle to an established MongoDB connection shared by the store implementations.
#[derive(Clone)]
pub struct MongoManager {
    database: Database,
}

impl MongoManager {
    /// Clone the database handle.
    pub fn database(&self) -> Database {
        self.database.clone()
    }

    /// Issue a ping against the connection.
    pub async fn ping(&self) -> MongoResult<()> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(|source| MongoDaoError::HealthPing { source })
    }
}

/// Connect to MongoDB, pinging with backoff until the server answers.
pub async fn connect(uri: &str, db_name: Option<&str>) -> MongoResult<MongoManager> {
    let database_name = db_name.unwrap_or(DEFAULT_DB).to_owned();
    let options = ClientOptions::parse(uri)
        .await
        .map_err(|source| MongoDaoError::InvalidUri {
            uri: uri.to_owned(),
            source,
        })?;

    let client = Client::with_options(options)
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(&database_name);

    let mut attempts = 0;
    let mut delay = RetryPolicy::initial_delay();

    loop {
        match database.run_command(doc! { "ping": 1 }).await {
            Ok(_) => break,
            Err(err) => {
                attempts += 1;
                if attempts >= RetryPolicy::MAX_ATTEMPTS {
                    return Err(MongoDaoError::InitialPing {
                        attempts,
                        source: err,
                    });
                }
                sleep(delay).await;
                delay = RetryPolicy::next_delay(delay);
            }
        }
    }

    Ok(MongoManager { database })
}

/// Ensure the indexes required by the application are present.
pub async fn ensure_indexes(database: &Database) -> MongoResult<()> {
    let participants = database.collection::<mongodb::bson::Document>(PARTICIPANT_COLLECTION);
    let email_index = IndexModel::builder()
        .keys(doc! {"email": 1})
        .options(
            IndexOptions::builder()
                .name(Some("participant_email_idx".to_string()))
                .unique(Some(true))
                .build(),
        )
        .build();
    participants
        .create_index(email_index)
        .await
        .map_err(|source| MongoDaoError::EnsureIndex {
            collection: PARTICIPANT_COLLECTION,
            index: "email",
            source,
        })?;

    let questions = database.collection::<mongodb::bson::Document>(QUESTION_COLLECTION);
    let target_index = IndexModel::builder()
        .keys(doc! {"target_cohort": 1, "target_stage": 1})
        .options(
            IndexOptions::builder()
                .name(Some("question_target_idx".to_string()))
                .build(),
        )
        .build();
    questions
        .create_index(target_index)
        .await
        .map_err(|source| MongoDaoError::EnsureIndex {
            collection: QUESTION_COLLECTION,
            index: "target_cohort,target_stage",
            source,
        })?;

    Ok(())
}
