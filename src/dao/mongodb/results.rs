use futures::future::BoxFuture;
use mongodb::Collection;

use super::{MongoDaoError, MongoManager, RESULT_COLLECTION, models::MongoResultDocument};
use crate::dao::{ResultLog, models::ResultEntity, storage::StorageResult};

/// MongoDB-backed append-only log of quiz results.
#[derive(Clone)]
pub struct MongoResultLog {
    mongo: MongoManager,
}

impl MongoResultLog {
    /// Build a result log on top of an established connection.
    pub fn new(mongo: MongoManager) -> Self {
        Self { mongo }
    }

    fn collection(&self) -> Collection<MongoResultDocument> {
        self.mongo
            .database()
            .collection::<MongoResultDocument>(RESULT_COLLECTION)
    }

    async fn append(&self, result: ResultEntity) -> StorageResult<()> {
        let document: MongoResultDocument = result.into();
        self.collection()
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: RESULT_COLLECTION,
                source,
            })?;
        Ok(())
    }
}

impl ResultLog for MongoResultLog {
    fn append(&self, result: ResultEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.append(result).await })
    }
}
