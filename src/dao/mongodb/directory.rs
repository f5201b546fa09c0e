use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Collection,
    bson::{Bson, DateTime, doc},
    options::ReturnDocument,
};
use uuid::Uuid;

use super::{
    MongoDaoError, MongoManager, PARTICIPANT_COLLECTION, is_duplicate_key,
    models::{MongoParticipantDocument, doc_id, uuid_as_binary},
};
use crate::{
    dao::{
        Directory,
        models::ParticipantEntity,
        storage::{StorageError, StorageResult},
    },
    state::stage::{Cohort, Role, Stage},
};

/// MongoDB-backed participant directory.
#[derive(Clone)]
pub struct MongoDirectory {
    mongo: MongoManager,
}

impl MongoDirectory {
    /// Build a directory on top of an established connection.
    pub fn new(mongo: MongoManager) -> Self {
        Self { mongo }
    }

    fn collection(&self) -> Collection<MongoParticipantDocument> {
        self.mongo
            .database()
            .collection::<MongoParticipantDocument>(PARTICIPANT_COLLECTION)
    }

    async fn insert(&self, participant: ParticipantEntity) -> StorageResult<()> {
        let email = participant.email.clone();
        let document: MongoParticipantDocument = participant.into();
        match self.collection().insert_one(&document).await {
            Ok(_) => Ok(()),
            Err(err) if is_duplicate_key(&err) => Err(StorageError::duplicate(format!(
                "participant email `{email}` already registered"
            ))),
            Err(source) => Err(MongoDaoError::Write {
                collection: PARTICIPANT_COLLECTION,
                source,
            }
            .into()),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<ParticipantEntity>> {
        let document = self
            .collection()
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: PARTICIPANT_COLLECTION,
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn find_by_email(&self, email: String) -> StorageResult<Option<ParticipantEntity>> {
        let document = self
            .collection()
            .find_one(doc! {"email": email})
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: PARTICIPANT_COLLECTION,
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn list_participants(&self) -> StorageResult<Vec<ParticipantEntity>> {
        let documents: Vec<MongoParticipantDocument> = self
            .collection()
            .find(doc! {"role": Role::Participant.as_str()})
            .sort(doc! {"cohort": 1, "current_score": -1})
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: PARTICIPANT_COLLECTION,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: PARTICIPANT_COLLECTION,
                source,
            })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn update_cohort(&self, id: Uuid, cohort: Cohort) -> StorageResult<()> {
        self.collection()
            .update_one(
                doc_id(id),
                doc! {"$set": {"cohort": cohort.0 as i32, "updated_at": DateTime::now()}},
            )
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: PARTICIPANT_COLLECTION,
                source,
            })?;
        Ok(())
    }

    async fn increment_score(&self, id: Uuid, delta: i64) -> StorageResult<()> {
        self.collection()
            .update_one(
                doc_id(id),
                doc! {"$inc": {"current_score": delta}, "$set": {"updated_at": DateTime::now()}},
            )
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: PARTICIPANT_COLLECTION,
                source,
            })?;
        Ok(())
    }

    async fn set_stage(&self, ids: Vec<Uuid>, stage: Stage) -> StorageResult<()> {
        let ids: Vec<Bson> = ids
            .into_iter()
            .map(|id| Bson::Binary(uuid_as_binary(id)))
            .collect();
        self.collection()
            .update_many(
                doc! {"_id": {"$in": ids}},
                doc! {"$set": {
                    "stage": stage.as_str(),
                    "current_score": 0_i64,
                    "updated_at": DateTime::now(),
                }},
            )
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: PARTICIPANT_COLLECTION,
                source,
            })?;
        Ok(())
    }

    async fn reset_all(&self) -> StorageResult<()> {
        self.collection()
            .update_many(
                doc! {"role": Role::Participant.as_str()},
                doc! {"$set": {
                    "stage": Stage::Registered.as_str(),
                    "current_score": 0_i64,
                    "updated_at": DateTime::now(),
                }},
            )
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: PARTICIPANT_COLLECTION,
                source,
            })?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> StorageResult<bool> {
        let result = self
            .collection()
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: PARTICIPANT_COLLECTION,
                source,
            })?;
        Ok(result.deleted_count > 0)
    }

    async fn increment_tab_switches(&self, id: Uuid) -> StorageResult<Option<ParticipantEntity>> {
        let document = self
            .collection()
            .find_one_and_update(
                doc_id(id),
                doc! {"$inc": {"tab_switches": 1_i64}, "$set": {"updated_at": DateTime::now()}},
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: PARTICIPANT_COLLECTION,
                source,
            })?;
        Ok(document.map(Into::into))
    }
}

impl Directory for MongoDirectory {
    fn insert(&self, participant: ParticipantEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert(participant).await })
    }

    fn find_by_id(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_by_id(id).await })
    }

    fn find_by_email(
        &self,
        email: String,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_by_email(email).await })
    }

    fn list_participants(&self) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_participants().await })
    }

    fn update_cohort(&self, id: Uuid, cohort: Cohort) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.update_cohort(id, cohort).await })
    }

    fn increment_score(&self, id: Uuid, delta: i64) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.increment_score(id, delta).await })
    }

    fn set_stage(&self, ids: Vec<Uuid>, stage: Stage) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.set_stage(ids, stage).await })
    }

    fn reset_all(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.reset_all().await })
    }

    fn delete(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete(id).await })
    }

    fn increment_tab_switches(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.increment_tab_switches(id).await })
    }
}
