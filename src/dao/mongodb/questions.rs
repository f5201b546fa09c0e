use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{Collection, bson::doc};
use uuid::Uuid;

use super::{
    MongoDaoError, MongoManager, QUESTION_COLLECTION,
    models::{MongoQuestionDocument, doc_id},
};
use crate::{
    dao::{QuestionBank, models::QuestionEntity, storage::StorageResult},
    state::stage::{Cohort, Stage},
};

/// MongoDB-backed question bank.
#[derive(Clone)]
pub struct MongoQuestionBank {
    mongo: MongoManager,
}

impl MongoQuestionBank {
    /// Build a question bank on top of an established connection.
    pub fn new(mongo: MongoManager) -> Self {
        Self { mongo }
    }

    fn collection(&self) -> Collection<MongoQuestionDocument> {
        self.mongo
            .database()
            .collection::<MongoQuestionDocument>(QUESTION_COLLECTION)
    }

    async fn insert(&self, question: QuestionEntity) -> StorageResult<()> {
        let document: MongoQuestionDocument = question.into();
        self.collection()
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: QUESTION_COLLECTION,
                source,
            })?;
        Ok(())
    }

    async fn update(&self, question: QuestionEntity) -> StorageResult<bool> {
        let id = question.id;
        let document: MongoQuestionDocument = question.into();
        let result = self
            .collection()
            .replace_one(doc_id(id), &document)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: QUESTION_COLLECTION,
                source,
            })?;
        Ok(result.matched_count > 0)
    }

    async fn delete(&self, id: Uuid) -> StorageResult<bool> {
        let result = self
            .collection()
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: QUESTION_COLLECTION,
                source,
            })?;
        Ok(result.deleted_count > 0)
    }

    async fn find(&self, id: Uuid) -> StorageResult<Option<QuestionEntity>> {
        let document = self
            .collection()
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: QUESTION_COLLECTION,
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn list_all(&self) -> StorageResult<Vec<QuestionEntity>> {
        let documents: Vec<MongoQuestionDocument> = self
            .collection()
            .find(doc! {})
            .sort(doc! {"created_at": -1})
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: QUESTION_COLLECTION,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: QUESTION_COLLECTION,
                source,
            })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn find_by_target(
        &self,
        cohort: Cohort,
        stage: Stage,
    ) -> StorageResult<Vec<QuestionEntity>> {
        // Batch dispatch matches authored targets exactly; "all" questions are
        // reserved for the live push path.
        let documents: Vec<MongoQuestionDocument> = self
            .collection()
            .find(doc! {
                "target_cohort": cohort.0 as i32,
                "target_stage": stage.as_str(),
            })
            .sort(doc! {"created_at": 1})
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: QUESTION_COLLECTION,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: QUESTION_COLLECTION,
                source,
            })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }
}

impl QuestionBank for MongoQuestionBank {
    fn insert(&self, question: QuestionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert(question).await })
    }

    fn update(&self, question: QuestionEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.update(question).await })
    }

    fn delete(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete(id).await })
    }

    fn find(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find(id).await })
    }

    fn list_all(&self) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_all().await })
    }

    fn find_by_target(
        &self,
        cohort: Cohort,
        stage: Stage,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_by_target(cohort, stage).await })
    }
}
