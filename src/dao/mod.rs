/// In-memory store fakes used by the service-layer tests.
#[cfg(test)]
pub mod memory;
/// Database model definitions.
pub mod models;
/// MongoDB store implementations.
pub mod mongodb;
/// Storage abstraction layer for database operations.
pub mod storage;

use std::sync::Arc;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::{
    dao::{
        models::{ParticipantEntity, QuestionEntity, ResultEntity},
        storage::StorageResult,
    },
    state::stage::{Cohort, Stage},
};

/// Abstraction over the identity-and-directory persistence for participants.
pub trait Directory: Send + Sync {
    /// Insert a new account; fails with a duplicate error on an existing email.
    fn insert(&self, participant: ParticipantEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Look up a participant by id.
    fn find_by_id(&self, id: Uuid)
    -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>>;
    /// Look up a participant by login email.
    fn find_by_email(
        &self,
        email: String,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>>;
    /// All participant-role records, sorted by cohort ascending then score descending.
    fn list_participants(&self) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>>;
    /// Re-assign a participant's cohort (participants pick a cohort at login).
    fn update_cohort(&self, id: Uuid, cohort: Cohort) -> BoxFuture<'static, StorageResult<()>>;
    /// Apply a delta to the cumulative round score.
    fn increment_score(&self, id: Uuid, delta: i64) -> BoxFuture<'static, StorageResult<()>>;
    /// Set the stage for each listed participant and reset their round score to 0.
    fn set_stage(&self, ids: Vec<Uuid>, stage: Stage) -> BoxFuture<'static, StorageResult<()>>;
    /// Put every participant back to the registered stage with a zero score.
    fn reset_all(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Delete a participant record; returns whether a record existed.
    fn delete(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    /// Increment the tab-switch counter and return the updated record.
    fn increment_tab_switches(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>>;
}

/// Abstraction over the question-bank persistence.
pub trait QuestionBank: Send + Sync {
    /// Insert a freshly authored question.
    fn insert(&self, question: QuestionEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Replace an existing question by id; returns whether it existed.
    fn update(&self, question: QuestionEntity) -> BoxFuture<'static, StorageResult<bool>>;
    /// Delete a question; returns whether it existed.
    fn delete(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    /// Look up a question by id.
    fn find(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>>;
    /// Every question, newest first.
    fn list_all(&self) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>>;
    /// Questions authored for exactly this cohort and stage (no wildcard).
    fn find_by_target(
        &self,
        cohort: Cohort,
        stage: Stage,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>>;
}

/// Append-only log of completed standalone quiz submissions.
pub trait ResultLog: Send + Sync {
    /// Append one immutable result record.
    fn append(&self, result: ResultEntity) -> BoxFuture<'static, StorageResult<()>>;
}

/// Bundle of store handles installed together by the storage supervisor.
#[derive(Clone)]
pub struct Stores {
    /// Participant directory.
    pub directory: Arc<dyn Directory>,
    /// Question bank.
    pub questions: Arc<dyn QuestionBank>,
    /// Quiz result log.
    pub results: Arc<dyn ResultLog>,
}
