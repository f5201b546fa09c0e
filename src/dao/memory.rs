//! In-memory store fakes backing the service-layer tests.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::{
    dao::{
        Directory, QuestionBank, ResultLog, Stores,
        models::{ParticipantEntity, QuestionEntity, ResultEntity},
        storage::{StorageError, StorageResult},
    },
    state::stage::{Cohort, Role, Stage},
};

/// Directory fake holding participants in a map.
#[derive(Default)]
pub struct MemoryDirectory {
    participants: DashMap<Uuid, ParticipantEntity>,
}

impl MemoryDirectory {
    /// Insert a record directly, bypassing duplicate checks.
    pub fn seed(&self, participant: ParticipantEntity) {
        self.participants.insert(participant.id, participant);
    }

    /// Read a record back for assertions.
    pub fn get(&self, id: Uuid) -> Option<ParticipantEntity> {
        self.participants.get(&id).map(|entry| entry.clone())
    }
}

impl Directory for Arc<MemoryDirectory> {
    fn insert(&self, participant: ParticipantEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let duplicate = store
                .participants
                .iter()
                .any(|entry| entry.email == participant.email);
            if duplicate {
                return Err(StorageError::duplicate(format!(
                    "participant email `{}` already registered",
                    participant.email
                )));
            }
            store.participants.insert(participant.id, participant);
            Ok(())
        })
    }

    fn find_by_id(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.get(id)) })
    }

    fn find_by_email(
        &self,
        email: String,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .participants
                .iter()
                .find(|entry| entry.email == email)
                .map(|entry| entry.clone()))
        })
    }

    fn list_participants(&self) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut list: Vec<ParticipantEntity> = store
                .participants
                .iter()
                .filter(|entry| entry.role == Role::Participant)
                .map(|entry| entry.clone())
                .collect();
            list.sort_by(|a, b| {
                a.cohort
                    .0
                    .cmp(&b.cohort.0)
                    .then(b.current_score.cmp(&a.current_score))
            });
            Ok(list)
        })
    }

    fn update_cohort(&self, id: Uuid, cohort: Cohort) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            if let Some(mut entry) = store.participants.get_mut(&id) {
                entry.cohort = cohort;
            }
            Ok(())
        })
    }

    fn increment_score(&self, id: Uuid, delta: i64) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            if let Some(mut entry) = store.participants.get_mut(&id) {
                entry.current_score += delta;
            }
            Ok(())
        })
    }

    fn set_stage(&self, ids: Vec<Uuid>, stage: Stage) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            for id in ids {
                if let Some(mut entry) = store.participants.get_mut(&id) {
                    entry.stage = stage;
                    entry.current_score = 0;
                }
            }
            Ok(())
        })
    }

    fn reset_all(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            for mut entry in store.participants.iter_mut() {
                if entry.role == Role::Participant {
                    entry.stage = Stage::Registered;
                    entry.current_score = 0;
                }
            }
            Ok(())
        })
    }

    fn delete(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.participants.remove(&id).is_some()) })
    }

    fn increment_tab_switches(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let Some(mut entry) = store.participants.get_mut(&id) else {
                return Ok(None);
            };
            entry.tab_switches += 1;
            Ok(Some(entry.clone()))
        })
    }
}

/// Question bank fake holding questions in a map.
#[derive(Default)]
pub struct MemoryQuestionBank {
    questions: DashMap<Uuid, QuestionEntity>,
}

impl MemoryQuestionBank {
    /// Insert a record directly.
    pub fn seed(&self, question: QuestionEntity) {
        self.questions.insert(question.id, question);
    }

    /// Read a record back for assertions.
    pub fn get(&self, id: Uuid) -> Option<QuestionEntity> {
        self.questions.get(&id).map(|entry| entry.clone())
    }
}

impl QuestionBank for Arc<MemoryQuestionBank> {
    fn insert(&self, question: QuestionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.questions.insert(question.id, question);
            Ok(())
        })
    }

    fn update(&self, question: QuestionEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let existed = store.questions.contains_key(&question.id);
            if existed {
                store.questions.insert(question.id, question);
            }
            Ok(existed)
        })
    }

    fn delete(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.questions.remove(&id).is_some()) })
    }

    fn find(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.questions.get(&id).map(|entry| entry.clone())) })
    }

    fn list_all(&self) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut list: Vec<QuestionEntity> =
                store.questions.iter().map(|entry| entry.clone()).collect();
            list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(list)
        })
    }

    fn find_by_target(
        &self,
        cohort: Cohort,
        stage: Stage,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        use crate::state::stage::{CohortTarget, StageTarget};
        let store = self.clone();
        Box::pin(async move {
            let mut list: Vec<QuestionEntity> = store
                .questions
                .iter()
                .filter(|entry| {
                    entry.target_cohort == CohortTarget::Cohort(cohort)
                        && entry.target_stage == StageTarget::Stage(stage)
                })
                .map(|entry| entry.clone())
                .collect();
            list.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            Ok(list)
        })
    }
}

/// Result log fake collecting appended records.
#[derive(Default)]
pub struct MemoryResultLog {
    records: DashMap<Uuid, ResultEntity>,
}

impl MemoryResultLog {
    /// Number of records appended so far.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ResultLog for Arc<MemoryResultLog> {
    fn append(&self, result: ResultEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.records.insert(result.id, result);
            Ok(())
        })
    }
}

/// Bundle of fresh memory fakes plus handles kept for assertions.
pub struct MemoryStores {
    /// Directory fake.
    pub directory: Arc<MemoryDirectory>,
    /// Question bank fake.
    pub questions: Arc<MemoryQuestionBank>,
    /// Result log fake.
    pub results: Arc<MemoryResultLog>,
}

impl MemoryStores {
    /// Create empty fakes.
    pub fn new() -> Self {
        Self {
            directory: Arc::new(MemoryDirectory::default()),
            questions: Arc::new(MemoryQuestionBank::default()),
            results: Arc::new(MemoryResultLog::default()),
        }
    }

    /// Wrap the fakes into the store bundle installed on the app state.
    pub fn stores(&self) -> Stores {
        Stores {
            directory: Arc::new(self.directory.clone()),
            questions: Arc::new(self.questions.clone()),
            results: Arc::new(self.results.clone()),
        }
    }
}
