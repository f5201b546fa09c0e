//! Game Master dashboard and question-bank management.

use std::time::SystemTime;

use tracing::warn;
use uuid::Uuid;

use crate::{
    config::DEFAULT_TIME_LIMIT_SECS,
    dao::models::QuestionEntity,
    dto::admin::{DashboardResponse, ParticipantSummary, QuestionInput, QuestionRecord},
    error::ServiceError,
    state::SharedState,
};

/// Build the dashboard: every participant, sorted by cohort then score.
pub async fn dashboard(state: &SharedState) -> Result<DashboardResponse, ServiceError> {
    let participants = list_users(state).await?;
    let total_participants = participants.len();
    Ok(DashboardResponse {
        participants,
        total_participants,
    })
}

/// Every participant account, sorted by cohort then score.
pub async fn list_users(state: &SharedState) -> Result<Vec<ParticipantSummary>, ServiceError> {
    let stores = state.require_stores().await?;
    Ok(stores
        .directory
        .list_participants()
        .await?
        .into_iter()
        .map(ParticipantSummary::from)
        .collect())
}

/// Author a new bank question.
pub async fn create_question(
    state: &SharedState,
    input: QuestionInput,
) -> Result<QuestionRecord, ServiceError> {
    let stores = state.require_stores().await?;
    let question = entity_from_input(Uuid::new_v4(), SystemTime::now(), input);
    stores.questions.insert(question.clone()).await?;
    Ok(QuestionRecord::from(question))
}

/// Replace an existing bank question, keeping its id and creation time.
pub async fn update_question(
    state: &SharedState,
    id: Uuid,
    input: QuestionInput,
) -> Result<QuestionRecord, ServiceError> {
    let stores = state.require_stores().await?;
    let existing = stores
        .questions
        .find(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("question `{id}` not found")))?;

    let question = entity_from_input(id, existing.created_at, input);
    if !stores.questions.update(question.clone()).await? {
        return Err(ServiceError::NotFound(format!("question `{id}` not found")));
    }
    Ok(QuestionRecord::from(question))
}

/// Delete a bank question.
pub async fn delete_question(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let stores = state.require_stores().await?;
    if !stores.questions.delete(id).await? {
        return Err(ServiceError::NotFound(format!("question `{id}` not found")));
    }
    Ok(())
}

/// Every bank question with correct answers included, newest first.
pub async fn list_questions(state: &SharedState) -> Result<Vec<QuestionRecord>, ServiceError> {
    let stores = state.require_stores().await?;
    Ok(stores
        .questions
        .list_all()
        .await?
        .into_iter()
        .map(QuestionRecord::from)
        .collect())
}

/// Turn validated input into a question entity.
///
/// A correct answer missing from the options is accepted but logged: such a
/// question can never be answered correctly, which may be intentional during
/// editing but is usually an authoring mistake.
fn entity_from_input(id: Uuid, created_at: SystemTime, input: QuestionInput) -> QuestionEntity {
    if !input.options.contains(&input.correct_answer) {
        warn!(question = %id, "correct answer is not one of the options");
    }
    QuestionEntity {
        id,
        text: input.text,
        options: input.options,
        correct_answer: input.correct_answer,
        time_limit_secs: input
            .time_limit_secs
            .filter(|limit| *limit > 0)
            .unwrap_or(DEFAULT_TIME_LIMIT_SECS),
        image: input.image,
        target_cohort: input.target_cohort,
        target_stage: input.target_stage,
        created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::{memory::MemoryStores, models::ParticipantEntity},
        state::{
            AppState,
            stage::{Cohort, CohortTarget, Stage, StageTarget},
        },
    };

    async fn harness() -> (SharedState, MemoryStores) {
        let state = AppState::new(AppConfig::default());
        let stores = MemoryStores::new();
        state.install_stores(stores.stores()).await;
        (state, stores)
    }

    fn input(text: &str, time_limit_secs: Option<u64>) -> QuestionInput {
        QuestionInput {
            text: text.to_string(),
            options: vec!["yes".into(), "no".into()],
            correct_answer: "yes".into(),
            time_limit_secs,
            image: None,
            target_cohort: CohortTarget::Cohort(Cohort(1)),
            target_stage: StageTarget::Stage(Stage::Registered),
        }
    }

    #[tokio::test]
    async fn create_applies_the_default_time_limit() {
        let (state, _stores) = harness().await;
        let record = create_question(&state, input("q", None)).await.unwrap();
        assert_eq!(record.time_limit_secs, DEFAULT_TIME_LIMIT_SECS);

        let explicit = create_question(&state, input("q2", Some(45))).await.unwrap();
        assert_eq!(explicit.time_limit_secs, 45);
    }

    #[tokio::test]
    async fn mismatched_correct_answer_is_accepted() {
        let (state, _stores) = harness().await;
        let mut bad = input("q", None);
        bad.correct_answer = "maybe".into();

        let record = create_question(&state, bad).await.unwrap();
        assert_eq!(record.correct_answer, "maybe");
    }

    #[tokio::test]
    async fn update_keeps_id_and_creation_time() {
        let (state, stores) = harness().await;
        let record = create_question(&state, input("before", None)).await.unwrap();

        let updated = update_question(&state, record.id, input("after", Some(10)))
            .await
            .unwrap();
        assert_eq!(updated.id, record.id);
        assert_eq!(updated.created_at, record.created_at);
        assert_eq!(updated.text, "after");

        let stored = stores.questions.get(record.id).unwrap();
        assert_eq!(stored.text, "after");
    }

    #[tokio::test]
    async fn update_and_delete_of_missing_questions_fail() {
        let (state, _stores) = harness().await;
        let missing = Uuid::new_v4();

        assert!(matches!(
            update_question(&state, missing, input("q", None)).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            delete_question(&state, missing).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn user_listing_returns_every_account() {
        let (state, stores) = harness().await;
        for name in ["ada", "bob"] {
            stores.directory.seed(ParticipantEntity::register(
                name.to_string(),
                format!("{name}@example.com"),
                "hash".to_string(),
            ));
        }

        let users = list_users(&state).await.unwrap();
        let mut names: Vec<&str> = users.iter().map(|user| user.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, ["ada", "bob"]);
    }

    #[tokio::test]
    async fn dashboard_counts_participants() {
        let (state, stores) = harness().await;
        for name in ["ada", "bob"] {
            stores.directory.seed(ParticipantEntity::register(
                name.to_string(),
                format!("{name}@example.com"),
                "hash".to_string(),
            ));
        }

        let dashboard = dashboard(&state).await.unwrap();
        assert_eq!(dashboard.total_participants, 2);
        assert_eq!(dashboard.participants.len(), 2);
    }
}
