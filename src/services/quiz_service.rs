//! Standalone quiz: answer-free question listing and server-side grading.

use std::time::SystemTime;

use uuid::Uuid;

use crate::{
    dao::models::ResultEntity,
    dto::{
        quiz::{PublicQuestion, QuizScore, QuizSubmission},
        ws::ServerMessage,
    },
    error::ServiceError,
    state::{Audience, SharedState},
};

/// Every bank question with the correct answers stripped.
pub async fn list_questions(state: &SharedState) -> Result<Vec<PublicQuestion>, ServiceError> {
    let stores = state.require_stores().await?;
    Ok(stores
        .questions
        .list_all()
        .await?
        .into_iter()
        .map(PublicQuestion::from)
        .collect())
}

/// Grade a completed quiz submission.
///
/// Grading happens entirely server-side against the stored correct answers.
/// The immutable result record is appended to the log and admin sessions see
/// the score immediately.
pub async fn submit(
    state: &SharedState,
    participant_id: Uuid,
    submission: QuizSubmission,
) -> Result<QuizScore, ServiceError> {
    let stores = state.require_stores().await?;
    let participant = stores
        .directory
        .find_by_id(participant_id)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("participant `{participant_id}` not found"))
        })?;

    let questions = stores.questions.list_all().await?;
    let total_questions = questions.len() as i64;
    let score = questions
        .iter()
        .filter(|question| {
            submission
                .answers
                .get(&question.id)
                .is_some_and(|answer| *answer == question.correct_answer)
        })
        .count() as i64;

    let result = ResultEntity {
        id: Uuid::new_v4(),
        participant_id,
        name: participant.name.clone(),
        email: participant.email.clone(),
        score,
        total_questions,
        submitted_at: SystemTime::now(),
    };
    stores.results.append(result).await?;

    state.sessions().broadcast(
        Audience::Admins,
        &ServerMessage::ScoreUpdate {
            participant_id,
            name: participant.name,
            email: participant.email,
            score,
            total_questions,
        },
    );

    Ok(QuizScore {
        score,
        total_questions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            memory::MemoryStores,
            models::{ParticipantEntity, QuestionEntity},
        },
        state::{
            AppState, SessionHandle, SessionKind,
            stage::{CohortTarget, StageTarget},
        },
    };
    use std::collections::HashMap;
    use tokio::sync::mpsc;

    async fn harness() -> (SharedState, MemoryStores) {
        let state = AppState::new(AppConfig::default());
        let stores = MemoryStores::new();
        state.install_stores(stores.stores()).await;
        (state, stores)
    }

    fn seed_question(stores: &MemoryStores, correct: &str) -> QuestionEntity {
        let question = QuestionEntity {
            id: Uuid::new_v4(),
            text: "q".into(),
            options: vec!["yes".into(), "no".into()],
            correct_answer: correct.into(),
            time_limit_secs: 20,
            image: None,
            target_cohort: CohortTarget::All,
            target_stage: StageTarget::All,
            created_at: SystemTime::now(),
        };
        stores.questions.seed(question.clone());
        question
    }

    #[tokio::test]
    async fn listing_never_exposes_correct_answers() {
        let (state, stores) = harness().await;
        seed_question(&stores, "yes");

        let listed = list_questions(&state).await.unwrap();
        assert_eq!(listed.len(), 1);

        let payload = serde_json::to_value(&listed).unwrap();
        assert!(payload[0].get("correct_answer").is_none());
    }

    #[tokio::test]
    async fn grading_counts_exact_matches_and_logs_the_result() {
        let (state, stores) = harness().await;
        let right = seed_question(&stores, "yes");
        let wrong = seed_question(&stores, "no");
        let unanswered = seed_question(&stores, "yes");
        let ada = ParticipantEntity::register(
            "ada".to_string(),
            "ada@example.com".to_string(),
            "hash".to_string(),
        );
        stores.directory.seed(ada.clone());

        let (tx, mut admin_rx) = mpsc::unbounded_channel();
        state.sessions().insert(SessionHandle {
            session_id: Uuid::new_v4(),
            kind: SessionKind::Admin,
            tx,
        });

        let mut answers = HashMap::new();
        answers.insert(right.id, "yes".to_string());
        answers.insert(wrong.id, "yes".to_string());
        let _ = unanswered;

        let outcome = submit(&state, ada.id, QuizSubmission { answers }).await.unwrap();
        assert_eq!(outcome.score, 1);
        assert_eq!(outcome.total_questions, 3);
        assert_eq!(stores.results.len(), 1);

        let frame = admin_rx.try_recv().unwrap();
        let axum::extract::ws::Message::Text(text) = frame else {
            panic!("expected a text frame");
        };
        let event: ServerMessage = serde_json::from_str(&text).unwrap();
        assert!(matches!(
            event,
            ServerMessage::ScoreUpdate { score: 1, total_questions: 3, .. }
        ));
    }

    #[tokio::test]
    async fn unknown_participants_cannot_submit() {
        let (state, _stores) = harness().await;
        let result = submit(
            &state,
            Uuid::new_v4(),
            QuizSubmission {
                answers: HashMap::new(),
            },
        )
        .await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }
}
