//! Wire messages carried over the `/ws` session channel, both directions.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::QuestionEntity,
    dto::validation::{validate_cohort_target, validate_options},
    state::{
        live::LiveQuestion,
        stage::{Cohort, CohortTarget, Stage, StageTarget},
    },
};

/// Payload of an admin push: a full question snapshot plus its audience.
#[skip_serializing_none]
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct PushQuestionRequest {
    /// Bank question this push was built from, when not ad-hoc.
    pub question_id: Option<Uuid>,
    /// Rich-text body.
    #[validate(length(min = 1, message = "question text must not be empty"))]
    pub text: String,
    /// Ordered answer options.
    #[validate(custom(function = "validate_options"))]
    pub options: Vec<String>,
    /// Correct option text, compared byte-exact at close time.
    #[validate(length(min = 1, message = "correct answer must not be empty"))]
    pub answer: String,
    /// Time limit in seconds; absent or non-positive falls back to the default.
    pub time_limit_secs: Option<u64>,
    /// Optional image URL.
    pub image: Option<String>,
    /// Cohort audience.
    #[validate(custom(function = "validate_cohort_target"))]
    pub target_cohort: CohortTarget,
    /// Stage audience.
    pub target_stage: StageTarget,
}

/// Messages accepted from WebSocket clients (participants and the Game Master).
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Participant announces its identity; re-sent after stage-refresh signals.
    Join {
        /// Directory id of the joining participant.
        participant_id: Uuid,
    },
    /// Game Master announces itself and receives the current game state.
    AdminJoin,
    /// Admin pushes a live question, replacing any open one.
    PushQuestion(PushQuestionRequest),
    /// Admin closes the open question, triggering scoring.
    CloseQuestion,
    /// Admin dispatches a question batch to an exact cohort/stage audience.
    StartBatch {
        /// Cohort whose authored questions are dispatched.
        target_cohort: Cohort,
        /// Stage whose authored questions are dispatched.
        target_stage: Stage,
    },
    /// Participant answers the open live question.
    SubmitAnswer {
        /// Submitting participant.
        participant_id: Uuid,
        /// Chosen option text.
        answer: String,
    },
    /// Participant answers one question of a running batch.
    SubmitBatchAnswer {
        /// Submitting participant.
        participant_id: Uuid,
        /// Bank question being answered.
        question_id: Uuid,
        /// Chosen option text.
        answer: String,
    },
    /// Admin moves participants to a new stage, resetting their round scores.
    Promote {
        /// Participants to move.
        participant_ids: Vec<Uuid>,
        /// Stage to move them to.
        new_stage: Stage,
    },
    /// Admin resets the whole competition.
    ResetGame,
    /// Admin deletes a participant.
    RemoveParticipant {
        /// Participant to delete.
        participant_id: Uuid,
    },
    /// Participant's client reports a tab switch.
    ReportTabSwitch {
        /// Offending participant.
        participant_id: Uuid,
    },
    /// Unrecognised message type, tolerated and ignored.
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    /// Parse a text frame and run payload validation where it applies.
    pub fn from_json_str(text: &str) -> Result<Self, String> {
        let message: ClientMessage =
            serde_json::from_str(text).map_err(|err| format!("malformed message: {err}"))?;
        if let ClientMessage::PushQuestion(request) = &message {
            request
                .validate()
                .map_err(|err| format!("invalid push: {err}"))?;
        }
        Ok(message)
    }
}

/// Live question content delivered to the matching audience.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuestionContent {
    /// Rich-text body.
    pub text: String,
    /// Ordered answer options.
    pub options: Vec<String>,
    /// Absolute deadline in unix millis; clients drive their own countdown.
    pub end_time_ms: u64,
    /// Optional image URL.
    pub image: Option<String>,
    /// Cohort audience of the push.
    pub target_cohort: CohortTarget,
    /// Stage audience of the push.
    pub target_stage: StageTarget,
}

impl From<&LiveQuestion> for QuestionContent {
    fn from(live: &LiveQuestion) -> Self {
        Self {
            text: live.text.clone(),
            options: live.options.clone(),
            end_time_ms: live.end_time_ms,
            image: live.image.clone(),
            target_cohort: live.target_cohort,
            target_stage: live.target_stage,
        }
    }
}

/// One question of a dispatched batch, with the correct answer stripped.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BatchQuestion {
    /// Bank question id, echoed back on submissions.
    pub id: Uuid,
    /// Rich-text body.
    pub text: String,
    /// Ordered answer options.
    pub options: Vec<String>,
    /// Per-question time limit driven client-side.
    pub time_limit_secs: u64,
    /// Optional image URL.
    pub image: Option<String>,
}

impl From<QuestionEntity> for BatchQuestion {
    fn from(question: QuestionEntity) -> Self {
        Self {
            id: question.id,
            text: question.text,
            options: question.options,
            time_limit_secs: question.time_limit_secs,
            image: question.image,
        }
    }
}

/// Events emitted by the game controller onto the session channel.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A live question is open; shown to the matching audience.
    QuestionContent(QuestionContent),
    /// The live question closed; reveals the answer and who got it right.
    QuestionResult {
        /// Correct option text.
        correct_answer: String,
        /// Participants whose answer matched, in submission order.
        winners: Vec<Uuid>,
    },
    /// A question batch starts; clients filter on the embedded targets.
    BatchStart {
        /// Ordered batch content.
        questions: Vec<BatchQuestion>,
        /// Cohort the batch was authored for.
        target_cohort: Cohort,
        /// Stage the batch was authored for.
        target_stage: Stage,
    },
    /// Admin-only: a participant just submitted an answer.
    LiveResponse {
        /// Submitting participant.
        participant_id: Uuid,
        /// Submitted option text.
        answer: String,
    },
    /// Identity state changed; clients must re-join to refresh room membership.
    StageRefresh,
    /// The whole competition was reset.
    GameReset,
    /// Admin-only: a participant's tab-switch counter moved.
    TabSwitchUpdate {
        /// Offending participant.
        participant_id: Uuid,
        /// Display name for the dashboard.
        name: String,
        /// New counter value.
        count: i64,
    },
    /// Private warning carrying the participant's own counter.
    TabSwitchWarning {
        /// New counter value.
        count: i64,
    },
    /// A participant was removed; targeted at their private channel.
    ParticipantRemoved {
        /// Removed participant.
        participant_id: Uuid,
    },
    /// Admin-only: a standalone quiz submission was graded.
    ScoreUpdate {
        /// Submitting participant.
        participant_id: Uuid,
        /// Display name for the dashboard.
        name: String,
        /// Login email for the dashboard.
        email: String,
        /// Correct answers in the submission.
        score: i64,
        /// Questions graded.
        total_questions: i64,
    },
    /// Current session snapshot sent to a joining Game Master.
    GameState {
        /// The open live question, if any.
        live: Option<QuestionContent>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_message_parses() {
        let id = Uuid::new_v4();
        let text = format!("{{\"type\":\"join\",\"participant_id\":\"{id}\"}}");
        match ClientMessage::from_json_str(&text) {
            Ok(ClientMessage::Join { participant_id }) => assert_eq!(participant_id, id),
            other => panic!("unexpected parse result: {other:?}"),
        }
    }

    #[test]
    fn push_question_fields_are_inline() {
        let text = r#"{
            "type": "push_question",
            "text": "2 + 2?",
            "options": ["3", "4"],
            "answer": "4",
            "time_limit_secs": 15,
            "target_cohort": "all",
            "target_stage": "registered"
        }"#;
        match ClientMessage::from_json_str(text) {
            Ok(ClientMessage::PushQuestion(request)) => {
                assert_eq!(request.text, "2 + 2?");
                assert_eq!(request.target_cohort, CohortTarget::All);
                assert_eq!(request.target_stage, StageTarget::Stage(Stage::Registered));
            }
            other => panic!("unexpected parse result: {other:?}"),
        }
    }

    #[test]
    fn push_question_with_blank_options_is_rejected() {
        let text = r#"{
            "type": "push_question",
            "text": "2 + 2?",
            "options": ["4", " "],
            "answer": "4",
            "target_cohort": 1,
            "target_stage": "all"
        }"#;
        assert!(ClientMessage::from_json_str(text).is_err());
    }

    #[test]
    fn unknown_type_is_tolerated() {
        let parsed = ClientMessage::from_json_str(r#"{"type":"nonsense"}"#).unwrap();
        assert!(matches!(parsed, ClientMessage::Unknown));
    }

    #[test]
    fn server_message_tags_are_snake_case() {
        let payload = serde_json::to_value(&ServerMessage::StageRefresh).unwrap();
        assert_eq!(payload["type"], "stage_refresh");
    }
}
