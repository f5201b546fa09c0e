use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{ParticipantEntity, QuestionEntity},
    dto::{
        format_system_time,
        validation::{validate_cohort_target, validate_options},
    },
    state::stage::{Cohort, CohortTarget, Stage, StageTarget},
};

/// Payload for authoring or editing a bank question.
#[skip_serializing_none]
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct QuestionInput {
    /// Rich-text body.
    #[validate(length(min = 1, message = "question text must not be empty"))]
    pub text: String,
    /// Ordered answer options.
    #[validate(custom(function = "validate_options"))]
    pub options: Vec<String>,
    /// Correct option text. Matching one of the options is a soft invariant:
    /// a mismatch is logged, not rejected.
    #[validate(length(min = 1, message = "correct answer must not be empty"))]
    pub correct_answer: String,
    /// Time limit in seconds; absent or non-positive falls back to the default.
    pub time_limit_secs: Option<u64>,
    /// Optional image URL, typically produced by the upload endpoint.
    pub image: Option<String>,
    /// Cohort audience this question is authored for.
    #[validate(custom(function = "validate_cohort_target"))]
    pub target_cohort: CohortTarget,
    /// Stage audience this question is authored for.
    pub target_stage: StageTarget,
}

/// Full question record returned to the Game Master, correct answer included.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuestionRecord {
    /// Stable identifier.
    pub id: Uuid,
    /// Rich-text body.
    pub text: String,
    /// Ordered answer options.
    pub options: Vec<String>,
    /// Correct option text.
    pub correct_answer: String,
    /// Time limit in seconds.
    pub time_limit_secs: u64,
    /// Optional image URL.
    pub image: Option<String>,
    /// Cohort audience.
    pub target_cohort: CohortTarget,
    /// Stage audience.
    pub target_stage: StageTarget,
    /// RFC3339 creation timestamp.
    pub created_at: String,
}

impl From<QuestionEntity> for QuestionRecord {
    fn from(entity: QuestionEntity) -> Self {
        Self {
            id: entity.id,
            text: entity.text,
            options: entity.options,
            correct_answer: entity.correct_answer,
            time_limit_secs: entity.time_limit_secs,
            image: entity.image,
            target_cohort: entity.target_cohort,
            target_stage: entity.target_stage,
            created_at: format_system_time(entity.created_at),
        }
    }
}

/// Dashboard row describing one participant.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ParticipantSummary {
    /// Directory id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Competition cohort.
    pub cohort: Cohort,
    /// Current competition stage.
    pub stage: Stage,
    /// Cumulative round score.
    pub current_score: i64,
    /// Monotonic tab-switch counter.
    pub tab_switches: i64,
}

impl From<ParticipantEntity> for ParticipantSummary {
    fn from(entity: ParticipantEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            email: entity.email,
            cohort: entity.cohort,
            stage: entity.stage,
            current_score: entity.current_score,
            tab_switches: entity.tab_switches,
        }
    }
}

/// Aggregate payload backing the Game Master dashboard.
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    /// Participants sorted by cohort then score descending.
    pub participants: Vec<ParticipantSummary>,
    /// Total number of participant accounts.
    pub total_participants: usize,
}

/// Public URL of a stored upload.
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    /// Retrievable URL for the uploaded asset.
    pub url: String,
}
