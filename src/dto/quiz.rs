use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::QuestionEntity,
    state::stage::{CohortTarget, StageTarget},
};

/// Question view handed to participants: everything except the correct answer.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PublicQuestion {
    /// Stable identifier, echoed back in submissions.
    pub id: Uuid,
    /// Rich-text body.
    pub text: String,
    /// Ordered answer options.
    pub options: Vec<String>,
    /// Time limit in seconds.
    pub time_limit_secs: u64,
    /// Optional image URL.
    pub image: Option<String>,
    /// Cohort audience.
    pub target_cohort: CohortTarget,
    /// Stage audience.
    pub target_stage: StageTarget,
}

impl From<QuestionEntity> for PublicQuestion {
    fn from(entity: QuestionEntity) -> Self {
        Self {
            id: entity.id,
            text: entity.text,
            options: entity.options,
            time_limit_secs: entity.time_limit_secs,
            image: entity.image,
            target_cohort: entity.target_cohort,
            target_stage: entity.target_stage,
        }
    }
}

/// A completed standalone quiz submission: chosen option per question id.
#[derive(Debug, Deserialize, ToSchema)]
pub struct QuizSubmission {
    /// Map from question id to the selected option text.
    pub answers: HashMap<Uuid, String>,
}

/// Grading outcome returned to the submitting participant.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuizScore {
    /// Correctly answered questions.
    pub score: i64,
    /// Questions graded.
    pub total_questions: i64,
}
