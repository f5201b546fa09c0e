use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::state::stage::{Cohort, CohortTarget, Role, Stage, StageTarget};

/// Participant record persisted by the directory store and shared across layers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParticipantEntity {
    /// Stable identifier for the participant.
    pub id: Uuid,
    /// Display name shown on dashboards and warnings.
    pub name: String,
    /// Login email, unique across the directory.
    pub email: String,
    /// Argon2 hash of the login password.
    pub password_hash: String,
    /// Account role.
    pub role: Role,
    /// Cohort the participant competes in.
    pub cohort: Cohort,
    /// Current competition stage.
    pub stage: Stage,
    /// Cumulative score for the current round; reset to 0 on stage transition.
    pub current_score: i64,
    /// Monotonic tab-switch counter, never reset.
    pub tab_switches: i64,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time this record was updated.
    pub updated_at: SystemTime,
}

impl ParticipantEntity {
    /// Build a fresh participant account at the registration stage.
    pub fn register(name: String, email: String, password_hash: String) -> Self {
        let timestamp = SystemTime::now();
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            role: Role::Participant,
            cohort: Cohort(1),
            stage: Stage::Registered,
            current_score: 0,
            tab_switches: 0,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }
}

/// Question record persisted by the question bank.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    /// Stable identifier for the question.
    pub id: Uuid,
    /// Rich-text body shown to participants.
    pub text: String,
    /// Ordered answer options.
    pub options: Vec<String>,
    /// The single correct option text.
    pub correct_answer: String,
    /// Time limit in seconds for answering.
    pub time_limit_secs: u64,
    /// Optional image URL attached to the question.
    pub image: Option<String>,
    /// Cohort audience this question is authored for.
    pub target_cohort: CohortTarget,
    /// Stage audience this question is authored for.
    pub target_stage: StageTarget,
    /// Creation timestamp; the bank lists newest first.
    pub created_at: SystemTime,
}

/// Immutable record of one completed standalone quiz submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultEntity {
    /// Record identifier.
    pub id: Uuid,
    /// Participant who submitted.
    pub participant_id: Uuid,
    /// Participant display name at submission time.
    pub name: String,
    /// Participant email at submission time.
    pub email: String,
    /// Number of correctly answered questions.
    pub score: i64,
    /// Number of questions graded.
    pub total_questions: i64,
    /// When the submission was graded.
    pub submitted_at: SystemTime,
}
