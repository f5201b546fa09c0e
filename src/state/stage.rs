//! Competition progress model: cohorts, stages, and the targeting rules used
//! when pushing questions to a subset of the audience.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::ValidationError;

/// Partition of participants used to target question delivery per group.
///
/// The competition runs with a small closed set of cohorts (1 and 2 today);
/// the value is kept as a plain number on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct Cohort(pub u8);

impl fmt::Display for Cohort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validates that a cohort number belongs to the closed competition set.
pub fn validate_cohort(cohort: &Cohort) -> Result<(), ValidationError> {
    if !(1..=2).contains(&cohort.0) {
        let mut err = ValidationError::new("cohort_range");
        err.message = Some(format!("cohort must be 1 or 2 (got {})", cohort.0).into());
        return Err(err);
    }
    Ok(())
}

/// A participant's progress checkpoint in the competition.
///
/// Promotion normally walks `Registered` to `Winner` in order; `Eliminated`
/// retains the record for participants explicitly demoted out of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Fresh account, has not qualified for anything yet.
    Registered,
    /// Passed the first round.
    Round1Qualified,
    /// Passed the first phase.
    Phase1Qualified,
    /// Won the competition.
    Winner,
    /// Explicitly taken out of the competition while keeping the record.
    Eliminated,
}

impl Stage {
    /// Stable wire/storage name for the stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Registered => "registered",
            Stage::Round1Qualified => "round1_qualified",
            Stage::Phase1Qualified => "phase1_qualified",
            Stage::Winner => "winner",
            Stage::Eliminated => "eliminated",
        }
    }

    /// Parse a stored stage name back into the enum.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "registered" => Some(Stage::Registered),
            "round1_qualified" => Some(Stage::Round1Qualified),
            "phase1_qualified" => Some(Stage::Phase1Qualified),
            "winner" => Some(Stage::Winner),
            "eliminated" => Some(Stage::Eliminated),
            _ => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role attached to an authenticated account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular competitor.
    Participant,
    /// Game Master driving the live session.
    Admin,
}

impl Role {
    /// Stable wire/storage name for the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Participant => "participant",
            Role::Admin => "admin",
        }
    }

    /// Parse a stored role name back into the enum.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "participant" => Some(Role::Participant),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Cohort selector carried by a pushed question: a single cohort or everyone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CohortTarget {
    /// Matches every cohort.
    All,
    /// Matches exactly one cohort.
    #[serde(untagged)]
    Cohort(Cohort),
}

impl CohortTarget {
    /// Whether a participant in `cohort` is addressed by this target.
    pub fn matches(&self, cohort: Cohort) -> bool {
        match self {
            CohortTarget::All => true,
            CohortTarget::Cohort(target) => *target == cohort,
        }
    }
}

/// Stage selector carried by a pushed question: a single stage or everyone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StageTarget {
    /// Matches every stage.
    All,
    /// Matches exactly one stage.
    #[serde(untagged)]
    Stage(Stage),
}

impl StageTarget {
    /// Whether a participant at `stage` is addressed by this target.
    pub fn matches(&self, stage: Stage) -> bool {
        match self {
            StageTarget::All => true,
            StageTarget::Stage(target) => *target == stage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names_round_trip() {
        for stage in [
            Stage::Registered,
            Stage::Round1Qualified,
            Stage::Phase1Qualified,
            Stage::Winner,
            Stage::Eliminated,
        ] {
            assert_eq!(Stage::parse(stage.as_str()), Some(stage));
        }
        assert_eq!(Stage::parse("round2_qualified"), None);
    }

    #[test]
    fn cohort_target_accepts_all_or_number() {
        let all: CohortTarget = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(all, CohortTarget::All);

        let one: CohortTarget = serde_json::from_str("1").unwrap();
        assert_eq!(one, CohortTarget::Cohort(Cohort(1)));

        assert!(all.matches(Cohort(2)));
        assert!(one.matches(Cohort(1)));
        assert!(!one.matches(Cohort(2)));
    }

    #[test]
    fn stage_target_accepts_all_or_name() {
        let all: StageTarget = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(all, StageTarget::All);

        let registered: StageTarget = serde_json::from_str("\"registered\"").unwrap();
        assert_eq!(registered, StageTarget::Stage(Stage::Registered));

        assert!(all.matches(Stage::Winner));
        assert!(registered.matches(Stage::Registered));
        assert!(!registered.matches(Stage::Winner));
    }

    #[test]
    fn cohort_validation_rejects_out_of_set() {
        assert!(validate_cohort(&Cohort(1)).is_ok());
        assert!(validate_cohort(&Cohort(2)).is_ok());
        assert!(validate_cohort(&Cohort(0)).is_err());
        assert!(validate_cohort(&Cohort(3)).is_err());
    }
}
