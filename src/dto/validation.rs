//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::state::stage::{CohortTarget, validate_cohort};

/// Practical bounds on the number of options a question may carry.
const MIN_OPTIONS: usize = 2;
const MAX_OPTIONS: usize = 6;

/// Validates that a question's option list is usable: 2 to 6 entries, none blank.
pub fn validate_options(options: &Vec<String>) -> Result<(), ValidationError> {
    if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&options.len()) {
        let mut err = ValidationError::new("options_count");
        err.message = Some(
            format!(
                "a question needs {MIN_OPTIONS} to {MAX_OPTIONS} options (got {})",
                options.len()
            )
            .into(),
        );
        return Err(err);
    }

    if options.iter().any(|option| option.trim().is_empty()) {
        let mut err = ValidationError::new("options_blank");
        err.message = Some("options must not be blank".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a cohort target names a cohort from the closed set.
pub fn validate_cohort_target(target: &CohortTarget) -> Result<(), ValidationError> {
    match target {
        CohortTarget::All => Ok(()),
        CohortTarget::Cohort(cohort) => validate_cohort(cohort),
    }
}
