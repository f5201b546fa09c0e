//! The single live question open across the whole process, together with the
//! answers collected while it is open.

use std::time::{SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;
use uuid::Uuid;

use crate::state::stage::{Cohort, CohortTarget, Stage, StageTarget};

/// Snapshot of a pushed question plus its deadline and collected answers.
///
/// At most one instance exists per process and only the game controller
/// mutates it. The answer map lives and dies with the question: it is empty on
/// push and discarded entirely on close.
#[derive(Debug, Clone)]
pub struct LiveQuestion {
    /// Identifies this particular push; a replacement push gets a fresh nonce
    /// so a stale auto-close timer can recognise it is no longer responsible.
    pub nonce: Uuid,
    /// Identifier of the bank question this push was built from, if any.
    pub question_id: Option<Uuid>,
    /// Rich-text body shown to participants.
    pub text: String,
    /// Ordered answer options.
    pub options: Vec<String>,
    /// The single correct option text; compared byte-exact at close time.
    pub answer: String,
    /// Optional image URL attached to the question.
    pub image: Option<String>,
    /// Time limit communicated to clients, in seconds.
    pub time_limit_secs: u64,
    /// Unix-millis timestamp of the push.
    pub started_at_ms: u64,
    /// Absolute deadline in unix millis (`started_at + time_limit`).
    pub end_time_ms: u64,
    /// Cohort audience for this push.
    pub target_cohort: CohortTarget,
    /// Stage audience for this push.
    pub target_stage: StageTarget,
    /// Collected answers keyed by participant id, in submission order.
    /// Each participant occupies this map at most once.
    answers: IndexMap<Uuid, String>,
}

impl LiveQuestion {
    /// Build a fresh live question starting now with an empty answer map.
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        question_id: Option<Uuid>,
        text: String,
        options: Vec<String>,
        answer: String,
        image: Option<String>,
        time_limit_secs: u64,
        target_cohort: CohortTarget,
        target_stage: StageTarget,
    ) -> Self {
        let started_at_ms = unix_millis_now();
        Self {
            nonce: Uuid::new_v4(),
            question_id,
            text,
            options,
            answer,
            image,
            time_limit_secs,
            started_at_ms,
            end_time_ms: started_at_ms + time_limit_secs * 1000,
            target_cohort,
            target_stage,
            answers: IndexMap::new(),
        }
    }

    /// Record `answer` for `participant` unless one is already registered.
    ///
    /// First submission wins; returns whether the answer was accepted.
    pub fn record_answer(&mut self, participant: Uuid, answer: String) -> bool {
        if self.answers.contains_key(&participant) {
            return false;
        }
        self.answers.insert(participant, answer);
        true
    }

    /// Whether a participant with this cohort/stage is addressed by the push.
    pub fn addresses(&self, cohort: Cohort, stage: Stage) -> bool {
        self.target_cohort.matches(cohort) && self.target_stage.matches(stage)
    }

    /// Participants whose recorded answer exactly equals the correct one,
    /// in submission order.
    pub fn winners(&self) -> Vec<Uuid> {
        self.answers
            .iter()
            .filter(|(_, answer)| *answer == &self.answer)
            .map(|(participant, _)| *participant)
            .collect()
    }

    /// Number of answers collected so far.
    pub fn answer_count(&self) -> usize {
        self.answers.len()
    }
}

/// Current wall-clock time as unix milliseconds.
pub fn unix_millis_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question() -> LiveQuestion {
        LiveQuestion::open(
            None,
            "capital of France?".into(),
            vec!["Paris".into(), "Lyon".into()],
            "Paris".into(),
            None,
            30,
            CohortTarget::All,
            StageTarget::Stage(Stage::Registered),
        )
    }

    #[test]
    fn deadline_is_start_plus_time_limit() {
        let live = question();
        assert_eq!(live.end_time_ms, live.started_at_ms + 30_000);
    }

    #[test]
    fn first_submission_wins() {
        let mut live = question();
        let participant = Uuid::new_v4();

        assert!(live.record_answer(participant, "Paris".into()));
        assert!(!live.record_answer(participant, "Lyon".into()));

        assert_eq!(live.winners(), vec![participant]);
    }

    #[test]
    fn winners_follow_submission_order_and_exact_match() {
        let mut live = question();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let third = Uuid::new_v4();

        live.record_answer(first, "Paris".into());
        live.record_answer(second, "Lyon".into());
        // Comparison is byte-exact, so case differences do not count.
        live.record_answer(third, "paris".into());

        assert_eq!(live.winners(), vec![first]);
        assert_eq!(live.answer_count(), 3);
    }

    #[test]
    fn empty_answer_map_yields_no_winners() {
        assert!(question().winners().is_empty());
    }

    #[test]
    fn addressing_requires_both_targets() {
        let live = question();
        assert!(live.addresses(Cohort(1), Stage::Registered));
        assert!(live.addresses(Cohort(2), Stage::Registered));
        assert!(!live.addresses(Cohort(1), Stage::Winner));
    }
}
