//! Live competition controller.
//!
//! All mutations of the live question slot happen here, behind the slot's
//! write lock, so pushes, submissions, closes and the auto-close timer can
//! never observe each other half-way. Scoring writes to the directory are
//! best-effort: a storage hiccup loses a score increment, not the broadcast.

use std::time::Duration;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    config::DEFAULT_TIME_LIMIT_SECS,
    dto::ws::{BatchQuestion, PushQuestionRequest, QuestionContent, ServerMessage},
    error::ServiceError,
    state::{Audience, LiveQuestion, SessionIdentity, SessionKind, SharedState},
    state::stage::{Cohort, Stage},
};

/// Open a live question, replacing any question still open.
///
/// The replaced question is discarded without scoring. The new question is
/// broadcast to the matching participant audience and mirrored to admin
/// sessions, and an auto-close timer is armed for its deadline.
pub async fn push_question(
    state: &SharedState,
    request: PushQuestionRequest,
) -> Result<(), ServiceError> {
    let time_limit_secs = request
        .time_limit_secs
        .filter(|limit| *limit > 0)
        .unwrap_or(DEFAULT_TIME_LIMIT_SECS);

    let live = LiveQuestion::open(
        request.question_id,
        request.text,
        request.options,
        request.answer,
        request.image,
        time_limit_secs,
        request.target_cohort,
        request.target_stage,
    );
    let nonce = live.nonce;
    let content = QuestionContent::from(&live);
    let audience = Audience::Targets(live.target_cohort, live.target_stage);

    {
        let mut guard = state.live().write().await;
        if let Some(replaced) = guard.replace(live) {
            info!(
                answers = replaced.answer_count(),
                "replacing an open question; its answers are discarded"
            );
        }
    }

    let event = ServerMessage::QuestionContent(content);
    state.sessions().broadcast(audience, &event);
    state.sessions().broadcast(Audience::Admins, &event);

    schedule_auto_close(state, nonce, Duration::from_secs(time_limit_secs));
    Ok(())
}

/// Close the open live question, score its winners and reveal the answer.
///
/// Closing when no question is open is a harmless no-op so a manual close can
/// race the auto-close timer.
pub async fn close_question(state: &SharedState) -> Result<(), ServiceError> {
    close_internal(state, None).await
}

/// Record a participant's answer to the open live question.
///
/// First submission per participant wins; later ones and submissions arriving
/// after the close are dropped. Accepted answers are relayed to admin sessions.
pub async fn submit_single_answer(
    state: &SharedState,
    participant_id: Uuid,
    answer: String,
) -> Result<(), ServiceError> {
    let mut guard = state.live().write().await;
    let Some(live) = guard.as_mut() else {
        info!(participant = %participant_id, "answer dropped: no question is open");
        return Ok(());
    };

    if !live.record_answer(participant_id, answer.clone()) {
        info!(participant = %participant_id, "answer dropped: participant already answered");
        return Ok(());
    }

    // Relayed under the slot lock so admins observe answers in acceptance order.
    state.sessions().broadcast(
        Audience::Admins,
        &ServerMessage::LiveResponse {
            participant_id,
            answer,
        },
    );
    Ok(())
}

/// Dispatch the questions authored for exactly this cohort and stage as a batch.
///
/// Questions targeting wider audiences are not swept in. An empty result is a
/// silent no-op; otherwise previous batch scoring memory is forgotten and the
/// batch goes out with correct answers stripped.
pub async fn start_batch(
    state: &SharedState,
    target_cohort: Cohort,
    target_stage: Stage,
) -> Result<(), ServiceError> {
    let stores = state.require_stores().await?;
    let questions = stores
        .questions
        .find_by_target(target_cohort, target_stage)
        .await?;

    if questions.is_empty() {
        info!(
            cohort = target_cohort.0,
            stage = target_stage.as_str(),
            "no questions authored for this audience; batch not started"
        );
        return Ok(());
    }

    state.clear_batch_progress();

    let questions: Vec<BatchQuestion> = questions.into_iter().map(BatchQuestion::from).collect();
    state.sessions().broadcast(
        Audience::Everyone,
        &ServerMessage::BatchStart {
            questions,
            target_cohort,
            target_stage,
        },
    );
    Ok(())
}

/// Grade a participant's answer to one batch question.
///
/// The first submission per (participant, question) pair is binding: it scores
/// a point when correct, and every later submission for the pair is ignored,
/// so client retries cannot double-count. Admin sessions see each submission.
pub async fn submit_batch_answer(
    state: &SharedState,
    participant_id: Uuid,
    question_id: Uuid,
    answer: String,
) -> Result<(), ServiceError> {
    let stores = state.require_stores().await?;
    let question = stores
        .questions
        .find(question_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("question `{question_id}` not found")))?;

    let first_submission = state.mark_batch_scored(participant_id, question_id);
    if first_submission && answer == question.correct_answer {
        stores.directory.increment_score(participant_id, 1).await?;
    }

    state.sessions().broadcast(
        Audience::Admins,
        &ServerMessage::LiveResponse {
            participant_id,
            answer,
        },
    );
    Ok(())
}

/// Move participants to a new stage, resetting their round scores to zero.
///
/// Connected clients receive a stage-refresh signal and are expected to
/// re-join so their audience membership follows the new stage.
pub async fn promote(
    state: &SharedState,
    participant_ids: Vec<Uuid>,
    new_stage: Stage,
) -> Result<(), ServiceError> {
    if participant_ids.is_empty() {
        return Ok(());
    }
    let stores = state.require_stores().await?;
    stores.directory.set_stage(participant_ids, new_stage).await?;

    state
        .sessions()
        .broadcast(Audience::Everyone, &ServerMessage::StageRefresh);
    Ok(())
}

/// Reset the whole competition: every participant back to the registration
/// stage with a zero score, the live question and batch memory discarded.
pub async fn reset_game(state: &SharedState) -> Result<(), ServiceError> {
    let stores = state.require_stores().await?;
    stores.directory.reset_all().await?;

    {
        let mut guard = state.live().write().await;
        guard.take();
    }
    state.clear_batch_progress();

    state
        .sessions()
        .broadcast(Audience::Everyone, &ServerMessage::GameReset);
    Ok(())
}

/// Delete a participant from the competition.
///
/// The removed participant is told on their private channel; everyone else
/// gets a stage-refresh signal so dashboards drop the record.
pub async fn remove_participant(
    state: &SharedState,
    participant_id: Uuid,
) -> Result<(), ServiceError> {
    let stores = state.require_stores().await?;
    let existed = stores.directory.delete(participant_id).await?;
    if !existed {
        return Err(ServiceError::NotFound(format!(
            "participant `{participant_id}` not found"
        )));
    }

    state.sessions().broadcast(
        Audience::Participant(participant_id),
        &ServerMessage::ParticipantRemoved { participant_id },
    );
    state
        .sessions()
        .broadcast(Audience::Everyone, &ServerMessage::StageRefresh);
    Ok(())
}

/// Count a tab switch against a participant.
///
/// The counter only ever grows. Admin sessions get the dashboard update, the
/// offender gets a private warning carrying the new count.
pub async fn report_tab_switch(
    state: &SharedState,
    participant_id: Uuid,
) -> Result<(), ServiceError> {
    let stores = state.require_stores().await?;
    let participant = stores
        .directory
        .increment_tab_switches(participant_id)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("participant `{participant_id}` not found"))
        })?;

    state.sessions().broadcast(
        Audience::Admins,
        &ServerMessage::TabSwitchUpdate {
            participant_id,
            name: participant.name,
            count: participant.tab_switches,
        },
    );
    state.sessions().broadcast(
        Audience::Participant(participant_id),
        &ServerMessage::TabSwitchWarning {
            count: participant.tab_switches,
        },
    );
    Ok(())
}

/// Bind a session to a participant identity looked up in the directory.
///
/// Called on every join, including re-joins after a stage-refresh signal, so
/// the session's audience membership always reflects the stored identity. If a
/// live question addressed to this participant is open, it is replayed so
/// late joiners can still answer.
pub async fn join(
    state: &SharedState,
    session_id: Uuid,
    participant_id: Uuid,
) -> Result<(), ServiceError> {
    let stores = state.require_stores().await?;
    let participant = stores
        .directory
        .find_by_id(participant_id)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("participant `{participant_id}` not found"))
        })?;

    let identity = SessionIdentity {
        participant_id,
        cohort: participant.cohort,
        stage: participant.stage,
    };
    state
        .sessions()
        .identify(session_id, SessionKind::Participant(identity));

    let replay = {
        let guard = state.live().read().await;
        guard
            .as_ref()
            .filter(|live| live.addresses(identity.cohort, identity.stage))
            .map(QuestionContent::from)
    };
    if let Some(content) = replay {
        state
            .sessions()
            .send_to_session(session_id, &ServerMessage::QuestionContent(content));
    }
    Ok(())
}

/// Bind a session to the Game Master identity and send it the game snapshot.
pub async fn admin_join(state: &SharedState, session_id: Uuid) {
    state.sessions().identify(session_id, SessionKind::Admin);

    let live = {
        let guard = state.live().read().await;
        guard.as_ref().map(QuestionContent::from)
    };
    state
        .sessions()
        .send_to_session(session_id, &ServerMessage::GameState { live });
}

/// Arm a timer that closes the question carrying `nonce` once its time limit
/// elapses. A push replacing the question gets a fresh nonce, which disarms
/// this timer without cancelling the task.
fn schedule_auto_close(state: &SharedState, nonce: Uuid, after: Duration) {
    let state = state.clone();
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        if let Err(err) = close_internal(&state, Some(nonce)).await {
            warn!(error = %err, "auto-close of the live question failed");
        }
    });
}

async fn close_internal(
    state: &SharedState,
    expected_nonce: Option<Uuid>,
) -> Result<(), ServiceError> {
    let closed = {
        let mut guard = state.live().write().await;
        let matches = match (guard.as_ref(), expected_nonce) {
            (Some(_), None) => true,
            (Some(live), Some(nonce)) => live.nonce == nonce,
            (None, _) => false,
        };
        if matches { guard.take() } else { None }
    };
    let Some(live) = closed else {
        return Ok(());
    };

    let winners = live.winners();
    match state.stores().await {
        Some(stores) => {
            for winner in &winners {
                if let Err(err) = stores.directory.increment_score(*winner, 1).await {
                    warn!(participant = %winner, error = %err, "failed to persist winner score");
                }
            }
        }
        None => warn!(
            winners = winners.len(),
            "storage degraded; winner scores not persisted"
        ),
    }

    state.sessions().broadcast(
        Audience::Everyone,
        &ServerMessage::QuestionResult {
            correct_answer: live.answer,
            winners,
        },
    );
    Ok(())
}
