//! WebSocket session lifecycle and message dispatch.
//!
//! Each connection gets a dedicated writer task and a registry entry keyed by
//! a fresh session id. Every inbound frame is parsed, validated and dispatched
//! to the game controller; errors are logged and the connection lives on, so a
//! malformed or unauthorized message never tears down a session.

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dto::ws::ClientMessage,
    services::game_service,
    state::{SessionHandle, SessionKind, SharedState},
};

/// What this connection has announced itself as, mirrored locally so admin
/// gating never races a registry lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionRole {
    Anonymous,
    Participant(Uuid),
    Admin,
}

/// Handle the full lifecycle of one `/ws` connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let session_id = Uuid::new_v4();
    state.sessions().insert(SessionHandle {
        session_id,
        kind: SessionKind::Anonymous,
        tx: outbound_tx.clone(),
    });
    info!(session = %session_id, "session connected");

    let mut role = SessionRole::Anonymous;

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => match ClientMessage::from_json_str(&text) {
                Ok(inbound) => dispatch(&state, session_id, &mut role, inbound).await,
                Err(err) => {
                    warn!(session = %session_id, error = %err, "rejected session message");
                }
            },
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(session = %session_id, "session closed");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(session = %session_id, error = %err, "websocket error");
                break;
            }
        }
    }

    state.sessions().remove(session_id);
    info!(session = %session_id, "session disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Route one parsed message to the game controller, enforcing who may send it.
///
/// Game Master actions are only honoured after an `admin_join` on the same
/// connection, and participant actions only for the identity the connection
/// joined as.
async fn dispatch(
    state: &SharedState,
    session_id: Uuid,
    role: &mut SessionRole,
    message: ClientMessage,
) {
    let outcome = match message {
        ClientMessage::Join { participant_id } => {
            match game_service::join(state, session_id, participant_id).await {
                Ok(()) => {
                    *role = SessionRole::Participant(participant_id);
                    Ok(())
                }
                Err(err) => Err(err),
            }
        }
        ClientMessage::AdminJoin => {
            game_service::admin_join(state, session_id).await;
            *role = SessionRole::Admin;
            Ok(())
        }
        ClientMessage::PushQuestion(request) => {
            if require_admin(session_id, role, "push_question") {
                game_service::push_question(state, request).await
            } else {
                Ok(())
            }
        }
        ClientMessage::CloseQuestion => {
            if require_admin(session_id, role, "close_question") {
                game_service::close_question(state).await
            } else {
                Ok(())
            }
        }
        ClientMessage::StartBatch {
            target_cohort,
            target_stage,
        } => {
            if require_admin(session_id, role, "start_batch") {
                game_service::start_batch(state, target_cohort, target_stage).await
            } else {
                Ok(())
            }
        }
        ClientMessage::SubmitAnswer {
            participant_id,
            answer,
        } => {
            if require_self(session_id, role, participant_id, "submit_answer") {
                game_service::submit_single_answer(state, participant_id, answer).await
            } else {
                Ok(())
            }
        }
        ClientMessage::SubmitBatchAnswer {
            participant_id,
            question_id,
            answer,
        } => {
            if require_self(session_id, role, participant_id, "submit_batch_answer") {
                game_service::submit_batch_answer(state, participant_id, question_id, answer).await
            } else {
                Ok(())
            }
        }
        ClientMessage::Promote {
            participant_ids,
            new_stage,
        } => {
            if require_admin(session_id, role, "promote") {
                game_service::promote(state, participant_ids, new_stage).await
            } else {
                Ok(())
            }
        }
        ClientMessage::ResetGame => {
            if require_admin(session_id, role, "reset_game") {
                game_service::reset_game(state).await
            } else {
                Ok(())
            }
        }
        ClientMessage::RemoveParticipant { participant_id } => {
            if require_admin(session_id, role, "remove_participant") {
                game_service::remove_participant(state, participant_id).await
            } else {
                Ok(())
            }
        }
        ClientMessage::ReportTabSwitch { participant_id } => {
            if require_self(session_id, role, participant_id, "report_tab_switch") {
                game_service::report_tab_switch(state, participant_id).await
            } else {
                Ok(())
            }
        }
        ClientMessage::Unknown => {
            warn!(session = %session_id, "ignoring message with unknown type");
            Ok(())
        }
    };

    if let Err(err) = outcome {
        warn!(session = %session_id, error = %err, "session message handling failed");
    }
}

fn require_admin(session_id: Uuid, role: &SessionRole, action: &str) -> bool {
    if *role == SessionRole::Admin {
        return true;
    }
    warn!(session = %session_id, action, "ignoring admin action from a non-admin session");
    false
}

fn require_self(
    session_id: Uuid,
    role: &SessionRole,
    participant_id: Uuid,
    action: &str,
) -> bool {
    if *role == SessionRole::Participant(participant_id) {
        return true;
    }
    warn!(
        session = %session_id,
        action,
        participant = %participant_id,
        "ignoring action for an identity this session did not join as"
    );
    false
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::memory::MemoryStores,
        dto::ws::{PushQuestionRequest, ServerMessage},
        state::{
            AppState,
            stage::{Cohort, CohortTarget, Stage, StageTarget},
        },
    };
    use tokio::sync::mpsc::UnboundedReceiver;

    async fn harness() -> (crate::state::SharedState, Uuid, UnboundedReceiver<Message>) {
        let state = AppState::new(AppConfig::default());
        let stores = MemoryStores::new();
        state.install_stores(stores.stores()).await;

        let (tx, rx) = mpsc::unbounded_channel();
        let session_id = Uuid::new_v4();
        state.sessions().insert(SessionHandle {
            session_id,
            kind: SessionKind::Anonymous,
            tx,
        });
        (state, session_id, rx)
    }

    fn push_message() -> ClientMessage {
        ClientMessage::PushQuestion(PushQuestionRequest {
            question_id: None,
            text: "q".into(),
            options: vec!["a".into(), "b".into()],
            answer: "a".into(),
            time_limit_secs: None,
            image: None,
            target_cohort: CohortTarget::All,
            target_stage: StageTarget::All,
        })
    }

    #[tokio::test]
    async fn admin_actions_are_ignored_before_admin_join() {
        let (state, session_id, _rx) = harness().await;
        let mut role = SessionRole::Anonymous;

        dispatch(&state, session_id, &mut role, push_message()).await;

        assert!(state.live().read().await.is_none());
    }

    #[tokio::test]
    async fn admin_join_unlocks_admin_actions() {
        let (state, session_id, mut rx) = harness().await;
        let mut role = SessionRole::Anonymous;

        dispatch(&state, session_id, &mut role, ClientMessage::AdminJoin).await;
        assert_eq!(role, SessionRole::Admin);
        // The join snapshot arrives before any pushed content.
        let snapshot = rx.try_recv().unwrap();
        let Message::Text(text) = snapshot else {
            panic!("expected a text frame");
        };
        assert!(matches!(
            serde_json::from_str::<ServerMessage>(&text).unwrap(),
            ServerMessage::GameState { live: None }
        ));

        dispatch(&state, session_id, &mut role, push_message()).await;
        assert!(state.live().read().await.is_some());
    }

    #[tokio::test]
    async fn participant_actions_require_the_joined_identity() {
        let (state, session_id, _rx) = harness().await;
        let mut role = SessionRole::Participant(Uuid::new_v4());

        {
            let mut guard = state.live().write().await;
            *guard = Some(crate::state::LiveQuestion::open(
                None,
                "q".into(),
                vec!["a".into(), "b".into()],
                "a".into(),
                None,
                30,
                CohortTarget::All,
                StageTarget::All,
            ));
        }

        // Submitting on behalf of someone else is dropped.
        dispatch(
            &state,
            session_id,
            &mut role,
            ClientMessage::SubmitAnswer {
                participant_id: Uuid::new_v4(),
                answer: "a".into(),
            },
        )
        .await;

        let guard = state.live().read().await;
        assert_eq!(guard.as_ref().unwrap().answer_count(), 0);
    }

    #[tokio::test]
    async fn start_batch_requires_cohort_and_stage() {
        // Wire-level check: the batch trigger cannot name a wildcard audience.
        let parsed = ClientMessage::from_json_str(
            r#"{"type":"start_batch","target_cohort":"all","target_stage":"registered"}"#,
        );
        assert!(parsed.is_err());

        let parsed = ClientMessage::from_json_str(
            r#"{"type":"start_batch","target_cohort":1,"target_stage":"registered"}"#,
        );
        assert!(matches!(
            parsed,
            Ok(ClientMessage::StartBatch {
                target_cohort: Cohort(1),
                target_stage: Stage::Registered,
            })
        ));
    }
}
