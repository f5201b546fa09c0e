//! Connected-session registry and broadcast fan-out.
//!
//! Rooms are not tracked server-side as explicit membership lists: each
//! connected session carries the identity it presented on join, and every
//! broadcast filters the registry against an [`Audience`]. A participant whose
//! stage changes keeps its old audience until it re-announces itself, which is
//! exactly the contract clients are told to honour via the stage-refresh
//! signal.

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::ws::ServerMessage,
    state::stage::{Cohort, CohortTarget, Stage, StageTarget},
};

/// Identity captured from the directory when a participant session joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionIdentity {
    /// Directory id of the participant behind the session.
    pub participant_id: Uuid,
    /// Cohort at join time.
    pub cohort: Cohort,
    /// Stage at join time.
    pub stage: Stage,
}

/// What a connected session has announced itself as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    /// Connected but not yet joined; only receives unfiltered broadcasts.
    Anonymous,
    /// Participant session with the identity presented on join.
    Participant(SessionIdentity),
    /// Game Master session.
    Admin,
}

/// Handle used to push messages to a connected WebSocket session.
#[derive(Clone)]
pub struct SessionHandle {
    /// Registry key for this connection.
    pub session_id: Uuid,
    /// Announced identity, updated on every (re)join.
    pub kind: SessionKind,
    /// Writer-task channel for outbound frames.
    pub tx: mpsc::UnboundedSender<Message>,
}

/// Logical broadcast audience resolved against session identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Every connected session, identified or not.
    Everyone,
    /// Participant sessions in one cohort.
    Cohort(Cohort),
    /// Participant sessions at one stage.
    Stage(Stage),
    /// Game Master sessions.
    Admins,
    /// The private channel of a single participant.
    Participant(Uuid),
    /// Participant sessions matched by a push's cohort/stage targets.
    Targets(CohortTarget, StageTarget),
}

impl Audience {
    fn includes(&self, kind: &SessionKind) -> bool {
        match (self, kind) {
            (Audience::Everyone, _) => true,
            (Audience::Admins, SessionKind::Admin) => true,
            (Audience::Cohort(cohort), SessionKind::Participant(identity)) => {
                identity.cohort == *cohort
            }
            (Audience::Stage(stage), SessionKind::Participant(identity)) => {
                identity.stage == *stage
            }
            (Audience::Participant(id), SessionKind::Participant(identity)) => {
                identity.participant_id == *id
            }
            (Audience::Targets(cohort, stage), SessionKind::Participant(identity)) => {
                cohort.matches(identity.cohort) && stage.matches(identity.stage)
            }
            _ => false,
        }
    }
}

/// Registry of currently connected WebSocket sessions keyed by connection id.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<Uuid, SessionHandle>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly connected session.
    pub fn insert(&self, handle: SessionHandle) {
        self.sessions.insert(handle.session_id, handle);
    }

    /// Replace the announced identity of a connected session.
    ///
    /// Called on every join and admin-join, including re-joins after a
    /// stage-refresh signal, so audience membership always reflects the most
    /// recently presented identity.
    pub fn identify(&self, session_id: Uuid, kind: SessionKind) {
        if let Some(mut entry) = self.sessions.get_mut(&session_id) {
            entry.kind = kind;
        }
    }

    /// Drop a session on disconnect.
    pub fn remove(&self, session_id: Uuid) {
        self.sessions.remove(&session_id);
    }

    /// Number of currently connected sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session is connected.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Serialize `event` once and fan it out to every session in `audience`.
    ///
    /// Send failures mean the receiving connection is going away; its own
    /// handler removes it from the registry, so failures are ignored here.
    pub fn broadcast(&self, audience: Audience, event: &ServerMessage) {
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "failed to serialize broadcast event");
                return;
            }
        };

        for session in self.sessions.iter() {
            if audience.includes(&session.kind) {
                let _ = session.tx.send(Message::Text(payload.clone().into()));
            }
        }
    }

    /// Send `event` to a single connection, bypassing audience filtering.
    pub fn send_to_session(&self, session_id: Uuid, event: &ServerMessage) {
        let Some(session) = self.sessions.get(&session_id) else {
            return;
        };
        match serde_json::to_string(event) {
            Ok(payload) => {
                let _ = session.tx.send(Message::Text(payload.into()));
            }
            Err(err) => warn!(error = %err, "failed to serialize session event"),
        }
    }
}
