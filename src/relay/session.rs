//! Signing session state machine
//!
//! `Created → Published → Polling → {Completed | Failed | Abandoned}`.
//! Status lives in a watch channel so the consent UI can abandon a session
//! while the poller is suspended.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

use super::crypto::SessionKey;
use crate::utils::logging::redact_hash;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Created,
    Published,
    Polling,
    Completed,
    Failed,
    Abandoned,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Failed | SessionStatus::Abandoned)
    }

    /// Forward-only; terminal states are final
    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        use SessionStatus::*;
        match (self, next) {
            (Created, Published) => true,
            (Published, Polling) => true,
            (Polling, Completed) | (Polling, Failed) => true,
            (current, Abandoned) => !current.is_terminal(),
            (current, Failed) => !current.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Cloneable status handle shared with the consent UI
#[derive(Debug, Clone)]
pub struct SessionControl {
    session_id: String,
    tx: Arc<watch::Sender<SessionStatus>>,
}

impl SessionControl {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn status(&self) -> SessionStatus {
        *self.tx.borrow()
    }

    /// Apply `next` if the transition is valid; returns whether it applied
    pub fn transition(&self, next: SessionStatus) -> bool {
        let mut from = None;
        let applied = self.tx.send_if_modified(|current| {
            if current.can_transition_to(next) {
                from = Some(*current);
                *current = next;
                true
            } else {
                false
            }
        });
        if let Some(from) = from {
            info!(session = %redact_hash(&self.session_id), %from, to = %next, "session status changed");
        }
        applied
    }

    /// Operator closed the consent UI; no effect once terminal
    pub fn abandon(&self) -> bool {
        self.transition(SessionStatus::Abandoned)
    }

    pub fn is_abandoned(&self) -> bool {
        self.status() == SessionStatus::Abandoned
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.tx.subscribe()
    }

    /// Resolves once the session is abandoned; never resolves otherwise
    pub async fn abandoned(&self) {
        let mut rx = self.subscribe();
        if rx.wait_for(|s| *s == SessionStatus::Abandoned).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// A coordination record with the remote co-signing parties
#[derive(Debug)]
pub struct SigningSession {
    pub id: String,
    pub key: SessionKey,
    pub uri: String,
    control: SessionControl,
}

impl SigningSession {
    pub fn new(key: SessionKey, uri: String, id: String) -> Self {
        let (tx, _rx) = watch::channel(SessionStatus::Created);
        let control = SessionControl {
            session_id: id.clone(),
            tx: Arc::new(tx),
        };
        Self { id, key, uri, control }
    }

    pub fn control(&self) -> SessionControl {
        self.control.clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.control.status()
    }
}

/// Random UUID v4 session id
pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::Duration;

    fn session() -> SigningSession {
        SigningSession::new(SessionKey::generate(), "vultisig://test".to_string(), new_session_id())
    }

    #[test]
    fn test_happy_path_transitions() {
        let session = session();
        let control = session.control();
        assert_eq!(session.status(), SessionStatus::Created);
        assert!(control.transition(SessionStatus::Published));
        assert!(control.transition(SessionStatus::Polling));
        assert!(control.transition(SessionStatus::Completed));
        assert_eq!(session.status(), SessionStatus::Completed);
    }

    #[test]
    fn test_terminal_states_are_final() {
        let control = session().control();
        control.transition(SessionStatus::Published);
        assert!(control.abandon());
        assert!(!control.transition(SessionStatus::Polling));
        assert!(!control.transition(SessionStatus::Completed));
        assert!(!control.abandon());
        assert_eq!(control.status(), SessionStatus::Abandoned);
    }

    #[test]
    fn test_no_skipping_states() {
        let control = session().control();
        assert!(!control.transition(SessionStatus::Polling));
        assert!(!control.transition(SessionStatus::Completed));
    }

    #[tokio::test]
    async fn test_abandoned_future_resolves() {
        let session = session();
        let control = session.control();
        let waiter = tokio::spawn({
            let control = control.clone();
            async move { control.abandoned().await }
        });
        control.abandon();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("abandon observed")
            .unwrap();
    }

    #[test]
    fn test_session_ids_unique() {
        let ids: HashSet<String> = (0..10_000).map(|_| new_session_id()).collect();
        assert_eq!(ids.len(), 10_000);
    }
}
