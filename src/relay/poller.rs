//! Relay polling state machine
//!
//! One network call per tick: wait for participants, lock the set, then poll
//! for the combined signature. Status is checked before every call and again
//! after it returns, so an abandoned session never consumes a late result.

use std::time::Duration;
use tracing::{debug, info, warn};

use super::client::{Completion, RelayClient};
use super::clock::Scheduler;
use super::session::{SessionControl, SessionStatus};
use crate::error::{BridgeError, BridgeResult, ErrorCode};
use crate::types::SignatureSet;
use crate::utils::logging::redact_hash;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerSettings {
    pub interval: Duration,
    pub min_participants: usize,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            min_participants: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    AwaitParticipants,
    Start(Vec<String>),
    AwaitCompletion,
}

enum Step {
    Next(Phase),
    Done(SignatureSet),
    Fail(BridgeError),
}

pub struct SessionPoller<'a> {
    relay: &'a dyn RelayClient,
    scheduler: &'a dyn Scheduler,
    settings: PollerSettings,
}

impl<'a> SessionPoller<'a> {
    pub fn new(relay: &'a dyn RelayClient, scheduler: &'a dyn Scheduler, settings: PollerSettings) -> Self {
        Self {
            relay,
            scheduler,
            settings,
        }
    }

    /// Drive a published session to a terminal state.
    ///
    /// Returns the signatures on `Completed`, `ErrorCode::Abandoned` if the
    /// operator closed the session, `ErrorCode::RelayTerminal` otherwise.
    pub async fn await_signatures(&self, control: &SessionControl, message_hash: &str) -> BridgeResult<SignatureSet> {
        let session_id = control.session_id().to_string();
        if !control.transition(SessionStatus::Polling) {
            return Err(self.not_polling(control));
        }

        let mut phase = Phase::AwaitParticipants;
        loop {
            if control.is_abandoned() {
                return Err(BridgeError::abandoned(&session_id));
            }

            let step = self.tick(&session_id, message_hash, phase).await;

            if control.is_abandoned() {
                debug!(session = %redact_hash(&session_id), "discarding relay result after abandon");
                return Err(BridgeError::abandoned(&session_id));
            }

            match step {
                Step::Done(signatures) => {
                    if !control.transition(SessionStatus::Completed) {
                        return Err(self.not_polling(control));
                    }
                    return Ok(signatures);
                }
                Step::Fail(err) => {
                    warn!(session = %redact_hash(&session_id), error = %err, "relay session failed");
                    control.transition(SessionStatus::Failed);
                    return Err(err);
                }
                Step::Next(next) => phase = next,
            }

            self.pause(control).await?;
        }
    }

    async fn tick(&self, session_id: &str, message_hash: &str, phase: Phase) -> Step {
        match phase {
            Phase::AwaitParticipants => match self.relay.list_participants(session_id).await {
                Ok(parties) if parties.len() >= self.settings.min_participants => {
                    info!(session = %redact_hash(session_id), count = parties.len(), "participants joined");
                    Step::Next(Phase::Start(parties))
                }
                Ok(parties) => {
                    debug!(count = parties.len(), "waiting for participants");
                    Step::Next(Phase::AwaitParticipants)
                }
                Err(err) => {
                    debug!(error = %err, "participant listing failed, retrying");
                    Step::Next(Phase::AwaitParticipants)
                }
            },
            Phase::Start(parties) => match self.relay.start_session(session_id, &parties).await {
                Ok(()) => Step::Next(Phase::AwaitCompletion),
                Err(err) => Step::Fail(terminal(err)),
            },
            Phase::AwaitCompletion => match self.relay.get_completion(session_id, message_hash).await {
                Ok(Completion::Ready(signatures)) => {
                    info!(session = %redact_hash(session_id), count = signatures.len(), "signatures received");
                    Step::Done(signatures)
                }
                Ok(Completion::NotFound) => Step::Next(Phase::AwaitCompletion),
                Err(err) => Step::Fail(terminal(err)),
            },
        }
    }

    /// Sleep one interval, waking early if the session is abandoned
    async fn pause(&self, control: &SessionControl) -> BridgeResult<()> {
        tokio::select! {
            _ = self.scheduler.sleep(self.settings.interval) => Ok(()),
            _ = control.abandoned() => Err(BridgeError::abandoned(control.session_id())),
        }
    }

    fn not_polling(&self, control: &SessionControl) -> BridgeError {
        match control.status() {
            SessionStatus::Abandoned => BridgeError::abandoned(control.session_id()),
            status => BridgeError::internal(format!("Session cannot be polled from {}", status)),
        }
    }
}

fn terminal(err: BridgeError) -> BridgeError {
    if err.code == ErrorCode::RelayTerminal {
        return err;
    }
    BridgeError::relay_terminal(err.message).with_details(err.details.unwrap_or_default())
}
