//! Signing session relay
//!
//! A session is created with a fresh id and key, published as a keysign URI,
//! and polled on the remote relay until the co-signers return a signature or
//! the operator abandons it.

pub mod client;
pub mod clock;
pub mod crypto;
pub mod poller;
pub mod session;
pub mod uri;

pub use client::{Completion, HttpRelayClient, RelayClient};
pub use clock::{Scheduler, TokioScheduler, VirtualScheduler};
pub use crypto::SessionKey;
pub use poller::{PollerSettings, SessionPoller};
pub use session::{new_session_id, SessionControl, SessionStatus, SigningSession};
pub use uri::{
    build_keysign_uri, open_keysign_uri, parse_keysign_uri, seal, CustomMessagePayload, KeysignMessage,
    ParsedKeysignUri, SessionPayload, SIGN_MESSAGE, SIGN_TRANSACTION,
};
