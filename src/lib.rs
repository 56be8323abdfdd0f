//! Vault Bridge Core Library
//!
//! Cross-chain signing pipeline for a threshold-signature vault whose key
//! shares live on remote co-signing devices.
//!
//! # Architecture
//!
//! - **chains**: chain table, family strategies and the registry
//! - **payload**: intent to canonical signing payload
//! - **adapter**: payload to engine input, pre-sign artifact
//! - **engine** / **signing**: wire encoding engine seam and the in-process engine
//! - **relay**: session URI, encryption and relay polling
//! - **finalizer**: signatures to transaction hash and raw bytes
//! - **pipeline**: the dispatcher-facing surface
//!
//! The pipeline never holds private key material and never signs.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vault_bridge::{BridgeConfig, NativeEngine, SigningPipeline};
//!
//! let config = BridgeConfig::load(None)?;
//! let pipeline = SigningPipeline::from_config(&config, Arc::new(NativeEngine::new()))?;
//! let finalized = pipeline.run(&intent, &vault, &consent_ui).await?;
//! println!("{}", finalized.tx_hash);
//! ```

pub mod adapter;
pub mod chains;
pub mod config;
pub mod engine;
pub mod error;
pub mod finalizer;
pub mod payload;
pub mod pipeline;
pub mod providers;
pub mod relay;
pub mod signing;
pub mod store;
pub mod types;
pub mod utils;

pub use chains::{ChainRegistry, ChainStrategy};
pub use config::BridgeConfig;
pub use engine::{NativeEngine, WireEncodingEngine};
pub use error::{BridgeError, BridgeResult, ErrorCode};
pub use pipeline::{ConsentUi, SigningPipeline, UriSettings};
pub use relay::{SessionControl, SessionStatus, SigningSession};
pub use store::{MemoryStore, RecordStatus, Store, TransactionRecord};
pub use types::*;
