//! Pre-Image Hash Generation
//!
//! Generates the hash(es) that need to be signed for each chain family.

pub mod bitcoin;
pub mod cosmos;
pub mod ethereum;

// Re-export chain-specific entry points
pub use bitcoin::{get_bitcoin_sighashes, BitcoinSigHashType};
pub use cosmos::get_cosmos_sign_doc_hash;
pub use ethereum::get_ethereum_signing_hash;
