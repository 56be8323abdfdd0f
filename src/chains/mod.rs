//! Chain family registry
//!
//! Each family implements [`ChainStrategy`]; the [`ChainRegistry`] maps a
//! chain identifier to its strategy. Adding a chain is a `register` call.

pub mod cosmos;
pub mod evm;
pub mod registry;
pub mod table;
pub mod thorchain;
pub mod utxo;

use async_trait::async_trait;

use crate::error::BridgeResult;
use crate::types::{
    ChainDescriptor, ChainFamily, FinalizedTransaction, PreSignArtifact, SignatureSet, SigningPayload,
    TransactionIntent, VaultIdentity,
};

pub use cosmos::CosmosStrategy;
pub use evm::EvmStrategy;
pub use registry::{ChainRegistry, EvmFallbackFactory};
pub use thorchain::ThorchainStrategy;
pub use utxo::UtxoStrategy;

/// The three-step contract every chain family fulfils
#[async_trait]
pub trait ChainStrategy: Send + Sync {
    /// Native asset of the chain this strategy serves
    fn descriptor(&self) -> &ChainDescriptor;

    fn family(&self) -> ChainFamily {
        self.descriptor().family
    }

    fn evm_chain_id(&self) -> Option<u64> {
        None
    }

    async fn build_payload(&self, intent: &TransactionIntent, vault: &VaultIdentity) -> BridgeResult<SigningPayload>;

    async fn build_pre_sign_artifact(&self, payload: &SigningPayload) -> BridgeResult<PreSignArtifact>;

    fn finalize(
        &self,
        signatures: &SignatureSet,
        artifact: &PreSignArtifact,
        payload: &SigningPayload,
    ) -> BridgeResult<FinalizedTransaction>;
}
