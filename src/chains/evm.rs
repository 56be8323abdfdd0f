//! EVM-like strategy

use async_trait::async_trait;
use std::sync::Arc;

use super::{table, ChainStrategy};
use crate::adapter::{evm_signing_input, pre_sign};
use crate::engine::WireEncodingEngine;
use crate::error::BridgeResult;
use crate::finalizer::finalize_evm;
use crate::payload::build_evm_payload;
use crate::providers::{EvmRpc, SelectorLookup};
use crate::types::{
    ChainDescriptor, ChainFamily, FinalizedTransaction, PreSignArtifact, SignatureSet, SigningPayload,
    TransactionIntent, VaultIdentity,
};

pub struct EvmStrategy {
    descriptor: ChainDescriptor,
    chain_id: u64,
    gas_limit: u64,
    rpc: Arc<dyn EvmRpc>,
    selectors: Arc<dyn SelectorLookup>,
    engine: Arc<dyn WireEncodingEngine>,
}

impl EvmStrategy {
    pub fn new(
        descriptor: ChainDescriptor,
        chain_id: u64,
        gas_limit: u64,
        rpc: Arc<dyn EvmRpc>,
        selectors: Arc<dyn SelectorLookup>,
        engine: Arc<dyn WireEncodingEngine>,
    ) -> Self {
        Self {
            descriptor,
            chain_id,
            gas_limit,
            rpc,
            selectors,
            engine,
        }
    }

    /// Descriptor for an EVM chain missing from the static table
    pub fn fallback_descriptor(chain_id: u64) -> ChainDescriptor {
        ChainDescriptor {
            family: ChainFamily::Evm,
            chain: format!("{}{}", table::EVM_FALLBACK_PREFIX, chain_id),
            ticker: "ETH".to_string(),
            decimals: 18,
            is_native: true,
            contract_address: None,
        }
    }
}

#[async_trait]
impl ChainStrategy for EvmStrategy {
    fn descriptor(&self) -> &ChainDescriptor {
        &self.descriptor
    }

    fn evm_chain_id(&self) -> Option<u64> {
        Some(self.chain_id)
    }

    async fn build_payload(&self, intent: &TransactionIntent, vault: &VaultIdentity) -> BridgeResult<SigningPayload> {
        build_evm_payload(intent, vault, self.gas_limit, self.rpc.as_ref(), self.selectors.as_ref()).await
    }

    async fn build_pre_sign_artifact(&self, payload: &SigningPayload) -> BridgeResult<PreSignArtifact> {
        let input = evm_signing_input(payload, self.chain_id)?;
        pre_sign(self.engine.as_ref(), ChainFamily::Evm, &input)
    }

    fn finalize(
        &self,
        signatures: &SignatureSet,
        artifact: &PreSignArtifact,
        payload: &SigningPayload,
    ) -> BridgeResult<FinalizedTransaction> {
        finalize_evm(signatures, artifact, payload, self.chain_id)
    }
}
