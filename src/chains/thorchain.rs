//! Thorchain-like strategy (THORChain, MayaChain)

use async_trait::async_trait;
use std::sync::Arc;

use super::table::ThorchainProfile;
use super::ChainStrategy;
use crate::adapter::{pre_sign, resolve_chain_id, thorchain_signing_input};
use crate::engine::WireEncodingEngine;
use crate::error::BridgeResult;
use crate::finalizer::finalize_compiled;
use crate::payload::build_thorchain_payload;
use crate::providers::{ChainIdLookup, CosmosAccounts, ThorchainFeeRate};
use crate::types::{
    ChainDescriptor, ChainFamily, FinalizedTransaction, PreSignArtifact, SignatureSet, SigningPayload,
    TransactionIntent, VaultIdentity,
};

pub struct ThorchainStrategy {
    descriptor: ChainDescriptor,
    profile: ThorchainProfile,
    accounts: Arc<dyn CosmosAccounts>,
    fee_rate: Arc<dyn ThorchainFeeRate>,
    chain_ids: Option<Arc<dyn ChainIdLookup>>,
    engine: Arc<dyn WireEncodingEngine>,
}

impl ThorchainStrategy {
    pub fn new(
        descriptor: ChainDescriptor,
        profile: ThorchainProfile,
        accounts: Arc<dyn CosmosAccounts>,
        fee_rate: Arc<dyn ThorchainFeeRate>,
        engine: Arc<dyn WireEncodingEngine>,
    ) -> Self {
        Self {
            descriptor,
            profile,
            accounts,
            fee_rate,
            chain_ids: None,
            engine,
        }
    }

    /// Re-sync the chain id against the network before each artifact
    pub fn with_chain_id_lookup(mut self, lookup: Arc<dyn ChainIdLookup>) -> Self {
        self.chain_ids = Some(lookup);
        self
    }
}

#[async_trait]
impl ChainStrategy for ThorchainStrategy {
    fn descriptor(&self) -> &ChainDescriptor {
        &self.descriptor
    }

    async fn build_payload(&self, intent: &TransactionIntent, vault: &VaultIdentity) -> BridgeResult<SigningPayload> {
        build_thorchain_payload(intent, vault, self.accounts.as_ref(), self.fee_rate.as_ref()).await
    }

    async fn build_pre_sign_artifact(&self, payload: &SigningPayload) -> BridgeResult<PreSignArtifact> {
        let chain_id = resolve_chain_id(self.profile.chain_id, self.chain_ids.as_deref()).await;
        let input = thorchain_signing_input(payload, &self.profile, &chain_id)?;
        pre_sign(self.engine.as_ref(), ChainFamily::ThorchainLike, &input)
    }

    fn finalize(
        &self,
        signatures: &SignatureSet,
        artifact: &PreSignArtifact,
        payload: &SigningPayload,
    ) -> BridgeResult<FinalizedTransaction> {
        finalize_compiled(self.engine.as_ref(), signatures, artifact, payload)
    }
}
