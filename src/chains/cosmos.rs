//! Generic Cosmos-SDK strategy

use async_trait::async_trait;
use std::sync::Arc;

use super::table::CosmosProfile;
use super::ChainStrategy;
use crate::adapter::{cosmos_signing_input, pre_sign};
use crate::engine::WireEncodingEngine;
use crate::error::BridgeResult;
use crate::finalizer::finalize_compiled;
use crate::payload::build_cosmos_payload;
use crate::providers::CosmosAccounts;
use crate::types::{
    ChainDescriptor, ChainFamily, FinalizedTransaction, PreSignArtifact, SignatureSet, SigningPayload,
    TransactionIntent, VaultIdentity,
};

pub struct CosmosStrategy {
    descriptor: ChainDescriptor,
    profile: CosmosProfile,
    accounts: Arc<dyn CosmosAccounts>,
    engine: Arc<dyn WireEncodingEngine>,
}

impl CosmosStrategy {
    pub fn new(
        descriptor: ChainDescriptor,
        profile: CosmosProfile,
        accounts: Arc<dyn CosmosAccounts>,
        engine: Arc<dyn WireEncodingEngine>,
    ) -> Self {
        Self {
            descriptor,
            profile,
            accounts,
            engine,
        }
    }
}

#[async_trait]
impl ChainStrategy for CosmosStrategy {
    fn descriptor(&self) -> &ChainDescriptor {
        &self.descriptor
    }

    async fn build_payload(&self, intent: &TransactionIntent, vault: &VaultIdentity) -> BridgeResult<SigningPayload> {
        build_cosmos_payload(intent, vault, &self.profile, self.accounts.as_ref()).await
    }

    async fn build_pre_sign_artifact(&self, payload: &SigningPayload) -> BridgeResult<PreSignArtifact> {
        let input = cosmos_signing_input(payload, &self.profile)?;
        pre_sign(self.engine.as_ref(), ChainFamily::CosmosSdk, &input)
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
