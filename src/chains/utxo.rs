//! UTXO-like strategy

use async_trait::async_trait;
use std::sync::Arc;

use super::table::UtxoProfile;
use super::ChainStrategy;
use crate::adapter::{pre_sign, utxo_signing_input};
use crate::engine::WireEncodingEngine;
use crate::error::BridgeResult;
use crate::finalizer::finalize_compiled;
use crate::payload::build_utxo_payload;
use crate::providers::UtxoIndexer;
use crate::types::{
    ChainDescriptor, ChainFamily, FinalizedTransaction, PreSignArtifact, SignatureSet, SigningPayload,
    TransactionIntent, VaultIdentity,
};

pub struct UtxoStrategy {
    descriptor: ChainDescriptor,
    profile: UtxoProfile,
    indexer: Arc<dyn UtxoIndexer>,
    engine: Arc<dyn WireEncodingEngine>,
}

impl UtxoStrategy {
    pub fn new(
        descriptor: ChainDescriptor,
        profile: UtxoProfile,
        indexer: Arc<dyn UtxoIndexer>,
        engine: Arc<dyn WireEncodingEngine>,
    ) -> Self {
        Self {
            descriptor,
            profile,
            indexer,
            engine,
        }
    }
}

#[async_trait]
impl ChainStrategy for UtxoStrategy {
    fn descriptor(&self) -> &ChainDescriptor {
        &self.descriptor
    }

    async fn build_payload(&self, intent: &TransactionIntent, vault: &VaultIdentity) -> BridgeResult<SigningPayload> {
        build_utxo_payload(intent, vault, self.indexer.as_ref()).await
    }

    async fn build_pre_sign_artifact(&self, payload: &SigningPayload) -> BridgeResult<PreSignArtifact> {
        let input = utxo_signing_input(payload, &self.profile)?;
        pre_sign(self.engine.as_ref(), ChainFamily::Utxo, &input)
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
