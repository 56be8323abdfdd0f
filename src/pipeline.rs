//! Signing pipeline
//!
//! intent → payload → pre-sign artifact → relay session → finalized
//! transaction. Each call resolves its strategy from the registry; nothing
//! is shared between invocations except the store.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::chains::{ChainRegistry, ChainStrategy};
use crate::config::BridgeConfig;
use crate::engine::WireEncodingEngine;
use crate::error::{BridgeError, BridgeResult};
use crate::finalizer::{custom_message_hash, signature_for, signature_hex};
use crate::relay::{
    build_keysign_uri, new_session_id, seal, CustomMessagePayload, HttpRelayClient, PollerSettings, RelayClient,
    Scheduler, SessionKey, SessionPayload, SessionPoller, SessionStatus, SigningSession, TokioScheduler,
};
use crate::store::{ActiveRequest, MemoryStore, RecordStatus, Store, TransactionRecord};
use crate::types::{
    FinalizedTransaction, PreSignArtifact, SignatureSet, SigningPayload, TransactionIntent, VaultIdentity,
};
use crate::utils::logging::{redact_address, redact_hash};
use crate::utils::HttpClient;

/// Out-of-band display of the keysign URI.
///
/// `present` returns once the URI is shown; the UI keeps `control` and calls
/// `abandon()` on it if the operator closes the window.
#[async_trait]
pub trait ConsentUi: Send + Sync {
    async fn present(&self, uri: &str, control: crate::relay::SessionControl) -> BridgeResult<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriSettings {
    pub scheme: String,
    pub host: String,
    pub service_name: String,
}

impl UriSettings {
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self {
            scheme: config.uri_scheme.clone(),
            host: config.uri_host.clone(),
            service_name: config.service_name.clone(),
        }
    }
}

pub struct SigningPipeline {
    registry: Arc<ChainRegistry>,
    relay: Arc<dyn RelayClient>,
    scheduler: Arc<dyn Scheduler>,
    store: Arc<dyn Store>,
    poller: PollerSettings,
    uri: UriSettings,
}

impl SigningPipeline {
    pub fn new(
        registry: Arc<ChainRegistry>,
        relay: Arc<dyn RelayClient>,
        scheduler: Arc<dyn Scheduler>,
        store: Arc<dyn Store>,
        poller: PollerSettings,
        uri: UriSettings,
    ) -> Self {
        Self {
            registry,
            relay,
            scheduler,
            store,
            poller,
            uri,
        }
    }

    /// Production wiring: HTTP collaborators, wall-clock polling, in-memory store
    pub fn from_config(config: &BridgeConfig, engine: Arc<dyn WireEncodingEngine>) -> BridgeResult<Self> {
        config.validate()?;
        let http = HttpClient::new(config.http_timeout(), &config.user_agent)?;
        Ok(Self::new(
            Arc::new(ChainRegistry::from_config(config, engine)?),
            Arc::new(HttpRelayClient::new(http, config.relay_url.clone())),
            Arc::new(TokioScheduler),
            Arc::new(MemoryStore::new()),
            PollerSettings {
                interval: config.poll_interval(),
                min_participants: config.min_participants,
            },
            UriSettings::from_config(config),
        ))
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    fn strategy(&self, chain: &str) -> BridgeResult<Arc<dyn ChainStrategy>> {
        self.registry.resolve(chain)
    }

    pub async fn build_payload(&self, intent: &TransactionIntent, vault: &VaultIdentity) -> BridgeResult<SigningPayload> {
        let strategy = self.strategy(&intent.chain.chain)?;
        let payload = strategy.build_payload(intent, vault).await?;
        info!(
            chain = %payload.coin.chain,
            family = %payload.coin.family,
            from = %redact_address(&payload.coin.address),
            "signing payload built"
        );
        Ok(payload)
    }

    pub async fn build_pre_sign_artifact(&self, payload: &SigningPayload) -> BridgeResult<PreSignArtifact> {
        self.strategy(&payload.coin.chain)?.build_pre_sign_artifact(payload).await
    }

    /// Fresh id and key, payload sealed into a keysign URI
    pub fn create_session(&self, payload: &SessionPayload, vault: &VaultIdentity) -> BridgeResult<SigningSession> {
        let id = new_session_id();
        let key = SessionKey::generate();
        let message = seal(payload, &id, &key, &self.uri.service_name)?;
        let uri = build_keysign_uri(
            &self.uri.scheme,
            &self.uri.host,
            payload.uri_kind(),
            &vault.public_key_ecdsa,
            &message,
        )?;
        info!(session = %redact_hash(&id), kind = payload.uri_kind(), "signing session created");
        Ok(SigningSession::new(key, uri, id))
    }

    /// Register with the relay and hand the URI to the consent UI
    pub async fn publish(&self, session: &SigningSession, vault: &VaultIdentity, ui: &dyn ConsentUi) -> BridgeResult<()> {
        let control = session.control();
        if let Err(err) = self.relay.register_session(&session.id, &vault.local_party_id).await {
            control.transition(SessionStatus::Failed);
            return Err(err);
        }
        if !control.transition(SessionStatus::Published) {
            return Err(BridgeError::internal(format!("Session cannot be published from {}", control.status())));
        }
        ui.present(&session.uri, control).await?;
        info!(session = %redact_hash(&session.id), "session published");
        Ok(())
    }

    /// Poll until the signatures for `message_hash` arrive
    pub async fn await_signatures(&self, session: &SigningSession, message_hash: &str) -> BridgeResult<SignatureSet> {
        SessionPoller::new(self.relay.as_ref(), self.scheduler.as_ref(), self.poller)
            .await_signatures(&session.control(), message_hash)
            .await
    }

    pub fn finalize(
        &self,
        signatures: &SignatureSet,
        artifact: &PreSignArtifact,
        payload: &SigningPayload,
    ) -> BridgeResult<FinalizedTransaction> {
        self.strategy(&payload.coin.chain)?.finalize(signatures, artifact, payload)
    }

    /// Operator closed the consent UI
    pub fn abandon(&self, session: &SigningSession) -> bool {
        session.control().abandon()
    }

    /// The whole pipeline with transaction-record bookkeeping
    pub async fn run(
        &self,
        intent: &TransactionIntent,
        vault: &VaultIdentity,
        ui: &dyn ConsentUi,
    ) -> BridgeResult<FinalizedTransaction> {
        let mut record = TransactionRecord::new(Uuid::new_v4().to_string(), &intent.chain.chain, &intent.from);
        record.to = intent.to.clone();
        record.amount = intent.amount;
        self.store.put_transaction(record.clone()).await?;
        self.store
            .put_active_request(Some(ActiveRequest {
                transaction_id: record.id.clone(),
                chain: record.chain.clone(),
                session_id: None,
                created_at: Utc::now().timestamp(),
            }))
            .await?;

        let outcome = self.drive(intent, vault, ui, &mut record).await;
        match &outcome {
            Ok(finalized) => {
                record.tx_hash = Some(finalized.tx_hash.clone());
                record.set_status(RecordStatus::Success);
            }
            Err(err) => {
                if err.is_abandoned() {
                    info!(record = %record.id, "signing abandoned by operator");
                } else {
                    warn!(record = %record.id, error = %err, "signing failed");
                }
                record.error = Some(err.message.clone());
                record.set_status(RecordStatus::Error);
            }
        }
        self.store.put_transaction(record).await?;
        self.store.put_active_request(None).await?;
        outcome
    }

    async fn drive(
        &self,
        intent: &TransactionIntent,
        vault: &VaultIdentity,
        ui: &dyn ConsentUi,
        record: &mut TransactionRecord,
    ) -> BridgeResult<FinalizedTransaction> {
        let payload = self.build_payload(intent, vault).await?;
        let artifact = self.build_pre_sign_artifact(&payload).await?;
        let message_hash = artifact
            .primary_hash_hex()
            .ok_or_else(|| BridgeError::encoding("Artifact carries no signing hash"))?;

        let session = self.create_session(&SessionPayload::Keysign(payload.clone()), vault)?;
        record.session_id = Some(session.id.clone());
        self.store
            .put_active_request(Some(ActiveRequest {
                transaction_id: record.id.clone(),
                chain: record.chain.clone(),
                session_id: Some(session.id.clone()),
                created_at: Utc::now().timestamp(),
            }))
            .await?;

        self.publish(&session, vault, ui).await?;
        record.set_status(RecordStatus::Pending);
        self.store.put_transaction(record.clone()).await?;

        let signatures = self.await_signatures(&session, &message_hash).await?;
        self.finalize(&signatures, &artifact, &payload)
    }

    /// Sign a personal message; returns the signature as 0x-hex.
    ///
    /// The message is published as given; both sides sign `custom_message_hash`.
    pub async fn sign_custom_message(
        &self,
        vault: &VaultIdentity,
        chain: &str,
        message: &str,
        ui: &dyn ConsentUi,
    ) -> BridgeResult<String> {
        let payload = SessionPayload::CustomMessage(CustomMessagePayload {
            method: "personal_sign".to_string(),
            message: message.to_string(),
            chain: chain.to_string(),
        });
        let hash = custom_message_hash(message);

        let session = self.create_session(&payload, vault)?;
        self.publish(&session, vault, ui).await?;
        let signatures = self.await_signatures(&session, &hex::encode(hash)).await?;
        Ok(signature_hex(signature_for(&signatures, &hash)?))
    }
}
