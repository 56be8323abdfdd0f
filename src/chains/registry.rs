//! Chain identifier to strategy lookup

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::table::{self, ProfileParams, CHAINS};
use super::{ChainStrategy, CosmosStrategy, EvmStrategy, ThorchainStrategy, UtxoStrategy};
use crate::config::BridgeConfig;
use crate::engine::WireEncodingEngine;
use crate::error::{BridgeError, BridgeResult};
use crate::providers::{
    BlockchairIndexer, CosmosRestClient, EvmJsonRpc, EvmRpc, FourByteSelectorLookup, SelectorLookup,
    TendermintStatusClient, ThornodeFeeRate, UnconfiguredEvmRpc,
};
use crate::utils::HttpClient;

/// Builds an EVM strategy for a chain id missing from the registry
pub type EvmFallbackFactory = Box<dyn Fn(u64) -> Arc<dyn ChainStrategy> + Send + Sync>;

#[derive(Default)]
pub struct ChainRegistry {
    strategies: HashMap<String, Arc<dyn ChainStrategy>>,
    evm_fallback: Option<EvmFallbackFactory>,
}

impl ChainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names are matched case-insensitively; re-registering replaces
    pub fn register(&mut self, name: &str, strategy: Arc<dyn ChainStrategy>) {
        debug!(chain = name, family = %strategy.family(), "registered chain strategy");
        self.strategies.insert(name.to_lowercase(), strategy);
    }

    pub fn set_evm_fallback(&mut self, factory: EvmFallbackFactory) {
        self.evm_fallback = Some(factory);
    }

    /// Exact name, then EVM chain id (registered first, factory second)
    pub fn resolve(&self, identifier: &str) -> BridgeResult<Arc<dyn ChainStrategy>> {
        if let Some(strategy) = self.strategies.get(&identifier.trim().to_lowercase()) {
            return Ok(strategy.clone());
        }

        if let Some(chain_id) = table::parse_evm_chain_id(identifier) {
            if let Some(strategy) = self.strategies.values().find(|s| s.evm_chain_id() == Some(chain_id)) {
                return Ok(strategy.clone());
            }
            if let Some(factory) = &self.evm_fallback {
                info!(chain_id, "using EVM fallback strategy");
                return Ok(factory(chain_id));
            }
        }

        Err(BridgeError::unsupported_chain(identifier))
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Every table chain wired to HTTP collaborators from `config`
    pub fn from_config(config: &BridgeConfig, engine: Arc<dyn WireEncodingEngine>) -> BridgeResult<Self> {
        let http = HttpClient::new(config.http_timeout(), &config.user_agent)?;
        let selectors: Arc<dyn SelectorLookup> =
            Arc::new(FourByteSelectorLookup::new(http.clone(), config.selector_directory_url.clone()));

        let mut registry = Self::new();
        for profile in CHAINS {
            let descriptor = profile.descriptor();
            let endpoints = config.endpoints(profile.name).cloned().unwrap_or_default();
            let missing = |kind: &str| BridgeError::config(format!("No {} endpoint configured for {}", kind, profile.name));

            let strategy: Arc<dyn ChainStrategy> = match profile.params {
                ProfileParams::Evm { chain_id, gas_limit } => {
                    let rpc = endpoints.rpc.ok_or_else(|| missing("rpc"))?;
                    Arc::new(EvmStrategy::new(
                        descriptor,
                        chain_id,
                        gas_limit,
                        Arc::new(EvmJsonRpc::new(http.clone(), rpc)),
                        selectors.clone(),
                        engine.clone(),
                    ))
                }
                ProfileParams::Utxo(utxo) => Arc::new(UtxoStrategy::new(
                    descriptor,
                    utxo,
                    Arc::new(BlockchairIndexer::new(
                        http.clone(),
                        config.blockchair_url.clone(),
                        utxo.blockchair_slug,
                    )),
                    engine.clone(),
                )),
                ProfileParams::Cosmos(cosmos) => {
                    let rest = endpoints.rest.ok_or_else(|| missing("rest"))?;
                    Arc::new(CosmosStrategy::new(
                        descriptor,
                        cosmos,
                        Arc::new(CosmosRestClient::new(http.clone(), rest)),
                        engine.clone(),
                    ))
                }
                ProfileParams::Thorchain(thor) => {
                    let rest = endpoints.rest.ok_or_else(|| missing("rest"))?;
                    let mut strategy = ThorchainStrategy::new(
                        descriptor,
                        thor,
                        Arc::new(CosmosRestClient::new(http.clone(), rest.clone())),
                        Arc::new(ThornodeFeeRate::new(http.clone(), rest, thor)),
                        engine.clone(),
                    );
                    if let Some(rpc) = endpoints.rpc {
                        strategy = strategy.with_chain_id_lookup(Arc::new(TendermintStatusClient::new(http.clone(), rpc)));
                    }
                    Arc::new(strategy)
                }
            };
            registry.register(profile.name, strategy);
        }

        // Without an endpoint the strategy still resolves; payload building reports the gap
        let fallback_config = config.clone();
        registry.set_evm_fallback(Box::new(move |chain_id| {
            let rpc: Arc<dyn EvmRpc> = match fallback_config.evm_fallback_rpc(chain_id) {
                Some(url) => Arc::new(EvmJsonRpc::new(http.clone(), url)),
                None => Arc::new(UnconfiguredEvmRpc::new(chain_id)),
            };
            Arc::new(EvmStrategy::new(
                EvmStrategy::fallback_descriptor(chain_id),
                chain_id,
                table::DEFAULT_EVM_GAS_LIMIT,
                rpc,
                selectors.clone(),
                engine.clone(),
            ))
        }));

        info!(chains = registry.len(), "chain registry ready");
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::NativeEngine;
    use crate::error::ErrorCode;
    use crate::types::ChainFamily;

    fn registry() -> ChainRegistry {
        ChainRegistry::from_config(&BridgeConfig::default(), Arc::new(NativeEngine::new())).unwrap()
    }

    #[test]
    fn test_every_table_chain_registered() {
        let registry = registry();
        assert_eq!(registry.len(), CHAINS.len());
        for profile in CHAINS {
            let strategy = registry.resolve(profile.name).unwrap();
            assert_eq!(strategy.family(), profile.family());
            assert_eq!(strategy.descriptor().chain, profile.name);
        }
    }

    #[test]
    fn test_resolve_by_name_and_chain_id() {
        let registry = registry();
        assert_eq!(registry.resolve("thorchain").unwrap().family(), ChainFamily::ThorchainLike);
        assert_eq!(registry.resolve("0x2105").unwrap().descriptor().chain, "Base");
        assert_eq!(registry.resolve("42161").unwrap().descriptor().chain, "Arbitrum");
    }

    #[test]
    fn test_unknown_evm_chain_falls_back() {
        let registry = registry();
        for (identifier, chain_id) in [("0x99999", 0x99999), ("59144", 59144), ("0xe708", 59144)] {
            let strategy = registry.resolve(identifier).unwrap();
            assert_eq!(strategy.family(), ChainFamily::Evm);
            assert_eq!(strategy.evm_chain_id(), Some(chain_id));
            assert_eq!(strategy.descriptor().chain, format!("evm-{}", chain_id));
        }

        // payloads carry the fallback name; it resolves back to the same chain
        assert_eq!(registry.resolve("evm-59144").unwrap().evm_chain_id(), Some(59144));
    }

    #[tokio::test]
    async fn test_fallback_without_endpoint_fails_at_payload() {
        let strategy = registry().resolve("59144").unwrap();
        let intent = crate::types::TransactionIntent {
            from: "0x0000000000000000000000000000000000000001".to_string(),
            to: Some("0x000000000000000000000000000000000000dEaD".to_string()),
            amount: Some(1),
            data: None,
            is_deposit: false,
            chain: strategy.descriptor().clone(),
        };
        let err = strategy
            .build_payload(&intent, &crate::payload::fixtures::vault())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Config);
    }

    #[test]
    fn test_non_evm_unknown_rejected() {
        let err = registry().resolve("Solana").err().unwrap();
        assert_eq!(err.code, ErrorCode::UnsupportedChain);
    }

    #[test]
    fn test_registration_extends_without_dispatch_changes() {
        let mut registry = ChainRegistry::new();
        assert!(registry.is_empty());
        let base = registry_strategy("Base");
        registry.register("MyRollup", base);
        assert_eq!(registry.resolve("myrollup").unwrap().descriptor().chain, "Base");
    }

    fn registry_strategy(name: &str) -> Arc<dyn ChainStrategy> {
        registry().resolve(name).unwrap()
    }
}
