//! EVM payload builder

use tracing::debug;

use super::{assemble, coin_for, memo, require_recipient, transient};
use crate::error::{BridgeError, BridgeResult};
use crate::providers::{EvmRpc, SelectorLookup};
use crate::types::{BlockchainSpecific, ChainFamily, EvmParams, SigningPayload, TransactionIntent, VaultIdentity};
use crate::utils::logging::redact_address;

/// Headroom applied to the reported gas price, as a numerator over 2
const MAX_FEE_MULTIPLIER_HALVES: u128 = 5;

/// Nonce and fee data come from `rpc`; the gas limit is the chain constant.
pub async fn build_evm_payload(
    intent: &TransactionIntent,
    vault: &VaultIdentity,
    gas_limit: u64,
    rpc: &dyn EvmRpc,
    selectors: &dyn SelectorLookup,
) -> BridgeResult<SigningPayload> {
    let coin = coin_for(intent, vault, ChainFamily::Evm)?;
    let to_address = require_recipient(intent)?;
    if !coin.is_native && coin.contract_address.is_none() {
        return Err(BridgeError::malformed_intent("Token transfer without a contract address")
            .with_details(format!("ticker: {}", coin.ticker)));
    }

    let (nonce, fees) = tokio::try_join!(rpc.transaction_count(&intent.from), rpc.fee_data()).map_err(transient)?;

    let params = EvmParams {
        nonce,
        gas_limit,
        max_fee_per_gas_wei: max_fee_per_gas(fees.gas_price),
        priority_fee_wei: fees.priority_fee.unwrap_or(fees.gas_price),
    };

    let memo = match intent.data.as_deref().filter(|d| !d.is_empty()) {
        Some(data) => Some(memo::classify(data, selectors).await),
        None => None,
    };

    debug!(
        chain = %coin.chain,
        from = %redact_address(&coin.address),
        nonce = params.nonce,
        max_fee = params.max_fee_per_gas_wei,
        "EVM payload built"
    );

    assemble(
        coin,
        to_address,
        intent.amount.unwrap_or(0),
        memo,
        BlockchainSpecific::Evm(params),
        vault,
    )
}

/// 2.5x the reported gas price
pub fn max_fee_per_gas(gas_price: u128) -> u128 {
    gas_price.saturating_mul(MAX_FEE_MULTIPLIER_HALVES) / 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::payload::fixtures::{intent, vault};
    use crate::providers::selector::StaticSelectorLookup;
    use crate::providers::FeeData;
    use crate::types::Memo;
    use async_trait::async_trait;

    const GWEI: u128 = 1_000_000_000;

    struct FakeRpc {
        nonce: u64,
        fees: FeeData,
        fail: bool,
    }

    #[async_trait]
    impl EvmRpc for FakeRpc {
        async fn transaction_count(&self, _address: &str) -> BridgeResult<u64> {
            if self.fail {
                return Err(BridgeError::internal("connection reset"));
            }
            Ok(self.nonce)
        }

        async fn fee_data(&self) -> BridgeResult<FeeData> {
            Ok(self.fees)
        }
    }

    fn rpc(priority_fee: Option<u128>) -> FakeRpc {
        FakeRpc {
            nonce: 5,
            fees: FeeData {
                gas_price: 20 * GWEI,
                priority_fee,
            },
            fail: false,
        }
    }

    #[tokio::test]
    async fn test_native_transfer_params() {
        let intent = intent(
            "Ethereum",
            Some("0x000000000000000000000000000000000000dEaD"),
            Some(1_000_000_000_000_000_000),
            None,
        );
        let payload = build_evm_payload(&intent, &vault(), 600_000, &rpc(Some(GWEI)), &StaticSelectorLookup)
            .await
            .unwrap();

        assert_eq!(
            payload.blockchain_specific,
            BlockchainSpecific::Evm(EvmParams {
                nonce: 5,
                gas_limit: 600_000,
                max_fee_per_gas_wei: 50 * GWEI,
                priority_fee_wei: GWEI,
            })
        );
        assert_eq!(payload.to_amount, 1_000_000_000_000_000_000);
        assert!(payload.memo.is_none());
    }

    #[tokio::test]
    async fn test_priority_fee_defaults_to_gas_price() {
        let intent = intent("Ethereum", Some("0x000000000000000000000000000000000000dEaD"), Some(1), None);
        let payload = build_evm_payload(&intent, &vault(), 600_000, &rpc(None), &StaticSelectorLookup)
            .await
            .unwrap();
        match payload.blockchain_specific {
            BlockchainSpecific::Evm(params) => assert_eq!(params.priority_fee_wei, 20 * GWEI),
            other => panic!("unexpected variant {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_calldata_with_known_selector_is_raw() {
        let data = hex::decode("095ea7b3000000000000000000000000").unwrap();
        let intent = intent(
            "Ethereum",
            Some("0x000000000000000000000000000000000000dEaD"),
            None,
            Some(&data),
        );
        let payload = build_evm_payload(&intent, &vault(), 600_000, &rpc(None), &StaticSelectorLookup)
            .await
            .unwrap();
        assert_eq!(payload.memo, Some(Memo::Raw(data)));
        assert_eq!(payload.to_amount, 0);
    }

    #[tokio::test]
    async fn test_rpc_failure_is_transient() {
        let mut failing = rpc(None);
        failing.fail = true;
        let intent = intent("Ethereum", Some("0x000000000000000000000000000000000000dEaD"), Some(1), None);
        let err = build_evm_payload(&intent, &vault(), 600_000, &failing, &StaticSelectorLookup)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::TransientNetwork);
    }

    #[tokio::test]
    async fn test_deterministic_for_same_state() {
        let intent = intent(
            "Base",
            Some("0x000000000000000000000000000000000000dEaD"),
            Some(7),
            Some(b"gm"),
        );
        let a = build_evm_payload(&intent, &vault(), 600_000, &rpc(Some(GWEI)), &StaticSelectorLookup)
            .await
            .unwrap();
        let b = build_evm_payload(&intent, &vault(), 600_000, &rpc(Some(GWEI)), &StaticSelectorLookup)
            .await
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.blockchain_specific.family(), ChainFamily::Evm);
    }

    #[tokio::test]
    async fn test_token_requires_contract() {
        let mut intent = intent("Ethereum", Some("0x000000000000000000000000000000000000dEaD"), Some(1), None);
        intent.chain.is_native = false;
        let err = build_evm_payload(&intent, &vault(), 600_000, &rpc(None), &StaticSelectorLookup)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MalformedIntent);
    }

    #[test]
    fn test_max_fee_headroom() {
        assert_eq!(max_fee_per_gas(20 * GWEI), 50 * GWEI);
        assert_eq!(max_fee_per_gas(3), 7);
        assert_eq!(max_fee_per_gas(u128::MAX), u128::MAX / 2);
    }
}
