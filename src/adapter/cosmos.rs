//! Cosmos and Thorchain payloads to protobuf signing input

use tracing::{debug, warn};

use super::address::bech32_account;
use crate::chains::table::{CosmosProfile, ThorchainProfile};
use crate::engine::{CosmosMessage, CosmosSigningInput, SigningInput};
use crate::error::{BridgeError, BridgeResult};
use crate::providers::ChainIdLookup;
use crate::signing::preimage::cosmos::{CosmosCoin, ThorchainAsset, ThorchainCoin};
use crate::types::{BlockchainSpecific, CosmosMessageKind, SigningPayload};

pub fn cosmos_signing_input(payload: &SigningPayload, profile: &CosmosProfile) -> BridgeResult<SigningInput> {
    let params = match &payload.blockchain_specific {
        BlockchainSpecific::Cosmos(params) => params,
        other => {
            return Err(BridgeError::internal(format!(
                "Cosmos adapter received {} chain state",
                other.family()
            )))
        }
    };
    bech32_account(&payload.to_address, profile.bech32_hrp)?;

    let message = match params.message_kind {
        CosmosMessageKind::BankSend => CosmosMessage::Send {
            from_address: payload.coin.address.clone(),
            to_address: payload.to_address.clone(),
            amounts: vec![coin(profile.denom, payload.to_amount)],
        },
    };

    Ok(SigningInput::Cosmos(CosmosSigningInput {
        chain_id: profile.chain_id.to_string(),
        account_number: params.account_number,
        sequence: params.sequence,
        memo: memo_text(payload),
        fee_amounts: vec![coin(profile.denom, params.gas_units as u128)],
        gas: profile.gas_limit,
        public_key: payload.public_key_bytes()?,
        messages: vec![message],
    }))
}

/// Deposit or send, chosen only by the payload's deposit flag.
pub fn thorchain_signing_input(
    payload: &SigningPayload,
    profile: &ThorchainProfile,
    chain_id: &str,
) -> BridgeResult<SigningInput> {
    let params = match &payload.blockchain_specific {
        BlockchainSpecific::Thorchain(params) => params,
        other => {
            return Err(BridgeError::internal(format!(
                "Thorchain adapter received {} chain state",
                other.family()
            )))
        }
    };
    let from = bech32_account(&payload.coin.address, profile.bech32_hrp)?;

    let message = if params.is_deposit {
        CosmosMessage::ThorchainDeposit {
            coins: vec![ThorchainCoin {
                asset: ThorchainAsset {
                    chain: profile.asset_chain.to_string(),
                    symbol: profile.asset_symbol.to_string(),
                    ticker: profile.asset_symbol.to_string(),
                    synth: false,
                },
                amount: payload.to_amount.to_string(),
                decimals: i64::from(payload.coin.decimals),
            }],
            memo: memo_text(payload),
            signer: from,
        }
    } else {
        CosmosMessage::ThorchainSend {
            from_address: from,
            to_address: bech32_account(&payload.to_address, profile.bech32_hrp)?,
            amounts: vec![coin(profile.denom, payload.to_amount)],
        }
    };

    Ok(SigningInput::Cosmos(CosmosSigningInput {
        chain_id: chain_id.to_string(),
        account_number: params.account_number,
        sequence: params.sequence,
        memo: memo_text(payload),
        fee_amounts: vec![coin(profile.denom, params.fee_units as u128)],
        gas: profile.gas_limit,
        public_key: payload.public_key_bytes()?,
        messages: vec![message],
    }))
}

/// Local chain id unless the network reports a different one.
///
/// A failed lookup keeps the local id.
pub async fn resolve_chain_id(local: &str, lookup: Option<&dyn ChainIdLookup>) -> String {
    let Some(lookup) = lookup else {
        return local.to_string();
    };
    match lookup.current_chain_id().await {
        Ok(remote) if !remote.is_empty() && remote != local => {
            warn!(local, remote = %remote, "network chain id differs, using network value");
            remote
        }
        Ok(_) => local.to_string(),
        Err(e) => {
            debug!(error = %e, "chain id lookup failed, keeping local value");
            local.to_string()
        }
    }
}

fn coin(denom: &str, amount: u128) -> CosmosCoin {
    CosmosCoin {
        denom: denom.to_string(),
        amount: amount.to_string(),
    }
}

fn memo_text(payload: &SigningPayload) -> String {
    payload.memo.as_ref().map(|m| m.to_text()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::table::{find, ProfileParams};
    use crate::types::{ChainFamily, Coin, CosmosParams, Memo, ThorchainParams};
    use async_trait::async_trait;
    use bech32::{ToBase32, Variant};

    const PUBKEY: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    fn address(hrp: &str, fill: u8) -> String {
        bech32::encode(hrp, [fill; 20].to_base32(), Variant::Bech32).unwrap()
    }

    fn thor_profile() -> ThorchainProfile {
        match find("THORChain").unwrap().params {
            ProfileParams::Thorchain(p) => p,
            _ => unreachable!(),
        }
    }

    fn thor_payload(is_deposit: bool) -> SigningPayload {
        SigningPayload {
            coin: Coin {
                family: ChainFamily::ThorchainLike,
                chain: "THORChain".to_string(),
                ticker: "RUNE".to_string(),
                decimals: 8,
                address: address("thor", 1),
                hex_public_key: PUBKEY.to_string(),
                is_native: true,
                contract_address: None,
            },
            to_address: address("thor", 2),
            to_amount: 150_000_000,
            memo: Some(Memo::Text("SWAP:BTC.BTC:bc1qxyz".to_string())),
            blockchain_specific: BlockchainSpecific::Thorchain(ThorchainParams {
                account_number: 1,
                sequence: 2,
                is_deposit,
                fee_units: 2_000_000,
            }),
            vault_public_key_ecdsa: PUBKEY.to_string(),
            vault_local_party_id: "party".to_string(),
        }
    }

    #[test]
    fn test_deposit_message_regardless_of_recipient() {
        let SigningInput::Cosmos(input) = thorchain_signing_input(&thor_payload(true), &thor_profile(), "thorchain-1").unwrap()
        else {
            panic!("expected cosmos input");
        };
        assert_eq!(input.messages.len(), 1);
        match &input.messages[0] {
            CosmosMessage::ThorchainDeposit { coins, memo, signer } => {
                assert_eq!(coins[0].asset.chain, "THOR");
                assert_eq!(coins[0].amount, "150000000");
                assert_eq!(memo, "SWAP:BTC.BTC:bc1qxyz");
                assert_eq!(signer, &vec![1u8; 20]);
            }
            other => panic!("expected deposit, got {:?}", other),
        }
        assert_eq!(input.gas, 20_000_000);
    }

    #[test]
    fn test_send_message() {
        let SigningInput::Cosmos(input) = thorchain_signing_input(&thor_payload(false), &thor_profile(), "thorchain-1").unwrap()
        else {
            panic!("expected cosmos input");
        };
        assert!(matches!(input.messages[0], CosmosMessage::ThorchainSend { .. }));
        assert_eq!(input.fee_amounts[0].amount, "2000000");
    }

    #[test]
    fn test_cosmos_bank_send() {
        let profile = match find("Osmosis").unwrap().params {
            ProfileParams::Cosmos(p) => p,
            _ => unreachable!(),
        };
        let mut payload = thor_payload(false);
        payload.coin.family = ChainFamily::CosmosSdk;
        payload.coin.address = address("osmo", 1);
        payload.to_address = address("osmo", 2);
        payload.blockchain_specific = BlockchainSpecific::Cosmos(CosmosParams {
            account_number: 9,
            sequence: 0,
            gas_units: 7500,
            message_kind: CosmosMessageKind::BankSend,
        });

        let SigningInput::Cosmos(input) = cosmos_signing_input(&payload, &profile).unwrap() else {
            panic!("expected cosmos input");
        };
        assert_eq!(input.chain_id, "osmosis-1");
        assert_eq!(input.fee_amounts, vec![coin("uosmo", 7500)]);
        assert_eq!(input.gas, 200_000);
    }

    struct FixedChainId(&'static str);

    #[async_trait]
    impl ChainIdLookup for FixedChainId {
        async fn current_chain_id(&self) -> BridgeResult<String> {
            Ok(self.0.to_string())
        }
    }

    struct DownChainId;

    #[async_trait]
    impl ChainIdLookup for DownChainId {
        async fn current_chain_id(&self) -> BridgeResult<String> {
            Err(BridgeError::transient_network("HTTP 502"))
        }
    }

    #[tokio::test]
    async fn test_remote_chain_id_overrides() {
        assert_eq!(resolve_chain_id("thorchain-1", Some(&FixedChainId("thorchain-2"))).await, "thorchain-2");
        assert_eq!(resolve_chain_id("thorchain-1", Some(&FixedChainId("thorchain-1"))).await, "thorchain-1");
        assert_eq!(resolve_chain_id("thorchain-1", Some(&DownChainId)).await, "thorchain-1");
        assert_eq!(resolve_chain_id("thorchain-1", None).await, "thorchain-1");
    }
}
