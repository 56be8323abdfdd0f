use async_trait::async_trait;
use proptest::prelude::*;
use std::collections::HashSet;
use std::future::Future;
use vault_bridge::chains::table::{self, parse_evm_chain_id, ProfileParams};
use vault_bridge::engine::be_bytes;
use vault_bridge::payload::evm::max_fee_per_gas;
use vault_bridge::payload::memo::{classify, decode_text};
use vault_bridge::payload::{build_cosmos_payload, build_evm_payload, build_thorchain_payload, build_utxo_payload};
use vault_bridge::providers::selector::StaticSelectorLookup;
use vault_bridge::providers::{AccountInfo, CosmosAccounts, EvmRpc, FeeData, ThorchainFeeRate, UtxoIndexer};
use vault_bridge::relay::{new_session_id, SessionKey};
use vault_bridge::signing::abi::{selector_of, KnownSelectors};
use vault_bridge::signing::rlp::encode_u64;
use vault_bridge::{
    BridgeResult, ChainFamily, Memo, SigningPayload, TransactionIntent, UnspentOutput, VaultIdentity,
};

fn block_on<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
        .block_on(future)
}

fn classify_blocking(data: &[u8]) -> Memo {
    block_on(classify(data, &StaticSelectorLookup))
}

/// One snapshot of remote chain state, served by every collaborator
#[derive(Debug, Clone)]
struct ChainState {
    nonce: u64,
    gas_price: u128,
    priority_fee: Option<u128>,
    account: AccountInfo,
    utxos: Vec<UnspentOutput>,
    byte_fee: u64,
    native_fee: u64,
}

#[async_trait]
impl EvmRpc for ChainState {
    async fn transaction_count(&self, _address: &str) -> BridgeResult<u64> {
        Ok(self.nonce)
    }

    async fn fee_data(&self) -> BridgeResult<FeeData> {
        Ok(FeeData {
            gas_price: self.gas_price,
            priority_fee: self.priority_fee,
        })
    }
}

#[async_trait]
impl CosmosAccounts for ChainState {
    async fn account(&self, _address: &str) -> BridgeResult<AccountInfo> {
        Ok(self.account)
    }
}

#[async_trait]
impl ThorchainFeeRate for ChainState {
    async fn native_fee(&self) -> BridgeResult<u64> {
        Ok(self.native_fee)
    }
}

#[async_trait]
impl UtxoIndexer for ChainState {
    async fn unspent_outputs(&self, _address: &str) -> BridgeResult<Vec<UnspentOutput>> {
        Ok(self.utxos.clone())
    }

    async fn suggested_byte_fee(&self) -> BridgeResult<u64> {
        Ok(self.byte_fee)
    }
}

fn chain_state() -> impl Strategy<Value = ChainState> {
    (
        any::<u64>(),
        0u128..(u128::MAX / 5),
        proptest::option::of(any::<u128>()),
        any::<u64>(),
        any::<u64>(),
        prop::collection::vec((any::<[u8; 32]>(), any::<u32>(), 1u64..), 0..6),
        1u64..1_000,
        any::<u64>(),
    )
        .prop_map(
            |(nonce, gas_price, priority_fee, account_number, sequence, utxos, byte_fee, native_fee)| ChainState {
                nonce,
                gas_price,
                priority_fee,
                account: AccountInfo {
                    account_number,
                    sequence,
                },
                utxos: utxos
                    .into_iter()
                    .map(|(txid, vout, value)| UnspentOutput {
                        txid: hex::encode(txid),
                        vout,
                        value,
                    })
                    .collect(),
                byte_fee,
                native_fee,
            },
        )
}

fn sample_vault() -> VaultIdentity {
    VaultIdentity {
        name: "Main Vault".to_string(),
        public_key_ecdsa: "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798".to_string(),
        public_key_eddsa: "00".repeat(32),
        hex_chain_code: "11".repeat(32),
        local_party_id: "extension-1".to_string(),
        derived_keys: Default::default(),
    }
}

fn sample_intent(chain: &str, to: &str, amount: u128, memo: &Option<String>) -> TransactionIntent {
    TransactionIntent {
        from: "sender".to_string(),
        to: Some(to.to_string()),
        amount: Some(amount),
        data: memo.as_ref().map(|m| m.as_bytes().to_vec()),
        is_deposit: false,
        chain: table::find(chain).expect("chain in table").descriptor(),
    }
}

/// Build the payload for `chain` against `state`
async fn build(chain: &str, state: &ChainState, amount: u128, memo: &Option<String>) -> BridgeResult<SigningPayload> {
    let profile = table::find(chain).expect("chain in table");
    let vault = sample_vault();
    match profile.params {
        ProfileParams::Evm { gas_limit, .. } => {
            let intent = sample_intent(chain, "0x000000000000000000000000000000000000dEaD", amount, memo);
            build_evm_payload(&intent, &vault, gas_limit, state, &StaticSelectorLookup).await
        }
        ProfileParams::Utxo(_) => {
            build_utxo_payload(&sample_intent(chain, "recipient", amount, memo), &vault, state).await
        }
        ProfileParams::Cosmos(cosmos) => {
            build_cosmos_payload(&sample_intent(chain, "recipient", amount, memo), &vault, &cosmos, state).await
        }
        ProfileParams::Thorchain(_) => {
            build_thorchain_payload(&sample_intent(chain, "recipient", amount, memo), &vault, state, state).await
        }
    }
}

fn starts_with_known_selector(data: &[u8]) -> bool {
    selector_of(data).map_or(false, |s| KnownSelectors::contains(&s))
}

proptest! {
    #[test]
    fn utf8_data_becomes_text_memo(text in "\\PC{1,64}") {
        prop_assume!(!starts_with_known_selector(text.as_bytes()));
        prop_assert_eq!(classify_blocking(text.as_bytes()), Memo::Text(text));
    }

    #[test]
    fn invalid_utf8_stays_raw(data in prop::collection::vec(any::<u8>(), 1..64)) {
        prop_assume!(std::str::from_utf8(&data).is_err());
        prop_assert_eq!(decode_text(&data), Memo::Raw(data.clone()));
        prop_assert_eq!(classify_blocking(&data), Memo::Raw(data));
    }

    #[test]
    fn known_selector_data_unchanged(
        index in 0..KnownSelectors::ALL.len(),
        tail in prop::collection::vec(any::<u8>(), 0..96),
    ) {
        let mut data = KnownSelectors::ALL[index].to_vec();
        data.extend_from_slice(&tail);
        prop_assert_eq!(classify_blocking(&data), Memo::Raw(data));
    }

    #[test]
    fn max_fee_is_two_and_a_half_times(gas_price in 0u128..(u128::MAX / 5)) {
        prop_assert_eq!(max_fee_per_gas(gas_price), gas_price * 5 / 2);
        prop_assert!(max_fee_per_gas(gas_price) >= gas_price);
    }

    #[test]
    fn be_bytes_minimal_and_lossless(value in any::<u128>()) {
        let bytes = be_bytes(value);
        prop_assert!(bytes.first() != Some(&0));
        let mut padded = [0u8; 16];
        padded[16 - bytes.len()..].copy_from_slice(&bytes);
        prop_assert_eq!(u128::from_be_bytes(padded), value);
    }

    #[test]
    fn rlp_small_integers_are_single_bytes(value in 1u64..0x80) {
        prop_assert_eq!(encode_u64(value), vec![value as u8]);
    }

    #[test]
    fn rlp_integer_prefix_carries_length(value in 0x80u64..) {
        let encoded = encode_u64(value);
        prop_assert_eq!(encoded[0] as usize - 0x80, encoded.len() - 1);
        prop_assert!(encoded[1] != 0);
    }

    #[test]
    fn evm_chain_ids_parse_in_both_forms(chain_id in 1u64..) {
        prop_assert_eq!(parse_evm_chain_id(&chain_id.to_string()), Some(chain_id));
        prop_assert_eq!(parse_evm_chain_id(&format!("0x{:x}", chain_id)), Some(chain_id));
    }

    #[test]
    fn payloads_are_deterministic_for_every_family(
        index in 0..table::CHAINS.len(),
        state in chain_state(),
        amount in 1u128..u64::MAX as u128,
        memo in proptest::option::of("[a-z =:.]{1,32}"),
    ) {
        let chain = table::CHAINS[index].name;
        let first = block_on(build(chain, &state, amount, &memo)).unwrap();
        let second = block_on(build(chain, &state, amount, &memo)).unwrap();

        prop_assert_eq!(&first, &second);
        let family: ChainFamily = table::CHAINS[index].family();
        prop_assert_eq!(first.coin.family, family);
        prop_assert_eq!(first.blockchain_specific.family(), family);
    }

    #[test]
    fn session_payload_encryption_roundtrips(plaintext in prop::collection::vec(any::<u8>(), 0..512)) {
        let key = SessionKey::generate();
        let sealed = key.encrypt(&plaintext).unwrap();
        prop_assert_eq!(key.decrypt(&sealed).unwrap(), plaintext);
    }
}

#[test]
fn session_ids_do_not_collide() {
    let ids: HashSet<String> = (0..100_000).map(|_| new_session_id()).collect();
    assert_eq!(ids.len(), 100_000);
}
