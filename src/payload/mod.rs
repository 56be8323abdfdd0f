//! Payload Builder
//!
//! Turns a [`TransactionIntent`] into a [`SigningPayload`] by querying chain
//! state through the `providers` traits. A builder either returns a complete
//! payload or an error; collaborator failures surface as
//! `ErrorCode::TransientNetwork`, a chain with no endpoint as `ErrorCode::Config`.

pub mod cosmos;
pub mod evm;
pub mod memo;
pub mod thorchain;
pub mod utxo;

use crate::error::{BridgeError, BridgeResult, ErrorCode};
use crate::types::{BlockchainSpecific, ChainFamily, Coin, Memo, SigningPayload, TransactionIntent, VaultIdentity};

pub use cosmos::build_cosmos_payload;
pub use evm::build_evm_payload;
pub use thorchain::build_thorchain_payload;
pub use utxo::build_utxo_payload;

/// Sending coin for an intent, keyed to the vault's derived key
pub(crate) fn coin_for(intent: &TransactionIntent, vault: &VaultIdentity, family: ChainFamily) -> BridgeResult<Coin> {
    if intent.chain.family != family {
        return Err(BridgeError::malformed_intent(format!(
            "{} intent routed to the {} builder",
            intent.chain.family, family
        )));
    }
    if intent.from.trim().is_empty() {
        return Err(BridgeError::malformed_intent("Sender address is required"));
    }

    Ok(Coin {
        family,
        chain: intent.chain.chain.clone(),
        ticker: intent.chain.ticker.clone(),
        decimals: intent.chain.decimals,
        address: intent.from.clone(),
        hex_public_key: vault.public_key_for(&intent.chain.chain).to_string(),
        is_native: intent.chain.is_native,
        contract_address: intent.chain.contract_address.clone(),
    })
}

pub(crate) fn require_recipient(intent: &TransactionIntent) -> BridgeResult<String> {
    intent
        .to
        .as_deref()
        .map(str::trim)
        .filter(|to| !to.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            BridgeError::malformed_intent("Recipient is required").with_details(format!("chain: {}", intent.chain.chain))
        })
}

pub(crate) fn require_amount(intent: &TransactionIntent) -> BridgeResult<u128> {
    intent.amount.ok_or_else(|| {
        BridgeError::malformed_intent("Amount is required").with_details(format!("chain: {}", intent.chain.chain))
    })
}

/// Collaborator failures are reported as transient, except a missing endpoint
pub(crate) fn transient(err: BridgeError) -> BridgeError {
    if matches!(err.code, ErrorCode::TransientNetwork | ErrorCode::Config) {
        return err;
    }
    let details = err.to_string();
    BridgeError::transient_network("Chain state lookup failed").with_details(details)
}

pub(crate) fn assemble(
    coin: Coin,
    to_address: String,
    to_amount: u128,
    memo: Option<Memo>,
    blockchain_specific: BlockchainSpecific,
    vault: &VaultIdentity,
) -> BridgeResult<SigningPayload> {
    let payload = SigningPayload {
        coin,
        to_address,
        to_amount,
        memo,
        blockchain_specific,
        vault_public_key_ecdsa: vault.public_key_ecdsa.clone(),
        vault_local_party_id: vault.local_party_id.clone(),
    };
    payload.validate()?;
    Ok(payload)
}
