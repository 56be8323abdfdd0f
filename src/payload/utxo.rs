//! UTXO payload builder

use tracing::debug;

use super::{assemble, coin_for, memo, require_amount, require_recipient, transient};
use crate::error::BridgeResult;
use crate::providers::UtxoIndexer;
use crate::types::{BlockchainSpecific, ChainFamily, SigningPayload, TransactionIntent, UtxoParams, VaultIdentity};
use crate::utils::logging::redact_address;

/// Change returns to the sending address.
pub async fn build_utxo_payload(
    intent: &TransactionIntent,
    vault: &VaultIdentity,
    indexer: &dyn UtxoIndexer,
) -> BridgeResult<SigningPayload> {
    let coin = coin_for(intent, vault, ChainFamily::Utxo)?;
    let to_address = require_recipient(intent)?;
    let amount = require_amount(intent)?;

    let (unspent_inputs, byte_fee) =
        tokio::try_join!(indexer.unspent_outputs(&intent.from), indexer.suggested_byte_fee()).map_err(transient)?;

    debug!(
        chain = %coin.chain,
        from = %redact_address(&coin.address),
        utxos = unspent_inputs.len(),
        byte_fee,
        "UTXO payload built"
    );

    let params = UtxoParams {
        unspent_inputs,
        byte_fee,
        change_address: intent.from.clone(),
    };
    assemble(
        coin,
        to_address,
        amount,
        memo::from_optional(intent.data.as_deref()),
        BlockchainSpecific::Utxo(params),
        vault,
    )
}
