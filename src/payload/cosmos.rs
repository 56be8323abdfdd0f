//! Cosmos SDK payload builder

use tracing::debug;

use super::{assemble, coin_for, memo, require_amount, require_recipient, transient};
use crate::chains::table::CosmosProfile;
use crate::error::{BridgeError, BridgeResult};
use crate::providers::CosmosAccounts;
use crate::types::{
    BlockchainSpecific, ChainFamily, CosmosMessageKind, CosmosParams, SigningPayload, TransactionIntent,
    VaultIdentity,
};

/// `gas_units` carries the chain's flat fee in base denomination units.
pub async fn build_cosmos_payload(
    intent: &TransactionIntent,
    vault: &VaultIdentity,
    profile: &CosmosProfile,
    accounts: &dyn CosmosAccounts,
) -> BridgeResult<SigningPayload> {
    let coin = coin_for(intent, vault, ChainFamily::CosmosSdk)?;
    let to_address = require_recipient(intent)?;
    let amount = require_amount(intent)?;

    let account = accounts.account(&intent.from).await.map_err(transient)?;
    let gas_units = u64::try_from(profile.fee_amount)
        .map_err(|_| BridgeError::internal(format!("Fee constant for {} exceeds u64", profile.chain_id)))?;

    debug!(
        chain_id = profile.chain_id,
        account_number = account.account_number,
        sequence = account.sequence,
        "Cosmos payload built"
    );

    let params = CosmosParams {
        account_number: account.account_number,
        sequence: account.sequence,
        gas_units,
        message_kind: CosmosMessageKind::BankSend,
    };
    assemble(
        coin,
        to_address,
        amount,
        memo::from_optional(intent.data.as_deref()),
        BlockchainSpecific::Cosmos(params),
        vault,
    )
}
