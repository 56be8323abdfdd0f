//! Thorchain-family payload builder
//!
//! The intent's deposit flag alone decides between a send and a deposit
//! message. Deposits need a memo; sends need a recipient and an amount.

use tracing::debug;

use super::{assemble, coin_for, memo, require_amount, require_recipient, transient};
use crate::error::{BridgeError, BridgeResult};
use crate::providers::{CosmosAccounts, ThorchainFeeRate};
use crate::types::{BlockchainSpecific, ChainFamily, SigningPayload, ThorchainParams, TransactionIntent, VaultIdentity};

pub async fn build_thorchain_payload(
    intent: &TransactionIntent,
    vault: &VaultIdentity,
    accounts: &dyn CosmosAccounts,
    fee_rate: &dyn ThorchainFeeRate,
) -> BridgeResult<SigningPayload> {
    let coin = coin_for(intent, vault, ChainFamily::ThorchainLike)?;
    let memo = memo::from_optional(intent.data.as_deref());

    let (to_address, amount) = if intent.is_deposit {
        if memo.is_none() {
            return Err(BridgeError::malformed_intent("Deposit requires a memo")
                .with_details(format!("chain: {}", coin.chain)));
        }
        (intent.to.clone().unwrap_or_default(), intent.amount.unwrap_or(0))
    } else {
        (require_recipient(intent)?, require_amount(intent)?)
    };

    let (account, fee_units) =
        tokio::try_join!(accounts.account(&intent.from), fee_rate.native_fee()).map_err(transient)?;

    debug!(
        chain = %coin.chain,
        is_deposit = intent.is_deposit,
        sequence = account.sequence,
        fee_units,
        "Thorchain payload built"
    );

    let params = ThorchainParams {
        account_number: account.account_number,
        sequence: account.sequence,
        is_deposit: intent.is_deposit,
        fee_units,
    };
    assemble(coin, to_address, amount, memo, BlockchainSpecific::Thorchain(params), vault)
}
