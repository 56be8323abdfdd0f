//! EVM payload to EIP-1559 signing input

use super::address::evm_address;
use crate::engine::{be_bytes, EthereumSigningInput, EthereumTransfer, SigningInput};
use crate::error::{BridgeError, BridgeResult};
use crate::types::{BlockchainSpecific, SigningPayload};

/// Token payloads send to the contract and carry the real recipient in the
/// ERC-20 transfer body.
pub fn evm_signing_input(payload: &SigningPayload, chain_id: u64) -> BridgeResult<SigningInput> {
    let params = match &payload.blockchain_specific {
        BlockchainSpecific::Evm(params) => params,
        other => {
            return Err(BridgeError::internal(format!(
                "EVM adapter received {} chain state",
                other.family()
            )))
        }
    };
    evm_address(&payload.to_address)?;

    let (to_address, transfer) = if payload.coin.is_native {
        let data = payload.memo.as_ref().map(|m| m.as_bytes().to_vec()).unwrap_or_default();
        (
            payload.to_address.clone(),
            EthereumTransfer::Transfer {
                amount: be_bytes(payload.to_amount),
                data,
            },
        )
    } else {
        let contract = payload
            .coin
            .contract_address
            .clone()
            .ok_or_else(|| BridgeError::malformed_intent("Token transfer without a contract address"))?;
        evm_address(&contract)?;
        (
            contract,
            EthereumTransfer::Erc20Transfer {
                to: payload.to_address.clone(),
                amount: be_bytes(payload.to_amount),
            },
        )
    };

    Ok(SigningInput::Ethereum(EthereumSigningInput {
        chain_id: be_bytes(chain_id as u128),
        nonce: be_bytes(params.nonce as u128),
        gas_limit: be_bytes(params.gas_limit as u128),
        max_fee_per_gas: be_bytes(params.max_fee_per_gas_wei),
        max_inclusion_fee_per_gas: be_bytes(params.priority_fee_wei),
        to_address,
        transfer,
    }))
}
