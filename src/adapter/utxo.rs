//! UTXO payload to Bitcoin-style signing input

use super::address::{own_script, utxo_script};
use crate::chains::table::UtxoProfile;
use crate::engine::{BitcoinSigningInput, SigningInput, UtxoInput};
use crate::error::{BridgeError, BridgeResult};
use crate::types::{BlockchainSpecific, SigningPayload};

/// Final sequence, no relative locktime or replacement signalling
const DEFAULT_SEQUENCE: u32 = 0xffff_ffff;

pub fn utxo_signing_input(payload: &SigningPayload, profile: &UtxoProfile) -> BridgeResult<SigningInput> {
    let params = match &payload.blockchain_specific {
        BlockchainSpecific::Utxo(params) => params,
        other => {
            return Err(BridgeError::internal(format!(
                "UTXO adapter received {} chain state",
                other.family()
            )))
        }
    };

    let amount = u64::try_from(payload.to_amount)
        .map_err(|_| BridgeError::malformed_intent("Amount exceeds the chain's maximum supply"))?;
    let locking_script = own_script(&payload.public_key_bytes()?, profile);

    let utxos = params
        .unspent_inputs
        .iter()
        .map(|utxo| -> BridgeResult<UtxoInput> {
            let txid: [u8; 32] = hex::decode(&utxo.txid)?
                .try_into()
                .map_err(|_| BridgeError::malformed_intent("Unspent output txid is not 32 bytes"))?;
            Ok(UtxoInput {
                txid,
                vout: utxo.vout,
                amount: utxo.value,
                script: locking_script.clone(),
                sequence: DEFAULT_SEQUENCE,
            })
        })
        .collect::<BridgeResult<Vec<_>>>()?;

    Ok(SigningInput::Bitcoin(BitcoinSigningInput {
        hash_type: profile.sighash_type,
        amount,
        byte_fee: params.byte_fee,
        to_script: utxo_script(&payload.to_address, profile)?,
        change_script: utxo_script(&params.change_address, profile)?,
        dust_threshold: profile.dust_threshold,
        utxos,
        op_return: payload.memo.as_ref().map(|m| m.as_bytes().to_vec()),
    }))
}
