//! Contract-call helpers: well-known selectors and ERC-20 transfer calldata

use super::{EngineError, EngineResult};

/// Well-known function selectors
pub struct KnownSelectors;

impl KnownSelectors {
    // ERC-20
    pub const TRANSFER: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb]; // transfer(address,uint256)
    pub const APPROVE: [u8; 4] = [0x09, 0x5e, 0xa7, 0xb3]; // approve(address,uint256)
    pub const TRANSFER_FROM: [u8; 4] = [0x23, 0xb8, 0x72, 0xdd]; // transferFrom(address,address,uint256)

    // ERC-721 / ERC-1155
    pub const SAFE_TRANSFER_FROM: [u8; 4] = [0x42, 0x84, 0x2e, 0x0e]; // safeTransferFrom(address,address,uint256)
    pub const SET_APPROVAL_FOR_ALL: [u8; 4] = [0xa2, 0x2c, 0xb4, 0x65]; // setApprovalForAll(address,bool)
    pub const SAFE_TRANSFER_FROM_1155: [u8; 4] = [0xf2, 0x42, 0x43, 0x2a]; // safeTransferFrom(address,address,uint256,uint256,bytes)

    // WETH
    pub const DEPOSIT: [u8; 4] = [0xd0, 0xe3, 0x0d, 0xb0]; // deposit()
    pub const WITHDRAW: [u8; 4] = [0x2e, 0x1a, 0x7d, 0x4d]; // withdraw(uint256)

    // Thorchain router
    pub const DEPOSIT_WITH_EXPIRY: [u8; 4] = [0x44, 0xbc, 0x93, 0x7b]; // depositWithExpiry(address,address,uint256,string,uint256)

    // Multicall
    pub const MULTICALL: [u8; 4] = [0xac, 0x96, 0x50, 0xd8]; // multicall(bytes[])

    pub const ALL: &'static [[u8; 4]] = &[
        Self::TRANSFER,
        Self::APPROVE,
        Self::TRANSFER_FROM,
        Self::SAFE_TRANSFER_FROM,
        Self::SET_APPROVAL_FOR_ALL,
        Self::SAFE_TRANSFER_FROM_1155,
        Self::DEPOSIT,
        Self::WITHDRAW,
        Self::DEPOSIT_WITH_EXPIRY,
        Self::MULTICALL,
    ];

    pub fn contains(selector: &[u8; 4]) -> bool {
        Self::ALL.contains(selector)
    }
}

/// Leading four bytes of calldata, if present
pub fn selector_of(data: &[u8]) -> Option<[u8; 4]> {
    if data.len() < 4 {
        return None;
    }
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&data[..4]);
    Some(selector)
}

/// `transfer(address,uint256)` calldata
pub fn erc20_transfer_calldata(to: &[u8; 20], amount: &[u8]) -> EngineResult<Vec<u8>> {
    let significant = &amount[amount.iter().take_while(|&&b| b == 0).count()..];
    if significant.len() > 32 {
        return Err(EngineError::EncodingError(
            "token amount exceeds uint256".to_string(),
        ));
    }

    let mut data = Vec::with_capacity(68);
    data.extend_from_slice(&KnownSelectors::TRANSFER);
    data.extend_from_slice(&[0u8; 12]);
    data.extend_from_slice(to);
    data.extend_from_slice(&vec![0u8; 32 - significant.len()]);
    data.extend_from_slice(significant);
    Ok(data)
}
