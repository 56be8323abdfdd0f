//! Static chain table
//!
//! Every chain the registry knows by name lives here, together with the
//! per-family constants the payload builders and wire adapters need.
//! Gas and fee constants are placeholders with no dynamic re-estimation.

use crate::types::{ChainDescriptor, ChainFamily};

/// Default EVM gas limit when a chain has no override
pub const DEFAULT_EVM_GAS_LIMIT: u64 = 600_000;

/// How UTXO inputs of a chain are locked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtxoScriptKind {
    /// Pay-to-witness-pubkey-hash (BTC/LTC style)
    SegwitV0,
    /// Pay-to-pubkey-hash (BCH/DOGE/DASH style)
    Legacy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtxoProfile {
    pub script: UtxoScriptKind,
    pub bech32_hrp: Option<&'static str>,
    pub cash_addr_prefix: Option<&'static str>,
    pub p2pkh_version: u8,
    pub p2sh_version: u8,
    /// Sighash flag appended to every signature
    pub sighash_type: u32,
    pub blockchair_slug: &'static str,
    pub dust_threshold: u64,
}

impl UtxoProfile {
    /// BIP-143 style digest, either segwit or the BCH fork-id variant
    pub fn uses_bip143_digest(&self) -> bool {
        self.script == UtxoScriptKind::SegwitV0 || self.sighash_type & 0x40 != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CosmosProfile {
    pub chain_id: &'static str,
    pub denom: &'static str,
    pub bech32_hrp: &'static str,
    pub gas_limit: u64,
    /// Flat fee in `denom` units
    pub fee_amount: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThorchainProfile {
    pub chain_id: &'static str,
    pub denom: &'static str,
    pub bech32_hrp: &'static str,
    pub gas_limit: u64,
    /// Native asset as `CHAIN.SYMBOL`
    pub asset_chain: &'static str,
    pub asset_symbol: &'static str,
    /// Node endpoint reporting the network fee
    pub network_path: &'static str,
    pub fee_field: &'static str,
    /// Used when the node omits `fee_field`
    pub default_fee_units: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileParams {
    Evm { chain_id: u64, gas_limit: u64 },
    Utxo(UtxoProfile),
    Cosmos(CosmosProfile),
    Thorchain(ThorchainProfile),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainProfile {
    pub name: &'static str,
    pub ticker: &'static str,
    pub decimals: u8,
    pub params: ProfileParams,
}

impl ChainProfile {
    pub fn family(&self) -> ChainFamily {
        match self.params {
            ProfileParams::Evm { .. } => ChainFamily::Evm,
            ProfileParams::Utxo(_) => ChainFamily::Utxo,
            ProfileParams::Cosmos(_) => ChainFamily::CosmosSdk,
            ProfileParams::Thorchain(_) => ChainFamily::ThorchainLike,
        }
    }

    /// Descriptor for the chain's native asset
    pub fn descriptor(&self) -> ChainDescriptor {
        ChainDescriptor {
            family: self.family(),
            chain: self.name.to_string(),
            ticker: self.ticker.to_string(),
            decimals: self.decimals,
            is_native: true,
            contract_address: None,
        }
    }

    pub fn evm_chain_id(&self) -> Option<u64> {
        match self.params {
            ProfileParams::Evm { chain_id, .. } => Some(chain_id),
            _ => None,
        }
    }
}

const fn evm(name: &'static str, ticker: &'static str, chain_id: u64, gas_limit: u64) -> ChainProfile {
    ChainProfile {
        name,
        ticker,
        decimals: 18,
        params: ProfileParams::Evm { chain_id, gas_limit },
    }
}

const fn cosmos(
    name: &'static str,
    ticker: &'static str,
    decimals: u8,
    chain_id: &'static str,
    denom: &'static str,
    bech32_hrp: &'static str,
    fee_amount: u128,
) -> ChainProfile {
    ChainProfile {
        name,
        ticker,
        decimals,
        params: ProfileParams::Cosmos(CosmosProfile {
            chain_id,
            denom,
            bech32_hrp,
            gas_limit: 200_000,
            fee_amount,
        }),
    }
}

pub static CHAINS: &[ChainProfile] = &[
    // EVM
    evm("Ethereum", "ETH", 1, DEFAULT_EVM_GAS_LIMIT),
    evm("BSC", "BNB", 56, DEFAULT_EVM_GAS_LIMIT),
    evm("Polygon", "MATIC", 137, DEFAULT_EVM_GAS_LIMIT),
    evm("Avalanche", "AVAX", 43114, DEFAULT_EVM_GAS_LIMIT),
    evm("Arbitrum", "ETH", 42161, 2_000_000),
    evm("Optimism", "ETH", 10, DEFAULT_EVM_GAS_LIMIT),
    evm("Base", "ETH", 8453, DEFAULT_EVM_GAS_LIMIT),
    evm("Blast", "ETH", 81457, DEFAULT_EVM_GAS_LIMIT),
    evm("CronosChain", "CRO", 25, 300_000),
    evm("Zksync", "ETH", 324, 2_000_000),
    // UTXO
    ChainProfile {
        name: "Bitcoin",
        ticker: "BTC",
        decimals: 8,
        params: ProfileParams::Utxo(UtxoProfile {
            script: UtxoScriptKind::SegwitV0,
            bech32_hrp: Some("bc"),
            cash_addr_prefix: None,
            p2pkh_version: 0x00,
            p2sh_version: 0x05,
            sighash_type: 0x01,
            blockchair_slug: "bitcoin",
            dust_threshold: 546,
        }),
    },
    ChainProfile {
        name: "Litecoin",
        ticker: "LTC",
        decimals: 8,
        params: ProfileParams::Utxo(UtxoProfile {
            script: UtxoScriptKind::SegwitV0,
            bech32_hrp: Some("ltc"),
            cash_addr_prefix: None,
            p2pkh_version: 0x30,
            p2sh_version: 0x32,
            sighash_type: 0x01,
            blockchair_slug: "litecoin",
            dust_threshold: 1_000,
        }),
    },
    ChainProfile {
        name: "Bitcoin-Cash",
        ticker: "BCH",
        decimals: 8,
        params: ProfileParams::Utxo(UtxoProfile {
            script: UtxoScriptKind::Legacy,
            bech32_hrp: None,
            cash_addr_prefix: Some("bitcoincash"),
            p2pkh_version: 0x00,
            p2sh_version: 0x05,
            sighash_type: 0x41,
            blockchair_slug: "bitcoin-cash",
            dust_threshold: 546,
        }),
    },
    ChainProfile {
        name: "Dogecoin",
        ticker: "DOGE",
        decimals: 8,
        params: ProfileParams::Utxo(UtxoProfile {
            script: UtxoScriptKind::Legacy,
            bech32_hrp: None,
            cash_addr_prefix: None,
            p2pkh_version: 0x1e,
            p2sh_version: 0x16,
            sighash_type: 0x01,
            blockchair_slug: "dogecoin",
            dust_threshold: 1_000_000,
        }),
    },
    ChainProfile {
        name: "Dash",
        ticker: "DASH",
        decimals: 8,
        params: ProfileParams::Utxo(UtxoProfile {
            script: UtxoScriptKind::Legacy,
            bech32_hrp: None,
            cash_addr_prefix: None,
            p2pkh_version: 0x4c,
            p2sh_version: 0x10,
            sighash_type: 0x01,
            blockchair_slug: "dash",
            dust_threshold: 1_000,
        }),
    },
    // Cosmos-SDK
    cosmos("Cosmos", "ATOM", 6, "cosmoshub-4", "uatom", "cosmos", 7_500),
    cosmos("Osmosis", "OSMO", 6, "osmosis-1", "uosmo", "osmo", 7_500),
    cosmos("Kujira", "KUJI", 6, "kaiyo-1", "ukuji", "kujira", 7_500),
    // adydx has 18 decimals, so the flat fee is scaled accordingly
    cosmos("Dydx", "DYDX", 18, "dydx-mainnet-1", "adydx", "dydx", 2_500_000_000_000_000),
    // Thorchain-like
    ChainProfile {
        name: "THORChain",
        ticker: "RUNE",
        decimals: 8,
        params: ProfileParams::Thorchain(ThorchainProfile {
            chain_id: "thorchain-1",
            denom: "rune",
            bech32_hrp: "thor",
            gas_limit: 20_000_000,
            asset_chain: "THOR",
            asset_symbol: "RUNE",
            network_path: "/thorchain/network",
            fee_field: "native_tx_fee_rune",
            default_fee_units: 2_000_000,
        }),
    },
    ChainProfile {
        name: "MayaChain",
        ticker: "CACAO",
        decimals: 10,
        params: ProfileParams::Thorchain(ThorchainProfile {
            chain_id: "mayachain-mainnet-v1",
            denom: "cacao",
            bech32_hrp: "maya",
            gas_limit: 2_000_000_000,
            asset_chain: "MAYA",
            asset_symbol: "CACAO",
            network_path: "/mayachain/network",
            fee_field: "native_tx_fee_cacao",
            default_fee_units: 2_000_000_000,
        }),
    },
];

/// Case-insensitive lookup by chain name
pub fn find(name: &str) -> Option<&'static ChainProfile> {
    CHAINS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

pub fn find_evm_by_chain_id(chain_id: u64) -> Option<&'static ChainProfile> {
    CHAINS.iter().find(|p| p.evm_chain_id() == Some(chain_id))
}

/// Name prefix of EVM chains resolved through the fallback
pub const EVM_FALLBACK_PREFIX: &str = "evm-";

/// Parse an identifier as an EVM chain id (`0x`-hex, decimal, or a fallback name)
pub fn parse_evm_chain_id(identifier: &str) -> Option<u64> {
    let trimmed = identifier.trim();
    let trimmed = trimmed.strip_prefix(EVM_FALLBACK_PREFIX).unwrap_or(trimmed);
    if let Some(hex_part) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        return u64::from_str_radix(hex_part, 16).ok().filter(|id| *id > 0);
    }
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        return trimmed.parse().ok().filter(|id| *id > 0);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique() {
        for (i, a) in CHAINS.iter().enumerate() {
            for b in &CHAINS[i + 1..] {
                assert!(!a.name.eq_ignore_ascii_case(b.name), "duplicate {}", a.name);
            }
        }
    }

    #[test]
    fn test_find_is_case_insensitive() {
        assert_eq!(find("ethereum").map(|p| p.name), Some("Ethereum"));
        assert_eq!(find("THORCHAIN").map(|p| p.family()), Some(ChainFamily::ThorchainLike));
        assert!(find("Solana").is_none());
    }

    #[test]
    fn test_gas_overrides() {
        let gas = |name: &str| match find(name).unwrap().params {
            ProfileParams::Evm { gas_limit, .. } => gas_limit,
            _ => unreachable!(),
        };
        assert_eq!(gas("Ethereum"), 600_000);
        assert_eq!(gas("Arbitrum"), 2_000_000);
        assert_eq!(gas("CronosChain"), 300_000);
    }

    #[test]
    fn test_dydx_fee_override() {
        let fee = |name: &str| match find(name).unwrap().params {
            ProfileParams::Cosmos(p) => p.fee_amount,
            _ => unreachable!(),
        };
        assert!(fee("Dydx") > fee("Cosmos") * 1_000_000);
    }

    #[test]
    fn test_parse_evm_chain_id() {
        assert_eq!(parse_evm_chain_id("0x1"), Some(1));
        assert_eq!(parse_evm_chain_id("0xa4b1"), Some(42161));
        assert_eq!(parse_evm_chain_id("8453"), Some(8453));
        assert_eq!(parse_evm_chain_id("0x0"), None);
        assert_eq!(parse_evm_chain_id("Solana"), None);
        assert_eq!(parse_evm_chain_id(""), None);
        assert_eq!(parse_evm_chain_id("evm-59144"), Some(59144));
        assert_eq!(parse_evm_chain_id("evm-"), None);
    }

    #[test]
    fn test_bch_uses_fork_id_digest() {
        match find("Bitcoin-Cash").unwrap().params {
            ProfileParams::Utxo(p) => assert!(p.uses_bip143_digest()),
            _ => unreachable!(),
        }
        match find("Dogecoin").unwrap().params {
            ProfileParams::Utxo(p) => assert!(!p.uses_bip143_digest()),
            _ => unreachable!(),
        }
    }
}
