//! Thorchain-family network fee lookup

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use super::{parse_decimal_u64, ThorchainFeeRate};
use crate::chains::table::ThorchainProfile;
use crate::error::BridgeResult;
use crate::utils::http::join_url;
use crate::utils::HttpClient;

pub struct ThornodeFeeRate {
    http: HttpClient,
    base_url: String,
    profile: ThorchainProfile,
}

impl ThornodeFeeRate {
    pub fn new(http: HttpClient, base_url: impl Into<String>, profile: ThorchainProfile) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            profile,
        }
    }
}

#[async_trait]
impl ThorchainFeeRate for ThornodeFeeRate {
    async fn native_fee(&self) -> BridgeResult<u64> {
        let url = join_url(&self.base_url, self.profile.network_path);
        let network: Value = self.http.get_json(&url).await?;
        native_fee_from_network(&network, &self.profile)
    }
}

fn native_fee_from_network(network: &Value, profile: &ThorchainProfile) -> BridgeResult<u64> {
    match network.get(profile.fee_field) {
        Some(Value::String(raw)) => parse_decimal_u64(raw, profile.fee_field),
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| crate::error::BridgeError::transient_network(format!("Malformed {}", profile.fee_field))),
        _ => {
            warn!(
                field = profile.fee_field,
                fallback = profile.default_fee_units,
                "network fee not reported, using default"
            );
            Ok(profile.default_fee_units)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::table::{find, ProfileParams};

    fn thor_profile() -> ThorchainProfile {
        match find("THORChain").unwrap().params {
            ProfileParams::Thorchain(p) => p,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_fee_from_string_field() {
        let network = serde_json::json!({"native_tx_fee_rune": "2000000", "vaults_migrating": false});
        assert_eq!(native_fee_from_network(&network, &thor_profile()).unwrap(), 2_000_000);
    }

    #[test]
    fn test_missing_field_uses_default() {
        let network = serde_json::json!({});
        let profile = thor_profile();
        assert_eq!(native_fee_from_network(&network, &profile).unwrap(), profile.default_fee_units);
    }

    #[test]
    fn test_malformed_field_is_error() {
        let network = serde_json::json!({"native_tx_fee_rune": "lots"});
        assert!(native_fee_from_network(&network, &thor_profile()).is_err());
    }
}
