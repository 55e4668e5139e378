use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_ANNUAL_INTEREST_PERCENT, DEFAULT_MAX_DURATION_SECS};
use crate::error::StakeError;
use crate::types::{AccountId, DurationSecs};

fn default_rate() -> u64 { DEFAULT_ANNUAL_INTEREST_PERCENT }
fn default_max_duration() -> DurationSecs { DEFAULT_MAX_DURATION_SECS }

/// Which asset the engine stakes.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum AssetKind {
    /// The chain's native coin. Needs no contract address.
    #[default]
    Native,
    /// A fungible token reached through its contract.
    Token {
        #[serde(with = "b58_account")]
        contract: AccountId,
    },
}

/// Construction parameters supplied by the deployment tooling.
///
/// Identities are base-58 strings in JSON:
///
/// ```json
/// { "owner": "…", "annual_interest_percent": 10, "max_duration_secs": 31536000,
///   "asset": { "type": "token", "contract": "…" } }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeployParams {
    /// Initial administrator.
    #[serde(with = "b58_account")]
    pub owner: AccountId,
    #[serde(default = "default_rate")]
    pub annual_interest_percent: u64,
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: DurationSecs,
    #[serde(default)]
    pub asset: AssetKind,
}

impl DeployParams {
    pub fn new(owner: AccountId, asset: AssetKind) -> Self {
        Self {
            owner,
            annual_interest_percent: DEFAULT_ANNUAL_INTEREST_PERCENT,
            max_duration_secs: DEFAULT_MAX_DURATION_SECS,
            asset,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, StakeError> {
        let params: Self =
            serde_json::from_str(json).map_err(|e| StakeError::Serialization(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StakeError> {
        let json = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            StakeError::Storage(format!("reading {}: {e}", path.as_ref().display()))
        })?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), StakeError> {
        if self.owner.is_null() {
            return Err(StakeError::InvalidOwner);
        }
        if self.max_duration_secs == 0 {
            return Err(StakeError::ZeroDuration);
        }
        if let AssetKind::Token { contract } = &self.asset {
            if contract.is_null() {
                return Err(StakeError::Other("token contract address must be non-null".into()));
            }
        }
        Ok(())
    }
}

mod b58_account {
    use serde::{de, Deserialize, Deserializer, Serializer};

    use crate::types::AccountId;

    pub fn serialize<S: Serializer>(id: &AccountId, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&id.to_b58())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<AccountId, D::Error> {
        let s = String::deserialize(d)?;
        AccountId::from_b58(&s).map_err(de::Error::custom)
    }
}
