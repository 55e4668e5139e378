use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::StakeError;

/// Amount in the asset's smallest unit. u128 holds any realistic token supply.
pub type Balance = u128;

/// Unix timestamp (seconds, UTC).
pub type Timestamp = i64;

/// A span of time in whole seconds.
pub type DurationSecs = u64;

// ── AccountId ────────────────────────────────────────────────────────────────

/// 32-byte participant identifier.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    /// The null identity. Never a valid owner.
    pub const NULL: AccountId = AccountId([0u8; 32]);

    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Deterministic identity: BLAKE3 of an arbitrary label.
    pub fn derive(label: &str) -> Self {
        Self(*blake3::hash(label.as_bytes()).as_bytes())
    }

    pub fn is_null(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Base-58 encoded string representation.
    pub fn to_b58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }

    /// Parse a base-58 identity. Anything that does not decode to exactly
    /// 32 bytes is rejected.
    pub fn from_b58(s: &str) -> Result<Self, StakeError> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| StakeError::InvalidAccountId(format!("{s}: {e}")))?;
        let arr: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            StakeError::InvalidAccountId(format!("{s}: decodes to {} bytes, expected 32", bytes.len()))
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_b58())
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b58 = self.to_b58();
        write!(f, "AccountId({})", &b58[..b58.len().min(8)])
    }
}

// ── RecordId ─────────────────────────────────────────────────────────────────

/// Identifier of a stake record. Allocated monotonically, never reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Debug)]
pub struct RecordId(pub u64);

impl RecordId {
    /// Big-endian bytes, so sled iterates records in allocation order.
    pub fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    pub fn from_be_bytes(b: [u8; 8]) -> Self {
        Self(u64::from_be_bytes(b))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "STK:{}", self.0)
    }
}
