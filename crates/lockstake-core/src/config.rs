use serde::{Deserialize, Serialize};

use crate::error::StakeError;
use crate::types::{AccountId, DurationSecs};

/// Process-wide, owner-mutable parameters.
///
/// Changes here apply to deposits made afterwards; existing records keep the
/// rate and lock they captured when they were opened.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GlobalConfig {
    pub owner: AccountId,
    pub annual_interest_percent: u64,
    pub max_duration: DurationSecs,
}

impl GlobalConfig {
    pub fn new(
        owner: AccountId,
        annual_interest_percent: u64,
        max_duration: DurationSecs,
    ) -> Result<Self, StakeError> {
        if owner.is_null() {
            return Err(StakeError::InvalidOwner);
        }
        if max_duration == 0 {
            return Err(StakeError::ZeroDuration);
        }
        Ok(Self { owner, annual_interest_percent, max_duration })
    }
}
