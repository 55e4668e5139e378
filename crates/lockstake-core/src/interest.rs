//! Simple (non-compounding) interest accrual.
//!
//! ```text
//! interest = floor(principal × rate × elapsed / (100 × SECONDS_PER_YEAR))
//! ```
//!
//! `rate` is a whole annual percent and `elapsed` is in seconds. The caller
//! clamps `elapsed` to the record's lock duration; see
//! [`StakeRecord::accrued_at`](crate::record::StakeRecord::accrued_at).

use crate::constants::INTEREST_DENOMINATOR;
use crate::error::StakeError;
use crate::math::mul_div;
use crate::types::{Balance, DurationSecs};

/// Interest owed on `principal` after `elapsed_secs` at `rate_annual_percent`.
pub fn accrued(
    principal: Balance,
    rate_annual_percent: u64,
    elapsed_secs: DurationSecs,
) -> Result<Balance, StakeError> {
    // u64 × u64 always fits in u128.
    let rate_time = rate_annual_percent as u128 * elapsed_secs as u128;
    mul_div(principal, rate_time, INTEREST_DENOMINATOR)
}
