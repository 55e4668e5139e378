use chrono::DateTime;
use lockstake_core::constants::SECONDS_PER_DAY;
use lockstake_core::error::StakeError;
use lockstake_core::record::StakeStatus;
use lockstake_core::types::{RecordId, Timestamp};

use crate::engine::StakingEngine;
use crate::transfer::AssetTransferPort;

/// Read-only helpers over a running engine.
pub struct StakeQuery<'a, P: AssetTransferPort> {
    engine: &'a StakingEngine<P>,
}

impl<'a, P: AssetTransferPort> StakeQuery<'a, P> {
    pub fn new(engine: &'a StakingEngine<P>) -> Self {
        Self { engine }
    }

    /// Returns true if the record's lock has elapsed (unlock_at <= now).
    pub fn is_matured(&self, id: RecordId, now: Timestamp) -> Result<bool, StakeError> {
        Ok(self.engine.stake_of(id)?.is_matured(now))
    }

    /// Human-readable summary of a record's state.
    pub fn describe(&self, id: RecordId, now: Timestamp) -> Result<String, StakeError> {
        let r = self.engine.stake_of(id)?;

        let status_str = match &r.status {
            StakeStatus::Active => {
                let secs_remaining = r.unlock_at().saturating_sub(now);
                if secs_remaining > 0 {
                    let days = (secs_remaining as u64).div_ceil(SECONDS_PER_DAY);
                    format!("Active — unlocks in {} days ({})", days, render(r.unlock_at()))
                } else {
                    "Active — matured, ready to withdraw".to_string()
                }
            }
            StakeStatus::Withdrawn { withdrawn_at } => {
                format!("Withdrawn at {}", render(*withdrawn_at))
            }
        };

        Ok(format!(
            "{} | {} units @ {}% | owner: {} | {}",
            r.id, r.principal, r.rate_at_deposit, r.owner, status_str
        ))
    }
}

fn render(ts: Timestamp) -> String {
    match DateTime::from_timestamp(ts, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => format!("Unix timestamp {}", ts),
    }
}
