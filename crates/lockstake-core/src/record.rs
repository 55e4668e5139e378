use serde::{Deserialize, Serialize};

use crate::error::StakeError;
use crate::interest::accrued;
use crate::math::checked_add;
use crate::types::{AccountId, Balance, DurationSecs, RecordId, Timestamp};

// ── StakeStatus ───────────────────────────────────────────────────────────────

/// Lifecycle of a stake record. `Withdrawn` is terminal.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum StakeStatus {
    /// Principal is held by the engine and interest is accruing.
    Active,
    /// Principal and interest have been paid out.
    Withdrawn { withdrawn_at: Timestamp },
}

// ── StakeRecord ───────────────────────────────────────────────────────────────

/// One deposit. Interest terms are captured at creation and never change.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StakeRecord {
    pub id: RecordId,
    /// Depositor. Only this account may withdraw the record.
    pub owner: AccountId,
    /// Amount deposited, in the asset's smallest unit. Always > 0.
    pub principal: Balance,
    pub start_time: Timestamp,
    /// Committed lock period in seconds.
    pub lock_duration: DurationSecs,
    /// Annual interest percent in effect when the record was opened.
    pub rate_at_deposit: u64,
    pub status: StakeStatus,
}

impl StakeRecord {
    pub fn is_active(&self) -> bool {
        self.status == StakeStatus::Active
    }

    /// Earliest timestamp at which the record may be withdrawn.
    pub fn unlock_at(&self) -> Timestamp {
        let lock = i64::try_from(self.lock_duration).unwrap_or(i64::MAX);
        self.start_time.saturating_add(lock)
    }

    pub fn is_matured(&self, now: Timestamp) -> bool {
        now >= self.unlock_at()
    }

    /// Seconds of accrual at `now`, clamped to `[0, lock_duration]`.
    pub fn elapsed_at(&self, now: Timestamp) -> DurationSecs {
        let elapsed = now.saturating_sub(self.start_time).max(0) as u64;
        elapsed.min(self.lock_duration)
    }

    /// Interest accrued at `now`. Never grows past the end of the lock.
    pub fn accrued_at(&self, now: Timestamp) -> Result<Balance, StakeError> {
        accrued(self.principal, self.rate_at_deposit, self.elapsed_at(now))
    }
}

// ── Settlement ────────────────────────────────────────────────────────────────

/// What a withdrawal owes the record owner.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settlement {
    pub record: RecordId,
    pub owner: AccountId,
    pub principal: Balance,
    pub interest: Balance,
    /// `principal + interest`.
    pub payout: Balance,
}

impl Settlement {
    pub fn new(
        record: RecordId,
        owner: AccountId,
        principal: Balance,
        interest: Balance,
    ) -> Result<Self, StakeError> {
        let payout = checked_add(principal, interest)?;
        Ok(Self { record, owner, principal, interest, payout })
    }
}
