use std::collections::BTreeMap;

use lockstake_core::config::GlobalConfig;
use lockstake_core::error::StakeError;
use lockstake_core::record::{Settlement, StakeRecord, StakeStatus};
use lockstake_core::types::{AccountId, Balance, DurationSecs, RecordId, Timestamp};

/// Arena of stake records keyed by a monotonically allocated [`RecordId`].
///
/// A participant may hold any number of concurrent records. Each record moves
/// `Active → Withdrawn` exactly once and always settles in full.
#[derive(Clone, Debug, Default)]
pub struct StakeLedger {
    records: BTreeMap<RecordId, StakeRecord>,
    next_id: u64,
}

impl StakeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from persisted records.
    ///
    /// `next_id` is raised past every existing id so identifiers are never reused.
    pub fn from_parts(records: Vec<StakeRecord>, next_id: u64) -> Self {
        let next_id = records
            .iter()
            .map(|r| r.id.0.saturating_add(1))
            .max()
            .unwrap_or(0)
            .max(next_id);
        let records = records.into_iter().map(|r| (r.id, r)).collect();
        Self { records, next_id }
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    // ── Lifecycle ────────────────────────────────────────────────────────────

    /// Open a record locked for the full `max_duration` at the current rate.
    pub fn open(
        &mut self,
        owner: AccountId,
        principal: Balance,
        now: Timestamp,
        config: &GlobalConfig,
    ) -> Result<StakeRecord, StakeError> {
        self.open_with_lock(owner, principal, config.max_duration, now, config)
    }

    /// Open a record with a caller-chosen lock no longer than `max_duration`.
    pub fn open_with_lock(
        &mut self,
        owner: AccountId,
        principal: Balance,
        lock_duration: DurationSecs,
        now: Timestamp,
        config: &GlobalConfig,
    ) -> Result<StakeRecord, StakeError> {
        validate_terms(principal, lock_duration, now, config)?;

        let id = RecordId(self.next_id);
        self.next_id = self.next_id.checked_add(1).ok_or(StakeError::ArithmeticOverflow)?;

        let record = StakeRecord {
            id,
            owner,
            principal,
            start_time: now,
            lock_duration,
            rate_at_deposit: config.annual_interest_percent,
            status: StakeStatus::Active,
        };
        self.records.insert(id, record.clone());
        Ok(record)
    }

    /// Validate a withdrawal and compute what it owes. Does not mutate.
    pub fn entitlement(
        &self,
        id: RecordId,
        caller: &AccountId,
        now: Timestamp,
    ) -> Result<Settlement, StakeError> {
        let record = self.get(id)?;
        if record.owner != *caller {
            return Err(StakeError::Unauthorized);
        }
        if !record.is_active() {
            return Err(StakeError::AlreadyWithdrawn);
        }
        if !record.is_matured(now) {
            return Err(StakeError::LockNotElapsed { unlock_at: record.unlock_at() });
        }
        let interest = record.accrued_at(now)?;
        Settlement::new(record.id, record.owner.clone(), record.principal, interest)
    }

    /// Commit `Active → Withdrawn`. Call only once the payout has settled.
    pub fn mark_withdrawn(&mut self, id: RecordId, now: Timestamp) -> Result<(), StakeError> {
        let record = self
            .records
            .get_mut(&id)
            .ok_or_else(|| StakeError::RecordNotFound(id.to_string()))?;
        if !record.is_active() {
            return Err(StakeError::AlreadyWithdrawn);
        }
        record.status = StakeStatus::Withdrawn { withdrawn_at: now };
        Ok(())
    }

    /// `entitlement` followed by `mark_withdrawn`, for callers that settle
    /// the payout outside the engine.
    pub fn close(
        &mut self,
        id: RecordId,
        caller: &AccountId,
        now: Timestamp,
    ) -> Result<Settlement, StakeError> {
        let settlement = self.entitlement(id, caller, now)?;
        self.mark_withdrawn(id, now)?;
        Ok(settlement)
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    pub fn get(&self, id: RecordId) -> Result<&StakeRecord, StakeError> {
        self.records
            .get(&id)
            .ok_or_else(|| StakeError::RecordNotFound(id.to_string()))
    }

    pub fn records(&self) -> impl Iterator<Item = &StakeRecord> {
        self.records.values()
    }

    pub fn records_of<'a>(&'a self, owner: &'a AccountId) -> impl Iterator<Item = &'a StakeRecord> + 'a {
        self.records.values().filter(move |r| r.owner == *owner)
    }

    /// Sum of principal over active records.
    pub fn active_principal(&self) -> Result<Balance, StakeError> {
        self.records
            .values()
            .filter(|r| r.is_active())
            .try_fold(0u128, |acc, r| {
                acc.checked_add(r.principal).ok_or(StakeError::ArithmeticOverflow)
            })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Deposit-side checks shared by the ledger and the engine, so the engine can
/// reject bad terms before any funds move.
pub fn validate_terms(
    principal: Balance,
    lock_duration: DurationSecs,
    now: Timestamp,
    config: &GlobalConfig,
) -> Result<(), StakeError> {
    if principal == 0 {
        return Err(StakeError::ZeroPrincipal);
    }
    if lock_duration == 0 {
        return Err(StakeError::ZeroDuration);
    }
    if lock_duration > config.max_duration {
        return Err(StakeError::LockTooLong {
            requested: lock_duration,
            max_secs: config.max_duration,
        });
    }
    // The unlock timestamp must be representable.
    i64::try_from(lock_duration)
        .ok()
        .and_then(|lock| now.checked_add(lock))
        .ok_or(StakeError::ArithmeticOverflow)?;
    Ok(())
}
