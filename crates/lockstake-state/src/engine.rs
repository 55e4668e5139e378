use std::sync::{Mutex, MutexGuard};

use lockstake_core::config::GlobalConfig;
use lockstake_core::error::StakeError;
use lockstake_core::params::DeployParams;
use lockstake_core::record::{Settlement, StakeRecord};
use lockstake_core::types::{AccountId, Balance, DurationSecs, RecordId, Timestamp};
use tracing::{info, warn};

use crate::access::AccessControl;
use crate::db::StakeDb;
use crate::ledger::{validate_terms, StakeLedger};
use crate::transfer::{AssetPort, AssetTransferPort};

// ── Engine state ──────────────────────────────────────────────────────────────

/// Everything an operation may touch. Guarded as a unit.
struct EngineState<P> {
    config: GlobalConfig,
    ledger: StakeLedger,
    port: P,
}

// ── StakingEngine ─────────────────────────────────────────────────────────────

/// The staking state machine.
///
/// Each public operation runs to completion under a single lock, so
/// operations are strictly ordered and either fully apply or leave no trace.
/// Time enters only through the `now` argument.
pub struct StakingEngine<P: AssetTransferPort = AssetPort> {
    state: Mutex<EngineState<P>>,
}

impl<P: AssetTransferPort> StakingEngine<P> {
    pub fn new(
        owner: AccountId,
        annual_interest_percent: u64,
        max_duration: DurationSecs,
        port: P,
    ) -> Result<Self, StakeError> {
        let config = GlobalConfig::new(owner, annual_interest_percent, max_duration)?;
        info!(
            owner = %config.owner,
            rate = config.annual_interest_percent,
            max_duration = config.max_duration,
            "staking engine initialised"
        );
        Ok(Self::from_state(config, StakeLedger::new(), port))
    }

    pub(crate) fn from_state(config: GlobalConfig, ledger: StakeLedger, port: P) -> Self {
        Self { state: Mutex::new(EngineState { config, ledger, port }) }
    }

    fn lock(&self) -> Result<MutexGuard<'_, EngineState<P>>, StakeError> {
        self.state
            .lock()
            .map_err(|_| StakeError::Other("engine state lock poisoned".into()))
    }

    // ── Deposit ──────────────────────────────────────────────────────────────

    /// Stake `amount` for the current `max_duration` at the current rate.
    ///
    /// If the pull succeeds but the record cannot be opened, the pulled amount
    /// is pushed back and the opening error is returned. Should that refund
    /// fail too, the call returns [`StakeError::FundsStranded`]: the amount
    /// sits in custody with no record, and the operator must return it.
    pub fn deposit(
        &self,
        caller: &AccountId,
        amount: Balance,
        now: Timestamp,
    ) -> Result<RecordId, StakeError> {
        let mut guard = self.lock()?;
        let lock = guard.config.max_duration;
        Self::deposit_locked(&mut guard, caller, amount, lock, now)
    }

    /// Stake `amount` for `lock_duration` seconds (at most `max_duration`).
    pub fn deposit_with_lock(
        &self,
        caller: &AccountId,
        amount: Balance,
        lock_duration: DurationSecs,
        now: Timestamp,
    ) -> Result<RecordId, StakeError> {
        let mut guard = self.lock()?;
        Self::deposit_locked(&mut guard, caller, amount, lock_duration, now)
    }

    fn deposit_locked(
        state: &mut EngineState<P>,
        caller: &AccountId,
        amount: Balance,
        lock_duration: DurationSecs,
        now: Timestamp,
    ) -> Result<RecordId, StakeError> {
        // Reject bad terms before any funds move.
        validate_terms(amount, lock_duration, now, &state.config)?;

        if let Err(e) = state.port.pull(caller, amount) {
            warn!(owner = %caller, amount, error = %e, "deposit pull failed");
            return Err(e.into());
        }

        let record = match state
            .ledger
            .open_with_lock(caller.clone(), amount, lock_duration, now, &state.config)
        {
            Ok(record) => record,
            Err(e) => {
                // Funds are in custody but no record exists: hand them back.
                if let Err(refund) = state.port.push(caller, amount) {
                    warn!(owner = %caller, amount, error = %refund, cause = %e, "deposit refund failed");
                    return Err(StakeError::FundsStranded {
                        amount,
                        reason: format!("{e}; refund failed: {refund}"),
                    });
                }
                warn!(owner = %caller, amount, error = %e, "deposit refunded");
                return Err(e);
            }
        };

        info!(
            record = %record.id,
            owner = %caller,
            amount,
            rate = record.rate_at_deposit,
            unlock_at = record.unlock_at(),
            "stake opened"
        );
        Ok(record.id)
    }

    // ── Withdraw ─────────────────────────────────────────────────────────────

    /// Pay out principal plus interest and close the record.
    ///
    /// The record is marked withdrawn only after the payout succeeds; a
    /// failed transfer leaves it `Active` so the owner can retry.
    pub fn withdraw(
        &self,
        caller: &AccountId,
        id: RecordId,
        now: Timestamp,
    ) -> Result<Settlement, StakeError> {
        let mut guard = self.lock()?;
        let state = &mut *guard;

        let settlement = state.ledger.entitlement(id, caller, now)?;

        if let Err(e) = state.port.push(&settlement.owner, settlement.payout) {
            warn!(record = %id, owner = %caller, payout = settlement.payout, error = %e, "withdrawal push failed");
            return Err(e.into());
        }
        state.ledger.mark_withdrawn(id, now)?;

        info!(
            record = %id,
            owner = %caller,
            principal = settlement.principal,
            interest = settlement.interest,
            "stake withdrawn"
        );
        Ok(settlement)
    }

    // ── Administration ───────────────────────────────────────────────────────

    pub fn set_annual_interest_percent(
        &self,
        caller: &AccountId,
        value: u64,
    ) -> Result<(), StakeError> {
        let mut guard = self.lock()?;
        AccessControl::new(&mut guard.config).set_annual_interest_percent(caller, value)?;
        info!(rate = value, "annual interest percent updated");
        Ok(())
    }

    pub fn set_max_duration(&self, caller: &AccountId, value: DurationSecs) -> Result<(), StakeError> {
        let mut guard = self.lock()?;
        AccessControl::new(&mut guard.config).set_max_duration(caller, value)?;
        info!(max_duration = value, "max duration updated");
        Ok(())
    }

    pub fn transfer_ownership(
        &self,
        caller: &AccountId,
        new_owner: AccountId,
    ) -> Result<(), StakeError> {
        let mut guard = self.lock()?;
        AccessControl::new(&mut guard.config).transfer_ownership(caller, new_owner)?;
        info!(from = %caller, to = %guard.config.owner, "ownership transferred");
        Ok(())
    }

    /// Run `f` against the asset port, e.g. to fund an interest reserve.
    pub fn with_port<R>(&self, f: impl FnOnce(&mut P) -> R) -> Result<R, StakeError> {
        let mut guard = self.lock()?;
        Ok(f(&mut guard.port))
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    pub fn stake_of(&self, id: RecordId) -> Result<StakeRecord, StakeError> {
        Ok(self.lock()?.ledger.get(id)?.clone())
    }

    pub fn config(&self) -> Result<GlobalConfig, StakeError> {
        Ok(self.lock()?.config.clone())
    }

    /// All records owned by `owner`, active and withdrawn, in id order.
    pub fn stakes_of(&self, owner: &AccountId) -> Result<Vec<StakeRecord>, StakeError> {
        Ok(self.lock()?.ledger.records_of(owner).cloned().collect())
    }

    /// Interest accrued so far, whether or not the lock has elapsed.
    pub fn pending_interest(&self, id: RecordId, now: Timestamp) -> Result<Balance, StakeError> {
        let guard = self.lock()?;
        let record = guard.ledger.get(id)?;
        if !record.is_active() {
            return Ok(0);
        }
        record.accrued_at(now)
    }

    /// Principal held across all active records.
    pub fn total_staked(&self) -> Result<Balance, StakeError> {
        self.lock()?.ledger.active_principal()
    }

    pub fn asset_balance(&self) -> Result<Balance, StakeError> {
        Ok(self.lock()?.port.balance())
    }

    // ── Persistence ──────────────────────────────────────────────────────────

    /// Replace the snapshot in `db` with this engine's config and ledger.
    ///
    /// Records left over from an earlier, different engine are dropped, so
    /// [`restore`](Self::restore) yields exactly the state saved here.
    pub fn save(&self, db: &StakeDb) -> Result<(), StakeError> {
        let guard = self.lock()?;
        let records: Vec<StakeRecord> = guard.ledger.records().cloned().collect();
        db.write_snapshot(&guard.config, &records, guard.ledger.next_id())?;
        info!(records = guard.ledger.len(), "engine snapshot saved");
        Ok(())
    }

    /// Rebuild an engine from a snapshot written by [`save`](Self::save).
    pub fn restore(db: &StakeDb, port: P) -> Result<Self, StakeError> {
        let config = db
            .get_config()?
            .ok_or_else(|| StakeError::Storage("no engine config in database".into()))?;
        let records = db.records()?;
        let next_id = db.get_next_id()?.unwrap_or(0);
        let ledger = StakeLedger::from_parts(records, next_id);
        info!(records = ledger.len(), owner = %config.owner, "engine snapshot restored");
        Ok(Self::from_state(config, ledger, port))
    }
}

impl StakingEngine<AssetPort> {
    /// Build an engine from deployment parameters.
    ///
    /// The asset port is derived from `params.asset`; `transport` only moves
    /// the funds. An engine built here always settles in the asset the
    /// parameters name.
    pub fn from_params(
        params: &DeployParams,
        transport: Box<dyn AssetTransferPort>,
    ) -> Result<Self, StakeError> {
        params.validate()?;
        let port = AssetPort::from_kind(&params.asset, transport);
        Self::new(
            params.owner.clone(),
            params.annual_interest_percent,
            params.max_duration_secs,
            port,
        )
    }
}
