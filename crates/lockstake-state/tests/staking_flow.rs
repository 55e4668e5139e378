//! End-to-end staking flows against the public engine API.
//!
//! Run with:
//!   cargo test -p lockstake-state --test staking_flow

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use lockstake_core::constants::{INTEREST_DENOMINATOR, SECONDS_PER_DAY, SECONDS_PER_YEAR};
use lockstake_core::error::{StakeError, TransferError};
use lockstake_core::params::{AssetKind, DeployParams};
use lockstake_core::record::StakeStatus;
use lockstake_core::types::{AccountId, Balance, RecordId};
use lockstake_state::{AssetTransferPort, InMemoryAsset, StakeDb, StakingEngine};
use proptest::prelude::*;

const NOW: i64 = 1_700_000_000;
const DAY: i64 = SECONDS_PER_DAY as i64;
const YEAR: i64 = SECONDS_PER_YEAR as i64;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn admin() -> AccountId {
    AccountId::derive("admin")
}

fn random_account() -> AccountId {
    AccountId::from_bytes(rand::random())
}

/// Shared-handle port so tests can break and repair transfers from outside
/// the engine.
#[derive(Clone, Default)]
struct Switchboard {
    asset: Arc<Mutex<InMemoryAsset>>,
    pulls_ok: Arc<AtomicBool>,
    pushes_ok: Arc<AtomicBool>,
}

impl Switchboard {
    fn new() -> Self {
        let s = Self::default();
        s.set_pulls(true);
        s.set_pushes(true);
        s
    }

    fn set_pulls(&self, ok: bool) {
        self.pulls_ok.store(ok, Ordering::SeqCst);
    }

    fn set_pushes(&self, ok: bool) {
        self.pushes_ok.store(ok, Ordering::SeqCst);
    }

    fn credit(&self, account: &AccountId, amount: Balance) {
        self.asset.lock().unwrap().credit(account, amount).unwrap();
    }

    fn fund_custody(&self, amount: Balance) {
        self.asset.lock().unwrap().fund_custody(amount).unwrap();
    }

    fn balance_of(&self, account: &AccountId) -> Balance {
        self.asset.lock().unwrap().balance_of(account)
    }
}

impl AssetTransferPort for Switchboard {
    fn pull(&mut self, from: &AccountId, amount: Balance) -> Result<(), TransferError> {
        if !self.pulls_ok.load(Ordering::SeqCst) {
            return Err(TransferError::Rejected("token contract reverted".into()));
        }
        self.asset.lock().unwrap().pull(from, amount)
    }

    fn push(&mut self, to: &AccountId, amount: Balance) -> Result<(), TransferError> {
        if !self.pushes_ok.load(Ordering::SeqCst) {
            return Err(TransferError::Rejected("token contract reverted".into()));
        }
        self.asset.lock().unwrap().push(to, amount)
    }

    fn balance(&self) -> Balance {
        self.asset.lock().unwrap().balance()
    }
}

fn setup(rate: u64, max_duration: u64) -> (StakingEngine<Switchboard>, Switchboard) {
    let board = Switchboard::new();
    board.fund_custody(1_000_000);
    let engine = StakingEngine::new(admin(), rate, max_duration, board.clone()).unwrap();
    (engine, board)
}

// ── Worked examples ───────────────────────────────────────────────────────────

#[test]
fn one_year_at_ten_percent_pays_1100() {
    let (engine, board) = setup(10, SECONDS_PER_YEAR);
    let alice = random_account();
    board.credit(&alice, 1_000);

    let id = engine.deposit(&alice, 1_000, NOW).unwrap();
    assert_eq!(board.balance_of(&alice), 0);

    let s = engine.withdraw(&alice, id, NOW + YEAR).unwrap();
    assert_eq!(s.interest, 100);
    assert_eq!(s.payout, 1_100);
    assert_eq!(board.balance_of(&alice), 1_100);
}

#[test]
fn withdrawal_at_day_100_is_rejected_and_changes_nothing() {
    let (engine, board) = setup(10, SECONDS_PER_YEAR);
    let alice = random_account();
    board.credit(&alice, 1_000);
    let id = engine.deposit(&alice, 1_000, NOW).unwrap();
    let custody = engine.asset_balance().unwrap();

    let err = engine.withdraw(&alice, id, NOW + 100 * DAY).unwrap_err();
    assert!(matches!(err, StakeError::LockNotElapsed { unlock_at } if unlock_at == NOW + YEAR));
    assert_eq!(engine.asset_balance().unwrap(), custody);
    assert_eq!(board.balance_of(&alice), 0);
    assert_eq!(engine.stake_of(id).unwrap().status, StakeStatus::Active);
}

// ── Properties ────────────────────────────────────────────────────────────────

#[test]
fn config_changes_do_not_touch_existing_records() {
    let (engine, board) = setup(10, SECONDS_PER_YEAR);
    let alice = random_account();
    board.credit(&alice, 2_000);

    let old = engine.deposit(&alice, 1_000, NOW).unwrap();
    engine.set_annual_interest_percent(&admin(), 50).unwrap();
    engine.set_max_duration(&admin(), 30 * SECONDS_PER_DAY).unwrap();
    let new = engine.deposit(&alice, 1_000, NOW).unwrap();

    let old_rec = engine.stake_of(old).unwrap();
    assert_eq!(old_rec.rate_at_deposit, 10);
    assert_eq!(old_rec.lock_duration, SECONDS_PER_YEAR);

    let new_rec = engine.stake_of(new).unwrap();
    assert_eq!(new_rec.rate_at_deposit, 50);
    assert_eq!(new_rec.lock_duration, 30 * SECONDS_PER_DAY);

    // The old record is still locked for a full year at 10%.
    assert!(matches!(
        engine.withdraw(&alice, old, NOW + 30 * DAY).unwrap_err(),
        StakeError::LockNotElapsed { .. }
    ));
    assert_eq!(engine.withdraw(&alice, old, NOW + YEAR).unwrap().interest, 100);
}

#[test]
fn second_withdrawal_rejected() {
    let (engine, board) = setup(10, SECONDS_PER_YEAR);
    let alice = random_account();
    board.credit(&alice, 1_000);
    let id = engine.deposit(&alice, 1_000, NOW).unwrap();
    engine.withdraw(&alice, id, NOW + YEAR).unwrap();

    assert!(matches!(
        engine.withdraw(&alice, id, NOW + 2 * YEAR).unwrap_err(),
        StakeError::AlreadyWithdrawn
    ));
    assert_eq!(board.balance_of(&alice), 1_100);
}

#[test]
fn failed_pull_leaves_no_record() {
    let (engine, board) = setup(10, SECONDS_PER_YEAR);
    let alice = random_account();
    board.credit(&alice, 1_000);
    board.set_pulls(false);

    let err = engine.deposit(&alice, 1_000, NOW).unwrap_err();
    assert!(matches!(err, StakeError::TransferFailed(TransferError::Rejected(_))));
    assert!(engine.stakes_of(&alice).unwrap().is_empty());
    assert_eq!(engine.total_staked().unwrap(), 0);

    // Insufficient funds is also a transfer failure with no record.
    board.set_pulls(true);
    let err = engine.deposit(&alice, 5_000, NOW).unwrap_err();
    assert!(matches!(
        err,
        StakeError::TransferFailed(TransferError::InsufficientFunds { need: 5_000, have: 1_000 })
    ));
    assert!(engine.stakes_of(&alice).unwrap().is_empty());
}

#[test]
fn failed_push_keeps_record_active_until_retry() {
    let (engine, board) = setup(10, SECONDS_PER_YEAR);
    let alice = random_account();
    board.credit(&alice, 1_000);
    let id = engine.deposit(&alice, 1_000, NOW).unwrap();

    board.set_pushes(false);
    let err = engine.withdraw(&alice, id, NOW + YEAR).unwrap_err();
    assert!(matches!(err, StakeError::TransferFailed(_)));
    assert!(engine.stake_of(id).unwrap().is_active());
    assert_eq!(board.balance_of(&alice), 0);

    board.set_pushes(true);
    let s = engine.withdraw(&alice, id, NOW + YEAR).unwrap();
    assert_eq!(s.payout, 1_100);
    assert_eq!(board.balance_of(&alice), 1_100);
    assert!(!engine.stake_of(id).unwrap().is_active());
}

#[test]
fn insolvent_custody_is_a_retryable_transfer_failure() {
    let board = Switchboard::new();
    let engine = StakingEngine::new(admin(), 10, SECONDS_PER_YEAR, board.clone()).unwrap();
    let alice = random_account();
    board.credit(&alice, 1_000);
    let id = engine.deposit(&alice, 1_000, NOW).unwrap();

    // Custody holds only the principal; interest is unfunded.
    let err = engine.withdraw(&alice, id, NOW + YEAR).unwrap_err();
    assert!(matches!(
        err,
        StakeError::TransferFailed(TransferError::InsufficientFunds { need: 1_100, have: 1_000 })
    ));
    assert!(engine.stake_of(id).unwrap().is_active());

    board.fund_custody(100);
    assert_eq!(engine.withdraw(&alice, id, NOW + YEAR).unwrap().payout, 1_100);
}

// ── Ownership & access ────────────────────────────────────────────────────────

#[test]
fn only_record_owner_may_withdraw() {
    let (engine, board) = setup(10, SECONDS_PER_YEAR);
    let alice = random_account();
    let mallory = random_account();
    board.credit(&alice, 1_000);
    let id = engine.deposit(&alice, 1_000, NOW).unwrap();

    assert!(matches!(
        engine.withdraw(&mallory, id, NOW + YEAR).unwrap_err(),
        StakeError::Unauthorized
    ));
    assert_eq!(board.balance_of(&mallory), 0);
    assert!(engine.stake_of(id).unwrap().is_active());
}

#[test]
fn ownership_transfer_moves_admin_rights() {
    let (engine, _) = setup(10, SECONDS_PER_YEAR);
    let heir = random_account();

    assert!(matches!(
        engine.transfer_ownership(&admin(), AccountId::NULL).unwrap_err(),
        StakeError::InvalidOwner
    ));
    engine.transfer_ownership(&admin(), heir.clone()).unwrap();
    assert_eq!(engine.config().unwrap().owner, heir);

    assert!(matches!(
        engine.set_annual_interest_percent(&admin(), 1).unwrap_err(),
        StakeError::Unauthorized
    ));
    engine.set_annual_interest_percent(&heir, 1).unwrap();
    assert_eq!(engine.config().unwrap().annual_interest_percent, 1);
}

#[test]
fn construction_rejects_null_owner_and_zero_duration() {
    assert!(matches!(
        StakingEngine::new(AccountId::NULL, 10, 60, InMemoryAsset::new()).err(),
        Some(StakeError::InvalidOwner)
    ));
    assert!(matches!(
        StakingEngine::new(admin(), 10, 0, InMemoryAsset::new()).err(),
        Some(StakeError::ZeroDuration)
    ));
}

// ── Multiple records ──────────────────────────────────────────────────────────

#[test]
fn participant_holds_independent_concurrent_records() {
    let (engine, board) = setup(10, SECONDS_PER_YEAR);
    let alice = random_account();
    board.credit(&alice, 3_000);

    let a = engine.deposit(&alice, 1_000, NOW).unwrap();
    let b = engine.deposit_with_lock(&alice, 2_000, 30 * SECONDS_PER_DAY, NOW + DAY).unwrap();
    assert_ne!(a, b);
    assert_eq!(engine.stakes_of(&alice).unwrap().len(), 2);
    assert_eq!(engine.total_staked().unwrap(), 3_000);

    // The short lock matures first; the long one is untouched by its withdrawal.
    let s = engine.withdraw(&alice, b, NOW + 31 * DAY).unwrap();
    assert_eq!(s.principal, 2_000);
    assert_eq!(s.interest, 2_000 * 10 * 30 * SECONDS_PER_DAY as u128 / INTEREST_DENOMINATOR);
    assert!(engine.stake_of(a).unwrap().is_active());
    assert_eq!(engine.total_staked().unwrap(), 1_000);
}

#[test]
fn unknown_record_reported() {
    let (engine, _) = setup(10, SECONDS_PER_YEAR);
    assert!(matches!(
        engine.withdraw(&admin(), RecordId(12345), NOW).unwrap_err(),
        StakeError::RecordNotFound(_)
    ));
}

// ── Deployment params ─────────────────────────────────────────────────────────

#[test]
fn token_engine_from_deploy_params() {
    let token = AccountId::derive("token-contract");
    let json = serde_json::json!({
        "owner": admin().to_b58(),
        "annual_interest_percent": 10,
        "max_duration_secs": SECONDS_PER_YEAR,
        "asset": { "type": "token", "contract": token.to_b58() },
    })
    .to_string();
    let params = DeployParams::from_json(&json).unwrap();

    let alice = random_account();
    let mut backing = InMemoryAsset::new();
    backing.credit(&alice, 1_000).unwrap();
    backing.fund_custody(100).unwrap();

    let engine = StakingEngine::from_params(&params, Box::new(backing)).unwrap();
    assert_eq!(
        engine.with_port(|p| p.kind()).unwrap(),
        AssetKind::Token { contract: token }
    );

    let id = engine.deposit(&alice, 1_000, NOW).unwrap();
    assert_eq!(engine.withdraw(&alice, id, NOW + YEAR).unwrap().payout, 1_100);
    assert_eq!(engine.asset_balance().unwrap(), 0);
}

// ── Persistence ───────────────────────────────────────────────────────────────

fn temp_db(name: &str) -> StakeDb {
    let dir = std::env::temp_dir().join(format!("lockstake_flow_test_{}", name));
    let _ = std::fs::remove_dir_all(&dir);
    StakeDb::open(&dir).expect("open temp db")
}

#[test]
fn snapshot_restores_config_records_and_id_sequence() {
    let db = temp_db("snapshot");
    let (engine, board) = setup(10, SECONDS_PER_YEAR);
    let alice = random_account();
    board.credit(&alice, 3_000);

    let first = engine.deposit(&alice, 1_000, NOW).unwrap();
    let second = engine.deposit(&alice, 2_000, NOW).unwrap();
    engine.withdraw(&alice, first, NOW + YEAR).unwrap();
    engine.set_annual_interest_percent(&admin(), 25).unwrap();
    engine.save(&db).unwrap();

    let restored = StakingEngine::restore(&db, board.clone()).unwrap();
    assert_eq!(restored.config().unwrap(), engine.config().unwrap());
    assert_eq!(restored.stake_of(first).unwrap(), engine.stake_of(first).unwrap());
    assert_eq!(restored.stake_of(second).unwrap(), engine.stake_of(second).unwrap());

    board.credit(&alice, 10);
    let third = restored.deposit(&alice, 10, NOW).unwrap();
    assert!(third > second);
    assert_eq!(restored.stake_of(third).unwrap().rate_at_deposit, 25);
}

#[test]
fn saving_a_fresh_engine_replaces_an_older_snapshot() {
    let db = temp_db("overwrite");
    let (old, board) = setup(10, SECONDS_PER_YEAR);
    let alice = random_account();
    board.credit(&alice, 3_000);
    for amount in [1_000, 1_000, 1_000] {
        old.deposit(&alice, amount, NOW).unwrap();
    }
    old.save(&db).unwrap();

    let new_owner = random_account();
    let fresh = StakingEngine::new(new_owner.clone(), 3, 30 * SECONDS_PER_DAY, board.clone()).unwrap();
    fresh.save(&db).unwrap();

    let restored = StakingEngine::restore(&db, board.clone()).unwrap();
    assert_eq!(restored.config().unwrap(), fresh.config().unwrap());
    assert_eq!(restored.config().unwrap().owner, new_owner);
    assert!(restored.stakes_of(&alice).unwrap().is_empty());
    assert_eq!(restored.total_staked().unwrap(), 0);
    assert!(matches!(
        restored.stake_of(RecordId(0)).unwrap_err(),
        StakeError::RecordNotFound(_)
    ));
}

#[test]
fn restore_from_empty_db_fails() {
    let db = temp_db("empty_restore");
    assert!(matches!(
        StakingEngine::restore(&db, InMemoryAsset::new()).err(),
        Some(StakeError::Storage(_))
    ));
}

// ── Concurrency ───────────────────────────────────────────────────────────────

#[test]
fn concurrent_callers_are_serialized() {
    let (engine, board) = setup(10, SECONDS_PER_YEAR);
    let engine = Arc::new(engine);
    let stakers: Vec<AccountId> = (0..8).map(|_| random_account()).collect();
    for s in &stakers {
        board.credit(s, 100);
    }

    let handles: Vec<_> = stakers
        .iter()
        .cloned()
        .map(|who| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                (0..10)
                    .map(|_| engine.deposit(&who, 10, NOW).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids: Vec<RecordId> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 80);
    assert_eq!(engine.total_staked().unwrap(), 800);

    // Racing withdrawals of the same record: exactly one wins.
    let id = engine.stakes_of(&stakers[0]).unwrap()[0].id;
    let racers: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let who = stakers[0].clone();
            thread::spawn(move || engine.withdraw(&who, id, NOW + YEAR).is_ok())
        })
        .collect();
    let wins = racers.into_iter().map(|h| h.join().unwrap()).filter(|ok| *ok).count();
    assert_eq!(wins, 1);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn payout_never_exceeds_exact_interest(
        principal in 1u64..,
        rate in 0u64..1_000,
        lock_days in 1u64..=365,
        late_days in 0u64..1_000,
    ) {
        let (engine, board) = setup(rate, 365 * SECONDS_PER_DAY);
        board.fund_custody(u64::MAX as u128 * 20);
        let alice = AccountId::derive("prop-alice");
        board.credit(&alice, principal as u128);

        let lock = lock_days * SECONDS_PER_DAY;
        let id = engine.deposit_with_lock(&alice, principal as u128, lock, NOW).unwrap();
        let s = engine.withdraw(&alice, id, NOW + (lock + late_days * SECONDS_PER_DAY) as i64).unwrap();

        let exact = principal as u128 * rate as u128 * lock as u128;
        prop_assert!(s.interest * INTEREST_DENOMINATOR <= exact);
        prop_assert!(exact - s.interest * INTEREST_DENOMINATOR < INTEREST_DENOMINATOR);
        prop_assert_eq!(s.payout, principal as u128 + s.interest);
    }
}
