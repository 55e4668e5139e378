//! lockstake-state
//!
//! The staking state machine and everything it owns: the owner gate over the
//! global config, the record ledger, the asset transfer port, the engine that
//! orchestrates them, and sled-backed snapshots.

pub mod access;
pub mod db;
pub mod engine;
pub mod ledger;
pub mod query;
pub mod transfer;

pub use access::AccessControl;
pub use db::StakeDb;
pub use engine::StakingEngine;
pub use ledger::StakeLedger;
pub use query::StakeQuery;
pub use transfer::{AssetPort, AssetTransferPort, InMemoryAsset};
