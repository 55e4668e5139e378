use thiserror::Error;

use crate::types::Timestamp;

#[derive(Debug, Error)]
pub enum StakeError {
    // ── Deposit errors ───────────────────────────────────────────────────────
    #[error("principal must be greater than zero")]
    ZeroPrincipal,

    #[error("lock duration must be greater than zero")]
    ZeroDuration,

    #[error("lock duration too long: requested {requested} seconds, maximum {max_secs}")]
    LockTooLong { requested: u64, max_secs: u64 },

    // ── Withdrawal errors ────────────────────────────────────────────────────
    #[error("stake record not found: {0}")]
    RecordNotFound(String),

    #[error("stake record already withdrawn")]
    AlreadyWithdrawn,

    #[error("lock period not yet elapsed (unlocks at {unlock_at})")]
    LockNotElapsed { unlock_at: Timestamp },

    // ── Auth errors ──────────────────────────────────────────────────────────
    #[error("caller is not authorized for this operation")]
    Unauthorized,

    #[error("owner must be a non-null identity")]
    InvalidOwner,

    #[error("invalid account id: {0}")]
    InvalidAccountId(String),

    // ── Arithmetic ───────────────────────────────────────────────────────────
    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    #[error("division by zero")]
    DivisionByZero,

    // ── Asset transfer ───────────────────────────────────────────────────────
    #[error("asset transfer failed: {0}")]
    TransferFailed(#[from] TransferError),

    #[error("{amount} held in custody with no stake record: {reason}")]
    FundsStranded { amount: u128, reason: String },

    // ── Serialization / storage ──────────────────────────────────────────────
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(String),

    // ── General ──────────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Failure reported by an asset transfer port.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("insufficient funds: need {need}, have {have}")]
    InsufficientFunds { need: u128, have: u128 },

    #[error("transfer rejected: {0}")]
    Rejected(String),
}
