/// ─── Lockstake Protocol Constants ───────────────────────────────────────────
///
/// Interest terms are quoted as a whole annual percentage and accrue linearly
/// per second over a fixed 365-day year. Leap years are not modelled.

// ── Time ─────────────────────────────────────────────────────────────────────

pub const SECONDS_PER_DAY: u64 = 86_400;

/// 365 × 86_400. The interest year, with no leap-year adjustment.
pub const SECONDS_PER_YEAR: u64 = 365 * SECONDS_PER_DAY;

// ── Interest ─────────────────────────────────────────────────────────────────

/// Rates are whole percents; 100 is one times the principal per year.
pub const PERCENT_DENOMINATOR: u64 = 100;

/// Denominator of the accrual formula: `100 × SECONDS_PER_YEAR`.
pub const INTEREST_DENOMINATOR: u128 = PERCENT_DENOMINATOR as u128 * SECONDS_PER_YEAR as u128;

// ── Deployment defaults ──────────────────────────────────────────────────────

/// Annual interest percent used when deployment parameters omit one.
pub const DEFAULT_ANNUAL_INTEREST_PERCENT: u64 = 10;

/// Maximum lock duration used when deployment parameters omit one (365 days).
pub const DEFAULT_MAX_DURATION_SECS: u64 = 365 * SECONDS_PER_DAY;
