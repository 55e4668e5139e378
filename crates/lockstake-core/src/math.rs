//! Integer-only fixed-point primitives.
//!
//! Every interest amount in the protocol goes through [`mul_div`]. Products
//! are formed in 256 bits so that two u128 operands near `u128::MAX` never
//! overflow, and quotients always truncate toward zero: the protocol never
//! pays out more than it mathematically owes.

use uint::construct_uint;

use crate::error::StakeError;

construct_uint! {
    /// 256-bit unsigned integer used as the intermediate for `a × b`.
    pub struct U256(4);
}

/// `floor(a × b / denominator)`.
///
/// # Errors
/// * `DivisionByZero` if `denominator == 0`.
/// * `ArithmeticOverflow` if the product or the quotient does not fit.
pub fn mul_div(a: u128, b: u128, denominator: u128) -> Result<u128, StakeError> {
    if denominator == 0 {
        return Err(StakeError::DivisionByZero);
    }
    let product = U256::from(a)
        .checked_mul(U256::from(b))
        .ok_or(StakeError::ArithmeticOverflow)?;
    let quotient = product / U256::from(denominator);
    if quotient > U256::from(u128::MAX) {
        return Err(StakeError::ArithmeticOverflow);
    }
    Ok(quotient.as_u128())
}

pub fn checked_add(a: u128, b: u128) -> Result<u128, StakeError> {
    a.checked_add(b).ok_or(StakeError::ArithmeticOverflow)
}

pub fn checked_mul(a: u128, b: u128) -> Result<u128, StakeError> {
    a.checked_mul(b).ok_or(StakeError::ArithmeticOverflow)
}
