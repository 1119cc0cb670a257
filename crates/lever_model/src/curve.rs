//! Shared constant-product swap step.
//!
//! Both pool variants price trades through [`swap_step`]; they differ only in
//! which totals they feed it (real reserves vs. real + virtual) and in how
//! they commit the result back to real reserves.

use crate::{AmmError, Result};

/// Outcome of one constant-product step, not yet committed to any pool.
///
/// `new_in`/`new_out` are the post-trade totals on the input and output
/// sides; `amount_out` is `old_out - new_out`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwapStep {
    pub new_in: f64,
    pub new_out: f64,
    pub amount_out: f64,
}

/// Price `amount_in` against totals `(total_in, total_out)` holding the
/// caller's invariant `k` constant:
///
/// - `new_in  = total_in + amount_in`
/// - `new_out = k / new_in`
/// - `amount_out = total_out - new_out`
///
/// The single-sided pool passes the freshly recomputed product of its real
/// reserves; the bonded pool passes its construction-time constant. For any
/// finite positive input, `amount_out` stays strictly below `total_out`
/// (output asymptotically approaches the full reserve but never reaches it).
///
/// # Errors
/// * `InvalidAmount` if `amount_in` is non-positive or non-finite
/// * `ArithmeticDomain` if `k` or the totals are degenerate, or the step
///   produces a non-finite or non-positive post-trade reserve
pub fn swap_step(k: f64, total_in: f64, total_out: f64, amount_in: f64) -> Result<SwapStep> {
    if !(amount_in > 0.0) || !amount_in.is_finite() {
        return Err(AmmError::InvalidAmount);
    }
    if !(total_in > 0.0) || !(total_out > 0.0) || !total_in.is_finite() || !total_out.is_finite() {
        return Err(AmmError::ArithmeticDomain);
    }
    if !(k > 0.0) || !k.is_finite() {
        return Err(AmmError::ArithmeticDomain);
    }

    let new_in = total_in + amount_in;
    let new_out = k / new_in;
    let amount_out = total_out - new_out;

    if !new_in.is_finite() || !new_out.is_finite() {
        return Err(AmmError::ArithmeticDomain);
    }
    // new_out > 0 holds algebraically; a rounding collapse to zero would
    // poison every later k computation, so it is rejected here.
    if new_out <= 0.0 || amount_out < 0.0 {
        return Err(AmmError::ArithmeticDomain);
    }

    Ok(SwapStep {
        new_in,
        new_out,
        amount_out,
    })
}

/// Reject non-finite values before they are committed to pool state.
pub(crate) fn ensure_finite(value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AmmError::ArithmeticDomain)
    }
}
