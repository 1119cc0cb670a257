//! Closed-form liquidation threshold.
//!
//! A leveraged open captures an invariant spread: the invariant recorded
//! just before the open strictly exceeds the spot product afterwards for as
//! long as the position stays open. The threshold is the counter-asset
//! reserve level at which returning the position's held amount to the pool
//! would exactly restore the captured invariant, i.e. the exact solution of
//!
//! ```text
//! x_t * y_t                     = k_now
//! x_t * (y_t + position_amount) = k_before
//! ```
//!
//! which gives `y_t = position_amount * k_now / (k_before - k_now)`.

/// Counter-asset reserve level at which the position becomes due for
/// liquidation, or `f64::INFINITY` when no finite positive crossing exists
/// (`k_before <= k_now`, or degenerate inputs).
///
/// Pure function; never panics, never returns NaN or a negative value.
/// Callers compare the returned target against the live counter reserve to
/// decide when to trigger closure.
pub fn threshold(k_before: f64, reserve_a: f64, reserve_b: f64, position_amount: f64) -> f64 {
    if !k_before.is_finite()
        || !reserve_a.is_finite()
        || !reserve_b.is_finite()
        || !position_amount.is_finite()
        || position_amount <= 0.0
    {
        return f64::INFINITY;
    }

    let k_now = reserve_a * reserve_b;
    if !k_now.is_finite() || k_now <= 0.0 || k_before <= k_now {
        return f64::INFINITY;
    }

    let target = position_amount * k_now / (k_before - k_now);
    if target.is_finite() && target > 0.0 {
        target
    } else {
        f64::INFINITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::margin::MarginAmm;
    use crate::position::Side;

    #[test]
    fn test_regression_target() {
        // 1000/1000 pool, one 10 @ 5x open: k_before = 1e6, spot product
        // afterwards is 1010 * (1e6/1050).
        let mut pool = MarginAmm::new(1000.0, 1000.0).unwrap();
        let k_before = pool.k();
        let amount = pool.open("bob", Side::Long, 10.0, 5.0).unwrap();

        let (a, b) = pool.reserves();
        let target = threshold(k_before, a, b, amount);
        assert!((target - 1202.380_952_380_951_4).abs() < 1e-6);
    }

    #[test]
    fn test_target_restores_captured_invariant() {
        // At the target, adding the held amount back to the counter reserve
        // reproduces the pre-open invariant exactly: that is the defining
        // system of equations.
        let mut pool = MarginAmm::new(1000.0, 1000.0).unwrap();
        let k_before = pool.k();
        let amount = pool.open("bob", Side::Long, 10.0, 5.0).unwrap();
        let (a, b) = pool.reserves();
        let k_now = a * b;

        let y_t = threshold(k_before, a, b, amount);
        let x_t = k_now / y_t;
        assert!((x_t * (y_t + amount) - k_before).abs() < 1e-6);
    }

    #[test]
    fn test_sentinel_when_not_liquidatable() {
        // No open position: k_before equals the spot product.
        assert_eq!(threshold(1_000_000.0, 1000.0, 1000.0, 50.0), f64::INFINITY);
        // k_before below spot.
        assert_eq!(threshold(900_000.0, 1000.0, 1000.0, 50.0), f64::INFINITY);
    }

    #[test]
    fn test_sentinel_on_degenerate_inputs() {
        assert_eq!(threshold(f64::NAN, 1000.0, 1000.0, 50.0), f64::INFINITY);
        assert_eq!(threshold(1e6, f64::INFINITY, 1000.0, 50.0), f64::INFINITY);
        assert_eq!(threshold(1e6, 1000.0, 900.0, 0.0), f64::INFINITY);
        assert_eq!(threshold(1e6, 1000.0, 900.0, -4.0), f64::INFINITY);
        assert_eq!(threshold(1e6, -1000.0, 900.0, 5.0), f64::INFINITY);
    }

    #[test]
    fn test_never_nan_or_negative() {
        for &kb in &[0.0, 1.0, 1e6, 1e300, f64::INFINITY, f64::NAN] {
            for &amt in &[-1.0, 0.0, 1.0, 1e12, f64::NAN] {
                let t = threshold(kb, 1000.0, 900.0, amt);
                assert!(!t.is_nan());
                assert!(t >= 0.0);
            }
        }
    }
}
