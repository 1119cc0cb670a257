//! Single-sided margin pool.
//!
//! Leverage is synthesized per-trade: an open prices the full notional
//! through the spot curve while only the real deposit enters the real
//! reserve, and a close temporarily reinflates the collateral-side reserve
//! by the borrowed amount to settle. Nothing virtual persists between
//! operations, so `k()` is always the plain product of real reserves.

use log::debug;

use crate::curve::{ensure_finite, swap_step};
use crate::position::{Position, PositionBook, Side};
use crate::{AmmError, PoolSnapshot, Result};

/// Constant-product pool with a leveraged-position overlay.
///
/// Owns both the reserves and the ledger of open positions; it is the sole
/// mutator of either. Every operation either fully commits or leaves the
/// pool untouched.
#[derive(Debug, Clone)]
pub struct MarginAmm {
    reserve_a: f64,
    reserve_b: f64,
    book: PositionBook,
}

impl MarginAmm {
    /// Create a pool from initial real reserves. Both must be positive and
    /// finite.
    pub fn new(reserve_a: f64, reserve_b: f64) -> Result<Self> {
        if !(reserve_a > 0.0) || !(reserve_b > 0.0) || !reserve_a.is_finite() || !reserve_b.is_finite()
        {
            return Err(AmmError::InvalidAmount);
        }
        Ok(Self {
            reserve_a,
            reserve_b,
            book: PositionBook::new(),
        })
    }

    /// Current invariant, recomputed fresh from real reserves.
    ///
    /// Drifts with floating-point rounding across long swap sequences;
    /// callers treating it as exact must apply their own tolerance.
    pub fn k(&self) -> f64 {
        self.reserve_a * self.reserve_b
    }

    pub fn reserves(&self) -> (f64, f64) {
        (self.reserve_a, self.reserve_b)
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            reserve_a: self.reserve_a,
            reserve_b: self.reserve_b,
            virtual_a: 0.0,
            virtual_b: 0.0,
            k: self.k(),
        }
    }

    /// Open position for `user`, if any.
    pub fn position(&self, user: &str) -> Option<&Position> {
        self.book.get(user)
    }

    /// Iterate over all open positions.
    pub fn positions(&self) -> impl Iterator<Item = (&str, &Position)> {
        self.book.iter()
    }

    pub fn open_position_count(&self) -> usize {
        self.book.len()
    }

    /// Spot swap A in, B out. Returns the B amount produced.
    pub fn swap_a_for_b(&mut self, amount_in: f64) -> Result<f64> {
        let step = swap_step(self.k(), self.reserve_a, self.reserve_b, amount_in)?;
        self.reserve_a = step.new_in;
        self.reserve_b = step.new_out;
        debug!(
            "spot swap a->b: in={amount_in} out={} reserves=({}, {})",
            step.amount_out, self.reserve_a, self.reserve_b
        );
        Ok(step.amount_out)
    }

    /// Spot swap B in, A out. Returns the A amount produced.
    pub fn swap_b_for_a(&mut self, amount_in: f64) -> Result<f64> {
        let step = swap_step(self.k(), self.reserve_b, self.reserve_a, amount_in)?;
        self.reserve_b = step.new_in;
        self.reserve_a = step.new_out;
        debug!(
            "spot swap b->a: in={amount_in} out={} reserves=({}, {})",
            step.amount_out, self.reserve_a, self.reserve_b
        );
        Ok(step.amount_out)
    }

    /// Open a leveraged position.
    ///
    /// The full notional (`deposit * leverage`) is priced through the curve
    /// against current real reserves; only the real deposit enters the
    /// collateral-side reserve, while the counter-side reserve takes the
    /// full notional's price impact. Returns the counter-asset amount the
    /// position holds.
    ///
    /// # Errors
    /// * `InvalidAmount` on non-positive deposit or `leverage < 1`
    /// * `PositionAlreadyOpen` if `user` already has one outstanding
    pub fn open(&mut self, user: &str, side: Side, deposit: f64, leverage: f64) -> Result<f64> {
        if !(deposit > 0.0) || !deposit.is_finite() {
            return Err(AmmError::InvalidAmount);
        }
        if !(leverage >= 1.0) || !leverage.is_finite() {
            return Err(AmmError::InvalidAmount);
        }
        if self.book.contains(user) {
            return Err(AmmError::PositionAlreadyOpen);
        }

        let notional = deposit * leverage;
        let borrowed = notional - deposit;

        let (collateral_reserve, counter_reserve) = match side {
            Side::Long => (self.reserve_a, self.reserve_b),
            Side::Short => (self.reserve_b, self.reserve_a),
        };

        // The full notional is priced against the pre-open invariant.
        let k = collateral_reserve * counter_reserve;
        let step = swap_step(k, collateral_reserve, counter_reserve, notional)?;
        let new_collateral = ensure_finite(collateral_reserve + deposit)?;

        match side {
            Side::Long => {
                self.reserve_a = new_collateral;
                self.reserve_b = step.new_out;
            }
            Side::Short => {
                self.reserve_b = new_collateral;
                self.reserve_a = step.new_out;
            }
        }

        self.book.insert(
            user,
            Position {
                side,
                deposit,
                leverage,
                borrowed,
                counter_amount: step.amount_out,
            },
        )?;

        debug!(
            "open {user}: side={side:?} deposit={deposit} leverage={leverage} \
             borrowed={borrowed} counter={} reserves=({}, {})",
            step.amount_out, self.reserve_a, self.reserve_b
        );
        Ok(step.amount_out)
    }

    /// Close `user`'s position and settle against the pool.
    ///
    /// The borrowed notional is reintroduced as virtual liquidity on the
    /// collateral side for this settlement only, the position's held
    /// counter-amount is swapped back against that inflated pool, and the
    /// borrow is repaid out of the proceeds. The returned payout is signed:
    /// a loss deeper than the deposit comes back negative and is not
    /// clamped.
    ///
    /// # Errors
    /// * `NoSuchPosition` if `user` has nothing open
    /// * `ArithmeticDomain` if settlement would empty the collateral-side
    ///   reserve or produce a non-finite value (pool left untouched)
    pub fn close(&mut self, user: &str) -> Result<f64> {
        let pos = *self.book.get(user).ok_or(AmmError::NoSuchPosition)?;

        let (collateral_reserve, counter_reserve) = match pos.side {
            Side::Long => (self.reserve_a, self.reserve_b),
            Side::Short => (self.reserve_b, self.reserve_a),
        };

        let inflated = ensure_finite(collateral_reserve + pos.borrowed)?;
        // Swap the held counter-amount back against the reinflated pool,
        // under the invariant that inflation defines for this settlement.
        let k_virtual = inflated * counter_reserve;
        let step = swap_step(k_virtual, counter_reserve, inflated, pos.counter_amount)?;
        let payout = ensure_finite(step.amount_out - pos.borrowed)?;

        let new_collateral = ensure_finite(collateral_reserve - payout)?;
        let new_counter = step.new_in;
        if new_collateral <= 0.0 {
            return Err(AmmError::ArithmeticDomain);
        }

        match pos.side {
            Side::Long => {
                self.reserve_a = new_collateral;
                self.reserve_b = new_counter;
            }
            Side::Short => {
                self.reserve_b = new_collateral;
                self.reserve_a = new_counter;
            }
        }
        self.book.remove(user)?;

        debug!(
            "close {user}: payout={payout} reserves=({}, {})",
            self.reserve_a, self.reserve_b
        );
        Ok(payout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    #[test]
    fn test_spot_swap_preserves_k() {
        let mut pool = MarginAmm::new(1000.0, 1000.0).unwrap();
        let k_before = pool.k();
        let out = pool.swap_a_for_b(50.0).unwrap();
        assert!(out > 0.0 && out < 1000.0);
        assert!((pool.k() - k_before).abs() < 1e-6);
    }

    #[test]
    fn test_swap_rejects_non_positive() {
        let mut pool = MarginAmm::new(1000.0, 1000.0).unwrap();
        assert_eq!(pool.swap_a_for_b(0.0), Err(AmmError::InvalidAmount));
        assert_eq!(pool.swap_b_for_a(-1.0), Err(AmmError::InvalidAmount));
        // Failed swaps leave reserves untouched.
        assert_eq!(pool.reserves(), (1000.0, 1000.0));
    }

    #[test]
    fn test_open_regression_scenario() {
        // Baseline from the 1000/1000 pool: 10 @ 5x prices a 50 notional,
        // so B drops to 1e6/1050 and only the 10 deposit lands in A.
        let mut pool = MarginAmm::new(1000.0, 1000.0).unwrap();
        let received = pool.open("bob", Side::Long, 10.0, 5.0).unwrap();

        assert!((received - 47.619_047_619_047_59).abs() < TOL);
        let (a, b) = pool.reserves();
        assert!((a - 1010.0).abs() < TOL);
        assert!((b - 952.380_952_380_952_4).abs() < TOL);

        let pos = pool.position("bob").unwrap();
        assert_eq!(pos.borrowed, 40.0);
        assert_eq!(pos.deposit, 10.0);
        assert_eq!(pos.counter_amount, received);
    }

    #[test]
    fn test_open_leverage_one_matches_spot_swap() {
        let mut leveraged = MarginAmm::new(1000.0, 1000.0).unwrap();
        let mut spot = MarginAmm::new(1000.0, 1000.0).unwrap();

        let via_open = leveraged.open("u", Side::Long, 25.0, 1.0).unwrap();
        let via_swap = spot.swap_a_for_b(25.0).unwrap();
        assert!((via_open - via_swap).abs() < TOL);
        assert_eq!(leveraged.position("u").unwrap().borrowed, 0.0);
    }

    #[test]
    fn test_open_amplifies_with_leverage() {
        let mut out_prev = 0.0;
        for (i, lev) in [1.0, 2.0, 5.0, 10.0].iter().enumerate() {
            let mut pool = MarginAmm::new(1000.0, 1000.0).unwrap();
            let out = pool.open("u", Side::Long, 10.0, *lev).unwrap();
            if i > 0 {
                assert!(out > out_prev, "leverage {lev} did not amplify");
            }
            out_prev = out;
        }
    }

    #[test]
    fn test_open_rejects_bad_inputs() {
        let mut pool = MarginAmm::new(1000.0, 1000.0).unwrap();
        assert_eq!(
            pool.open("u", Side::Long, 0.0, 2.0),
            Err(AmmError::InvalidAmount)
        );
        assert_eq!(
            pool.open("u", Side::Long, 10.0, 0.5),
            Err(AmmError::InvalidAmount)
        );
        assert_eq!(
            pool.open("u", Side::Long, f64::NAN, 2.0),
            Err(AmmError::InvalidAmount)
        );
        assert_eq!(pool.reserves(), (1000.0, 1000.0));
    }

    #[test]
    fn test_double_open_rejected_without_mutation() {
        let mut pool = MarginAmm::new(1000.0, 1000.0).unwrap();
        pool.open("bob", Side::Long, 10.0, 5.0).unwrap();
        let reserves = pool.reserves();
        assert_eq!(
            pool.open("bob", Side::Long, 5.0, 2.0),
            Err(AmmError::PositionAlreadyOpen)
        );
        assert_eq!(pool.reserves(), reserves);
    }

    #[test]
    fn test_immediate_close_is_exact_inverse() {
        // With no intervening market activity the close settlement exactly
        // inverts the open: the payout returns precisely the deposit and
        // the pool returns to its starting state. Zero market movement is
        // never a profit.
        let mut pool = MarginAmm::new(1000.0, 1000.0).unwrap();
        pool.open("bob", Side::Long, 10.0, 5.0).unwrap();
        let payout = pool.close("bob").unwrap();

        assert!((payout - 10.0).abs() < TOL);
        let (a, b) = pool.reserves();
        assert!((a - 1000.0).abs() < TOL);
        assert!((b - 1000.0).abs() < TOL);
        assert!(pool.position("bob").is_none());
    }

    #[test]
    fn test_close_after_adverse_move_loses() {
        let mut pool = MarginAmm::new(1000.0, 1000.0).unwrap();
        pool.open("bob", Side::Long, 10.0, 5.0).unwrap();
        // Market dumps B into the pool: B gets cheaper, Bob's long suffers.
        pool.swap_b_for_a(300.0).unwrap();
        let payout = pool.close("bob").unwrap();
        assert!(payout < 10.0);
    }

    #[test]
    fn test_close_payout_can_go_negative() {
        let mut pool = MarginAmm::new(1000.0, 1000.0).unwrap();
        pool.open("bob", Side::Long, 10.0, 5.0).unwrap();
        // A violent enough move pushes losses past the deposit; the signed
        // payout surfaces that without clamping.
        pool.swap_b_for_a(2000.0).unwrap();
        let payout = pool.close("bob").unwrap();
        assert!(payout < 0.0);
    }

    #[test]
    fn test_close_absent_position() {
        let mut pool = MarginAmm::new(1000.0, 1000.0).unwrap();
        assert_eq!(pool.close("ghost"), Err(AmmError::NoSuchPosition));
    }

    #[test]
    fn test_short_side_mirrors_long() {
        let mut long_pool = MarginAmm::new(1000.0, 800.0).unwrap();
        let mut short_pool = MarginAmm::new(800.0, 1000.0).unwrap();

        let long_out = long_pool.open("u", Side::Long, 10.0, 3.0).unwrap();
        let short_out = short_pool.open("u", Side::Short, 10.0, 3.0).unwrap();
        assert!((long_out - short_out).abs() < TOL);

        let (la, lb) = long_pool.reserves();
        let (sa, sb) = short_pool.reserves();
        assert!((la - sb).abs() < TOL);
        assert!((lb - sa).abs() < TOL);

        let lp = long_pool.close("u").unwrap();
        let sp = short_pool.close("u").unwrap();
        assert!((lp - sp).abs() < TOL);
    }

    #[test]
    fn test_new_rejects_degenerate_reserves() {
        assert!(MarginAmm::new(0.0, 1000.0).is_err());
        assert!(MarginAmm::new(1000.0, -1.0).is_err());
        assert!(MarginAmm::new(f64::INFINITY, 1000.0).is_err());
    }
}
