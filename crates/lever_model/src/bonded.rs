//! Dual-sided bonded pool.
//!
//! Both assets carry persistent virtual-reserve offsets. Leveraged opens
//! bond the borrowed amount into the virtual offset permanently (nothing
//! removes it), and the invariant is fixed once at construction over the
//! `(real + virtual)` totals. Modelling perpetually bonded virtual
//! liquidity is the point of this variant; it must not be collapsed into
//! the margin pool's temporary-reinflation behavior.

use log::debug;

use crate::curve::{ensure_finite, swap_step};
use crate::{AmmError, PoolSnapshot, Result};

/// Constant-product pool whose invariant spans real plus virtual reserves.
#[derive(Debug, Clone)]
pub struct BondedAmm {
    reserve_a: f64,
    reserve_b: f64,
    virtual_a: f64,
    virtual_b: f64,
    /// Fixed at construction; every operation preserves it.
    k: f64,
}

impl BondedAmm {
    /// Create a pool from initial real reserves and virtual offsets.
    /// Reserves must be positive, offsets non-negative, all finite.
    pub fn new(reserve_a: f64, reserve_b: f64, virtual_a: f64, virtual_b: f64) -> Result<Self> {
        let all_finite = reserve_a.is_finite()
            && reserve_b.is_finite()
            && virtual_a.is_finite()
            && virtual_b.is_finite();
        if !all_finite || !(reserve_a > 0.0) || !(reserve_b > 0.0) || virtual_a < 0.0 || virtual_b < 0.0
        {
            return Err(AmmError::InvalidAmount);
        }
        let k = ensure_finite((reserve_a + virtual_a) * (reserve_b + virtual_b))?;
        Ok(Self {
            reserve_a,
            reserve_b,
            virtual_a,
            virtual_b,
            k,
        })
    }

    /// The construction-time invariant. Constant for the pool's lifetime.
    pub fn k(&self) -> f64 {
        self.k
    }

    pub fn reserves(&self) -> (f64, f64) {
        (self.reserve_a, self.reserve_b)
    }

    pub fn virtual_offsets(&self) -> (f64, f64) {
        (self.virtual_a, self.virtual_b)
    }

    /// Effective totals the curve prices against.
    pub fn totals(&self) -> (f64, f64) {
        (self.reserve_a + self.virtual_a, self.reserve_b + self.virtual_b)
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            reserve_a: self.reserve_a,
            reserve_b: self.reserve_b,
            virtual_a: self.virtual_a,
            virtual_b: self.virtual_b,
            k: self.k,
        }
    }

    /// Spot swap A in, B out, priced over the `(real + virtual)` totals
    /// under the fixed invariant. Only the real reserves move; virtual
    /// offsets are untouched.
    pub fn swap_a_for_b(&mut self, amount_in: f64) -> Result<f64> {
        let (total_a, total_b) = self.totals();
        let step = swap_step(self.k, total_a, total_b, amount_in)?;

        let new_reserve_b = ensure_finite(self.reserve_b - step.amount_out)?;
        if new_reserve_b <= 0.0 {
            return Err(AmmError::ArithmeticDomain);
        }
        self.reserve_a = ensure_finite(self.reserve_a + amount_in)?;
        self.reserve_b = new_reserve_b;

        debug!(
            "bonded swap a->b: in={amount_in} out={} reserves=({}, {}) virtual=({}, {})",
            step.amount_out, self.reserve_a, self.reserve_b, self.virtual_a, self.virtual_b
        );
        Ok(step.amount_out)
    }

    /// Spot swap B in, A out. Mirror of [`Self::swap_a_for_b`].
    pub fn swap_b_for_a(&mut self, amount_in: f64) -> Result<f64> {
        let (total_a, total_b) = self.totals();
        let step = swap_step(self.k, total_b, total_a, amount_in)?;

        let new_reserve_a = ensure_finite(self.reserve_a - step.amount_out)?;
        if new_reserve_a <= 0.0 {
            return Err(AmmError::ArithmeticDomain);
        }
        self.reserve_b = ensure_finite(self.reserve_b + amount_in)?;
        self.reserve_a = new_reserve_a;

        debug!(
            "bonded swap b->a: in={amount_in} out={} reserves=({}, {}) virtual=({}, {})",
            step.amount_out, self.reserve_a, self.reserve_b, self.virtual_a, self.virtual_b
        );
        Ok(step.amount_out)
    }

    /// Open a leveraged long: real collateral in A, borrowed amount bonded
    /// into `virtual_a` for good. Returns the synthesized B amount.
    ///
    /// Repeated opens permanently shift the effective curve; the offsets
    /// only ever grow.
    pub fn leverage_long(&mut self, collateral: f64, leverage: f64) -> Result<f64> {
        if !(collateral > 0.0) || !collateral.is_finite() {
            return Err(AmmError::InvalidAmount);
        }
        if !(leverage >= 1.0) || !leverage.is_finite() {
            return Err(AmmError::InvalidAmount);
        }

        let borrowed = collateral * (leverage - 1.0);
        let new_reserve_a = ensure_finite(self.reserve_a + collateral)?;
        let new_virtual_a = ensure_finite(self.virtual_a + borrowed)?;

        let total_a = ensure_finite(new_reserve_a + new_virtual_a)?;
        let new_total_b = ensure_finite(self.k / total_a)?;
        let position_amount = ensure_finite(self.reserve_b - new_total_b)?;
        if new_total_b <= 0.0 || position_amount < 0.0 {
            return Err(AmmError::ArithmeticDomain);
        }

        self.reserve_a = new_reserve_a;
        self.virtual_a = new_virtual_a;
        self.reserve_b = new_total_b;

        debug!(
            "leverage long: collateral={collateral} leverage={leverage} borrowed={borrowed} \
             amount={position_amount} reserves=({}, {}) virtual=({}, {})",
            self.reserve_a, self.reserve_b, self.virtual_a, self.virtual_b
        );
        Ok(position_amount)
    }

    /// Open a leveraged short: collateral in B, borrow bonded into
    /// `virtual_b`. Mirror of [`Self::leverage_long`].
    pub fn leverage_short(&mut self, collateral: f64, leverage: f64) -> Result<f64> {
        if !(collateral > 0.0) || !collateral.is_finite() {
            return Err(AmmError::InvalidAmount);
        }
        if !(leverage >= 1.0) || !leverage.is_finite() {
            return Err(AmmError::InvalidAmount);
        }

        let borrowed = collateral * (leverage - 1.0);
        let new_reserve_b = ensure_finite(self.reserve_b + collateral)?;
        let new_virtual_b = ensure_finite(self.virtual_b + borrowed)?;

        let total_b = ensure_finite(new_reserve_b + new_virtual_b)?;
        let new_total_a = ensure_finite(self.k / total_b)?;
        let position_amount = ensure_finite(self.reserve_a - new_total_a)?;
        if new_total_a <= 0.0 || position_amount < 0.0 {
            return Err(AmmError::ArithmeticDomain);
        }

        self.reserve_b = new_reserve_b;
        self.virtual_b = new_virtual_b;
        self.reserve_a = new_total_a;

        debug!(
            "leverage short: collateral={collateral} leverage={leverage} borrowed={borrowed} \
             amount={position_amount} reserves=({}, {}) virtual=({}, {})",
            self.reserve_a, self.reserve_b, self.virtual_a, self.virtual_b
        );
        Ok(position_amount)
    }
}
