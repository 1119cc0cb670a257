//! Lever Model - Constant product AMM (x·y=k) with leveraged position overlays
//!
//! This crate contains the pure pricing model: two pool variants built on the
//! same constant-product step, a position ledger for the single-sided margin
//! variant, and the closed-form liquidation threshold solver.
//!
//! Two variants, deliberately kept as distinct types (their liquidation
//! economics differ and must not be conflated):
//!
//! - [`MarginAmm`]: leverage is synthesized per-trade by pricing the full
//!   notional against real reserves; the borrowed amount reappears only as a
//!   temporary reinflation when the position is closed.
//! - [`BondedAmm`]: both assets carry persistent virtual-reserve offsets that
//!   accumulate across leveraged opens and are never removed; the invariant
//!   is fixed over `(real + virtual)` totals at construction.
//!
//! Everything here is synchronous and side-effect free apart from mutating
//! the pool value itself. No I/O, no clocks, no fees.

pub mod bonded;
pub mod curve;
pub mod liquidation;
pub mod margin;
pub mod position;

pub use bonded::BondedAmm;
pub use liquidation::threshold;
pub use margin::MarginAmm;
pub use position::{Position, PositionBook, Side};

use serde::Serialize;

/// Error types for pool operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AmmError {
    /// Non-positive or non-finite amount, or leverage below 1.
    #[error("invalid amount: inputs must be positive and finite, leverage at least 1")]
    InvalidAmount,
    /// Close requested for a user with no open position.
    #[error("no open position for user")]
    NoSuchPosition,
    /// Open requested for a user whose previous position is still open.
    #[error("position already open for user")]
    PositionAlreadyOpen,
    /// An operation would produce a non-finite value or drive a real
    /// reserve to zero or below. The pool is left untouched.
    #[error("arithmetic left the representable domain")]
    ArithmeticDomain,
}

pub type Result<T> = core::result::Result<T, AmmError>;

/// Point-in-time view of a pool, serializable for reporting.
///
/// For [`MarginAmm`] the virtual offsets are always zero and `k` is the
/// recomputed spot product; for [`BondedAmm`] `k` is the fixed construction
/// invariant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PoolSnapshot {
    pub reserve_a: f64,
    pub reserve_b: f64,
    pub virtual_a: f64,
    pub virtual_b: f64,
    pub k: f64,
}
