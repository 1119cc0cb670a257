//! Leveraged position records and the per-pool ledger.

use std::collections::HashMap;

use serde::Serialize;

use crate::{AmmError, Result};

/// Which asset the trader deposited as collateral.
///
/// `Long` deposits asset A and holds synthesized asset B exposure;
/// `Short` is the mirror image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    Long,
    Short,
}

/// Economic parameters of one open leveraged position.
///
/// Created at open, read-only until close, removed at close. There is no
/// top-up or partial close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub side: Side,
    /// Real collateral contributed at open.
    pub deposit: f64,
    /// Leverage factor, at least 1.
    pub leverage: f64,
    /// Synthetic amount priced into the open: `deposit * (leverage - 1)`.
    pub borrowed: f64,
    /// Counter-asset amount the position holds, fixed at open time.
    pub counter_amount: f64,
}

/// Ledger of open positions keyed by user identifier.
///
/// Owned by the pool that settles against it; no shared or ambient state.
#[derive(Debug, Clone, Default)]
pub struct PositionBook {
    inner: HashMap<String, Position>,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly opened position.
    ///
    /// A second open for the same user while one is outstanding would
    /// discard an unsettled position, so it is rejected.
    pub fn insert(&mut self, user: &str, position: Position) -> Result<()> {
        if self.inner.contains_key(user) {
            return Err(AmmError::PositionAlreadyOpen);
        }
        self.inner.insert(user.to_owned(), position);
        Ok(())
    }

    /// Remove and return the position being closed.
    pub fn remove(&mut self, user: &str) -> Result<Position> {
        self.inner.remove(user).ok_or(AmmError::NoSuchPosition)
    }

    pub fn get(&self, user: &str) -> Option<&Position> {
        self.inner.get(user)
    }

    pub fn contains(&self, user: &str) -> bool {
        self.inner.contains_key(user)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Position)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Position {
        Position {
            side: Side::Long,
            deposit: 10.0,
            leverage: 5.0,
            borrowed: 40.0,
            counter_amount: 47.6,
        }
    }

    #[test]
    fn test_double_open_rejected() {
        let mut book = PositionBook::new();
        book.insert("bob", sample()).unwrap();
        assert_eq!(
            book.insert("bob", sample()),
            Err(AmmError::PositionAlreadyOpen)
        );
        // The original position survives the failed insert.
        assert_eq!(book.get("bob").unwrap().leverage, 5.0);
    }

    #[test]
    fn test_remove_absent() {
        let mut book = PositionBook::new();
        assert_eq!(book.remove("alice"), Err(AmmError::NoSuchPosition));
    }

    #[test]
    fn test_lifecycle() {
        let mut book = PositionBook::new();
        book.insert("bob", sample()).unwrap();
        assert_eq!(book.len(), 1);
        let pos = book.remove("bob").unwrap();
        assert_eq!(pos.borrowed, 40.0);
        assert!(book.is_empty());
    }
}
