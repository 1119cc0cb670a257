//! One-shot quotes for scripting.

use anyhow::{Context, Result};
use colored::Colorize;
use lever_model::{self as model, MarginAmm};

use crate::Direction;

/// Price a single spot swap against a fresh pool and report the outcome.
pub fn swap(reserve_a: f64, reserve_b: f64, amount: f64, direction: Direction, json: bool) -> Result<()> {
    let mut pool = MarginAmm::new(reserve_a, reserve_b).context("invalid reserves")?;
    let amount_out = match direction {
        Direction::AToB => pool.swap_a_for_b(amount),
        Direction::BToA => pool.swap_b_for_a(amount),
    }
    .context("swap rejected")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&pool.snapshot())?);
        return Ok(());
    }

    println!("{}", "=== Spot Swap Quote ===".bright_green().bold());
    println!("{} {}", "Amount in:".bright_cyan(), amount);
    println!("{} {:.8}", "Amount out:".bright_cyan(), amount_out);
    let (a, b) = pool.reserves();
    println!("{} A = {:.8}, B = {:.8}", "Reserves after:".bright_cyan(), a, b);
    println!("{} {:.8}", "Invariant k:".bright_cyan(), pool.k());
    Ok(())
}

/// Compute the liquidation-threshold reserve level for a position.
pub fn threshold(k_before: f64, reserve_a: f64, reserve_b: f64, amount: f64) -> Result<()> {
    let target = model::threshold(k_before, reserve_a, reserve_b, amount);

    println!("{}", "=== Liquidation Threshold ===".bright_green().bold());
    println!("{} {}", "k before open:".bright_cyan(), k_before);
    println!("{} {}", "Current k:".bright_cyan(), reserve_a * reserve_b);
    if target.is_finite() {
        println!("{} {:.8}", "Target B reserve:".bright_cyan(), target);
    } else {
        println!(
            "{} {}",
            "Target B reserve:".bright_cyan(),
            "infinity (not liquidatable at current invariants)".yellow()
        );
    }
    Ok(())
}
