//! Narrated end-to-end scenarios.

use anyhow::{Context, Result};
use colored::Colorize;
use lever_model::{threshold, BondedAmm, MarginAmm, Side};

fn print_reserves(label: &str, reserve_a: f64, reserve_b: f64) {
    println!(
        "{} A = {:.8}, B = {:.8}",
        label.bright_cyan(),
        reserve_a,
        reserve_b
    );
}

/// Two leveraged longs opened against the single-sided pool, each pushed to
/// its computed liquidation target by outside supply and closed there.
pub fn multi_position(
    reserve_a: f64,
    reserve_b: f64,
    bob: (f64, f64),
    alice: (f64, f64),
    json: bool,
) -> Result<()> {
    println!(
        "{}",
        "=== Multi-Position Liquidation Scenario ===".bright_green().bold()
    );

    let mut pool = MarginAmm::new(reserve_a, reserve_b).context("invalid initial reserves")?;
    let (a, b) = pool.reserves();
    print_reserves("Initial reserves:", a, b);

    // --- Bob opens ---
    let (bob_deposit, bob_leverage) = bob;
    let k_before_bob = pool.k();
    let bob_amount = pool
        .open("Bob", Side::Long, bob_deposit, bob_leverage)
        .context("opening Bob's position")?;

    println!(
        "\n{} deposit = {} at {}x leverage",
        "Bob opens leveraged position:".bright_green(),
        bob_deposit,
        bob_leverage
    );
    println!("{} {:.8}", "  Counter-asset received:".bright_cyan(), bob_amount);
    let (a, b) = pool.reserves();
    print_reserves("Reserves after Bob:", a, b);

    let bob_target = threshold(k_before_bob, a, b, bob_amount);
    println!("{} {:.8}", "Bob's liquidation target (B reserve):".bright_cyan(), bob_target);

    // --- Alice opens ---
    let (alice_deposit, alice_leverage) = alice;
    let k_before_alice = pool.k();
    let alice_amount = pool
        .open("Alice", Side::Long, alice_deposit, alice_leverage)
        .context("opening Alice's position")?;

    println!(
        "\n{} deposit = {} at {}x leverage",
        "Alice opens leveraged position:".bright_green(),
        alice_deposit,
        alice_leverage
    );
    println!("{} {:.8}", "  Counter-asset received:".bright_cyan(), alice_amount);
    let (a, b) = pool.reserves();
    print_reserves("Reserves after Alice:", a, b);

    let alice_target = threshold(k_before_alice, a, b, alice_amount);
    println!(
        "{} {:.8}",
        "Alice's liquidation target (B reserve):".bright_cyan(),
        alice_target
    );

    println!("\n{}", "Open positions:".bright_green());
    for (user, pos) in pool.positions() {
        println!(
            "  {} {:?} deposit = {}, leverage = {}x, holds {:.8} B",
            user.bright_cyan(),
            pos.side,
            pos.deposit,
            pos.leverage,
            pos.counter_amount
        );
    }

    // --- Liquidate in target order ---
    for (user, target) in [("Bob", bob_target), ("Alice", alice_target)] {
        let (_, b) = pool.reserves();
        if !target.is_finite() {
            println!("\n{} {user} has no finite target", "Skipping:".yellow());
            continue;
        }
        if b < target {
            let supply = target - b;
            pool.swap_b_for_a(supply)
                .with_context(|| format!("pushing B reserve to {user}'s target"))?;
            println!(
                "\n{} {:.8} B supplied to reach {:.8} ({}'s target)",
                "Market swap:".bright_green(),
                supply,
                target,
                user
            );
            let (a, b) = pool.reserves();
            print_reserves("Reserves after market swap:", a, b);
        } else {
            println!("\n{} target already reached for {user}", "No swap needed:".yellow());
        }

        let payout = pool
            .close(user)
            .with_context(|| format!("closing {user}'s position"))?;
        println!("\n{} {user}", "Liquidated:".bright_green().bold());
        println!("{} {:.8}", "  Net payout (A):".bright_cyan(), payout);
        let (a, b) = pool.reserves();
        print_reserves("Reserves after liquidation:", a, b);
    }

    println!("\n{} {:.8}", "Final invariant k:".bright_cyan(), pool.k());

    if json {
        println!("{}", serde_json::to_string_pretty(&pool.snapshot())?);
    }
    Ok(())
}

/// Dual-sided pool: leveraged opens bond virtual liquidity permanently and
/// every operation preserves the construction-time invariant.
pub fn bonded(reserve_a: f64, reserve_b: f64, json: bool) -> Result<()> {
    println!(
        "{}",
        "=== Bonded Virtual-Liquidity Scenario ===".bright_green().bold()
    );

    let mut pool =
        BondedAmm::new(reserve_a, reserve_b, 0.0, 0.0).context("invalid initial reserves")?;
    println!("{} {:.8}", "Fixed invariant k:".bright_cyan(), pool.k());
    let (a, b) = pool.reserves();
    print_reserves("Initial reserves:", a, b);

    let first = pool
        .leverage_long(10.0, 5.0)
        .context("opening first leveraged long")?;
    println!("\n{} 10 collateral at 5x", "Leveraged long:".bright_green());
    println!("{} {:.8}", "  Position amount (B):".bright_cyan(), first);
    let (va, vb) = pool.virtual_offsets();
    println!("{} A = {:.8}, B = {:.8}", "Virtual offsets:".bright_cyan(), va, vb);
    let (a, b) = pool.reserves();
    print_reserves("Real reserves:", a, b);

    let second = pool
        .leverage_long(10.0, 2.0)
        .context("opening second leveraged long")?;
    println!("\n{} 10 collateral at 2x", "Leveraged long:".bright_green());
    println!("{} {:.8}", "  Position amount (B):".bright_cyan(), second);
    let (va, vb) = pool.virtual_offsets();
    println!("{} A = {:.8}, B = {:.8}", "Virtual offsets:".bright_cyan(), va, vb);
    let (a, b) = pool.reserves();
    print_reserves("Real reserves:", a, b);

    let out = pool.swap_b_for_a(25.0).context("spot swap")?;
    println!("\n{} 25 B in, {:.8} A out", "Spot swap:".bright_green(), out);
    let (a, b) = pool.reserves();
    print_reserves("Real reserves:", a, b);

    // The offsets are bonded for good; only the fixed k is preserved, and
    // it is preserved exactly.
    let (ta, tb) = pool.totals();
    println!(
        "\n{} ({:.8} + virtual) x ({:.8} + virtual) = {:.8}",
        "Invariant check:".bright_cyan(),
        a,
        b,
        ta * tb
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&pool.snapshot())?);
    }
    Ok(())
}
