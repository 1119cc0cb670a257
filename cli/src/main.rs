//! Leverpool CLI - Scenario driver for the constant-product leverage model
//!
//! Constructs pools, runs one-shot quotes and full narrated scenarios, and
//! prints pool state at each step. All pricing logic lives in `lever_model`;
//! this binary only formats its return values.

use clap::{Parser, Subcommand, ValueEnum};

mod quote;
mod scenario;

#[derive(Parser)]
#[command(name = "leverpool")]
#[command(about = "Constant-product AMM with leveraged positions - scenario driver", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbose output (state-transition logging)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Narrated end-to-end scenarios
    Scenario {
        #[command(subcommand)]
        command: ScenarioCommands,
    },

    /// One-shot quotes for scripting
    Quote {
        #[command(subcommand)]
        command: QuoteCommands,
    },
}

#[derive(Subcommand)]
enum ScenarioCommands {
    /// Two leveraged positions opened, pushed to their computed targets,
    /// and liquidated in order
    MultiPosition {
        /// Initial asset A reserve
        #[arg(long, default_value = "1000.0")]
        reserve_a: f64,

        /// Initial asset B reserve
        #[arg(long, default_value = "1000.0")]
        reserve_b: f64,

        /// First trader's deposit
        #[arg(long, default_value = "10.0")]
        bob_deposit: f64,

        /// First trader's leverage
        #[arg(long, default_value = "5.0")]
        bob_leverage: f64,

        /// Second trader's deposit
        #[arg(long, default_value = "10.0")]
        alice_deposit: f64,

        /// Second trader's leverage
        #[arg(long, default_value = "2.0")]
        alice_leverage: f64,

        /// Emit the final pool snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Dual-sided pool with persistently bonded virtual liquidity
    Bonded {
        /// Initial asset A reserve
        #[arg(long, default_value = "1000.0")]
        reserve_a: f64,

        /// Initial asset B reserve
        #[arg(long, default_value = "1000.0")]
        reserve_b: f64,

        /// Emit the final pool snapshot as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum QuoteCommands {
    /// Price a single spot swap against a fresh pool
    Swap {
        /// Asset A reserve
        #[arg(long)]
        reserve_a: f64,

        /// Asset B reserve
        #[arg(long)]
        reserve_b: f64,

        /// Amount swapped in
        #[arg(long)]
        amount: f64,

        /// Swap direction
        #[arg(long, value_enum, default_value = "a-to-b")]
        direction: Direction,

        /// Emit the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compute the liquidation-threshold reserve level for a position
    Threshold {
        /// Invariant captured before the position opened
        #[arg(long)]
        k_before: f64,

        /// Current asset A reserve
        #[arg(long)]
        reserve_a: f64,

        /// Current asset B reserve
        #[arg(long)]
        reserve_b: f64,

        /// Counter-asset amount the position holds
        #[arg(long)]
        amount: f64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Direction {
    AToB,
    BToA,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    match cli.command {
        Commands::Scenario { command } => match command {
            ScenarioCommands::MultiPosition {
                reserve_a,
                reserve_b,
                bob_deposit,
                bob_leverage,
                alice_deposit,
                alice_leverage,
                json,
            } => scenario::multi_position(
                reserve_a,
                reserve_b,
                (bob_deposit, bob_leverage),
                (alice_deposit, alice_leverage),
                json,
            ),
            ScenarioCommands::Bonded {
                reserve_a,
                reserve_b,
                json,
            } => scenario::bonded(reserve_a, reserve_b, json),
        },
        Commands::Quote { command } => match command {
            QuoteCommands::Swap {
                reserve_a,
                reserve_b,
                amount,
                direction,
                json,
            } => quote::swap(reserve_a, reserve_b, amount, direction, json),
            QuoteCommands::Threshold {
                k_before,
                reserve_a,
                reserve_b,
                amount,
            } => quote::threshold(k_before, reserve_a, reserve_b, amount),
        },
    }
}
