//! dicelab - martingale dice strategy simulator
//!
//! ```sh
//! dicelab calc --balance 20 --bet-div 500 --profit-mult 100
//! dicelab simulate -n 1000 --win-increase 78 --loss-reset 5 --buffer 25
//! dicelab verify <server-seed> <client-seed> --nonce 0 -n 10
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dicelab::application::simulation::{ExecutionMode, TrialAggregator, aggregate};
use dicelab::config::Config;
use dicelab::domain::ports::RollSource;
use dicelab::domain::simulation::{AggregateStats, CancelToken, CyclePlan, SimParams};
use dicelab::infrastructure::ProgressLog;
use dicelab::infrastructure::rng::ProvablyFairRng;
use dicelab::infrastructure::shutdown::cancel_on_ctrl_c;
use std::time::Instant;
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Martingale dice strategy simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct StrategyArgs {
    /// Starting balance
    #[arg(long, default_value_t = 20.0)]
    balance: f64,

    /// Base bet is balance / bet_div
    #[arg(long, default_value_t = 500.0)]
    bet_div: f64,

    /// Cycle profit target as a multiple of the base bet
    #[arg(long, default_value_t = 100.0)]
    profit_mult: f64,

    /// Bet increase after a win, in percent
    #[arg(long = "win-increase", default_value_t = 78.0)]
    win_increase_pct: f64,

    /// Consecutive losses before the bet resets
    #[arg(long = "loss-reset", default_value_t = 5)]
    loss_reset: u32,

    /// Multiplier headroom, in percent
    #[arg(long = "buffer", default_value_t = 25.0)]
    buffer_pct: f64,
}

impl StrategyArgs {
    fn to_params(&self, n_trials: usize) -> Result<SimParams> {
        SimParams::from_percentages(
            self.balance,
            self.bet_div,
            self.profit_mult,
            self.win_increase_pct,
            self.loss_reset,
            self.buffer_pct,
            n_trials,
        )
        .context("Invalid strategy parameters")
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the first cycle's bet, target and win chance
    Calc {
        #[command(flatten)]
        strategy: StrategyArgs,
    },
    /// Run many independent trials and print aggregate statistics
    Simulate {
        #[command(flatten)]
        strategy: StrategyArgs,

        /// Number of trials
        #[arg(short = 'n', long, default_value_t = 100)]
        trials: usize,

        /// Run trials one after another on this thread
        #[arg(long)]
        sequential: bool,

        /// Headline statistic for AvgHigh (mean, median)
        #[arg(long)]
        headline: Option<String>,

        /// Roll generator (provably_fair, fast)
        #[arg(long)]
        rng: Option<String>,

        /// Also print the statistics as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the rolls produced by a seed pair
    Verify {
        server_seed: String,
        client_seed: String,

        #[arg(long, default_value_t = 0)]
        nonce: u64,

        /// Number of rolls to print
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Calc { strategy } => {
            let params = strategy.to_params(1)?;
            print_cycle_plan(&params, &CyclePlan::derive(params.starting_balance, &params));
        }
        Commands::Simulate {
            strategy,
            trials,
            sequential,
            headline,
            rng,
            json,
        } => {
            let mut config = Config::from_env()?;
            if let Some(headline) = headline {
                config.simulation.headline = headline.parse()?;
            }
            if let Some(rng) = rng {
                config.simulation.rng = rng.parse()?;
            }

            let params = strategy.to_params(trials)?;
            let mode = if sequential {
                ExecutionMode::Sequential
            } else {
                ExecutionMode::Parallel
            };
            let aggregator = TrialAggregator::new(config.aggregator_settings(mode));

            info!(
                "Simulating {} trials ({:?}, rng={}, headline={})",
                trials, mode, config.simulation.rng, config.simulation.headline
            );

            let cancel = CancelToken::new();
            let watcher = cancel_on_ctrl_c(cancel.clone());
            let started = Instant::now();

            let results = tokio::task::spawn_blocking(move || {
                let mut progress = ProgressLog::new("simulate");
                aggregator.run_many(&params, &cancel, |done, total| {
                    progress.update_counts(done, total);
                })
            })
            .await
            .context("Simulation task panicked")??;
            watcher.abort();

            if results.len() < trials {
                warn!("Cancelled: statistics cover {}/{} trials", results.len(), trials);
            }

            let stats = aggregate(&results, config.simulation.headline);
            print_stats(&params, &stats, started.elapsed().as_secs_f64());
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&stats).context("Failed to serialize statistics")?
                );
            }
        }
        Commands::Verify {
            server_seed,
            client_seed,
            nonce,
            count,
        } => {
            let mut rng = ProvablyFairRng::new(server_seed, client_seed, nonce)?;
            println!("{:>10} | {:>10}", "Nonce", "Roll");
            println!("{}", "-".repeat(23));
            for (i, roll) in rng.next_rolls(count).into_iter().enumerate() {
                println!("{:>10} | {:>10.4}", nonce + i as u64, roll);
            }
        }
    }

    Ok(())
}

fn print_cycle_plan(params: &SimParams, plan: &CyclePlan) {
    println!("{}", "=".repeat(50));
    println!("🎲 CYCLE PLAN");
    println!("{}", "=".repeat(50));
    println!("  Balance:        {:.8}", params.starting_balance);
    println!("  Multiplier:     {:.4}x", plan.multiplier);
    println!("  Win Chance:     {:.4}%", plan.win_chance * 100.0);
    println!("  Roll Under:     {:.4}", plan.win_threshold());
    println!("  Base Bet:       {:.8}", plan.bet);
    println!("  Profit Stop:    {:.8}", plan.profit_stop);
    println!("  Target:         {:.8}", plan.target);
    println!("{}", "=".repeat(50));
}

fn print_stats(params: &SimParams, stats: &AggregateStats, elapsed_secs: f64) {
    println!("\n{}", "=".repeat(50));
    println!("📊 SIMULATION RESULTS ({} trials, {:.1}s)", stats.trials, elapsed_secs);
    println!("{}", "=".repeat(50));
    println!("  Avg High:       {:.8}", stats.avg_high);
    println!("  Std Dev:        {:.8}", stats.std_high);
    println!("  Max High:       {:.8}", stats.max_high);
    println!("  Gain vs Start:  {:.8}", stats.avg_high - params.starting_balance);
    println!("  Avg Cycles:     {:.2}", stats.avg_cycles);
    println!("  Avg Rounds:     {:.1}", stats.avg_rounds);
    println!("  Cycle Success:  {:.2}%", stats.cycle_success_rate);
    println!("  Bust Rate:      {:.2}%", stats.bust_rate);
    println!("{}\n", "=".repeat(50));
}
