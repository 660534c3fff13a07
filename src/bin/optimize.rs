//! Grid Search Parameter Optimizer Binary
//!
//! Sweeps martingale parameters over range expressions, ranks every
//! combination by risk-adjusted score and exports the table.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dicelab::application::optimization::{
    CsvLayout, GridSearchOptimizer, GridSpec, OptimizationReport, OptimizeReporter,
};
use dicelab::config::Config;
use dicelab::domain::optimization::{OptParams, ResultColumn, sort_by_column};
use dicelab::domain::simulation::CancelToken;
use dicelab::infrastructure::ProgressLog;
use dicelab::infrastructure::shutdown::cancel_on_ctrl_c;
use std::io::{BufRead, IsTerminal, Write};
use std::path::Path;
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

const DEFAULT_BALANCE: f64 = 20.0;
const DEFAULT_TRIALS: usize = 10;

#[derive(Parser)]
#[command(author, version, about = "Grid Search Parameter Optimizer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Range expressions: `a,b,c`, `start-end`, `start-end;step=s` or a single value
#[derive(Args, Debug, Clone, Default)]
struct GridArgs {
    /// TOML file with the grid; command-line ranges override its entries
    #[arg(long)]
    grid_config: Option<String>,

    #[arg(long)]
    balance: Option<f64>,

    /// Trials per combination
    #[arg(long)]
    trials: Option<usize>,

    #[arg(long)]
    bet_div: Option<String>,

    #[arg(long)]
    profit_mult: Option<String>,

    /// Win increase percentages
    #[arg(long)]
    win_increase: Option<String>,

    #[arg(long)]
    loss_reset: Option<String>,

    /// Buffer percentages
    #[arg(long)]
    buffer: Option<String>,
}

impl GridArgs {
    fn resolve(&self) -> Result<OptParams> {
        let mut spec = match &self.grid_config {
            Some(path) => {
                info!("Loading parameter grid from: {}", path);
                GridSpec::load_toml(Path::new(path))?
            }
            None => GridSpec::default(),
        };

        let overrides = [
            (&self.bet_div, &mut spec.bet_div),
            (&self.profit_mult, &mut spec.profit_mult),
            (&self.win_increase, &mut spec.win_increase_pct),
            (&self.loss_reset, &mut spec.loss_reset),
            (&self.buffer, &mut spec.buffer_pct),
        ];
        for (arg, field) in overrides {
            if let Some(text) = arg {
                *field = text.clone();
            }
        }

        let params = OptParams {
            starting_balance: self
                .balance
                .or(spec.starting_balance)
                .unwrap_or(DEFAULT_BALANCE),
            trials_per_combo: self.trials.or(spec.trials_per_combo).unwrap_or(DEFAULT_TRIALS),
            grid: spec.to_grid()?,
        };
        params.validate().context("Invalid optimizer input")?;
        Ok(params)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the grid search
    Run {
        #[command(flatten)]
        grid: GridArgs,

        /// Output JSON file for results
        #[arg(short, long, default_value = "optimization_results.json")]
        output: String,

        /// Also write the table as CSV
        #[arg(long)]
        csv: Option<String>,

        /// Prefix CSV rows with StartingBalance and Trials
        #[arg(long)]
        extended: bool,

        /// Append to an existing CSV instead of overwriting it
        #[arg(long)]
        append: bool,

        /// Column to sort the table by (e.g. Score, AvgHigh, Bust%)
        #[arg(long, default_value = "Score")]
        sort_by: String,

        #[arg(long)]
        ascending: bool,

        /// Number of top results to display
        #[arg(short, long, default_value = "10")]
        top_n: usize,

        /// Skip the confirmation for very large sweeps
        #[arg(short, long)]
        yes: bool,
    },
    /// Expand and print the grid without running it
    Plan {
        #[command(flatten)]
        grid: GridArgs,
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
    let config = Config::from_env()?;
    let reporter = OptimizeReporter::new(&config.optimizer.output_dir);

    match cli.command {
        Commands::Plan { grid } => {
            let params = grid.resolve()?;
            reporter.print_grid_info(&params.grid);
            println!(
                "🔢 Total trials: {}",
                params.grid.combo_count() * params.trials_per_combo
            );
        }
        Commands::Run {
            grid,
            output,
            csv,
            extended,
            append,
            sort_by,
            ascending,
            top_n,
            yes,
        } => {
            let sort_column = ResultColumn::from_header(&sort_by)
                .with_context(|| format!("Unknown sort column: {}", sort_by))?;
            let params = grid.resolve()?;
            let combos = params.grid.combo_count();

            if combos > config.optimizer.large_sweep_threshold {
                warn!(
                    "{} combinations exceeds the large-sweep threshold of {}",
                    combos, config.optimizer.large_sweep_threshold
                );
                if !yes && !confirm_large_sweep(combos)? {
                    println!("Aborted.");
                    return Ok(());
                }
            }

            let optimizer = GridSearchOptimizer::new(config.optimizer_settings());
            reporter.print_header(&params, optimizer.worker_count(combos), &output);
            reporter.print_grid_info(&params.grid);
            println!("{}\n", "=".repeat(80));

            println!("🚀 Starting optimization...\n");
            let cancel = CancelToken::new();
            let watcher = cancel_on_ctrl_c(cancel.clone());

            let run_params = params.clone();
            let mut results = tokio::task::spawn_blocking(move || {
                let mut progress = ProgressLog::new("optimize");
                optimizer.run_optimization(&run_params, &cancel, |fraction| {
                    progress.update(fraction);
                })
            })
            .await
            .context("Optimizer task panicked")??;
            watcher.abort();

            if sort_column != ResultColumn::Score || ascending {
                sort_by_column(&mut results, sort_column, !ascending);
            }

            reporter.print_results_table(&results, top_n);
            if let Some(best) = results.iter().filter(|r| !r.failed).max_by(|a, b| a.score.total_cmp(&b.score)) {
                reporter.print_best_config(best, params.starting_balance);
            }

            if let Some(csv_file) = csv {
                let layout = if extended {
                    CsvLayout::Extended
                } else {
                    CsvLayout::Basic
                };
                reporter.export_csv(&results, &params, &csv_file, layout, append)?;
            }

            let report = OptimizationReport::new(&params, config.simulation.headline, results);
            if report.is_partial() {
                warn!(
                    "Partial results: {}/{} combinations evaluated",
                    report.combos_evaluated, report.combos_total
                );
            }
            reporter.export_json(&report, &output)?;
            println!("✅ Optimization complete!\n");
        }
    }

    Ok(())
}

/// Asks on the terminal before running a very large sweep.
fn confirm_large_sweep(combos: usize) -> Result<bool> {
    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        anyhow::bail!(
            "{} combinations is a very large sweep; rerun with --yes to confirm",
            combos
        );
    }

    print!("⚠️  {} combinations may take a long time. Continue? [y/N] ", combos);
    std::io::stdout().flush().context("Failed to flush stdout")?;

    let mut answer = String::new();
    stdin
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
