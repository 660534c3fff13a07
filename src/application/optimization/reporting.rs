//! Reporting utilities for optimization results.
//!
//! Provides formatted console output plus CSV and JSON export.

use crate::domain::optimization::{ComboResult, OptParams, ParameterGrid, ResultColumn};
use crate::domain::simulation::HeadlineStat;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// Column set of a CSV export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CsvLayout {
    /// The 13 result columns
    #[default]
    Basic,
    /// `StartingBalance` and `Trials` followed by the result columns
    Extended,
}

/// Everything needed to reproduce and read back an optimizer run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub generated_at: DateTime<Utc>,
    pub starting_balance: f64,
    pub trials_per_combo: usize,
    pub headline: HeadlineStat,
    pub grid: ParameterGrid,
    pub combos_total: usize,
    pub combos_evaluated: usize,
    pub rows: Vec<ComboResult>,
}

impl OptimizationReport {
    pub fn new(params: &OptParams, headline: HeadlineStat, rows: Vec<ComboResult>) -> Self {
        Self {
            generated_at: Utc::now(),
            starting_balance: params.starting_balance,
            trials_per_combo: params.trials_per_combo,
            headline,
            grid: params.grid.clone(),
            combos_total: params.grid.combo_count(),
            combos_evaluated: rows.len(),
            rows,
        }
    }

    pub fn is_partial(&self) -> bool {
        self.combos_evaluated < self.combos_total
    }
}

/// Reporter for optimization results output.
pub struct OptimizeReporter {
    output_dir: String,
}

impl OptimizeReporter {
    /// Creates a new reporter with the given output directory.
    pub fn new(output_dir: &str) -> Self {
        Self {
            output_dir: output_dir.to_string(),
        }
    }

    /// Prints the header banner for the optimization run.
    pub fn print_header(&self, params: &OptParams, workers: usize, output: &str) {
        println!("{}", "=".repeat(80));
        println!("🎲 MARTINGALE GRID SEARCH");
        println!("{}", "=".repeat(80));
        println!("Starting balance: {}", params.starting_balance);
        println!("Trials/combo:     {}", params.trials_per_combo);
        println!("Workers:          {}", workers);
        println!("Output:           {}", output);
        println!("{}", "=".repeat(80));
    }

    /// Prints the parameter grid configuration.
    pub fn print_grid_info(&self, grid: &ParameterGrid) {
        println!("\n📊 Parameter Grid:");
        println!("  BetDiv:         {:?}", grid.bet_div);
        println!("  ProfitMult:     {:?}", grid.profit_mult);
        println!("  W%:             {:?}", grid.win_increase_pct);
        println!("  L:              {:?}", grid.loss_reset);
        println!("  Buffer%:        {:?}", grid.buffer_pct);

        println!("\n🔢 Total combinations to test: {}", grid.combo_count());
    }

    /// Prints a formatted table of results.
    pub fn print_results_table(&self, results: &[ComboResult], top_n: usize) {
        let width = 112;
        println!("\n{}", "=".repeat(width));
        println!("✅ OPTIMIZATION COMPLETE - Top {} Results", top_n.min(results.len()));
        println!("{}", "=".repeat(width));

        println!(
            "{:<4} | {:>7} | {:>6} | {:>6} | {:>3} | {:>7} | {:>9} | {:>9} | {:>7} | {:>9} | {:>6} | {:>7}",
            "#", "BetDiv", "PMult", "W%", "L", "Buffer%", "AvgHigh", "StdDev", "Cycles", "Rounds", "Bust%", "Score"
        );
        println!("{}", "-".repeat(width));

        for (i, row) in results.iter().take(top_n).enumerate() {
            println!(
                "{:<4} | {:>7.2} | {:>6.2} | {:>6.2} | {:>3} | {:>7.2} | {:>9.4} | {:>9.4} | {:>7.2} | {:>9.1} | {:>6.1} | {:>7.4}{}",
                i + 1,
                row.bet_div,
                row.profit_mult,
                row.win_increase_pct,
                row.loss_reset,
                row.buffer_pct,
                row.avg_high,
                row.std_high,
                row.avg_cycles,
                row.avg_rounds,
                row.bust_rate,
                row.score,
                if row.failed { "  (failed)" } else { "" }
            );
        }

        println!("{}\n", "=".repeat(width));
    }

    /// Prints detailed information about the best configuration.
    pub fn print_best_config(&self, best: &ComboResult, starting_balance: f64) {
        println!("🏆 BEST CONFIGURATION:");
        println!("  BetDiv:           {:.2}", best.bet_div);
        println!("  ProfitMult:       {:.2}", best.profit_mult);
        println!("  W%:               {:.2}", best.win_increase_pct);
        println!("  L:                {}", best.loss_reset);
        println!("  Buffer%:          {:.2}", best.buffer_pct);
        println!("\n  Avg High:         {:.4}", best.avg_high);
        println!("  Std Dev:          {:.4}", best.std_high);
        println!("  Max High:         {:.4}", best.max_high);
        println!("  Gain vs Start:    {:.4}", best.avg_high - starting_balance);
        println!("  Cycle Success:    {:.2}%", best.cycle_success_rate);
        println!("  Bust Rate:        {:.2}%", best.bust_rate);
        println!("  Score:            {:.4}", best.score);
        println!("{}\n", "=".repeat(80));
    }

    /// Writes rows as CSV with every number at 2 decimals.
    ///
    /// In append mode the header is only written when the file is new or
    /// empty.
    pub fn export_csv(
        &self,
        rows: &[ComboResult],
        params: &OptParams,
        filename: &str,
        layout: CsvLayout,
        append: bool,
    ) -> Result<PathBuf> {
        let output_path = self.resolve_path(filename)?;

        let has_content = append
            && std::fs::metadata(&output_path)
                .map(|m| m.len() > 0)
                .unwrap_or(false);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(&output_path)
            .context(format!("Failed to open CSV file {}", output_path.display()))?;

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if !has_content {
            writer
                .write_record(csv_header(layout))
                .context("Failed to write CSV header")?;
        }
        for row in rows {
            writer
                .write_record(csv_record(row, params, layout))
                .context("Failed to write CSV row")?;
        }
        writer.flush().context("Failed to flush CSV file")?;

        println!("💾 CSV saved to: {}", output_path.display());
        Ok(output_path)
    }

    /// Exports the full report to a JSON file.
    pub fn export_json(&self, report: &OptimizationReport, filename: &str) -> Result<PathBuf> {
        let output_path = self.resolve_path(filename)?;

        let json_output =
            serde_json::to_string_pretty(report).context("Failed to serialize results to JSON")?;

        std::fs::write(&output_path, json_output)
            .context(format!("Failed to write results to {}", output_path.display()))?;

        println!("💾 Results saved to: {}", output_path.display());
        Ok(output_path)
    }

    fn resolve_path(&self, filename: &str) -> Result<PathBuf> {
        let output_path = if filename.contains('/') || filename.contains('\\') {
            PathBuf::from(filename)
        } else {
            Path::new(&self.output_dir).join(filename)
        };

        // Ensure directory exists
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create directory: {:?}", parent))?;
        }
        Ok(output_path)
    }
}

impl Default for OptimizeReporter {
    fn default() -> Self {
        Self::new(".")
    }
}

/// Reads a report written by [`OptimizeReporter::export_json`].
pub fn load_report(path: &Path) -> Result<OptimizationReport> {
    let content = std::fs::read_to_string(path)
        .context(format!("Failed to read report {}", path.display()))?;
    serde_json::from_str(&content).context(format!("Failed to parse report {}", path.display()))
}

pub fn csv_header(layout: CsvLayout) -> Vec<&'static str> {
    let mut header = Vec::with_capacity(ResultColumn::ALL.len() + 2);
    if layout == CsvLayout::Extended {
        header.extend(["StartingBalance", "Trials"]);
    }
    header.extend(ResultColumn::ALL.iter().map(|c| c.header()));
    header
}

fn csv_record(row: &ComboResult, params: &OptParams, layout: CsvLayout) -> Vec<String> {
    let mut record = Vec::with_capacity(ResultColumn::ALL.len() + 2);
    if layout == CsvLayout::Extended {
        record.push(format!("{:.2}", params.starting_balance));
        record.push(format!("{:.2}", params.trials_per_combo as f64));
    }
    record.extend(ResultColumn::ALL.iter().map(|c| format!("{:.2}", c.value(row))));
    record
}
