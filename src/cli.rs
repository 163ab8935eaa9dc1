//! CLI definition and dispatch.
//!
//! Every subcommand follows the same shape: load config (or defaults),
//! run one `*_pipeline` function against a [`DataPort`], then print a
//! console summary to stderr. Pipelines return typed results so they can be
//! driven directly from tests with an in-memory port.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::recording_execution::RecordingExecution;
use crate::domain::analysis::{analyze, SignalMetrics};
use crate::domain::backtest::{run_backtest, BacktestConfig, BacktestResult};
use crate::domain::columns::ColumnMap;
use crate::domain::config_validation::{
    read_backtest_config, read_column_map, read_envelope_params, read_strategy_params,
    validate_config,
};
use crate::domain::data_validation::validate_integrity;
use crate::domain::error::BandtraderError;
use crate::domain::frame::Frame;
use crate::domain::indicator::EnvelopeParams;
use crate::domain::pipeline;
use crate::domain::signal::Signal;
use crate::domain::strategy::StrategyParams;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(
    name = "bandtrader",
    about = "Volatility-adaptive moving-average envelope toolkit"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute envelope bands for a price file
    Envelope {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Use a constant band percentage instead of the volatility-scaled one
        #[arg(long)]
        fixed_pct: Option<f64>,
    },
    /// Generate breakout signals from an envelope file
    Signal {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Run the envelope strategy over a signal file
    Backtest {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print statistics for a signal file
    Analyze {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Run data quality checks on a price file
    Check {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Every configured value a pipeline can need.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Settings {
    pub envelope: EnvelopeParams,
    pub strategy: StrategyParams,
    pub backtest: BacktestConfig,
    pub columns: ColumnMap,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Envelope {
            input,
            output,
            config,
            fixed_pct,
        } => run_envelope(&input, &output, config.as_ref(), fixed_pct),
        Command::Signal {
            input,
            output,
            config,
        } => run_signal(&input, &output, config.as_ref()),
        Command::Backtest { input, config } => run_backtest_command(&input, config.as_ref()),
        Command::Analyze { input, config } => run_analyze(&input, config.as_ref()),
        Command::Check { input, config } => run_check(&input, config.as_ref()),
        Command::Validate { config } => run_validate(&config),
    }
}

fn fail(err: &BandtraderError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

pub fn build_settings(config: &dyn ConfigPort) -> Result<Settings, BandtraderError> {
    Ok(Settings {
        envelope: read_envelope_params(config)?,
        strategy: read_strategy_params(config)?,
        backtest: read_backtest_config(config)?,
        columns: read_column_map(config)?,
    })
}

/// Stage 1 for every data command: settings from `path`, or defaults.
fn load_settings(path: Option<&PathBuf>) -> Result<Settings, ExitCode> {
    let adapter = match path {
        Some(p) => {
            eprintln!("Loading config from {}", p.display());
            load_config(p)?
        }
        None => FileConfigAdapter::empty(),
    };
    build_settings(&adapter).map_err(|e| fail(&e))
}

fn source_name(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn csv_port() -> CsvAdapter {
    CsvAdapter::new(PathBuf::new())
}

fn date_range(frame: &Frame) -> String {
    match (frame.dates().first(), frame.dates().last()) {
        (Some(first), Some(last)) => format!("{} to {}", first, last),
        _ => "no dates".to_string(),
    }
}

/// Load prices, check them, compute the envelope and store the result.
pub fn run_envelope_pipeline(
    data_port: &dyn DataPort,
    settings: &Settings,
    input: &str,
    output: &str,
    fixed_pct: Option<f64>,
) -> Result<Frame, BandtraderError> {
    let cols = &settings.columns;
    let prices = data_port.load_frame(input, &cols.date)?;
    eprintln!("  Loaded {} rows ({})", prices.len(), date_range(&prices));

    validate_integrity(&prices, cols)?;

    let out = match fixed_pct {
        Some(pct) => {
            eprintln!(
                "  Fixed envelope: window {}, band {:.2}%",
                settings.envelope.base_window,
                pct * 100.0
            );
            pipeline::fixed_envelope_frame(&prices, cols, settings.envelope.base_window, pct)?
        }
        None => {
            let p = &settings.envelope;
            eprintln!(
                "  Adaptive envelope: base {}, vol {}, scale {}, clip [{}, {}]",
                p.base_window, p.vol_window, p.scale_factor, p.clip_min, p.clip_max
            );
            pipeline::envelope_frame(&prices, cols, p)?
        }
    };
    if out.is_empty() {
        tracing::warn!(rows = prices.len(), "series shorter than the warmup window");
    }

    data_port.store_frame(&out, output)?;
    Ok(out)
}

pub fn run_signal_pipeline(
    data_port: &dyn DataPort,
    settings: &Settings,
    input: &str,
    output: &str,
) -> Result<Frame, BandtraderError> {
    let cols = &settings.columns;
    let bands = data_port.load_frame(input, &cols.date)?;
    let out = pipeline::signal_frame(&bands, cols)?;
    data_port.store_frame(&out, output)?;
    Ok(out)
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    settings: &Settings,
    input: &str,
) -> Result<BacktestResult, BandtraderError> {
    let frame = data_port.load_frame(input, &settings.columns.date)?;
    let days = pipeline::decision_inputs(&frame, &settings.columns)?;
    let mut execution = RecordingExecution::new(
        settings.backtest.initial_equity,
        settings.strategy.slippage,
    );
    run_backtest(&days, &settings.strategy, &mut execution)
}

pub fn run_analyze_pipeline(
    data_port: &dyn DataPort,
    settings: &Settings,
    input: &str,
) -> Result<SignalMetrics, BandtraderError> {
    let frame = data_port.load_frame(input, &settings.columns.date)?;
    let rows = pipeline::analysis_rows(&frame, &settings.columns)?;
    Ok(analyze(&rows))
}

pub fn run_check_pipeline(
    data_port: &dyn DataPort,
    settings: &Settings,
    input: &str,
) -> Result<Frame, BandtraderError> {
    let frame = data_port.load_frame(input, &settings.columns.date)?;
    validate_integrity(&frame, &settings.columns)?;
    Ok(frame)
}

fn run_envelope(
    input: &Path,
    output: &Path,
    config: Option<&PathBuf>,
    fixed_pct: Option<f64>,
) -> ExitCode {
    let settings = match load_settings(config) {
        Ok(s) => s,
        Err(code) => return code,
    };

    eprintln!("Computing envelope for {}", input.display());
    match run_envelope_pipeline(
        &csv_port(),
        &settings,
        &source_name(input),
        &source_name(output),
        fixed_pct,
    ) {
        Ok(out) => {
            eprintln!("  {} rows written to {}", out.len(), output.display());
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_signal(input: &Path, output: &Path, config: Option<&PathBuf>) -> ExitCode {
    let settings = match load_settings(config) {
        Ok(s) => s,
        Err(code) => return code,
    };

    eprintln!("Generating signals from {}", input.display());
    let out = match run_signal_pipeline(
        &csv_port(),
        &settings,
        &source_name(input),
        &source_name(output),
    ) {
        Ok(f) => f,
        Err(e) => return fail(&e),
    };

    let signals = out
        .column_index(&settings.columns.signal)
        .map(|idx| {
            (0..out.len())
                .filter_map(|i| out.row(i).and_then(|r| Signal::parse(&r[idx])))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    let count = |s: Signal| signals.iter().filter(|x| **x == s).count();

    eprintln!("\n=== Signals ===");
    eprintln!("Rows:     {}", out.len());
    eprintln!("Long:     {}", count(Signal::Long));
    eprintln!("Short:    {}", count(Signal::Short));
    eprintln!("Flat:     {}", count(Signal::Flat));
    eprintln!("\nSignals written to: {}", output.display());
    ExitCode::SUCCESS
}

fn run_backtest_command(input: &Path, config: Option<&PathBuf>) -> ExitCode {
    let settings = match load_settings(config) {
        Ok(s) => s,
        Err(code) => return code,
    };

    eprintln!("Running strategy over {}", input.display());
    let result = match run_backtest_pipeline(&csv_port(), &settings, &source_name(input)) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    let s = &result.summary;
    eprintln!("\n=== Backtest Summary ===");
    eprintln!("Days evaluated:   {}", s.evaluated_days);
    eprintln!("Entries:          {}", s.entries);
    eprintln!("Exits:            {}", s.exits);
    eprintln!("Invalid data:     {}", s.invalid_data_days);
    eprintln!("Price spikes:     {}", s.price_spike_days);
    eprintln!("Sizing failures:  {}", s.sizing_failures);
    eprintln!("Rejected orders:  {}", s.rejected_orders);
    eprintln!(
        "Final position:   {}",
        if result.final_state.position_open() {
            "long"
        } else {
            "flat"
        }
    );

    if !result.fills.is_empty() {
        eprintln!("\n=== Fills ===");
        for fill in &result.fills {
            eprintln!(
                "  {}  {} {} @ {:.4}",
                fill.date, fill.action, fill.size, fill.price
            );
        }
    }
    ExitCode::SUCCESS
}

fn run_analyze(input: &Path, config: Option<&PathBuf>) -> ExitCode {
    let settings = match load_settings(config) {
        Ok(s) => s,
        Err(code) => return code,
    };

    eprintln!("Analyzing {}", input.display());
    let m = match run_analyze_pipeline(&csv_port(), &settings, &source_name(input)) {
        Ok(m) => m,
        Err(e) => return fail(&e),
    };

    eprintln!("\n=== Signal Analysis ===");
    if let (Some(start), Some(end)) = (m.start_date, m.end_date) {
        eprintln!("Period:           {} to {}", start, end);
    }
    eprintln!("Total days:       {}", m.total_days);
    eprintln!(
        "Active signals:   {} ({:.2}%)",
        m.active_signals,
        m.signal_ratio * 100.0
    );
    eprintln!(
        "Upper breakouts:  {} ({:.2}%)",
        m.upper_breakouts,
        m.upper_breakout_ratio() * 100.0
    );
    eprintln!(
        "Lower breakouts:  {} ({:.2}%)",
        m.lower_breakouts,
        m.lower_breakout_ratio() * 100.0
    );
    eprintln!("Band width mean:  {:.4}", m.width_stats.mean);
    eprintln!("Band width med:   {:.4}", m.width_stats.median);
    eprintln!("Band width std:   {:.4}", m.width_stats.std);
    eprintln!("Total trades:     {}", m.total_trades);
    eprintln!("Avg holding days: {:.1}", m.avg_holding_days);
    ExitCode::SUCCESS
}

fn run_check(input: &Path, config: Option<&PathBuf>) -> ExitCode {
    let settings = match load_settings(config) {
        Ok(s) => s,
        Err(code) => return code,
    };

    eprintln!("Checking {}", input.display());
    match run_check_pipeline(&csv_port(), &settings, &source_name(input)) {
        Ok(frame) => {
            eprintln!("  {} rows, {}", frame.len(), date_range(&frame));
            eprintln!("\nData checks passed");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

pub fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_config(&adapter) {
        return fail(&e);
    }
    let settings = match build_settings(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let env = &settings.envelope;
    eprintln!("\nEnvelope:");
    eprintln!("  base_window:      {}", env.base_window);
    eprintln!("  vol_window:       {}", env.vol_window);
    eprintln!("  scale_factor:     {}", env.scale_factor);
    eprintln!("  clip_range:       {}, {}", env.clip_min, env.clip_max);
    eprintln!("  warmup rows:      {}", env.warmup());

    let strat = &settings.strategy;
    eprintln!("\nStrategy:");
    eprintln!("  risk_per_trade:   {}", strat.risk_per_trade);
    eprintln!("  max_price_change: {}", strat.max_price_change);
    eprintln!("  min_position:     {}", strat.min_position);
    eprintln!("  slippage:         {}", strat.slippage);

    eprintln!("\nBacktest:");
    eprintln!("  initial_equity:   {}", settings.backtest.initial_equity);

    let cols = &settings.columns;
    eprintln!("\nColumns:");
    eprintln!(
        "  {} {} {} {} {} {}",
        cols.date, cols.close, cols.upper, cols.lower, cols.signal, cols.base
    );

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}
