//! CLI definition and dispatch.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::adapters::cache_adapter::FileCacheAdapter;
use crate::adapters::csv_adapter::CsvDataAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::forest_adapter::ForestAdapter;
use crate::adapters::svg_report_adapter::SvgReportAdapter;
use crate::domain::backtest::{run_backtest, RiskPolicy};
use crate::domain::classification::ClassificationReport;
use crate::domain::config_validation::{
    validate_data_config, validate_ml_config, validate_strategy_config, DataConfig, MlConfig,
    StrategyConfig,
};
use crate::domain::dataset::build_dataset;
use crate::domain::error::CrosstraderError;
use crate::domain::performance::{evaluate, Performance};
use crate::domain::price::PricePoint;
use crate::domain::signal::{
    compute_signals, SignalSeries, DEFAULT_LONG_WINDOW, DEFAULT_SHORT_WINDOW,
};
use crate::ports::classifier_port::ClassifierPort;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "crosstrader", about = "Moving-average crossover backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest and write reports
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Override the configured symbol
        #[arg(long)]
        symbol: Option<String>,
        /// Override the configured report directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the tail of the crossover signal series
    Signals {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Train the direction classifier and report test metrics
    TrainModel {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            symbol,
            output,
        } => run_backtest_command(&config, symbol.as_deref(), output.as_deref()),
        Command::Signals { config } => run_signals_command(&config),
        Command::TrainModel { config } => run_train_model_command(&config),
        Command::Validate { config } => run_validate_command(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        (&e).into()
    })
}

pub fn build_data_config(
    adapter: &dyn ConfigPort,
    symbol_override: Option<&str>,
) -> Result<DataConfig, CrosstraderError> {
    let symbol = symbol_override
        .map(str::to_string)
        .or_else(|| adapter.get_string("data", "symbol"));
    validate_data_config(
        symbol,
        adapter.get_string("data", "start"),
        adapter.get_string("data", "end"),
    )
}

pub fn build_strategy_config(
    adapter: &dyn ConfigPort,
) -> Result<StrategyConfig, CrosstraderError> {
    validate_strategy_config(
        adapter.get_double("strategy", "initial_capital", 10_000.0),
        adapter.get_int("strategy", "short_window", DEFAULT_SHORT_WINDOW as i64),
        adapter.get_int("strategy", "long_window", DEFAULT_LONG_WINDOW as i64),
    )
}

/// Stop-loss and take-profit exits apply only when `risk_control` is set.
pub fn build_risk_policy(adapter: &dyn ConfigPort) -> RiskPolicy {
    if adapter.get_bool("strategy", "risk_control", false) {
        RiskPolicy::StopLossTakeProfit {
            stop_loss: adapter.get_double("strategy", "stop_loss", 0.1),
            take_profit: adapter.get_double("strategy", "take_profit", 0.2),
        }
    } else {
        RiskPolicy::SignalOnly
    }
}

pub fn build_ml_config(adapter: &dyn ConfigPort) -> Result<MlConfig, CrosstraderError> {
    validate_ml_config(
        adapter.get_int("ml", "lookahead", 3),
        adapter.get_double("ml", "test_fraction", 0.2),
    )
}

fn build_data_port(adapter: &dyn ConfigPort) -> FileCacheAdapter<CsvDataAdapter> {
    let prices_dir = adapter
        .get_string("data", "prices_dir")
        .unwrap_or_else(|| "data".to_string());
    let cache_dir = adapter
        .get_string("data", "cache_dir")
        .unwrap_or_else(|| "cache".to_string());
    FileCacheAdapter::new(
        CsvDataAdapter::new(PathBuf::from(prices_dir)),
        PathBuf::from(cache_dir),
    )
}

fn fetch_prices(
    data_port: &dyn DataPort,
    data_config: &DataConfig,
) -> Result<Vec<PricePoint>, CrosstraderError> {
    let prices =
        data_port.fetch_prices(&data_config.symbol, data_config.start, data_config.end)?;
    if prices.is_empty() {
        return Err(CrosstraderError::NoData {
            symbol: data_config.symbol.clone(),
            start: data_config.start,
            end: data_config.end,
        });
    }
    Ok(prices)
}

// Shared front half of every pipeline: config load, validation, data fetch.
fn load_prices(
    config_path: &Path,
    symbol_override: Option<&str>,
) -> Result<(FileConfigAdapter, DataConfig, Vec<PricePoint>), ExitCode> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;

    let data_config = build_data_config(&adapter, symbol_override).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })?;

    eprintln!(
        "Fetching {} from {} to {}",
        data_config.symbol, data_config.start, data_config.end
    );
    let data_port = build_data_port(&adapter);
    let prices = fetch_prices(&data_port, &data_config).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })?;
    eprintln!("Loaded {} price rows", prices.len());

    Ok((adapter, data_config, prices))
}

fn print_performance(performance: &Performance) {
    let win_rate = match performance.win_rate_pct {
        Some(rate) => format!("{rate:.2}"),
        None => "N/A".to_string(),
    };
    println!("Total Return (%): {:.2}", performance.total_return_pct);
    println!("Number of Trades: {}", performance.num_trades);
    println!("Win Rate (%): {win_rate}");
}

fn run_backtest_command(
    config_path: &Path,
    symbol_override: Option<&str>,
    output_override: Option<&Path>,
) -> ExitCode {
    let (adapter, data_config, prices) = match load_prices(config_path, symbol_override) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    let strategy = match build_strategy_config(&adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let policy = build_risk_policy(&adapter);

    eprintln!(
        "Computing signals (short={}, long={})",
        strategy.short_window, strategy.long_window
    );
    let signals = compute_signals(&prices, strategy.short_window, strategy.long_window);

    eprintln!("Running backtest");
    let trajectory = match run_backtest(&prices, &signals, strategy.initial_capital, policy) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let performance = evaluate(&trajectory, &prices, strategy.initial_capital);
    print_performance(&performance);

    let output_dir = output_override.map(Path::to_path_buf).unwrap_or_else(|| {
        PathBuf::from(
            adapter
                .get_string("report", "output_dir")
                .unwrap_or_else(|| "reports".to_string()),
        )
    });
    let report_port = SvgReportAdapter::new(output_dir);

    let written = report_port
        .write_signal_chart(&data_config.symbol, &prices, &signals)
        .and_then(|chart| {
            let curve = report_port.write_equity_curve(&trajectory)?;
            let perf = report_port.write_performance(&performance)?;
            Ok((chart, curve, perf))
        });
    match written {
        Ok((chart, curve, perf)) => {
            eprintln!("Wrote {}", chart.display());
            eprintln!("Wrote {}", curve.display());
            eprintln!("Wrote {}", perf.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

const SIGNAL_TAIL_ROWS: usize = 10;

fn format_ma(ma: Option<f64>) -> String {
    match ma {
        Some(value) => format!("{value:.2}"),
        None => "N/A".to_string(),
    }
}

fn print_signal_tail(prices: &[PricePoint], signals: &SignalSeries) {
    println!(
        "{:<12} {:>10} {:>10} {:>10} {:>8} {:>10}",
        "date", "close", "short_ma", "long_ma", "signal", "transition"
    );
    let start = prices.len().saturating_sub(SIGNAL_TAIL_ROWS);
    for (price, point) in prices[start..].iter().zip(&signals.points[start..]) {
        println!(
            "{:<12} {:>10.2} {:>10} {:>10} {:>8} {:>10}",
            price.date.to_string(),
            price.close,
            format_ma(point.short_ma),
            format_ma(point.long_ma),
            point.signal.value(),
            point.transition
        );
    }
}

fn run_signals_command(config_path: &Path) -> ExitCode {
    let (adapter, _, prices) = match load_prices(config_path, None) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    let strategy = match build_strategy_config(&adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let signals = compute_signals(&prices, strategy.short_window, strategy.long_window);
    print_signal_tail(&prices, &signals);
    ExitCode::SUCCESS
}

fn run_train_model_command(config_path: &Path) -> ExitCode {
    let (adapter, _, prices) = match load_prices(config_path, None) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    let ml = match build_ml_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let seed = adapter.get_int("ml", "seed", 42) as u64;
    let n_trees = adapter.get_int("ml", "n_trees", 100).clamp(1, u16::MAX as i64) as u16;

    eprintln!(
        "Building dataset (lookahead={}, test_fraction={})",
        ml.lookahead, ml.test_fraction
    );
    let split = match build_dataset(&prices, ml.lookahead, ml.test_fraction, seed) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let (down, up) = split.train.class_counts();
    eprintln!(
        "Train rows: {} (down={down}, up={up}), test rows: {}",
        split.train.len(),
        split.test.len()
    );

    eprintln!("Training random forest ({n_trees} trees, seed {seed})");
    let mut classifier = ForestAdapter::new(n_trees, seed);
    let report = classifier
        .fit(&split.train.features, &split.train.labels)
        .and_then(|()| classifier.predict(&split.test.features))
        .map(|predictions| ClassificationReport::compute(&split.test.labels, &predictions));
    let report = match report {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    println!("Accuracy (%): {:.2}", report.accuracy_pct);
    println!(
        "Up   - precision: {:.2}  recall: {:.2}  f1: {:.2}",
        report.precision_up, report.recall_up, report.f1_up
    );
    println!(
        "Down - precision: {:.2}  recall: {:.2}  f1: {:.2}",
        report.precision_down, report.recall_down, report.f1_down
    );
    println!(
        "Confusion [down, up] x [down, up]: {:?}",
        report.confusion
    );
    ExitCode::SUCCESS
}

fn run_validate_command(config_path: &Path) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let result = build_data_config(&adapter, None)
        .and_then(|_| build_strategy_config(&adapter).map(|_| ()))
        .and_then(|()| build_ml_config(&adapter).map(|_| ()));
    match result {
        Ok(()) => {
            println!("Configuration OK");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}
