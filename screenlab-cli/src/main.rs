//! ScreenLab CLI: screening, calculator and universe commands.
//!
//! Commands:
//! - `screen`: run one screening batch and print the colored table
//! - `calc positive` / `calc negative`: percentage-change and P&L calculator
//! - `universe list` / `universe export`: inspect or write the ticker universe

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::style::{Color, Stylize};
use screenlab_core::calculator::{self, NegativeInputs, PositiveInputs};
use screenlab_core::data::{PriceCache, PriceProvider, SyntheticProvider, YahooProvider};
use screenlab_core::domain::{ForecastHorizon, HistoricalWindow, ScreenerRow};
use screenlab_core::forecast::ForecastEngine;
use screenlab_runner::{
    row_cells, run_batch, write_csv, write_json, BatchProgress, DeltaTone, ForecastTone,
    RowAnnotations, RowOrder, ScreenerConfig, ScreenerTable, HEADERS,
};

#[derive(Parser)]
#[command(
    name = "screenlab",
    about = "ScreenLab CLI: ARIMA portfolio screener and position calculator"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one screening batch over the ticker universe.
    Screen {
        /// Historical window in trading days: 120, 360 or 720.
        #[arg(long)]
        window: Option<usize>,

        /// Forecast horizon in trading days: 30, 60 or 120.
        #[arg(long)]
        horizon: Option<usize>,

        /// Run config file. Defaults to ./screenlab.toml when present.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Universe TOML file (overrides the config file).
        #[arg(long)]
        universe: Option<PathBuf>,

        /// Row order: declaration or completion.
        #[arg(long)]
        order: Option<RowOrder>,

        /// Worker threads.
        #[arg(long)]
        workers: Option<usize>,

        /// Use deterministic synthetic prices instead of Yahoo Finance.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Write the table as CSV.
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Write the table as JSON.
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Percentage-change and position P&L calculator.
    Calc {
        #[command(subcommand)]
        scenario: CalcScenario,
    },
    /// Ticker universe commands.
    Universe {
        #[command(subcommand)]
        action: UniverseAction,
    },
}

#[derive(Subcommand)]
enum CalcScenario {
    /// Target-price scenario with partial exit and tax.
    #[command(allow_negative_numbers = true)]
    Positive {
        #[arg(long)]
        start: f64,
        #[arg(long)]
        end: f64,
        #[arg(long)]
        qty: i64,
        /// Hypothetical price.
        #[arg(long)]
        hyp: f64,
        /// Fraction of the position taken out.
        #[arg(long = "out-f")]
        out_f: f64,
        /// Tax rate in percent.
        #[arg(long)]
        atx: f64,
    },
    /// Loss scenario.
    #[command(allow_negative_numbers = true)]
    Negative {
        #[arg(long)]
        start: f64,
        #[arg(long)]
        end: f64,
        #[arg(long)]
        qty: i64,
    },
}

#[derive(Subcommand)]
enum UniverseAction {
    /// Print the active universe.
    List {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Write the active universe as TOML (stdout when no file is given).
    Export {
        file: Option<PathBuf>,

        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Screen {
            window,
            horizon,
            config,
            universe,
            order,
            workers,
            synthetic,
            csv,
            json,
        } => {
            let mut cfg = ScreenerConfig::load(config.as_deref())?;
            if let Some(w) = window {
                cfg.historical_window = HistoricalWindow::try_from(w)?;
            }
            if let Some(h) = horizon {
                cfg.forecast_horizon = ForecastHorizon::try_from(h)?;
            }
            if let Some(path) = universe {
                cfg.universe_file = Some(path);
            }
            if let Some(o) = order {
                cfg.row_order = o;
            }
            if let Some(n) = workers {
                cfg.workers = n;
            }
            cfg.validate()?;
            run_screen(&cfg, synthetic, csv, json)
        }
        Commands::Calc { scenario } => {
            run_calc(scenario);
            Ok(())
        }
        Commands::Universe { action } => match action {
            UniverseAction::List { config } => run_universe_list(config),
            UniverseAction::Export { file, config } => run_universe_export(file, config),
        },
    }
}

fn run_screen(
    cfg: &ScreenerConfig,
    synthetic: bool,
    csv: Option<PathBuf>,
    json: Option<PathBuf>,
) -> Result<()> {
    let universe = cfg.universe()?;
    let provider: Arc<dyn PriceProvider> = if synthetic {
        Arc::new(SyntheticProvider::today())
    } else {
        Arc::new(YahooProvider::new().context("failed to build Yahoo Finance client")?)
    };
    let cache = PriceCache::new(provider);
    let engine = ForecastEngine::default();
    let params = cfg.run_params();

    println!(
        "Screening {} tickers | window {} | horizon {} | {} workers",
        universe.len(),
        params.window,
        params.horizon,
        cfg.workers
    );

    let report = |p: &BatchProgress| {
        eprintln!(
            "[{}/{}] {:<8} {}",
            p.completed, p.total, p.row.symbol, p.row.status
        );
    };
    let outcome = run_batch(
        universe.tickers(),
        params,
        &cache,
        &engine,
        &cfg.batch_options(),
        Some(&report),
    )?;

    tracing::info!(
        model = outcome.model.as_str(),
        source = ?outcome.source,
        fetched_at = %outcome.fetched_at.format("%Y-%m-%d %H:%M:%S UTC"),
        "run summary"
    );

    let table = ScreenerTable::assemble(outcome.rows, cfg.row_order);
    print_table(&table);

    println!();
    println!(
        "{} in {:.1}s (fetch {:.1}s, source {:?}, model {})",
        outcome.counts,
        outcome.elapsed.as_secs_f64(),
        outcome.fetch_elapsed.as_secs_f64(),
        outcome.source,
        outcome.model
    );

    if let Some(path) = csv {
        write_csv(&table, &path)?;
        println!("CSV saved to: {}", path.display());
    }
    if let Some(path) = json {
        write_json(&table, &path)?;
        println!("JSON saved to: {}", path.display());
    }
    Ok(())
}

// ── Table rendering ─────────────────────────────────────────────────

const NAME_WIDTH: usize = 22;
const TICKER_WIDTH: usize = 8;
const VALUE_WIDTH: usize = 14;
const STATUS_WIDTH: usize = 18;

fn column_width(col: usize) -> usize {
    match col {
        0 => NAME_WIDTH,
        1 => TICKER_WIDTH,
        10 => STATUS_WIDTH,
        _ => VALUE_WIDTH,
    }
}

fn pad(col: usize, text: &str) -> String {
    let width = column_width(col);
    if col < 2 || col == 10 {
        format!("{text:<width$}")
    } else {
        format!("{text:>width$}")
    }
}

fn print_table(table: &ScreenerTable) {
    let header: Vec<String> = HEADERS
        .iter()
        .enumerate()
        .map(|(i, h)| pad(i, h))
        .collect();
    println!("{}", header.join(" ").bold());

    for (row, notes) in table.annotated() {
        println!("{}", render_row(row, notes));
    }
}

fn cell_color(col: usize, notes: RowAnnotations) -> Option<Color> {
    match col {
        7 => match notes.forecast? {
            ForecastTone::Above => Some(Color::Blue),
            ForecastTone::Below => Some(Color::Red),
            ForecastTone::Flat => None,
        },
        9 => match notes.delta? {
            DeltaTone::Strong => Some(Color::Green),
            DeltaTone::Negative => Some(Color::Magenta),
            DeltaTone::Neutral => None,
        },
        10 if notes.attention => Some(Color::DarkYellow),
        _ => None,
    }
}

fn render_row(row: &ScreenerRow, notes: RowAnnotations) -> String {
    row_cells(row)
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let text = pad(i, cell);
            match cell_color(i, notes) {
                Some(color) => text.with(color).to_string(),
                None => text,
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Calculator ──────────────────────────────────────────────────────

fn run_calc(scenario: CalcScenario) {
    match scenario {
        CalcScenario::Positive {
            start,
            end,
            qty,
            hyp,
            out_f,
            atx,
        } => {
            let out = calculator::positive(&PositiveInputs {
                start,
                end,
                qty,
                hyp,
                out_f,
                atx,
            });
            for (label, value) in out.labeled() {
                print_calc_line(label, value, label == "OUT");
            }
        }
        CalcScenario::Negative { start, end, qty } => {
            let out = calculator::negative(&NegativeInputs { start, end, qty });
            for (label, value) in out.labeled() {
                print_calc_line(label, value, false);
            }
        }
    }
}

fn print_calc_line(label: &str, value: f64, always_red: bool) {
    let text = format!("{value:>14.2}");
    if always_red || value < 0.0 {
        println!("{label:<8} {}", text.with(Color::Red));
    } else {
        println!("{label:<8} {text}");
    }
}

// ── Universe ────────────────────────────────────────────────────────

fn run_universe_list(config: Option<PathBuf>) -> Result<()> {
    let universe = ScreenerConfig::load(config.as_deref())?.universe()?;
    println!("{:<4} {:<8} NAME", "#", "TICKER");
    for (i, ticker) in universe.tickers().iter().enumerate() {
        println!("{:<4} {:<8} {}", i + 1, ticker.symbol, ticker.name);
    }
    println!("{} tickers", universe.len());
    Ok(())
}

fn run_universe_export(file: Option<PathBuf>, config: Option<PathBuf>) -> Result<()> {
    let universe = ScreenerConfig::load(config.as_deref())?.universe()?;
    let text = universe.to_toml()?;
    match file {
        Some(path) => {
            std::fs::write(&path, text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Universe saved to: {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}
