//! ScreenLab TUI: two-tab terminal interface.
//!
//! Tabs:
//! 1. Calibra: window/horizon selectors, run progress, colored screener table
//! 2. Calcolatore: percentage-change and P&L calculator

mod app;
mod input;
mod theme;
mod ui;
mod worker;

use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use screenlab_core::data::{PriceCache, PriceProvider, SyntheticProvider, YahooProvider};
use screenlab_core::forecast::ForecastEngine;
use screenlab_runner::{ScreenerConfig, WORKER_THREAD_PREFIX};

use crate::app::AppState;
use crate::worker::{WorkerCommand, WorkerContext};

#[derive(Parser)]
#[command(name = "screenlab-tui", about = "ScreenLab terminal UI")]
struct Args {
    /// Run config file. Defaults to ./screenlab.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use deterministic synthetic prices instead of Yahoo Finance.
    #[arg(long, default_value_t = false)]
    synthetic: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = ScreenerConfig::load(args.config.as_deref())?;
    let universe = config.universe()?;

    let provider: Arc<dyn PriceProvider> = if args.synthetic {
        Arc::new(SyntheticProvider::today())
    } else {
        Arc::new(YahooProvider::new().context("failed to build Yahoo Finance client")?)
    };

    // Restore the terminal before printing a panic, except for row panics the
    // batch contains: those must leave the session untouched.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if is_contained_panic(thread::current().name()) {
            return;
        }
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        default_hook(info);
    }));

    // Worker channels
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (resp_tx, resp_rx) = mpsc::channel();

    let universe_len = universe.len();
    let ctx = WorkerContext {
        universe,
        cache: PriceCache::new(provider),
        engine: ForecastEngine::default(),
        options: config.batch_options(),
    };
    let worker_handle = worker::spawn_worker(cmd_rx, resp_tx, ctx)?;

    let mut app = AppState::new(cmd_tx.clone(), resp_rx, &config, universe_len);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut app);

    // Shutdown worker. A run in flight finishes before the worker sees this.
    let _ = cmd_tx.send(WorkerCommand::Shutdown);
    drop(app);
    let _ = worker_handle.join();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Row tasks run on the batch pool and turn panics into ARIMA_ERROR rows.
fn is_contained_panic(thread_name: Option<&str>) -> bool {
    thread_name.is_some_and(|name| name.starts_with(WORKER_THREAD_PREFIX))
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
) -> Result<()> {
    loop {
        // 1. Render
        terminal.draw(|f| ui::draw(f, app))?;

        // 2. Drain worker responses (non-blocking)
        while let Ok(resp) = app.worker_rx.try_recv() {
            app.handle_response(resp);
        }

        // 3. Poll for input events (50ms timeout for ~20 FPS tick)
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                input::handle_key(app, key);
            }
        }

        // 4. Check quit
        if !app.running {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use chrono::NaiveDate;
    use screenlab_core::domain::{RunParams, Ticker};
    use screenlab_core::forecast::{ArimaOrder, Forecast, ForecastError, ForecastModel};
    use screenlab_runner::{run_batch, BatchOptions};

    #[test]
    fn only_row_worker_panics_are_contained() {
        assert!(is_contained_panic(Some("screen-worker-0")));
        assert!(is_contained_panic(Some("screen-worker-5")));
        assert!(!is_contained_panic(Some("main")));
        assert!(!is_contained_panic(Some("screenlab-worker")));
        assert!(!is_contained_panic(None));
    }

    /// Records the thread it runs on, then panics.
    struct PanickingModel {
        thread: Arc<Mutex<Option<String>>>,
    }

    impl ForecastModel for PanickingModel {
        fn name(&self) -> String {
            "panicking".into()
        }

        fn order(&self) -> ArimaOrder {
            ArimaOrder::SCREENING
        }

        fn forecast(&self, _values: &[f64], _steps: usize) -> Result<Forecast, ForecastError> {
            *self.thread.lock().unwrap() = thread::current().name().map(str::to_string);
            panic!("fit blew up");
        }
    }

    #[test]
    fn row_panics_happen_on_contained_threads() {
        let thread = Arc::new(Mutex::new(None));
        let engine = ForecastEngine::new(Box::new(PanickingModel {
            thread: Arc::clone(&thread),
        }));
        let end = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        let cache = PriceCache::new(Arc::new(SyntheticProvider::new(end)));
        let tickers = [Ticker::new("NVIDIA", "NVDA")];

        let outcome = run_batch(
            &tickers,
            RunParams::default(),
            &cache,
            &engine,
            &BatchOptions::default(),
            None,
        )
        .unwrap();

        assert_eq!(outcome.counts.arima_error, 1);
        let name = thread.lock().unwrap().clone();
        assert!(is_contained_panic(name.as_deref()), "ran on {name:?}");
    }
}
