//! Application state: single-owner, main-thread only.
//!
//! All TUI state lives here. The worker thread communicates via channels.

use std::sync::mpsc::{Receiver, Sender};

use screenlab_core::calculator::{self, NegativeInputs, NegativeOutputs, PositiveInputs, PositiveOutputs};
use screenlab_core::domain::{ForecastHorizon, HistoricalWindow, RunParams};
use screenlab_runner::{BatchProgress, RowOrder, ScreenerConfig, ScreenerTable};

use crate::worker::{RunSummary, WorkerCommand, WorkerResponse};

/// Which tab is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Screener,
    Calculator,
}

impl Tab {
    pub const ALL: [Tab; 2] = [Tab::Screener, Tab::Calculator];

    pub fn index(self) -> usize {
        match self {
            Tab::Screener => 0,
            Tab::Calculator => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tab::Screener => "Calibra",
            Tab::Calculator => "Calcolatore",
        }
    }

    pub fn next(self) -> Tab {
        match self {
            Tab::Screener => Tab::Calculator,
            Tab::Calculator => Tab::Screener,
        }
    }
}

/// Status message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// Screener tab state: selectors, live progress and the last finished table.
#[derive(Debug)]
pub struct ScreenerState {
    pub window: HistoricalWindow,
    pub horizon: ForecastHorizon,
    pub order: RowOrder,
    pub running: bool,
    pub progress: Option<BatchProgress>,
    pub table: Option<ScreenerTable>,
    pub summary: Option<RunSummary>,
    pub scroll: usize,
}

impl ScreenerState {
    pub fn new(config: &ScreenerConfig) -> Self {
        Self {
            window: config.historical_window,
            horizon: config.forecast_horizon,
            order: config.row_order,
            running: false,
            progress: None,
            table: None,
            summary: None,
            scroll: 0,
        }
    }

    pub fn params(&self) -> RunParams {
        RunParams::new(self.window, self.horizon)
    }

    pub fn row_count(&self) -> usize {
        self.table.as_ref().map_or(0, |t| t.len())
    }

    pub fn scroll_down(&mut self) {
        if self.scroll + 1 < self.row_count() {
            self.scroll += 1;
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    /// Progress fraction in [0, 1]; 0 before the first row completes.
    pub fn fraction(&self) -> f64 {
        self.progress.as_ref().map_or(0.0, |p| p.fraction())
    }
}

/// Calculator input labels, in field order. The first six feed the positive
/// scenario, the last three the independent negative scenario.
pub const CALC_FIELDS: [&str; 9] = [
    "START", "END", "QTY", "HYP", "OUT/F", "ATX %", "START", "END", "QTY",
];

/// Index of the first negative-scenario field.
pub const NEGATIVE_FIELDS_START: usize = 6;

const QTY_FIELD: usize = 2;
const NEG_QTY_FIELD: usize = 8;

/// Calculator tab state. Inputs are kept as the typed text and parsed on compute.
#[derive(Debug, Clone, Default)]
pub struct CalculatorState {
    pub inputs: [String; 9],
    pub cursor: usize,
    pub positive: Option<PositiveOutputs>,
    pub negative: Option<NegativeOutputs>,
    /// Field that failed to parse on the last compute.
    pub invalid: Option<usize>,
}

impl CalculatorState {
    pub fn next_field(&mut self) {
        self.cursor = (self.cursor + 1) % CALC_FIELDS.len();
    }

    pub fn prev_field(&mut self) {
        self.cursor = (self.cursor + CALC_FIELDS.len() - 1) % CALC_FIELDS.len();
    }

    /// Append a character to the active field. Accepts digits, one `.`
    /// (not in a QTY field) and a leading `-`.
    pub fn push_char(&mut self, c: char) {
        let is_qty = is_qty_field(self.cursor);
        let field = &mut self.inputs[self.cursor];
        let accepted = match c {
            '0'..='9' => true,
            '.' => !is_qty && !field.contains('.'),
            '-' => field.is_empty(),
            _ => false,
        };
        if accepted {
            field.push(c);
            self.invalid = None;
        }
    }

    pub fn backspace(&mut self) {
        self.inputs[self.cursor].pop();
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Parse every field (blank counts as zero) and derive both scenarios.
    /// On a parse failure returns the offending field index.
    pub fn compute(&mut self) -> Result<(), usize> {
        let (positive, negative) = match self.parse_inputs() {
            Ok(parsed) => parsed,
            Err(i) => {
                self.invalid = Some(i);
                return Err(i);
            }
        };
        self.positive = Some(calculator::positive(&positive));
        self.negative = Some(calculator::negative(&negative));
        self.invalid = None;
        Ok(())
    }

    fn parse_inputs(&self) -> Result<(PositiveInputs, NegativeInputs), usize> {
        let mut values = [0.0; 9];
        for (i, text) in self.inputs.iter().enumerate() {
            values[i] = parse_field(text).ok_or(i)?;
        }
        let positive = PositiveInputs {
            start: values[0],
            end: values[1],
            qty: self.parse_qty(QTY_FIELD)?,
            hyp: values[3],
            out_f: values[4],
            atx: values[5],
        };
        let negative = NegativeInputs {
            start: values[NEGATIVE_FIELDS_START],
            end: values[NEGATIVE_FIELDS_START + 1],
            qty: self.parse_qty(NEG_QTY_FIELD)?,
        };
        Ok((positive, negative))
    }

    fn parse_qty(&self, field: usize) -> Result<i64, usize> {
        let text = self.inputs[field].trim();
        if text.is_empty() {
            return Ok(0);
        }
        text.parse::<i64>().map_err(|_| field)
    }
}

fn is_qty_field(field: usize) -> bool {
    field == QTY_FIELD || field == NEG_QTY_FIELD
}

fn parse_field(text: &str) -> Option<f64> {
    let t = text.trim();
    if t.is_empty() {
        return Some(0.0);
    }
    t.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Top-level application state.
pub struct AppState {
    pub active_tab: Tab,
    pub running: bool,
    pub screener: ScreenerState,
    pub calculator: CalculatorState,
    pub universe_len: usize,
    pub worker_tx: Sender<WorkerCommand>,
    pub worker_rx: Receiver<WorkerResponse>,
    pub status_message: Option<(String, StatusLevel)>,
}

impl AppState {
    pub fn new(
        worker_tx: Sender<WorkerCommand>,
        worker_rx: Receiver<WorkerResponse>,
        config: &ScreenerConfig,
        universe_len: usize,
    ) -> Self {
        Self {
            active_tab: Tab::Screener,
            running: true,
            screener: ScreenerState::new(config),
            calculator: CalculatorState::default(),
            universe_len,
            worker_tx,
            worker_rx,
            status_message: None,
        }
    }

    /// Ask the worker for a run with the selected parameters. Ignored while a
    /// run is in flight.
    pub fn request_run(&mut self) {
        if self.screener.running {
            self.set_warning("A run is already in progress");
            return;
        }
        let params = self.screener.params();
        let cmd = WorkerCommand::RunScreen {
            params,
            order: self.screener.order,
        };
        if self.worker_tx.send(cmd).is_err() {
            self.set_error("Worker thread is not running");
            return;
        }
        self.screener.running = true;
        self.screener.progress = None;
        self.set_status(format!(
            "Running: window {} | horizon {}",
            params.window, params.horizon
        ));
    }

    pub fn handle_response(&mut self, resp: WorkerResponse) {
        match resp {
            WorkerResponse::Progress(progress) => {
                self.screener.progress = Some(progress);
            }
            WorkerResponse::ScreenDone { table, summary } => {
                self.screener.running = false;
                self.screener.scroll = 0;
                let message = format!("Done in {:.1}s: {}", summary.elapsed.as_secs_f64(), summary.counts);
                if summary.counts.ok == summary.counts.total() {
                    self.set_status(message);
                } else {
                    self.set_warning(message);
                }
                self.screener.table = Some(table);
                self.screener.summary = Some(summary);
            }
            WorkerResponse::ScreenError { error } => {
                self.screener.running = false;
                self.screener.progress = None;
                self.set_error(format!("Run failed: {error}"));
            }
        }
    }

    pub fn compute_calculator(&mut self) {
        match self.calculator.compute() {
            Ok(()) => self.set_status("Calculated"),
            Err(i) => {
                let scenario = if i >= NEGATIVE_FIELDS_START {
                    "negative"
                } else {
                    "positive"
                };
                self.set_warning(format!("{} ({scenario}) is not a valid number", CALC_FIELDS[i]));
            }
        }
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Info));
    }

    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Warning));
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    use screenlab_core::data::DataSource;
    use screenlab_core::domain::{RowStatus, ScreenerRow, StatusCounts};
    use screenlab_runner::CompletedRow;

    fn app() -> (AppState, Receiver<WorkerCommand>, Sender<WorkerResponse>) {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let app = AppState::new(cmd_tx, resp_rx, &ScreenerConfig::default(), 46);
        (app, cmd_rx, resp_tx)
    }

    #[test]
    fn tab_cycle() {
        assert_eq!(Tab::Screener.next(), Tab::Calculator);
        assert_eq!(Tab::Calculator.next(), Tab::Screener);
        for (i, tab) in Tab::ALL.iter().enumerate() {
            assert_eq!(tab.index(), i);
        }
    }

    #[test]
    fn run_request_is_sent_once_while_running() {
        let (mut app, cmd_rx, _resp_tx) = app();
        app.request_run();
        app.request_run();
        assert!(app.screener.running);
        assert!(matches!(cmd_rx.try_recv(), Ok(WorkerCommand::RunScreen { .. })));
        assert!(cmd_rx.try_recv().is_err());
        assert_eq!(app.status_message.as_ref().map(|m| m.1), Some(StatusLevel::Warning));
    }

    #[test]
    fn done_response_stores_table_and_clears_running() {
        let (mut app, _cmd_rx, _resp_tx) = app();
        app.request_run();
        let row = ScreenerRow::empty("NVIDIA", "NVDA", RowStatus::NoData);
        let table = ScreenerTable::assemble(
            vec![CompletedRow {
                index: 0,
                sequence: 0,
                row,
            }],
            RowOrder::Declaration,
        );
        let mut counts = StatusCounts::default();
        counts.record(RowStatus::NoData);
        app.handle_response(WorkerResponse::ScreenDone {
            table,
            summary: RunSummary {
                params: RunParams::default(),
                counts,
                source: DataSource::Unavailable,
                fetched_at: chrono::Utc::now(),
                model: "ARIMA(2,0,2)".into(),
                elapsed: Duration::from_millis(10),
            },
        });
        assert!(!app.screener.running);
        assert_eq!(app.screener.row_count(), 1);
        assert_eq!(app.status_message.as_ref().map(|m| m.1), Some(StatusLevel::Warning));
    }

    #[test]
    fn scrolling_is_bounded() {
        let (mut app, _cmd_rx, _resp_tx) = app();
        app.screener.scroll_down();
        assert_eq!(app.screener.scroll, 0);
        app.screener.scroll_up();
        assert_eq!(app.screener.scroll, 0);
    }

    #[test]
    fn calculator_editing_rules() {
        let mut calc = CalculatorState::default();
        for c in "-1.5.0x".chars() {
            calc.push_char(c);
        }
        assert_eq!(calc.inputs[0], "-1.50");

        calc.cursor = QTY_FIELD;
        for c in "10.5".chars() {
            calc.push_char(c);
        }
        assert_eq!(calc.inputs[QTY_FIELD], "105");
        calc.backspace();
        assert_eq!(calc.inputs[QTY_FIELD], "10");

        calc.prev_field();
        calc.prev_field();
        calc.prev_field();
        assert_eq!(calc.cursor, CALC_FIELDS.len() - 1);
    }

    #[test]
    fn calculator_computes_both_scenarios() {
        let mut calc = CalculatorState::default();
        calc.inputs[0] = "100".into();
        calc.inputs[1] = "150".into();
        calc.inputs[2] = "10".into();
        calc.compute().unwrap();
        let pos = calc.positive.unwrap();
        assert_eq!(pos.incr, 50.0);
        assert_eq!(pos.var_pct, 50.0);
        assert_eq!(pos.out, 0.0);
        assert_eq!(pos.res, 10.0);
        // Negative inputs left blank
        assert_eq!(calc.negative.unwrap().n_pl, 0.0);

        calc.reset();
        assert!(calc.positive.is_none());
        assert_eq!(calc.cursor, 0);
    }

    #[test]
    fn negative_scenario_uses_its_own_inputs() {
        let mut calc = CalculatorState::default();
        calc.inputs[0] = "100".into();
        calc.inputs[1] = "150".into();
        calc.inputs[2] = "10".into();
        calc.inputs[NEGATIVE_FIELDS_START] = "200".into();
        calc.inputs[NEGATIVE_FIELDS_START + 1] = "150".into();
        calc.inputs[NEG_QTY_FIELD] = "4".into();
        calc.compute().unwrap();

        let pos = calc.positive.unwrap();
        assert_eq!(pos.incr, 50.0);
        assert_eq!(pos.pl, 500.0);

        let neg = calc.negative.unwrap();
        assert_eq!(neg.incr, -50.0);
        assert_eq!(neg.var_pct, -25.0);
        assert_eq!(neg.lqy, 800.0);
        assert_eq!(neg.n_pl, -200.0);
    }

    #[test]
    fn negative_qty_rejects_decimal_point() {
        let mut calc = CalculatorState::default();
        calc.cursor = NEG_QTY_FIELD;
        for c in "3.5".chars() {
            calc.push_char(c);
        }
        assert_eq!(calc.inputs[NEG_QTY_FIELD], "35");

        calc.inputs[NEG_QTY_FIELD] = "-".into();
        assert_eq!(calc.compute(), Err(NEG_QTY_FIELD));
        assert!(calc.negative.is_none());
    }

    #[test]
    fn lone_minus_is_reported_invalid() {
        let mut calc = CalculatorState::default();
        calc.cursor = 1;
        calc.push_char('-');
        assert_eq!(calc.compute(), Err(1));
        assert_eq!(calc.invalid, Some(1));
    }
}
