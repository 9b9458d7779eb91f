//! Calibra tab: window/horizon selectors, run progress, colored table.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Cell, Gauge, Paragraph, Row, Table};
use ratatui::Frame;
use screenlab_core::domain::{ForecastHorizon, HistoricalWindow};
use screenlab_runner::{row_cells, RowAnnotations, HEADERS};

use crate::app::{AppState, ScreenerState};
use crate::theme;

const COLUMN_WIDTHS: [u16; 11] = [20, 7, 10, 10, 10, 10, 12, 14, 12, 12, 17];

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .split(area);

    f.render_widget(Paragraph::new(selector_lines(&app.screener)), chunks[0]);
    render_progress(f, chunks[1], app);
    f.render_widget(Paragraph::new(summary_line(app)), chunks[2]);
    render_table(f, chunks[3], &app.screener);
}

fn option_spans<T: Copy + PartialEq + std::fmt::Display>(options: &[T], selected: T) -> Vec<Span<'static>> {
    options
        .iter()
        .map(|o| {
            if *o == selected {
                Span::styled(format!("[{o}] "), theme::accent_bold())
            } else {
                Span::styled(format!(" {o}  "), theme::muted())
            }
        })
        .collect()
}

fn selector_lines(s: &ScreenerState) -> Vec<Line<'static>> {
    let mut window = vec![Span::styled("Historical window (days): ", theme::text())];
    window.extend(option_spans(&HistoricalWindow::ALL, s.window));
    window.push(Span::styled("   Order: ", theme::text()));
    window.push(Span::styled(s.order.to_string(), theme::neutral()));

    let mut horizon = vec![Span::styled("Forecast horizon (days):  ", theme::text())];
    horizon.extend(option_spans(&ForecastHorizon::ALL, s.horizon));
    vec![Line::from(window), Line::from(horizon)]
}

fn render_progress(f: &mut Frame, area: Rect, app: &AppState) {
    let s = &app.screener;
    let label = match (&s.progress, s.running) {
        (Some(p), true) => format!("{}/{} {}", p.completed, p.total, p.row.symbol),
        (None, true) => format!("fetching prices for {} tickers", app.universe_len),
        (Some(p), false) => format!("{}/{}", p.completed, p.total),
        (None, false) => "idle".to_string(),
    };
    let gauge = Gauge::default()
        .gauge_style(theme::accent())
        .ratio(s.fraction().clamp(0.0, 1.0))
        .label(label);
    f.render_widget(gauge, area);
}

fn summary_line(app: &AppState) -> Line<'static> {
    match &app.screener.summary {
        Some(summary) => Line::from(vec![
            Span::styled(
                format!(
                    "Last run: window {} | horizon {} | ",
                    summary.params.window, summary.params.horizon
                ),
                theme::muted(),
            ),
            Span::styled(summary.counts.to_string(), theme::accent()),
            Span::styled(
                format!(
                    " | {:.1}s | {} | {:?} prices from {}",
                    summary.elapsed.as_secs_f64(),
                    summary.model,
                    summary.source,
                    summary.fetched_at.with_timezone(&chrono::Local).format("%H:%M:%S")
                ),
                theme::muted(),
            ),
        ]),
        None => Line::from(Span::styled(
            "No results yet. Press [r] to run the screener.",
            theme::muted(),
        )),
    }
}

fn render_table(f: &mut Frame, area: Rect, s: &ScreenerState) {
    let Some(table) = &s.table else {
        return;
    };
    let header = Row::new(HEADERS.iter().map(|h| Cell::from(*h)))
        .style(theme::accent_bold())
        .height(1);

    let visible = area.height.saturating_sub(1) as usize;
    let rows: Vec<Row> = table
        .annotated()
        .skip(s.scroll)
        .take(visible)
        .map(|(row, notes)| {
            let cells = row_cells(row)
                .into_iter()
                .enumerate()
                .map(|(col, text)| Cell::from(text).style(cell_style(col, notes)));
            Row::new(cells)
        })
        .collect();

    let widget = Table::new(rows, COLUMN_WIDTHS.map(Constraint::Length))
        .header(header)
        .column_spacing(1);
    f.render_widget(widget, area);
}

fn cell_style(col: usize, notes: RowAnnotations) -> ratatui::style::Style {
    match col {
        0 => theme::text().add_modifier(Modifier::BOLD),
        1 => theme::neutral(),
        7 => theme::forecast_style(notes.forecast),
        9 => theme::delta_style(notes.delta),
        10 => theme::status_style(notes.attention),
        _ => theme::text(),
    }
}
