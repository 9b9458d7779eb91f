//! Top-level UI layout: tab bar, active tab frame, status bar.

pub mod calculator_tab;
pub mod screener_tab;
pub mod status_bar;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Modifier;
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Tabs};
use ratatui::Frame;

use crate::app::{AppState, Tab};
use crate::theme;

/// Draw the entire UI.
pub fn draw(f: &mut Frame, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_tabs(f, chunks[0], app);
    draw_tab(f, chunks[1], app);
    status_bar::render(f, chunks[2], app);
}

fn draw_tabs(f: &mut Frame, area: Rect, app: &AppState) {
    let titles: Vec<Line> = Tab::ALL
        .iter()
        .map(|t| Line::from(format!(" {} [{}] ", t.label(), t.index() + 1)))
        .collect();
    let tabs = Tabs::new(titles)
        .select(app.active_tab.index())
        .style(theme::muted())
        .highlight_style(theme::accent_bold().add_modifier(Modifier::REVERSED));
    f.render_widget(tabs, area);
}

fn draw_tab(f: &mut Frame, area: Rect, app: &AppState) {
    let tab = app.active_tab;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::panel_border(true))
        .title(format!(" {} ", tab.label()))
        .title_style(theme::panel_title(true));

    let inner = block.inner(area);
    f.render_widget(block, area);

    match tab {
        Tab::Screener => screener_tab::render(f, inner, app),
        Tab::Calculator => calculator_tab::render(f, inner, app),
    }
}
