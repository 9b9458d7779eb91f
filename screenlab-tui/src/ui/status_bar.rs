//! Bottom status bar: key hints and the last status message.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::{AppState, StatusLevel, Tab};
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let hints = match app.active_tab {
        Tab::Screener => " [w]indow [h]orizon [o]rder [r]un [j/k]scroll [Tab]/[2] calc [q]uit",
        Tab::Calculator => " [j/k]field [0-9 . -]edit [c]ompute [x]reset [Tab] screener [q]uit",
    };
    let mut spans: Vec<Span> = vec![Span::styled(hints, theme::muted())];

    if let Some((msg, level)) = &app.status_message {
        let style = match level {
            StatusLevel::Info => theme::accent(),
            StatusLevel::Warning => theme::warning(),
            StatusLevel::Error => theme::negative(),
        };
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(msg.as_str(), style));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
