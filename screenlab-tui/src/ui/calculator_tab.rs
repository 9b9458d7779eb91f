//! Calcolatore tab: editable inputs on the left, derived outputs on the right.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::{AppState, CALC_FIELDS, NEGATIVE_FIELDS_START};
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(30),
            Constraint::Length(30),
            Constraint::Min(24),
        ])
        .split(area);

    render_inputs(f, columns[0], app);

    let calc = &app.calculator;
    let positive = calc.positive.map(|o| o.labeled().to_vec());
    let negative = calc.negative.map(|o| o.labeled().to_vec());
    render_outputs(f, columns[1], " Positive ", positive.as_deref());
    render_outputs(f, columns[2], " Negative ", negative.as_deref());
}

fn render_inputs(f: &mut Frame, area: Rect, app: &AppState) {
    let calc = &app.calculator;
    let mut lines: Vec<Line> = vec![Line::from(Span::styled("Positive", theme::accent_bold()))];
    for (i, (label, value)) in CALC_FIELDS.iter().zip(calc.inputs.iter()).enumerate() {
        if i == NEGATIVE_FIELDS_START {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled("Negative", theme::accent_bold())));
        }
        let label_style = if calc.invalid == Some(i) {
            theme::negative()
        } else if i == calc.cursor {
            theme::accent().add_modifier(Modifier::REVERSED)
        } else {
            theme::muted()
        };
        let cursor = if i == calc.cursor { "_" } else { "" };
        lines.push(Line::from(vec![
            Span::styled(format!("{label:>6} "), label_style),
            Span::styled(format!("{value}{cursor}"), theme::text()),
        ]));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::muted())
        .title(" Inputs ");
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_outputs(f: &mut Frame, area: Rect, title: &str, values: Option<&[(&'static str, f64)]>) {
    let lines: Vec<Line> = match values {
        Some(values) => values
            .iter()
            .map(|(label, value)| {
                Line::from(vec![
                    Span::styled(format!("{label:<8}"), theme::muted()),
                    Span::styled(
                        format!("{value:>16.2}"),
                        theme::calc_value_style(label, *value),
                    ),
                ])
            })
            .collect(),
        None => vec![Line::from(Span::styled("[c] to compute", theme::muted()))],
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::muted())
        .title(title.to_string());
    f.render_widget(Paragraph::new(lines).block(block), area);
}
