//! Parrot/neon palette and the style helpers the panels draw with.
//!
//! - **Accent**: electric cyan (focus, selected options)
//! - **Positive**: neon green (strong forecast delta)
//! - **Negative**: hot pink (losses, forecast below market)
//! - **Warning**: neon orange (non-OK status cells)
//! - **Muted**: steel blue (hints, secondary text)

use ratatui::style::{Color, Modifier, Style};
use screenlab_runner::{DeltaTone, ForecastTone};

pub const ACCENT: Color = Color::Rgb(0, 255, 255);
pub const POSITIVE: Color = Color::Rgb(0, 255, 128);
pub const NEGATIVE: Color = Color::Rgb(255, 20, 147);
pub const WARNING: Color = Color::Rgb(255, 140, 0);
pub const NEUTRAL: Color = Color::Rgb(147, 112, 219);
pub const MUTED: Color = Color::Rgb(100, 149, 237);
pub const FORECAST_UP: Color = Color::Rgb(30, 144, 255);
pub const FORECAST_DOWN: Color = Color::Rgb(255, 64, 64);
pub const TEXT_PRIMARY: Color = Color::White;

pub fn accent() -> Style {
    Style::default().fg(ACCENT)
}

pub fn accent_bold() -> Style {
    accent().add_modifier(Modifier::BOLD)
}

pub fn muted() -> Style {
    Style::default().fg(MUTED)
}

pub fn positive() -> Style {
    Style::default().fg(POSITIVE)
}

pub fn negative() -> Style {
    Style::default().fg(NEGATIVE)
}

pub fn warning() -> Style {
    Style::default().fg(WARNING)
}

pub fn neutral() -> Style {
    Style::default().fg(NEUTRAL)
}

pub fn text() -> Style {
    Style::default().fg(TEXT_PRIMARY)
}

pub fn panel_border(active: bool) -> Style {
    if active {
        accent()
    } else {
        muted()
    }
}

pub fn panel_title(active: bool) -> Style {
    if active {
        accent_bold()
    } else {
        muted()
    }
}

/// FORECAST VALUE cell: blue above the market price, red below.
pub fn forecast_style(tone: Option<ForecastTone>) -> Style {
    match tone {
        Some(ForecastTone::Above) => Style::default().fg(FORECAST_UP),
        Some(ForecastTone::Below) => Style::default().fg(FORECAST_DOWN),
        _ => text(),
    }
}

/// Δ % FORECAST cell.
pub fn delta_style(tone: Option<DeltaTone>) -> Style {
    match tone {
        Some(DeltaTone::Strong) => positive().add_modifier(Modifier::BOLD),
        Some(DeltaTone::Negative) => negative(),
        _ => text(),
    }
}

pub fn status_style(attention: bool) -> Style {
    if attention {
        warning().add_modifier(Modifier::BOLD)
    } else {
        positive()
    }
}

/// Calculator output: negative values and OUT in red.
pub fn calc_value_style(label: &str, value: f64) -> Style {
    if label == "OUT" || value < 0.0 {
        Style::default().fg(FORECAST_DOWN)
    } else {
        text()
    }
}
