//! Keyboard input dispatch: global keys, then tab-specific handlers.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use screenlab_runner::RowOrder;

use crate::app::{AppState, Tab};

pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    // Only handle key press events (Windows sends both Press and Release).
    if key.kind != KeyEventKind::Press {
        return;
    }

    // Global keys. Digits belong to the calculator fields on that tab.
    match key.code {
        KeyCode::Char('q') => {
            app.running = false;
            return;
        }
        KeyCode::Tab | KeyCode::BackTab => {
            app.active_tab = app.active_tab.next();
            return;
        }
        KeyCode::Char('1') if app.active_tab == Tab::Screener => return,
        KeyCode::Char('2') if app.active_tab == Tab::Screener => {
            app.active_tab = Tab::Calculator;
            return;
        }
        _ => {}
    }

    match app.active_tab {
        Tab::Screener => handle_screener_key(app, key),
        Tab::Calculator => handle_calculator_key(app, key),
    }
}

fn handle_screener_key(app: &mut AppState, key: KeyEvent) {
    let s = &mut app.screener;
    match key.code {
        KeyCode::Char('w') => s.window = s.window.cycle(),
        KeyCode::Char('h') => s.horizon = s.horizon.cycle(),
        KeyCode::Char('o') => {
            s.order = match s.order {
                RowOrder::Declaration => RowOrder::Completion,
                RowOrder::Completion => RowOrder::Declaration,
            };
        }
        KeyCode::Char('j') | KeyCode::Down => s.scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => s.scroll_up(),
        KeyCode::Char('g') | KeyCode::Home => s.scroll = 0,
        KeyCode::Char('G') | KeyCode::End => s.scroll = s.row_count().saturating_sub(1),
        KeyCode::Char('r') | KeyCode::Enter => app.request_run(),
        _ => {}
    }
}

fn handle_calculator_key(app: &mut AppState, key: KeyEvent) {
    let calc = &mut app.calculator;
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => calc.next_field(),
        KeyCode::Char('k') | KeyCode::Up => calc.prev_field(),
        KeyCode::Char(c @ ('0'..='9' | '.' | '-')) => calc.push_char(c),
        KeyCode::Backspace => calc.backspace(),
        KeyCode::Char('c') | KeyCode::Enter => app.compute_calculator(),
        KeyCode::Char('x') => {
            calc.reset();
            app.set_status("Calculator reset");
        }
        _ => {}
    }
}
