// Keyboard and mouse event handling
//
// This module maps terminal input onto AppState operations and selection
// events.

use super::AppState;
use crate::selection::SelectionEvent;
use crossterm::event::{KeyCode, MouseButton, MouseEvent, MouseEventKind};
use std::time::Instant;

/// Handle keyboard events and update application state
///
/// Returns `true` if the application should continue running,
/// `false` if it should exit.
///
/// # Key Bindings
/// - `q`, `Q`, `Esc` - Quit the application
/// - `Tab` - Cycle the cursor pane (tree, servers, clients)
/// - `Up` / `Down` - Move the cursor
/// - `Space` - Click the item under the cursor
/// - `f`, `F` - Request the member view for the cursor item
/// - `0`-`9`, `-` - Type an entity id to trace
/// - `Backspace` - Remove the last typed character
/// - `Enter` - Trace the typed entity id (empty clears the trace)
/// - `a`, `A` - Toggle animations
/// - `l`, `L` - Toggle node labels
/// - `[` / `]` - Shorter / longer refresh interval
/// - `r`, `R` - Refresh now
pub fn handle_key_event(app: &mut AppState, key: KeyCode, now: Instant) -> bool {
    match key {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
            app.running = false;
            false
        }
        KeyCode::Tab => {
            app.cycle_focus();
            true
        }
        KeyCode::Up => {
            app.select_previous();
            true
        }
        KeyCode::Down => {
            app.select_next();
            true
        }
        KeyCode::Char(' ') => {
            app.activate_cursor(now);
            true
        }
        KeyCode::Char('f') | KeyCode::Char('F') => {
            app.request_cursor_member(now);
            true
        }
        KeyCode::Char(digit) if digit.is_ascii_digit() => {
            app.select(SelectionEvent::KeyDigit(digit), now);
            true
        }
        KeyCode::Char('-') => {
            app.select(SelectionEvent::KeyDash, now);
            true
        }
        KeyCode::Backspace => {
            app.select(SelectionEvent::KeyBackspace, now);
            true
        }
        KeyCode::Enter => {
            app.select(SelectionEvent::KeyEnter, now);
            true
        }
        KeyCode::Char('a') | KeyCode::Char('A') => {
            app.toggle_animations();
            true
        }
        KeyCode::Char('l') | KeyCode::Char('L') => {
            app.toggle_labels();
            true
        }
        KeyCode::Char('[') => {
            app.increase_refresh_rate(now);
            true
        }
        KeyCode::Char(']') => {
            app.decrease_refresh_rate(now);
            true
        }
        KeyCode::Char('r') | KeyCode::Char('R') => {
            app.refresh(now);
            true
        }
        _ => true,
    }
}

/// Handle mouse events; a left click on the map clicks whatever is there
pub fn handle_mouse_event(app: &mut AppState, mouse: MouseEvent, now: Instant) {
    if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
        return;
    }

    let area = app.map_area;
    let inside = mouse.column >= area.x
        && mouse.column < area.x + area.width
        && mouse.row >= area.y
        && mouse.row < area.y + area.height;
    if !inside {
        return;
    }

    let point = app
        .viewport
        .cell_center(mouse.column - area.x, mouse.row - area.y);
    app.click_at(point, now);
}
