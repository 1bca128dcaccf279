// UI rendering module
//
// This module contains all UI rendering components for shardscope.
// The main draw() function orchestrates rendering of all UI panels.

mod banner;
mod status_bar;
mod topology;

use crate::app::AppState;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};
use std::time::Instant;

use banner::render_banner;
use status_bar::render_status_bar;
use topology::render_topology;

/// Main UI drawing function
///
/// Takes the state mutably because the map canvas size drives the layout.
pub fn draw(f: &mut Frame, app: &mut AppState, now: Instant) {
    let size = f.area();

    // Main layout: banner, map, status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Banner
            Constraint::Min(0),    // Map
            Constraint::Length(4), // Status bar
        ])
        .split(size);

    render_banner(f, chunks[0], app, now);
    render_topology(f, chunks[1], app, now);
    render_status_bar(f, chunks[2], app);
}
