// Banner rendering module
//
// Renders the top banner: product name, feed connection state, refresh
// interval and snapshot counters.

use crate::app::config::DEFAULT_REFRESH_SECS;
use crate::app::{AppState, ConnectionStatus};
use crate::theme::{
    get_refresh_color, BORDER_BLUE, LABEL_GREY, STATUS_GREEN, STATUS_ORANGE, STATUS_RED,
};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};
use std::time::Instant;

/// Short label and colour for the feed state
pub fn connection_label(status: &ConnectionStatus) -> (&'static str, ratatui::style::Color) {
    match status {
        ConnectionStatus::Open => ("LIVE", STATUS_GREEN),
        ConnectionStatus::Connecting => ("OPENING", STATUS_ORANGE),
        ConnectionStatus::Closed => ("CLOSED", STATUS_ORANGE),
        ConnectionStatus::Failed(_) => ("FAILED", STATUS_RED),
    }
}

pub fn render_banner(f: &mut Frame, area: Rect, app: &AppState, now: Instant) {
    let (state, state_color) = connection_label(&app.connection);
    let refresh_color = get_refresh_color(
        app.refresh_config.refresh_secs,
        DEFAULT_REFRESH_SECS,
        app.refresh_config.recently_changed(now),
    );

    let mut spans = vec![
        Span::styled(
            " shardscope ",
            Style::default()
                .fg(BORDER_BLUE)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("[", Style::default().fg(LABEL_GREY)),
        Span::styled(
            state,
            Style::default().fg(state_color).add_modifier(Modifier::BOLD),
        ),
        Span::styled("] ", Style::default().fg(LABEL_GREY)),
        Span::styled(
            format!("ws://{}{} ", app.config.server, app.config.feed_path),
            Style::default().fg(LABEL_GREY),
        ),
        Span::styled("| refresh ", Style::default().fg(LABEL_GREY)),
        Span::styled(
            format!("{}s", app.refresh_config.refresh_secs),
            Style::default()
                .fg(refresh_color)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(
                " | snapshots {} | nodes {} | servers {} | clients {}",
                app.snapshots_received,
                app.tree.nodes().len().saturating_sub(1),
                app.snapshot.server_activities.len(),
                app.snapshot.client_activities.len(),
            ),
            Style::default().fg(LABEL_GREY),
        ),
    ];

    if let ConnectionStatus::Failed(error) = &app.connection {
        spans.push(Span::styled(
            format!(" | {}", error),
            Style::default().fg(STATUS_RED),
        ));
    }

    let banner = Paragraph::new(Line::from(spans))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Double)
                .border_style(Style::default().fg(BORDER_BLUE)),
        )
        .alignment(Alignment::Left);

    f.render_widget(banner, area);
}
