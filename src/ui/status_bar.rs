// Status Bar rendering module
//
// Renders the bottom status bar: the trace selection and the item under
// the cursor on the first line, keyboard shortcuts and toggle indicators
// on the second.

use crate::app::{AppState, Pane};
use crate::theme::{
    BORDER_BLUE, HIGHLIGHT_CREAM, LABEL_GREY, STATUS_GREEN, TRACE_RED,
};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

/// Describe the item under the cursor, if any
pub fn cursor_detail(app: &AppState) -> Option<String> {
    if let Some(node) = app.cursor_node() {
        return Some(format!(
            "{} {} | events {}",
            node.kind, node.name, node.events
        ));
    }
    let peer = app.cursor_peer()?;
    let role = match app.focus {
        Pane::Clients => "client",
        _ => "server",
    };
    Some(format!("{} {} @ {}", role, peer.id, peer.ip))
}

fn selection_spans(app: &AppState) -> Vec<Span<'static>> {
    let mut spans = vec![Span::styled(" Trace: ", Style::default().fg(LABEL_GREY))];

    match (&app.selection.selected_entity, &app.selection.selected_shard) {
        (Some(entity), Some(shard)) => spans.push(Span::styled(
            format!("entity {} in shard {}", entity, shard),
            Style::default().fg(TRACE_RED).add_modifier(Modifier::BOLD),
        )),
        (Some(entity), None) => spans.push(Span::styled(
            format!("entity {}", entity),
            Style::default().fg(TRACE_RED).add_modifier(Modifier::BOLD),
        )),
        (None, Some(shard)) => spans.push(Span::styled(
            format!("shard {}", shard),
            Style::default().fg(TRACE_RED).add_modifier(Modifier::BOLD),
        )),
        (None, None) => spans.push(Span::styled("none", Style::default().fg(LABEL_GREY))),
    }

    if !app.selection.pending_input.is_empty() {
        spans.push(Span::styled(" | id: ", Style::default().fg(LABEL_GREY)));
        spans.push(Span::styled(
            format!("{}_", app.selection.pending_input),
            Style::default()
                .fg(HIGHLIGHT_CREAM)
                .add_modifier(Modifier::BOLD),
        ));
    }

    if !app.selection.hidden_members.is_empty() {
        spans.push(Span::styled(
            format!(" | hidden members: {}", app.selection.hidden_members.len()),
            Style::default().fg(LABEL_GREY),
        ));
    }

    spans.push(Span::styled(
        format!(" | {}: ", app.focus.label()),
        Style::default().fg(LABEL_GREY),
    ));
    let detail = cursor_detail(app).unwrap_or_else(|| "-".to_string());
    spans.push(Span::styled(detail, Style::default().fg(HIGHLIGHT_CREAM)));

    spans
}

pub fn render_status_bar(f: &mut Frame, area: Rect, app: &AppState) {
    // Calculate available width for hints (subtract borders)
    let available_width = area.width.saturating_sub(4);

    // Define all hints with priority levels
    struct Hint {
        priority: u8,
        key: &'static str,
        desc: &'static str,
        color: Color,
    }

    let hints = [
        Hint {
            priority: 1,
            key: "Q:",
            desc: "Quit | ",
            color: TRACE_RED,
        },
        Hint {
            priority: 1,
            key: "Tab/↑↓:",
            desc: "Navigate | ",
            color: BORDER_BLUE,
        },
        Hint {
            priority: 1,
            key: "Space:",
            desc: "Click | ",
            color: BORDER_BLUE,
        },
        Hint {
            priority: 1,
            key: "0-9 Enter:",
            desc: "Trace id | ",
            color: BORDER_BLUE,
        },
        Hint {
            priority: 2,
            key: "F:",
            desc: "Member view | ",
            color: BORDER_BLUE,
        },
        Hint {
            priority: 2,
            key: "[/]:",
            desc: "Refresh rate | ",
            color: BORDER_BLUE,
        },
        Hint {
            priority: 3,
            key: "R:",
            desc: "Refresh | ",
            color: BORDER_BLUE,
        },
    ];

    let mut spans = vec![Span::raw(" ")];
    let mut current_length = 1;

    // Process hints by priority
    for priority in 1..=3 {
        for hint in hints.iter().filter(|hint| hint.priority == priority) {
            let hint_length = hint.key.chars().count() + hint.desc.len();
            if current_length + hint_length <= available_width as usize {
                spans.push(Span::styled(
                    hint.key,
                    Style::default().fg(hint.color).add_modifier(Modifier::BOLD),
                ));
                spans.push(Span::raw(hint.desc));
                current_length += hint_length;
            }
        }
    }

    spans.extend(build_toggle_indicators(app));

    let status = Paragraph::new(vec![Line::from(selection_spans(app)), Line::from(spans)])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Double)
                .border_style(Style::default().fg(BORDER_BLUE)),
        )
        .alignment(Alignment::Left);

    f.render_widget(status, area);
}

fn toggle_spans(key: &'static str, enabled: bool) -> [Span<'static>; 3] {
    let (state, color) = if enabled {
        ("ON", STATUS_GREEN)
    } else {
        ("OFF", LABEL_GREY)
    };
    [
        Span::styled(key, Style::default().fg(LABEL_GREY)),
        Span::styled(state, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::styled("] ", Style::default().fg(LABEL_GREY)),
    ]
}

/// Build toggle status indicator spans for the status bar
/// Shows [A:ON/OFF] [L:ON/OFF], green for ON
pub fn build_toggle_indicators(app: &AppState) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    spans.extend(toggle_spans("[A:", app.map_settings.animations_enabled));
    spans.extend(toggle_spans("[L:", app.map_settings.labels_enabled));
    spans
}
