// Topology map rendering module
//
// Renders the sharding map canvas: the radial hierarchy with its tree links,
// server -> entity links, client -> server links, the activity columns on
// both edges and the statistics block. Element geometry and opacity are
// sampled from the scene registries so in-flight transitions are drawn.
//
// World space has y growing downwards; the canvas has y growing upwards,
// so every point is flipped on the way in.

use crate::address::extract_member_suffix;
use crate::app::{AppState, ConnectionStatus, Pane};
use crate::layout::{Column, Point, Viewport, ACTIVITY_COLUMN_WIDTH};
use crate::model::NodeRole;
use crate::reconcile::NodeKey;
use crate::stats::{group_thousands, ENTITY_COUNT_LABEL, MESSAGE_COUNT_LABEL, MESSAGE_RATE_LABEL};
use crate::theme::{
    fade, label_offset, link_color, node_color, node_radius, tint_exiting, BACKGROUND,
    BORDER_BLUE, HIGHLIGHT_CREAM, LABEL_GREY, MEMBER_NUMBER_WHITE, STAT_TEXT,
    TREE_LINK_GREY,
};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle, Context, Line as CanvasLine},
        Block, BorderType, Borders,
    },
    Frame,
};
use std::f64::consts::PI;
use std::time::Instant;
use unicode_width::UnicodeWidthStr;

/// World units per pixel unit of the radius tables in `theme`
const NODE_SCALE: f64 = 0.12;

/// Tree links are drawn at this fraction of full opacity
const TREE_LINK_OPACITY: f64 = 0.4;

/// Hidden members are drawn at this fraction of full opacity
const HIDDEN_MEMBER_OPACITY: f64 = 0.4;

/// Elements fainter than this are not drawn at all
const MIN_DRAWN_OPACITY: f64 = 0.05;

/// Labels appear once their node is this opaque
const MIN_LABEL_OPACITY: f64 = 0.5;

/// Straight segments per curved link
const CURVE_SEGMENTS: usize = 12;

/// Radius of the cursor ring relative to the node circle
const CURSOR_RING_SCALE: f64 = 1.6;

/// Concentric rings used to fill a node circle
const FILL_RINGS: usize = 3;

/// Order of the rows in the statistics block
const STAT_LABELS: [&str; 3] = [ENTITY_COUNT_LABEL, MESSAGE_COUNT_LABEL, MESSAGE_RATE_LABEL];

/// Control points of a cubic Bézier link
pub type LinkPath = [Point; 4];

/// Point at `t` (0.0 ~ 1.0) along a cubic Bézier curve
pub fn cubic_bezier(path: &LinkPath, t: f64) -> Point {
    let u = 1.0 - t;
    let [p0, p1, p2, p3] = path;
    let a = u * u * u;
    let b = 3.0 * u * u * t;
    let c = 3.0 * u * t * t;
    let d = t * t * t;
    Point::new(
        a * p0.x + b * p1.x + c * p2.x + d * p3.x,
        a * p0.y + b * p1.y + c * p2.y + d * p3.y,
    )
}

/// Radial link: both control points sit on the mid radius, one at each
/// end's angle, so the curve follows the rings of the tree
pub fn radial_link_path(source: Point, target: Point) -> LinkPath {
    let (source_angle, source_radius) = source.to_polar();
    let (target_angle, target_radius) = target.to_polar();
    let mid = (source_radius + target_radius) / 2.0;
    [
        source,
        Point::from_polar(source_angle, mid),
        Point::from_polar(target_angle, mid),
        target,
    ]
}

/// Horizontal link: leaves and arrives horizontally, bending at mid x
pub fn horizontal_link_path(source: Point, target: Point) -> LinkPath {
    let mid_x = (source.x + target.x) / 2.0;
    [
        source,
        Point::new(mid_x, source.y),
        Point::new(mid_x, target.y),
        target,
    ]
}

/// Left edge of a label `width` cells wide for a node at `point`
///
/// Leaf labels sit outside the node and read away from the centre; parent
/// labels sit inside and read towards it.
pub fn label_origin(point: Point, is_leaf: bool, offset: f64, width: f64) -> Point {
    let (angle, radius) = point.to_polar();
    if radius < f64::EPSILON {
        return Point::new(point.x + offset, point.y);
    }

    let anchor_radius = if is_leaf {
        radius + offset
    } else {
        (radius - offset).max(0.0)
    };
    let anchor = Point::from_polar(angle, anchor_radius);
    let right_half = angle < PI;

    // Text always grows to the right, so shift it when it should read leftwards
    let reads_right = right_half == is_leaf;
    if reads_right {
        anchor
    } else {
        Point::new(anchor.x - width, anchor.y)
    }
}

/// Truncate `text` to at most `max_width` terminal cells
pub fn fit_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    for ch in text.chars() {
        let candidate = format!("{}{}", out, ch);
        if candidate.width() + 1 > max_width {
            break;
        }
        out = candidate;
    }
    out.push('…');
    out
}

fn to_canvas(point: Point) -> (f64, f64) {
    (point.x, -point.y)
}

fn draw_segment(ctx: &mut Context<'_>, from: Point, to: Point, color: Color) {
    let (x1, y1) = to_canvas(from);
    let (x2, y2) = to_canvas(to);
    ctx.draw(&CanvasLine {
        x1,
        y1,
        x2,
        y2,
        color,
    });
}

fn draw_curve(ctx: &mut Context<'_>, path: &LinkPath, color: Color) {
    let mut previous = path[0];
    for step in 1..=CURVE_SEGMENTS {
        let next = cubic_bezier(path, step as f64 / CURVE_SEGMENTS as f64);
        draw_segment(ctx, previous, next, color);
        previous = next;
    }
}

fn fill_circle(ctx: &mut Context<'_>, center: Point, radius: f64, color: Color) {
    let (x, y) = to_canvas(center);
    for ring in 0..FILL_RINGS {
        ctx.draw(&Circle {
            x,
            y,
            radius: radius * (FILL_RINGS - ring) as f64 / FILL_RINGS as f64,
            color,
        });
    }
}

fn print_at(ctx: &mut Context<'_>, point: Point, text: String, style: Style) {
    let (x, y) = to_canvas(point);
    ctx.print(x, y, Line::from(Span::styled(text, style)));
}

fn is_traced(app: &AppState, key: &NodeKey) -> bool {
    match key.kind.role {
        NodeRole::Entity => app.selection.is_entity_traced(&key.name),
        NodeRole::Shard => app.selection.is_shard_traced(&key.name),
        _ => false,
    }
}

fn draw_tree_links(ctx: &mut Context<'_>, app: &AppState, now: Instant) {
    for link in app.scenes.tree_links.visible(now) {
        let opacity = link.opacity * TREE_LINK_OPACITY;
        if opacity < MIN_DRAWN_OPACITY * TREE_LINK_OPACITY {
            continue;
        }
        let path = radial_link_path(link.visual.source, link.visual.target);
        draw_curve(ctx, &path, fade(TREE_LINK_GREY, opacity));
    }
}

fn draw_activity_links(ctx: &mut Context<'_>, app: &AppState, now: Instant) {
    for link in app.scenes.server_links.visible(now) {
        if link.opacity < MIN_DRAWN_OPACITY {
            continue;
        }
        let path = radial_link_path(link.visual.source, link.visual.target);
        draw_curve(ctx, &path, fade(link_color(&link.key.source), link.opacity));
    }

    for link in app.scenes.client_links.visible(now) {
        if link.opacity < MIN_DRAWN_OPACITY {
            continue;
        }
        let path = horizontal_link_path(link.visual.source, link.visual.target);
        draw_curve(ctx, &path, fade(link_color(&link.key.source), link.opacity));
    }
}

fn draw_nodes(ctx: &mut Context<'_>, app: &AppState, now: Instant) {
    let root = app.tree.root();
    fill_circle(
        ctx,
        Point::ORIGIN,
        node_radius(root.kind) * NODE_SCALE,
        node_color(root.kind, false),
    );

    for node in app.scenes.nodes.visible(now) {
        let mut opacity = node.opacity;
        if node.key.kind.is_member() && app.selection.is_member_address_hidden(&node.key.name) {
            opacity *= HIDDEN_MEMBER_OPACITY;
        }
        if opacity < MIN_DRAWN_OPACITY {
            continue;
        }

        let base = node_color(node.key.kind, is_traced(app, node.key));
        let color = fade(tint_exiting(base, node.visual.exit_tint), opacity);
        let radius = node_radius(node.key.kind) * NODE_SCALE * node.visual.scale;
        fill_circle(ctx, node.visual.point, radius, color);
    }

    // Ring around the node under the cursor, following its animation
    let cursor = app
        .cursor_node()
        .map(|node| NodeKey::new(node.kind, node.name.as_str()));
    if let Some(key) = cursor {
        if let Some((visual, _)) = app.scenes.nodes.sample(&key, now) {
            let (x, y) = to_canvas(visual.point);
            ctx.draw(&Circle {
                x,
                y,
                radius: node_radius(key.kind) * NODE_SCALE * visual.scale * CURSOR_RING_SCALE,
                color: HIGHLIGHT_CREAM,
            });
        }
    }
}

fn draw_node_labels(ctx: &mut Context<'_>, app: &AppState, now: Instant) {
    let cursor = app
        .cursor_node()
        .map(|node| NodeKey::new(node.kind, node.name.as_str()));

    for node in app.scenes.nodes.visible(now) {
        if node.retiring || node.opacity < MIN_LABEL_OPACITY {
            continue;
        }
        let highlighted = cursor.as_ref() == Some(node.key);

        if node.key.kind.is_member() {
            let suffix = extract_member_suffix(&node.key.name);
            let half = suffix.width() as f64 / 2.0;
            print_at(
                ctx,
                Point::new(node.visual.point.x - half, node.visual.point.y),
                suffix,
                Style::default()
                    .fg(MEMBER_NUMBER_WHITE)
                    .add_modifier(Modifier::BOLD),
            );
        }

        if !app.map_settings.labels_enabled && !highlighted {
            continue;
        }

        let text = node.key.name.clone();
        let origin = label_origin(
            node.visual.point,
            node.visual.leaf,
            label_offset(node.key.kind) * NODE_SCALE,
            text.width() as f64,
        );
        let style = if highlighted {
            Style::default()
                .fg(HIGHLIGHT_CREAM)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED)
        } else {
            Style::default().fg(fade(LABEL_GREY, node.opacity))
        };
        print_at(ctx, origin, text, style);
    }
}

/// Header one row above the first activity row
fn column_header(column: Column) -> Point {
    Point::new(column.x, column.top - column.row_height / 2.0)
}

fn activity_row_text(id: &str, ip: &str, message_count: i64) -> String {
    fit_width(
        &format!("{:>3} {:<14} {:>8}", id, ip, group_thousands(message_count)),
        ACTIVITY_COLUMN_WIDTH as usize,
    )
}

fn draw_activity_rows(ctx: &mut Context<'_>, app: &AppState) {
    let header = Style::default().fg(BORDER_BLUE).add_modifier(Modifier::BOLD);
    let servers = app.viewport.server_column();
    let clients = app.viewport.client_column();

    if !app.snapshot.server_activities.is_empty() {
        print_at(ctx, column_header(servers), "HTTP servers".to_string(), header);
    }
    for (row, activity) in app.snapshot.server_activities.iter().enumerate() {
        let highlighted = app.focus == Pane::Servers && app.cursor == Some(row);
        print_at(
            ctx,
            servers.row_anchor(row),
            activity_row_text(&activity.server.id, &activity.server.ip, activity.message_count),
            row_style(&activity.server.id, highlighted),
        );
    }

    if !app.snapshot.client_activities.is_empty() {
        print_at(ctx, column_header(clients), "HTTP clients".to_string(), header);
    }
    for (row, activity) in app.snapshot.client_activities.iter().enumerate() {
        let highlighted = app.focus == Pane::Clients && app.cursor == Some(row);
        print_at(
            ctx,
            clients.row_anchor(row),
            activity_row_text(&activity.client.id, &activity.client.ip, activity.message_count),
            row_style(&activity.client.id, highlighted),
        );
    }
}

fn row_style(id: &str, highlighted: bool) -> Style {
    if highlighted {
        Style::default()
            .fg(HIGHLIGHT_CREAM)
            .add_modifier(Modifier::BOLD | Modifier::REVERSED)
    } else {
        Style::default().fg(link_color(id))
    }
}

fn draw_stat_rows(ctx: &mut Context<'_>, app: &AppState, now: Instant) {
    let column = app.viewport.stats_column();
    for row in app.scenes.stat_rows.visible(now) {
        if row.opacity < MIN_DRAWN_OPACITY {
            continue;
        }
        let Some(idx) = STAT_LABELS.iter().position(|label| label == row.key) else {
            continue;
        };
        let text = format!("{:<15}{:>12}", row.key, row.visual.value);
        print_at(
            ctx,
            column.row_anchor(idx),
            text,
            Style::default().fg(fade(STAT_TEXT, row.opacity)),
        );
    }
}

fn draw_empty_message(ctx: &mut Context<'_>, app: &AppState) {
    if app.tree.nodes().len() > 1 {
        return;
    }
    let message = match &app.connection {
        ConnectionStatus::Open => "Waiting for the first snapshot...".to_string(),
        ConnectionStatus::Closed | ConnectionStatus::Connecting => {
            format!("Connecting to {}...", app.config.server)
        }
        ConnectionStatus::Failed(error) => format!("Feed unavailable: {}", error),
    };
    let message = fit_width(&message, app.viewport.width.max(1.0) as usize);
    let half = message.width() as f64 / 2.0;
    print_at(
        ctx,
        Point::new(-half, crate::layout::ROW_HEIGHT * 2.0),
        message,
        Style::default().fg(LABEL_GREY).add_modifier(Modifier::ITALIC),
    );
}

/// Render the topology canvas into `area`
///
/// Records the canvas area on `app` for mouse hit-testing and re-lays out
/// the tree when the canvas size changed.
pub fn render_topology(f: &mut Frame, area: Rect, app: &mut AppState, now: Instant) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_BLUE))
        .title(Span::styled(
            " Sharding topology ",
            Style::default().fg(BORDER_BLUE).add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(area);
    app.map_area = inner;
    if inner.width > 0 && inner.height > 0 {
        app.set_viewport(Viewport::from_cells(inner.width, inner.height), now);
    }

    let app: &AppState = app;
    let viewport = app.viewport;

    let canvas = Canvas::default()
        .block(block)
        .background_color(BACKGROUND)
        .marker(Marker::Braille)
        .x_bounds(viewport.x_bounds())
        .y_bounds(viewport.y_bounds())
        .paint(move |ctx| {
            draw_tree_links(ctx, app, now);
            draw_activity_links(ctx, app, now);
            ctx.layer();
            draw_nodes(ctx, app, now);
            ctx.layer();
            draw_node_labels(ctx, app, now);
            draw_activity_rows(ctx, app);
            draw_stat_rows(ctx, app, now);
            draw_empty_message(ctx, app);
        });

    f.render_widget(canvas, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        a.distance(b) < 1e-9
    }

    #[test]
    fn test_bezier_endpoints() {
        let path = horizontal_link_path(Point::new(-10.0, 4.0), Point::new(10.0, -4.0));
        assert!(close(cubic_bezier(&path, 0.0), path[0]));
        assert!(close(cubic_bezier(&path, 1.0), path[3]));

        // Symmetric controls put the midpoint halfway between the ends
        assert!(close(cubic_bezier(&path, 0.5), Point::new(0.0, 0.0)));
    }

    #[test]
    fn test_horizontal_path_leaves_horizontally() {
        let path = horizontal_link_path(Point::new(0.0, 0.0), Point::new(20.0, 10.0));
        assert_eq!(path[1], Point::new(10.0, 0.0));
        assert_eq!(path[2], Point::new(10.0, 10.0));
    }

    #[test]
    fn test_radial_path_controls_on_mid_radius() {
        let source = Point::from_polar(0.5, 10.0);
        let target = Point::from_polar(1.5, 20.0);
        let path = radial_link_path(source, target);

        let (angle1, radius1) = path[1].to_polar();
        let (angle2, radius2) = path[2].to_polar();
        assert!((radius1 - 15.0).abs() < 1e-9);
        assert!((radius2 - 15.0).abs() < 1e-9);
        assert!((angle1 - 0.5).abs() < 1e-9);
        assert!((angle2 - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_leaf_label_reads_outwards() {
        // Right half: text starts just outside the node
        let right = Point::from_polar(PI / 2.0, 10.0);
        let origin = label_origin(right, true, 2.0, 4.0);
        assert!((origin.x - 12.0).abs() < 1e-9);

        // Left half: text ends just outside the node
        let left = Point::from_polar(3.0 * PI / 2.0, 10.0);
        let origin = label_origin(left, true, 2.0, 4.0);
        assert!((origin.x - -16.0).abs() < 1e-9);
    }

    #[test]
    fn test_parent_label_reads_inwards() {
        let right = Point::from_polar(PI / 2.0, 10.0);
        let origin = label_origin(right, false, 2.0, 4.0);
        assert!((origin.x - 4.0).abs() < 1e-9);

        let centre = label_origin(Point::ORIGIN, false, 2.0, 4.0);
        assert_eq!(centre, Point::new(2.0, 0.0));
    }

    #[test]
    fn test_fit_width() {
        assert_eq!(fit_width("short", 10), "short");
        assert_eq!(fit_width("exactly10!", 10), "exactly10!");
        assert_eq!(fit_width("much too long", 6), "much …");
        assert!(fit_width("much too long", 6).width() <= 6);
    }

    #[test]
    fn test_activity_row_text_fits_column() {
        let text = activity_row_text("3", "172.17.0.3", 1_234_567);
        assert!(text.contains("172.17.0.3"));
        assert!(text.contains("1,234,567"));
        assert!(text.width() <= ACTIVITY_COLUMN_WIDTH as usize);
    }
}
