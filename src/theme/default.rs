// Default theme functions
//
// Lookup tables keyed by node kind (colour, circle radius, label offset)
// and the colour blending helpers used to render opacity on a terminal.

use ratatui::style::Color;

use super::{
    BACKGROUND, CLUSTER_CRIMSON, ENTITY_BLUE, EXIT_RED, HTTP_SERVER_AMBER, LINK_PALETTE,
    MEMBER_ORANGE, SHARD_GREEN, SINGLETON_VIOLET, STATUS_GREEN, STATUS_ORANGE, STATUS_RED,
    TRACE_RED,
};
use crate::model::{NodeKind, NodeRole};

/// Fill colour of a node circle
///
/// `traced` only affects entities and shards.
pub fn node_color(kind: NodeKind, traced: bool) -> Color {
    match kind.role {
        NodeRole::Entity if traced => TRACE_RED,
        NodeRole::Entity => ENTITY_BLUE,
        NodeRole::Shard if traced => TRACE_RED,
        NodeRole::Shard => SHARD_GREEN,
        NodeRole::Singleton => SINGLETON_VIOLET,
        NodeRole::HttpServer => HTTP_SERVER_AMBER,
        _ if kind.is_member() => MEMBER_ORANGE,
        NodeRole::Cluster => CLUSTER_CRIMSON,
        _ => EXIT_RED,
    }
}

/// Circle radius in pixel units
///
/// Callers scale this into world units.
pub fn node_radius(kind: NodeKind) -> f64 {
    match kind.role {
        NodeRole::Entity => 8.0,
        NodeRole::Shard => 12.0,
        _ if kind.is_member() => 22.0,
        NodeRole::Cluster => 10.0,
        _ => 3.0,
    }
}

/// Distance between a node's centre and its label, same units as
/// [`node_radius`]
pub fn label_offset(kind: NodeKind) -> f64 {
    match kind.role {
        NodeRole::Entity => 10.0,
        NodeRole::Shard => 14.0,
        _ if kind.is_member() => 24.0,
        NodeRole::Cluster => 12.0,
        _ => 5.0,
    }
}

/// Stroke colour for links originating at peer `id`
///
/// Numeric ids cycle through [`LINK_PALETTE`]; anything else uses the
/// first entry.
pub fn link_color(id: &str) -> Color {
    let idx = id
        .parse::<u64>()
        .map(|n| (n % LINK_PALETTE.len() as u64) as usize)
        .unwrap_or(0);
    LINK_PALETTE[idx]
}

/// Extract RGB components, mapping named colours to black
pub fn rgb(color: Color) -> (u8, u8, u8) {
    match color {
        Color::Rgb(r, g, b) => (r, g, b),
        _ => (0, 0, 0),
    }
}

/// Interpolate between two RGB colors based on a ratio (0.0 ~ 1.0)
///
/// # Arguments
/// * `color1` - Starting color as (r, g, b) tuple
/// * `color2` - Ending color as (r, g, b) tuple
/// * `ratio` - Interpolation ratio (0.0 = color1, 1.0 = color2)
///
/// # Returns
/// Interpolated Color::Rgb value
pub fn interpolate_color(color1: (u8, u8, u8), color2: (u8, u8, u8), ratio: f32) -> Color {
    let ratio = ratio.clamp(0.0, 1.0);
    let r = (color1.0 as f32 + (color2.0 as f32 - color1.0 as f32) * ratio).round() as u8;
    let g = (color1.1 as f32 + (color2.1 as f32 - color1.1 as f32) * ratio).round() as u8;
    let b = (color1.2 as f32 + (color2.2 as f32 - color1.2 as f32) * ratio).round() as u8;
    Color::Rgb(r, g, b)
}

/// Blend `color` onto the map background at `opacity` (0.0 ~ 1.0)
pub fn fade(color: Color, opacity: f64) -> Color {
    interpolate_color(rgb(BACKGROUND), rgb(color), opacity as f32)
}

/// Shift `color` towards the exit red by `amount` (0.0 ~ 1.0)
pub fn tint_exiting(color: Color, amount: f64) -> Color {
    interpolate_color(rgb(color), rgb(EXIT_RED), amount as f32)
}

/// Get color for refresh interval based on its value relative to default
///
/// Color coding:
/// - Green: default or slower (fewer requests to the server)
/// - Orange: faster than default
/// - Red: less than half the default interval
///
/// If recently_changed is true, returns a brighter version of the color
pub fn get_refresh_color(interval_secs: u64, default_secs: u64, recently_changed: bool) -> Color {
    let base_color = if interval_secs >= default_secs {
        STATUS_GREEN
    } else if interval_secs * 2 < default_secs {
        STATUS_RED
    } else {
        STATUS_ORANGE
    };

    if recently_changed {
        let (r, g, b) = rgb(base_color);
        // Increase brightness by 20%
        let r = ((r as f32 * 1.2).min(255.0)) as u8;
        let g = ((g as f32 * 1.2).min(255.0)) as u8;
        let b = ((b as f32 * 1.2).min(255.0)) as u8;
        Color::Rgb(r, g, b)
    } else {
        base_color
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_color_table() {
        assert_eq!(node_color(NodeKind::ENTITY, false), ENTITY_BLUE);
        assert_eq!(node_color(NodeKind::ENTITY, true), TRACE_RED);
        assert_eq!(node_color(NodeKind::SHARD, true), TRACE_RED);
        assert_eq!(node_color(NodeKind::MEMBER, false), MEMBER_ORANGE);
        assert_eq!(
            node_color(NodeKind::member_of(NodeRole::HttpServer), false),
            HTTP_SERVER_AMBER
        );
        assert_eq!(node_color(NodeKind::CLUSTER, true), CLUSTER_CRIMSON);
        assert_eq!(node_color(NodeKind::parse("gateway"), false), EXIT_RED);
    }

    #[test]
    fn test_radius_and_offset_tables() {
        assert_eq!(node_radius(NodeKind::ENTITY), 8.0);
        assert_eq!(node_radius(NodeKind::member_of(NodeRole::HttpServer)), 22.0);
        assert_eq!(node_radius(NodeKind::plain(NodeRole::Singleton)), 3.0);
        for kind in [NodeKind::ENTITY, NodeKind::SHARD, NodeKind::MEMBER, NodeKind::CLUSTER] {
            assert!(label_offset(kind) > node_radius(kind));
        }
    }

    #[test]
    fn test_link_color_cycles() {
        assert_eq!(link_color("0"), LINK_PALETTE[0]);
        assert_eq!(link_color("13"), LINK_PALETTE[1]);
        assert_eq!(link_color("client-a"), LINK_PALETTE[0]);
    }

    #[test]
    fn test_fade_endpoints() {
        assert_eq!(fade(SHARD_GREEN, 1.0), SHARD_GREEN);
        assert_eq!(fade(SHARD_GREEN, 0.0), BACKGROUND);
        assert_eq!(fade(SHARD_GREEN, 0.000001), BACKGROUND);
    }

    #[test]
    fn test_interpolate_color_clamps() {
        assert_eq!(interpolate_color((0, 0, 0), (200, 100, 50), 0.5), Color::Rgb(100, 50, 25));
        assert_eq!(interpolate_color((0, 0, 0), (200, 100, 50), 2.0), Color::Rgb(200, 100, 50));
    }

    #[test]
    fn test_refresh_color() {
        assert_eq!(get_refresh_color(5, 5, false), STATUS_GREEN);
        assert_eq!(get_refresh_color(30, 5, false), STATUS_GREEN);
        assert_eq!(get_refresh_color(3, 5, false), STATUS_ORANGE);
        assert_eq!(get_refresh_color(1, 5, false), STATUS_RED);
        assert_ne!(get_refresh_color(5, 5, true), STATUS_GREEN);
    }
}
