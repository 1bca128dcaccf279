// Theme module - Color constants and theme re-exports
//
// This module provides the colour palette for the topology map. Node
// colours follow the cluster roles; link colours cycle through a
// twelve-colour qualitative palette keyed by peer id.

pub mod default;

use ratatui::style::Color;

/// Map background
/// RGB: (0, 16, 23)
pub const BACKGROUND: Color = Color::Rgb(0x00, 0x10, 0x17);

/// Panel borders and titles
/// RGB: (4, 110, 151)
pub const BORDER_BLUE: Color = Color::Rgb(0x04, 0x6E, 0x97);

/// Parent -> child tree links
/// RGB: (85, 85, 85)
pub const TREE_LINK_GREY: Color = Color::Rgb(0x55, 0x55, 0x55);

/// Node labels
/// RGB: (153, 153, 153)
pub const LABEL_GREY: Color = Color::Rgb(0x99, 0x99, 0x99);

/// Label of the node or row under the cursor
/// RGB: (254, 225, 183)
pub const HIGHLIGHT_CREAM: Color = Color::Rgb(0xFE, 0xE1, 0xB7);

/// Member number drawn inside member circles
pub const MEMBER_NUMBER_WHITE: Color = Color::Rgb(0xFF, 0xFF, 0xFF);

/// Traced entity or shard
/// RGB: (170, 0, 0)
pub const TRACE_RED: Color = Color::Rgb(0xAA, 0x00, 0x00);

/// Colour exiting nodes fade towards
pub const EXIT_RED: Color = Color::Rgb(0xFF, 0x00, 0x00);

pub const ENTITY_BLUE: Color = Color::Rgb(0x04, 0x6E, 0x97);
pub const SHARD_GREEN: Color = Color::Rgb(0x00, 0xC0, 0x00);
pub const SINGLETON_VIOLET: Color = Color::Rgb(0x8F, 0x42, 0xEB);
pub const HTTP_SERVER_AMBER: Color = Color::Rgb(0xF3, 0xB5, 0x00);
pub const MEMBER_ORANGE: Color = Color::Rgb(0xF1, 0x7D, 0x00);
pub const CLUSTER_CRIMSON: Color = Color::Rgb(0xB3, 0x00, 0x00);

/// Statistics panel text
pub const STAT_TEXT: Color = Color::Rgb(0xFF, 0xFF, 0xFF);

/// Healthy channel / default settings indicator
/// RGB: (158, 206, 106)
pub const STATUS_GREEN: Color = Color::Rgb(158, 206, 106);

/// Warning indicator
/// RGB: (255, 158, 100)
pub const STATUS_ORANGE: Color = Color::Rgb(255, 158, 100);

/// Error indicator
/// RGB: (247, 118, 142)
pub const STATUS_RED: Color = Color::Rgb(247, 118, 142);

/// Twelve-colour qualitative palette for client/server links
pub const LINK_PALETTE: [Color; 12] = [
    Color::Rgb(0x8D, 0xD3, 0xC7),
    Color::Rgb(0xFF, 0xFF, 0xB3),
    Color::Rgb(0xBE, 0xBA, 0xDA),
    Color::Rgb(0xFB, 0x80, 0x72),
    Color::Rgb(0x80, 0xB1, 0xD3),
    Color::Rgb(0xFD, 0xB4, 0x62),
    Color::Rgb(0xB3, 0xDE, 0x69),
    Color::Rgb(0xFC, 0xCD, 0xE5),
    Color::Rgb(0xD9, 0xD9, 0xD9),
    Color::Rgb(0xBC, 0x80, 0xBD),
    Color::Rgb(0xCC, 0xEB, 0xC5),
    Color::Rgb(0xFF, 0xED, 0x6F),
];

// Re-export theme functions for convenient access
pub use default::*;
