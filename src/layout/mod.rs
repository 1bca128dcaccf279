// Radial tree layout
//
// Converts the hierarchy into positioned nodes (angle, radius) and
// describes the world-space geometry of the map canvas: the tree disc in
// the middle, the server/client activity columns on the edges and the
// statistics block in the bottom-left corner.
//
// World coordinates use the screen convention: origin at the canvas
// centre, x grows to the right, y grows downwards.

use crate::model::{HierarchyNode, NodeKind};
use std::f64::consts::TAU;

/// Angular span of a full radial layout
pub const FULL_CIRCLE: f64 = TAU;

/// Smallest radius handed out when the requested one is unusable
const MIN_LAYOUT_RADIUS: f64 = 10.0;

/// Angular separation between adjacent leaves sharing a parent
const SIBLING_SEPARATION: f64 = 1.0;

/// Angular separation between adjacent leaves with different parents,
/// also used as the gap between the last and first leaf of the circle
const COUSIN_SEPARATION: f64 = 2.0;

/// World units per terminal row (terminal cells are ~2x taller than wide)
pub const ROW_HEIGHT: f64 = 2.0;

/// Width of one activity column in world units (one unit per terminal column)
pub const ACTIVITY_COLUMN_WIDTH: f64 = 28.0;

/// Number of rows in the statistics block
pub const STAT_ROW_COUNT: usize = 3;

/// Gap kept between the tree disc and the canvas edges/columns
const TREE_MARGIN: f64 = 4.0;

/// A point in world space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Polar to Cartesian: angle 0 points up, angles grow clockwise
    pub fn from_polar(angle: f64, radius: f64) -> Self {
        Self {
            x: radius * angle.sin(),
            y: -radius * angle.cos(),
        }
    }

    /// Inverse of [`Point::from_polar`], angle normalised to [0, 2π)
    pub fn to_polar(self) -> (f64, f64) {
        let radius = (self.x * self.x + self.y * self.y).sqrt();
        let angle = self.x.atan2(-self.y).rem_euclid(TAU);
        (angle, radius)
    }

    pub fn distance(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn lerp(self, other: Point, t: f64) -> Point {
        Point {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

/// Hierarchy node decorated with its layout position
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedNode {
    pub name: String,
    pub kind: NodeKind,
    pub events: u64,
    pub depth: usize,
    /// Radians in [0, 2π)
    pub angle: f64,
    /// Distance from the centre
    pub radius: f64,
    /// Arena index of the parent; lookup only
    pub parent: Option<usize>,
    /// Arena indices of the children, in document order
    pub children: Vec<usize>,
}

impl PositionedNode {
    pub fn point(&self) -> Point {
        Point::from_polar(self.angle, self.radius)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Parent -> child edge, as arena indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeEdge {
    pub source: usize,
    pub target: usize,
}

/// Positioned hierarchy stored as a pre-order arena (index 0 is the root)
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedTree {
    nodes: Vec<PositionedNode>,
}

impl PositionedTree {
    pub fn nodes(&self) -> &[PositionedNode] {
        &self.nodes
    }

    pub fn root(&self) -> &PositionedNode {
        &self.nodes[0]
    }

    pub fn get(&self, idx: usize) -> Option<&PositionedNode> {
        self.nodes.get(idx)
    }

    pub fn parent_of(&self, idx: usize) -> Option<&PositionedNode> {
        self.nodes
            .get(idx)
            .and_then(|node| node.parent)
            .and_then(|parent| self.nodes.get(parent))
    }

    /// One edge per parent-child pair, in pre-order of the child
    pub fn links(&self) -> Vec<TreeEdge> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(target, node)| node.parent.map(|source| TreeEdge { source, target }))
            .collect()
    }

    /// First non-root node (pre-order) whose name contains `fragment`
    pub fn find_containing(&self, fragment: &str) -> Option<&PositionedNode> {
        self.nodes
            .iter()
            .skip(1)
            .find(|node| crate::address::matches_host(&node.name, fragment))
    }

    /// First non-root node (pre-order) whose name equals `name`
    pub fn find_named(&self, name: &str) -> Option<&PositionedNode> {
        self.nodes.iter().skip(1).find(|node| node.name == name)
    }

    /// Index of the node closest to `point`, if any lies within `tolerance`
    pub fn nearest(&self, point: Point, tolerance: f64) -> Option<usize> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (idx, node.point().distance(point)))
            .filter(|(_, dist)| *dist <= tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(idx, _)| idx)
    }
}

/// Lay out `root` as a radial tidy tree
///
/// Leaves receive angular slots in pre-order, spaced by
/// [`SIBLING_SEPARATION`] within a parent and [`COUSIN_SEPARATION`] across
/// parents; internal nodes sit midway between their first and last child.
/// Radius grows linearly with depth so the deepest level lands on
/// `max_radius`. The result depends only on structure and child order.
pub fn layout(root: &HierarchyNode, angular_span: f64, max_radius: f64) -> PositionedTree {
    let span = if angular_span.is_finite() && angular_span > 0.0 {
        angular_span.min(FULL_CIRCLE)
    } else {
        FULL_CIRCLE
    };
    let max_radius = if max_radius.is_finite() && max_radius > 0.0 {
        max_radius
    } else {
        MIN_LAYOUT_RADIUS
    };

    let mut nodes = Vec::with_capacity(root.node_count());
    flatten(root, None, 0, &mut nodes);

    // First pass: leaf slots in pre-order
    let mut leaf_slots: Vec<(usize, f64)> = Vec::new();
    let mut cursor = 0.0;
    let mut previous_leaf: Option<usize> = None;
    for (idx, node) in nodes.iter().enumerate() {
        if !node.is_leaf() {
            continue;
        }
        if let Some(prev) = previous_leaf {
            cursor += if nodes[prev].parent == node.parent {
                SIBLING_SEPARATION
            } else {
                COUSIN_SEPARATION
            };
        }
        leaf_slots.push((idx, cursor));
        previous_leaf = Some(idx);
    }

    let total = cursor + COUSIN_SEPARATION;
    for (idx, slot) in leaf_slots {
        nodes[idx].angle = span * (slot + COUSIN_SEPARATION / 2.0) / total;
    }

    // Second pass: parents centred over their children (children come later
    // in pre-order, so walking backwards settles them first)
    for idx in (0..nodes.len()).rev() {
        let (first, last) = match (nodes[idx].children.first(), nodes[idx].children.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => continue,
        };
        nodes[idx].angle = (nodes[first].angle + nodes[last].angle) / 2.0;
    }

    let max_depth = nodes.iter().map(|node| node.depth).max().unwrap_or(0);
    for node in nodes.iter_mut() {
        node.radius = if max_depth == 0 {
            0.0
        } else {
            node.depth as f64 / max_depth as f64 * max_radius
        };
    }

    PositionedTree { nodes }
}

fn flatten(
    node: &HierarchyNode,
    parent: Option<usize>,
    depth: usize,
    out: &mut Vec<PositionedNode>,
) -> usize {
    let idx = out.len();
    out.push(PositionedNode {
        name: node.name.clone(),
        kind: node.kind,
        events: node.events,
        depth,
        angle: 0.0,
        radius: 0.0,
        parent,
        children: Vec::with_capacity(node.children.len()),
    });

    for child in &node.children {
        let child_idx = flatten(child, Some(idx), depth + 1, out);
        out[idx].children.push(child_idx);
    }

    idx
}

/// One column of fixed-height rows (activity lists, statistics block)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column {
    /// Left edge of the rows
    pub x: f64,
    /// Top edge of row 0
    pub top: f64,
    pub row_height: f64,
}

impl Column {
    /// Vertical centre of row `row` at the column's left edge
    pub fn row_anchor(&self, row: usize) -> Point {
        Point {
            x: self.x,
            y: self.top + (row as f64 + 0.5) * self.row_height,
        }
    }

    /// Row index under world-space `y`, if any
    pub fn row_at(&self, y: f64) -> Option<usize> {
        if y < self.top {
            return None;
        }
        Some(((y - self.top) / self.row_height).floor() as usize)
    }

    pub fn contains_x(&self, x: f64) -> bool {
        x >= self.x && x <= self.x + ACTIVITY_COLUMN_WIDTH
    }
}

/// World-space extent of the map canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 160.0,
            height: 90.0,
        }
    }
}

impl Viewport {
    /// Viewport matching a canvas of `cols` x `rows` terminal cells
    pub fn from_cells(cols: u16, rows: u16) -> Self {
        Self {
            width: cols as f64,
            height: rows as f64 * ROW_HEIGHT,
        }
    }

    /// World-space centre of the terminal cell at (`col`, `row`), both
    /// relative to the canvas' top-left corner
    pub fn cell_center(&self, col: u16, row: u16) -> Point {
        Point {
            x: col as f64 + 0.5 - self.width / 2.0,
            y: (row as f64 + 0.5) * ROW_HEIGHT - self.height / 2.0,
        }
    }

    pub fn x_bounds(&self) -> [f64; 2] {
        [-self.width / 2.0, self.width / 2.0]
    }

    pub fn y_bounds(&self) -> [f64; 2] {
        [-self.height / 2.0, self.height / 2.0]
    }

    /// Largest radius the tree may use without running into the columns
    pub fn tree_radius(&self) -> f64 {
        let horizontal = self.width / 2.0 - ACTIVITY_COLUMN_WIDTH;
        let vertical = self.height / 2.0;
        (horizontal.min(vertical) - TREE_MARGIN).max(MIN_LAYOUT_RADIUS)
    }

    /// HTTP server rows along the left edge
    pub fn server_column(&self) -> Column {
        Column {
            x: -self.width / 2.0 + 1.0,
            top: -self.height / 2.0 + ROW_HEIGHT,
            row_height: ROW_HEIGHT,
        }
    }

    /// HTTP client rows along the right edge
    pub fn client_column(&self) -> Column {
        Column {
            x: self.width / 2.0 - ACTIVITY_COLUMN_WIDTH - 1.0,
            top: -self.height / 2.0 + ROW_HEIGHT,
            row_height: ROW_HEIGHT,
        }
    }

    /// Statistics rows in the bottom-left corner
    pub fn stats_column(&self) -> Column {
        Column {
            x: -self.width / 2.0 + 1.0,
            top: self.height / 2.0 - ROW_HEIGHT * (STAT_ROW_COUNT as f64 + 1.0),
            row_height: ROW_HEIGHT,
        }
    }
}
