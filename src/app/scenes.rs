// Rendered element families of the topology map
//
// Five families are reconciled every cycle: hierarchy nodes, tree links,
// client links, server links and statistic rows. Colours are not part of
// the animated state; they are looked up at draw time from the node kind
// and the current selection.

use crate::layout::{Point, PositionedTree};
use crate::links::RenderedLink;
use crate::reconcile::{Choreography, KeyedDiff, LinkKey, NodeKey, Scene, Tween};
use crate::stats::StatRow;
use std::time::Instant;

/// Radius growth of a node while it animates out
const EXIT_SCALE: f64 = 4.0;

/// Animated state of a node circle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeVisual {
    pub point: Point,
    /// Multiplier on the kind's base radius
    pub scale: f64,
    /// How far the fill has shifted towards the exit red (0.0 ~ 1.0)
    pub exit_tint: f64,
    /// Childless in its tree; leaf labels sit outside the circle
    pub leaf: bool,
}

impl NodeVisual {
    pub fn at(point: Point, leaf: bool) -> Self {
        Self {
            point,
            scale: 1.0,
            exit_tint: 0.0,
            leaf,
        }
    }
}

impl Tween for NodeVisual {
    fn tween(&self, to: &Self, t: f64) -> Self {
        Self {
            point: self.point.lerp(to.point, t),
            scale: self.scale.tween(&to.scale, t),
            exit_tint: self.exit_tint.tween(&to.exit_tint, t),
            leaf: if t > 0.0 { to.leaf } else { self.leaf },
        }
    }

    fn retired(&self) -> Self {
        Self {
            point: self.point,
            scale: self.scale * EXIT_SCALE,
            exit_tint: 1.0,
            leaf: self.leaf,
        }
    }
}

/// Animated state of a link
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkVisual {
    pub source: Point,
    pub target: Point,
}

impl Tween for LinkVisual {
    fn tween(&self, to: &Self, t: f64) -> Self {
        Self {
            source: self.source.lerp(to.source, t),
            target: self.target.lerp(to.target, t),
        }
    }
}

impl From<&RenderedLink> for LinkVisual {
    fn from(link: &RenderedLink) -> Self {
        Self {
            source: link.source,
            target: link.target,
        }
    }
}

/// Animated state of a statistic row; text switches once the move starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatVisual {
    pub value: String,
}

impl Tween for StatVisual {
    fn tween(&self, to: &Self, t: f64) -> Self {
        if t > 0.0 {
            to.clone()
        } else {
            self.clone()
        }
    }
}

/// Targets for one reconciliation cycle
pub struct MapFrame<'a> {
    pub tree: &'a PositionedTree,
    pub server_links: Vec<RenderedLink>,
    pub client_links: Vec<RenderedLink>,
    pub stat_rows: Vec<StatRow>,
}

/// Per-family diffs of the last cycle
#[derive(Debug, Clone, Default)]
pub struct CycleDiffs {
    pub nodes: KeyedDiff<NodeKey>,
    pub tree_links: KeyedDiff<LinkKey>,
    pub client_links: KeyedDiff<LinkKey>,
    pub server_links: KeyedDiff<LinkKey>,
    pub stat_rows: KeyedDiff<&'static str>,
}

impl CycleDiffs {
    pub fn entering(&self) -> usize {
        self.nodes.entering.len()
            + self.tree_links.entering.len()
            + self.client_links.entering.len()
            + self.server_links.entering.len()
            + self.stat_rows.entering.len()
    }

    pub fn updating(&self) -> usize {
        self.nodes.updating.len()
            + self.tree_links.updating.len()
            + self.client_links.updating.len()
            + self.server_links.updating.len()
            + self.stat_rows.updating.len()
    }

    pub fn exiting(&self) -> usize {
        self.nodes.exiting.len()
            + self.tree_links.exiting.len()
            + self.client_links.exiting.len()
            + self.server_links.exiting.len()
            + self.stat_rows.exiting.len()
    }
}

/// Registries for every rendered family
#[derive(Debug, Clone, Default)]
pub struct MapScenes {
    /// Non-root hierarchy nodes; the cluster root is a fixed centre marker
    pub nodes: Scene<NodeKey, NodeVisual>,
    pub tree_links: Scene<LinkKey, LinkVisual>,
    pub client_links: Scene<LinkKey, LinkVisual>,
    pub server_links: Scene<LinkKey, LinkVisual>,
    pub stat_rows: Scene<&'static str, StatVisual>,
}

impl MapScenes {
    pub fn reconcile(
        &mut self,
        frame: MapFrame<'_>,
        now: Instant,
        choreography: &Choreography,
    ) -> CycleDiffs {
        let tree = frame.tree;

        let nodes = tree
            .nodes()
            .iter()
            .skip(1)
            .map(|node| {
                (
                    NodeKey::new(node.kind, node.name.as_str()),
                    NodeVisual::at(node.point(), node.is_leaf()),
                )
            })
            .collect();

        let tree_links = tree
            .links()
            .into_iter()
            .filter_map(|edge| {
                let source = tree.get(edge.source)?;
                let target = tree.get(edge.target)?;
                Some((
                    LinkKey::new(source.name.as_str(), target.name.as_str()),
                    LinkVisual {
                        source: source.point(),
                        target: target.point(),
                    },
                ))
            })
            .collect();

        let client_links = frame
            .client_links
            .iter()
            .map(|link| (link.key(), LinkVisual::from(link)))
            .collect();

        let server_links = frame
            .server_links
            .iter()
            .map(|link| (link.key(), LinkVisual::from(link)))
            .collect();

        let stat_rows = frame
            .stat_rows
            .into_iter()
            .map(|row| (row.label, StatVisual { value: row.value }))
            .collect();

        CycleDiffs {
            nodes: self.nodes.reconcile(nodes, now, choreography),
            tree_links: self.tree_links.reconcile(tree_links, now, choreography),
            client_links: self.client_links.reconcile(client_links, now, choreography),
            server_links: self.server_links.reconcile(server_links, now, choreography),
            stat_rows: self.stat_rows.reconcile(stat_rows, now, choreography),
        }
    }

    pub fn prune(&mut self, now: Instant) {
        self.nodes.prune(now);
        self.tree_links.prune(now);
        self.client_links.prune(now);
        self.server_links.prune(now);
        self.stat_rows.prune(now);
    }
}
