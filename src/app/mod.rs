// Application state management
//
// This module contains the main AppState struct and re-exports
// configuration types from the config submodule.

pub mod config;
pub mod event;
pub mod scenes;

// Re-export config types for convenience
pub use config::{MapSettings, Pane, RefreshConfig, ViewerConfig};
pub use scenes::{CycleDiffs, MapFrame, MapScenes};

use crate::feed::{FeedEvent, FeedRequest, SendOutcome, SnapshotFeed};
use crate::layout::{layout, Point, PositionedNode, PositionedTree, Viewport, FULL_CIRCLE};
use crate::links::{resolve_client_links, resolve_server_links};
use crate::model::{NodeRole, Peer, Snapshot};
use crate::reconcile::Choreography;
use crate::selection::{self, SelectionEvent, TraceSelection};
use crate::stats::{StatisticsTracker, StatsReport};
use ratatui::layout::Rect;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Hit radius around node centres for mouse clicks, in world units
const CLICK_TOLERANCE: f64 = 3.0;

/// State of the push channel as last observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Never opened, or closed by the server
    Closed,
    /// Connect in flight; requests are held until it finishes
    Connecting,
    Open,
    /// Last send or read failed; reopened on the next request
    Failed(String),
}

/// Main application state
pub struct AppState {
    /// Whether the application is running
    pub running: bool,

    pub config: ViewerConfig,

    /// Refresh interval configuration
    pub refresh_config: RefreshConfig,

    /// Map visual settings (animations, labels)
    pub map_settings: MapSettings,

    feed: Box<dyn SnapshotFeed>,

    pub connection: ConnectionStatus,

    /// Snapshot currently rendered
    pub snapshot: Snapshot,

    /// Layout of `snapshot.tree` for the current viewport
    pub tree: PositionedTree,

    pub selection: TraceSelection,

    stats: StatisticsTracker,

    /// Statistics of the last snapshot
    pub report: StatsReport,

    /// Rendered element registries
    pub scenes: MapScenes,

    /// Diffs of the last reconciliation cycle
    pub last_diffs: CycleDiffs,

    /// World-space extent of the map canvas
    pub viewport: Viewport,

    /// Screen area of the map canvas from the last draw (for mouse hits)
    pub map_area: Rect,

    /// Pane the cursor moves through
    pub focus: Pane,

    /// Cursor position inside the focused pane
    pub cursor: Option<usize>,

    /// Last time a refresh was requested
    last_refresh: Option<Instant>,

    /// Snapshots decoded since startup
    pub snapshots_received: u64,
}

impl AppState {
    /// Create the application around `feed`, rendering the placeholder
    pub fn new(
        config: ViewerConfig,
        refresh_config: RefreshConfig,
        feed: Box<dyn SnapshotFeed>,
        now: Instant,
    ) -> Self {
        let viewport = Viewport::default();
        let snapshot = Snapshot::placeholder();
        let tree = layout(&snapshot.tree, FULL_CIRCLE, viewport.tree_radius());

        let mut state = Self {
            running: true,
            config,
            refresh_config,
            map_settings: MapSettings::default(),
            feed,
            connection: ConnectionStatus::Closed,
            snapshot,
            tree,
            selection: TraceSelection::default(),
            stats: StatisticsTracker::new(now),
            report: StatsReport::default(),
            scenes: MapScenes::default(),
            last_diffs: CycleDiffs::default(),
            viewport,
            map_area: Rect::default(),
            focus: Pane::default(),
            cursor: None,
            last_refresh: None,
            snapshots_received: 0,
        };
        state.reconcile_scenes(now);
        state
    }

    /// Update state on each frame
    ///
    /// Drains the feed, fires the periodic refresh and drops finished exit
    /// animations.
    pub fn on_tick(&mut self, now: Instant) {
        for event in self.feed.poll() {
            self.handle_feed_event(event, now);
        }
        if self.connection == ConnectionStatus::Open && !self.feed.is_open() {
            self.connection = ConnectionStatus::Closed;
        }

        let due = self
            .last_refresh
            .map_or(true, |at| now.saturating_duration_since(at) >= self.refresh_config.interval());
        if due {
            self.refresh(now);
        }

        self.scenes.prune(now);
    }

    fn handle_feed_event(&mut self, event: FeedEvent, now: Instant) {
        match event {
            FeedEvent::Opened => {
                info!("Snapshot feed opened");
                self.connection = ConnectionStatus::Open;
            }
            FeedEvent::Message(text) => match Snapshot::decode(&text) {
                Ok(snapshot) => {
                    self.snapshots_received += 1;
                    self.apply_snapshot(snapshot, now);
                }
                Err(error) => warn!(%error, "Ignoring undecodable snapshot"),
            },
            FeedEvent::Closed => {
                info!("Snapshot feed closed");
                self.connection = ConnectionStatus::Closed;
            }
            FeedEvent::Error(error) => {
                warn!(%error, "Snapshot feed failed");
                self.connection = ConnectionStatus::Failed(error);
            }
        }
    }

    /// Ask the server for a fresh snapshot
    pub fn refresh(&mut self, now: Instant) {
        self.last_refresh = Some(now);
        self.send_request(FeedRequest::Refresh, now);
    }

    /// Ask for the snapshot as seen by the member running at `ip`
    pub fn request_member(&mut self, ip: &str, now: Instant) {
        let address = self
            .config
            .member_format
            .compose(ip, self.config.member_port);
        info!(%address, "Requesting member view");
        self.send_request(FeedRequest::Member(address), now);
    }

    fn send_request(&mut self, request: FeedRequest, now: Instant) {
        let opening = !self.feed.is_open();
        if opening {
            // Nothing rendered from before the connection stays on screen,
            // whether or not the open succeeds
            self.apply_snapshot(Snapshot::placeholder(), now);
        }

        match self.feed.send(&request) {
            Ok(SendOutcome::Sent) => {
                debug!(payload = request.payload(), "Request sent");
            }
            Ok(SendOutcome::Queued) => {
                debug!(payload = request.payload(), "Request held until the feed opens");
                self.connection = ConnectionStatus::Connecting;
            }
            Err(error) => {
                warn!(%error, "Request failed");
                self.connection = ConnectionStatus::Failed(error.to_string());
            }
        }
    }

    /// Replace the rendered snapshot and start a reconciliation cycle
    pub fn apply_snapshot(&mut self, snapshot: Snapshot, now: Instant) {
        self.snapshot = snapshot;
        self.tree = layout(&self.snapshot.tree, FULL_CIRCLE, self.viewport.tree_radius());
        self.report = self
            .stats
            .update(&self.snapshot.server_activities, &self.tree, now);
        self.reconcile_scenes(now);
        self.clamp_cursor();
    }

    /// Timeline used for the next reconciliation
    pub fn choreography(&self) -> Choreography {
        if self.map_settings.animations_enabled {
            Choreography::new(self.config.transition)
        } else {
            Choreography::instant()
        }
    }

    /// Re-derive links and rows from the current tree and selection and
    /// reconcile every family
    fn reconcile_scenes(&mut self, now: Instant) {
        let server_links =
            resolve_server_links(&self.snapshot.server_activities, &self.tree, &self.selection);
        let client_links = resolve_client_links(
            &self.snapshot.client_activities,
            &self.tree,
            &self.selection,
            self.viewport.client_column(),
        );

        let frame = MapFrame {
            tree: &self.tree,
            server_links,
            client_links,
            stat_rows: self.report.rows(),
        };
        let choreography = self.choreography();
        self.last_diffs = self.scenes.reconcile(frame, now, &choreography);

        if !self.last_diffs.nodes.is_unchanged() {
            info!(
                entering = self.last_diffs.nodes.entering.len(),
                exiting = self.last_diffs.nodes.exiting.len(),
                "Topology changed"
            );
        }
        debug!(
            entering = self.last_diffs.entering(),
            updating = self.last_diffs.updating(),
            exiting = self.last_diffs.exiting(),
            transition_ms = choreography.total().as_millis() as u64,
            "Reconciled map"
        );
    }

    /// Adopt a new canvas size, re-laying out the tree if it changed
    pub fn set_viewport(&mut self, viewport: Viewport, now: Instant) {
        if viewport == self.viewport {
            return;
        }
        self.viewport = viewport;
        self.tree = layout(&self.snapshot.tree, FULL_CIRCLE, viewport.tree_radius());
        self.reconcile_scenes(now);
    }

    /// Feed one selection event through the controller
    pub fn select(&mut self, event: SelectionEvent, now: Instant) {
        let hidden_before = self.selection.hidden_members.clone();
        let current = std::mem::take(&mut self.selection);
        self.selection = selection::apply(current, event, &self.tree);

        // Colours are looked up at draw time; only link visibility needs a cycle
        if self.selection.hidden_members != hidden_before {
            self.reconcile_scenes(now);
        }
    }

    /// Click on the node at arena index `idx`
    pub fn click_node(&mut self, idx: usize, now: Instant) {
        let Some(node) = self.tree.get(idx) else {
            return;
        };
        let event = match node.kind.role {
            NodeRole::Entity => SelectionEvent::ClickEntity(node.name.clone()),
            NodeRole::Shard => SelectionEvent::ClickShard(node.name.clone()),
            _ if node.kind.is_member() => SelectionEvent::ClickMember(node.name.clone()),
            _ => return,
        };
        self.select(event, now);
    }

    /// Click at a world-space point: activity rows first, then nodes
    pub fn click_at(&mut self, point: Point, now: Instant) {
        let servers = self.viewport.server_column();
        if servers.contains_x(point.x) {
            if let Some(peer) = servers
                .row_at(point.y)
                .and_then(|row| self.snapshot.server_activities.get(row))
                .map(|activity| activity.server.clone())
            {
                self.request_member(&peer.ip, now);
                return;
            }
        }

        let clients = self.viewport.client_column();
        if clients.contains_x(point.x) {
            if let Some(peer) = clients
                .row_at(point.y)
                .and_then(|row| self.snapshot.client_activities.get(row))
                .map(|activity| activity.client.clone())
            {
                self.request_member(&peer.ip, now);
                return;
            }
        }

        if let Some(idx) = self.tree.nearest(point, CLICK_TOLERANCE) {
            self.click_node(idx, now);
        }
    }

    // ========================================================================
    // Cursor
    // ========================================================================

    /// Number of items in the focused pane
    fn pane_len(&self) -> usize {
        match self.focus {
            // The root is not selectable
            Pane::Tree => self.tree.nodes().len().saturating_sub(1),
            Pane::Servers => self.snapshot.server_activities.len(),
            Pane::Clients => self.snapshot.client_activities.len(),
        }
    }

    fn clamp_cursor(&mut self) {
        let len = self.pane_len();
        self.cursor = match self.cursor {
            _ if len == 0 => None,
            Some(idx) => Some(idx.min(len - 1)),
            None => None,
        };
    }

    /// Move focus to the next pane and reset the cursor
    pub fn cycle_focus(&mut self) {
        self.focus = self.focus.next();
        self.cursor = None;
    }

    /// Move cursor up (decrease index)
    pub fn select_previous(&mut self) {
        let len = self.pane_len();
        if len == 0 {
            self.cursor = None;
            return;
        }
        self.cursor = match self.cursor {
            // Start at the last item
            None => Some(len - 1),
            Some(idx) => Some(idx.saturating_sub(1)),
        };
    }

    /// Move cursor down (increase index)
    pub fn select_next(&mut self) {
        let len = self.pane_len();
        if len == 0 {
            self.cursor = None;
            return;
        }
        self.cursor = match self.cursor {
            None => Some(0),
            Some(idx) => Some((idx + 1).min(len - 1)),
        };
    }

    /// Arena index of the node under the cursor
    pub fn cursor_node_index(&self) -> Option<usize> {
        match self.focus {
            Pane::Tree => self.cursor.map(|idx| idx + 1),
            _ => None,
        }
    }

    pub fn cursor_node(&self) -> Option<&PositionedNode> {
        self.cursor_node_index().and_then(|idx| self.tree.get(idx))
    }

    /// Peer of the activity row under the cursor
    pub fn cursor_peer(&self) -> Option<&Peer> {
        let idx = self.cursor?;
        match self.focus {
            Pane::Tree => None,
            Pane::Servers => self
                .snapshot
                .server_activities
                .get(idx)
                .map(|activity| &activity.server),
            Pane::Clients => self
                .snapshot
                .client_activities
                .get(idx)
                .map(|activity| &activity.client),
        }
    }

    /// Click the item under the cursor
    pub fn activate_cursor(&mut self, now: Instant) {
        match self.focus {
            Pane::Tree => {
                if let Some(idx) = self.cursor_node_index() {
                    self.click_node(idx, now);
                }
            }
            Pane::Servers | Pane::Clients => self.request_cursor_member(now),
        }
    }

    /// Request the member view for the cursor item
    ///
    /// Activity rows use the peer IP; member nodes use their own address.
    pub fn request_cursor_member(&mut self, now: Instant) {
        if let Some(ip) = self.cursor_peer().map(|peer| peer.ip.clone()) {
            self.request_member(&ip, now);
            return;
        }
        let address = self
            .cursor_node()
            .filter(|node| node.kind.is_member())
            .map(|node| node.name.clone());
        if let Some(address) = address {
            info!(%address, "Requesting member view");
            self.send_request(FeedRequest::Member(address), now);
        }
    }

    // ========================================================================
    // Settings
    // ========================================================================

    pub fn toggle_animations(&mut self) {
        self.map_settings.animations_enabled = !self.map_settings.animations_enabled;
    }

    pub fn toggle_labels(&mut self) {
        self.map_settings.labels_enabled = !self.map_settings.labels_enabled;
    }

    /// Shorten the refresh interval
    pub fn increase_refresh_rate(&mut self, now: Instant) {
        self.refresh_config.faster(now);
    }

    /// Lengthen the refresh interval
    pub fn decrease_refresh_rate(&mut self, now: Instant) {
        self.refresh_config.slower(now);
    }
}
