// Application configuration types
//
// This module contains configuration structs and enums for:
// - Command line options and the resolved viewer configuration
// - Map visual settings
// - Refresh intervals
// - Focus panes

use crate::address::MemberAddressFormat;
use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};

// ============================================================================
// Constants
// ============================================================================

/// Server the viewer connects to when none is given
pub const DEFAULT_SERVER: &str = "127.0.0.1:8080";

/// Path of the snapshot push channel on the server
pub const FEED_PATH: &str = "/viewer-entities";

/// Default interval between refresh requests in seconds
pub const DEFAULT_REFRESH_SECS: u64 = 5;

/// Minimum refresh interval in seconds
pub const MIN_REFRESH_SECS: u64 = 1;

/// Maximum refresh interval in seconds
pub const MAX_REFRESH_SECS: u64 = 60;

/// Refresh interval adjustment step in seconds
pub const REFRESH_STEP_SECS: u64 = 1;

/// Default length of one transition phase in milliseconds
pub const DEFAULT_TRANSITION_MS: u64 = 750;

/// Remoting port cluster members listen on
pub const DEFAULT_MEMBER_PORT: u16 = 25520;

/// How long to wait for the push channel to open
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Frame interval of the UI loop (input poll timeout)
pub const FRAME_INTERVAL: Duration = Duration::from_millis(50);

/// Duration to highlight recently changed refresh intervals
pub const CHANGE_HIGHLIGHT_DURATION: Duration = Duration::from_millis(500);

/// Log file used when none is given
pub const DEFAULT_LOG_FILE: &str = "shardscope.log";

// ============================================================================
// Command line
// ============================================================================

/// Live terminal map of an actor cluster's sharding topology
#[derive(Debug, Parser)]
#[command(name = "shardscope", version, about)]
pub struct Cli {
    /// Snapshot server as host:port
    #[arg(short, long, default_value = DEFAULT_SERVER)]
    pub server: String,

    /// Seconds between refresh requests
    #[arg(short, long, default_value_t = DEFAULT_REFRESH_SECS)]
    pub refresh: u64,

    /// Length of one transition phase in milliseconds (0 disables animation)
    #[arg(long, default_value_t = DEFAULT_TRANSITION_MS)]
    pub transition_ms: u64,

    /// File that receives the diagnostic log
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Port used when composing member addresses
    #[arg(long, default_value_t = DEFAULT_MEMBER_PORT)]
    pub member_port: u16,

    /// Scheme used when composing member addresses
    #[arg(long, default_value = "akka")]
    pub member_scheme: String,

    /// Actor system name used when composing member addresses
    #[arg(long, default_value = "cluster")]
    pub member_system: String,
}

/// Resolved viewer configuration
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub server: String,
    pub feed_path: String,
    pub transition: Duration,
    pub connect_timeout: Duration,
    pub member_port: u16,
    pub member_format: MemberAddressFormat,
    pub log_file: PathBuf,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            feed_path: FEED_PATH.to_string(),
            transition: Duration::from_millis(DEFAULT_TRANSITION_MS),
            connect_timeout: CONNECT_TIMEOUT,
            member_port: DEFAULT_MEMBER_PORT,
            member_format: MemberAddressFormat::default(),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl Cli {
    /// Split into the static configuration and the initial refresh setting
    pub fn into_config(self) -> (ViewerConfig, RefreshConfig) {
        let config = ViewerConfig {
            server: self.server,
            feed_path: FEED_PATH.to_string(),
            transition: Duration::from_millis(self.transition_ms),
            connect_timeout: CONNECT_TIMEOUT,
            member_port: self.member_port,
            member_format: MemberAddressFormat {
                scheme: self.member_scheme,
                system: self.member_system,
            },
            log_file: self.log_file,
        };
        (config, RefreshConfig::with_secs(self.refresh))
    }
}

// ============================================================================
// Enums
// ============================================================================

/// Which list the cursor moves through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pane {
    /// Hierarchy nodes, in layout order (default)
    #[default]
    Tree,
    /// HTTP server activity rows
    Servers,
    /// HTTP client activity rows
    Clients,
}

impl Pane {
    pub fn next(self) -> Self {
        match self {
            Pane::Tree => Pane::Servers,
            Pane::Servers => Pane::Clients,
            Pane::Clients => Pane::Tree,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Pane::Tree => "Tree",
            Pane::Servers => "Servers",
            Pane::Clients => "Clients",
        }
    }
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Visual settings for the topology map
#[derive(Debug, Clone)]
pub struct MapSettings {
    /// Animate transitions between snapshots (toggle with 'a' key)
    pub animations_enabled: bool,

    /// Show node names next to circles (toggle with 'l' key)
    pub labels_enabled: bool,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            animations_enabled: true,
            labels_enabled: true,
        }
    }
}

/// Configuration for the refresh request interval
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Seconds between refresh requests (1-60)
    pub refresh_secs: u64,

    /// Timestamp of last interval change (for visual feedback)
    pub last_change: Option<Instant>,
}

impl RefreshConfig {
    /// Create a new RefreshConfig with default values
    pub fn new() -> Self {
        Self::with_secs(DEFAULT_REFRESH_SECS)
    }

    /// Create a RefreshConfig clamped to the supported range
    pub fn with_secs(refresh_secs: u64) -> Self {
        Self {
            refresh_secs: refresh_secs.clamp(MIN_REFRESH_SECS, MAX_REFRESH_SECS),
            last_change: None,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }

    /// Refresh more often (shorter interval)
    pub fn faster(&mut self, now: Instant) {
        self.refresh_secs = self
            .refresh_secs
            .saturating_sub(REFRESH_STEP_SECS)
            .max(MIN_REFRESH_SECS);
        self.last_change = Some(now);
    }

    /// Refresh less often (longer interval)
    pub fn slower(&mut self, now: Instant) {
        self.refresh_secs = self
            .refresh_secs
            .saturating_add(REFRESH_STEP_SECS)
            .min(MAX_REFRESH_SECS);
        self.last_change = Some(now);
    }

    /// Whether the interval changed within [`CHANGE_HIGHLIGHT_DURATION`]
    pub fn recently_changed(&self, now: Instant) -> bool {
        self.last_change
            .is_some_and(|at| now.saturating_duration_since(at) < CHANGE_HIGHLIGHT_DURATION)
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["shardscope"]).unwrap();
        let (config, refresh) = cli.into_config();
        assert_eq!(config.server, DEFAULT_SERVER);
        assert_eq!(config.feed_path, "/viewer-entities");
        assert_eq!(config.transition, Duration::from_millis(750));
        assert_eq!(config.member_port, 25520);
        assert_eq!(config.member_format, MemberAddressFormat::default());
        assert_eq!(refresh.interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::try_parse_from([
            "shardscope",
            "--server",
            "10.0.0.2:9000",
            "--refresh",
            "500",
            "--transition-ms",
            "0",
            "--member-scheme",
            "pekko",
        ])
        .unwrap();
        let (config, refresh) = cli.into_config();
        assert_eq!(config.server, "10.0.0.2:9000");
        assert_eq!(config.transition, Duration::ZERO);
        assert_eq!(config.member_format.scheme, "pekko");
        assert_eq!(refresh.refresh_secs, MAX_REFRESH_SECS);
    }

    #[test]
    fn test_refresh_bounds() {
        let now = Instant::now();
        let mut refresh = RefreshConfig::with_secs(2);
        refresh.faster(now);
        refresh.faster(now);
        assert_eq!(refresh.refresh_secs, MIN_REFRESH_SECS);
        assert!(refresh.recently_changed(now));
        assert!(!refresh.recently_changed(now + Duration::from_secs(1)));

        let mut refresh = RefreshConfig::with_secs(59);
        refresh.slower(now);
        refresh.slower(now);
        assert_eq!(refresh.refresh_secs, MAX_REFRESH_SECS);
    }

    #[test]
    fn test_pane_cycle() {
        assert_eq!(Pane::default().next(), Pane::Servers);
        assert_eq!(Pane::Servers.next(), Pane::Clients);
        assert_eq!(Pane::Clients.next(), Pane::Tree);
    }
}
