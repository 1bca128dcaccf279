// Running statistics derived from consecutive snapshots

use crate::layout::PositionedTree;
use crate::model::{NodeRole, ServerActivity};
use std::time::Instant;

pub const ENTITY_COUNT_LABEL: &str = "Entity count";
pub const MESSAGE_COUNT_LABEL: &str = "Message count";
pub const MESSAGE_RATE_LABEL: &str = "Message rate/s";

/// Derived metrics for one snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsReport {
    pub entity_count: usize,
    pub message_count: i64,
    pub rate_per_second: i64,
}

/// One labelled line of the statistics panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatRow {
    pub label: &'static str,
    pub value: String,
}

impl StatsReport {
    /// Panel rows; empty while there are no entities to report on
    pub fn rows(&self) -> Vec<StatRow> {
        if self.entity_count == 0 {
            return Vec::new();
        }
        vec![
            StatRow {
                label: ENTITY_COUNT_LABEL,
                value: group_thousands(self.entity_count as i64),
            },
            StatRow {
                label: MESSAGE_COUNT_LABEL,
                value: group_thousands(self.message_count),
            },
            StatRow {
                label: MESSAGE_RATE_LABEL,
                value: group_thousands(self.rate_per_second),
            },
        ]
    }
}

/// Remembers the previous observation so rates can be derived
#[derive(Debug, Clone)]
pub struct StatisticsTracker {
    last_message_count: i64,
    last_observed_at: Instant,
}

impl StatisticsTracker {
    pub fn new(now: Instant) -> Self {
        Self {
            last_message_count: 0,
            last_observed_at: now,
        }
    }

    /// Compute the report for a snapshot observed at `now`
    ///
    /// The elapsed time is rounded to whole seconds and floored at one, so
    /// back-to-back snapshots never divide by zero. State is overwritten
    /// unconditionally.
    pub fn update(
        &mut self,
        servers: &[ServerActivity],
        tree: &PositionedTree,
        now: Instant,
    ) -> StatsReport {
        let entity_count = tree
            .links()
            .iter()
            .filter(|edge| {
                tree.get(edge.target)
                    .is_some_and(|node| node.kind.role == NodeRole::Entity)
            })
            .count();

        let message_count = servers
            .iter()
            .fold(0i64, |total, s| total.saturating_add(s.message_count));

        let delta = message_count.saturating_sub(self.last_message_count);
        let elapsed_ms = now.saturating_duration_since(self.last_observed_at).as_millis() as f64;
        let elapsed_secs = round_half_up(elapsed_ms / 1000.0).max(1.0);
        let rate_per_second = round_half_up(delta as f64 / elapsed_secs) as i64;

        self.last_message_count = message_count;
        self.last_observed_at = now;

        StatsReport {
            entity_count,
            message_count,
            rate_per_second,
        }
    }
}

/// Round to the nearest integer, halves towards positive infinity
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Format an integer with ',' every three digits
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
