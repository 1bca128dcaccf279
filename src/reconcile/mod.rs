// Keyed reconciliation
//
// Every element family drawn on the map (tree nodes, tree links, client
// links, server links, statistic rows) is diffed by stable identity against
// the previously rendered set. The diff drives a fixed three-phase
// animation timeline shared by all families.

mod scene;

pub use scene::{Scene, Tween};

use crate::model::NodeKind;
use std::collections::HashSet;
use std::hash::Hash;
use std::time::Duration;

/// Default length of one animation phase
pub const DEFAULT_PHASE_DURATION: Duration = Duration::from_millis(750);

/// Identity of a hierarchy node: type and name together
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey {
    pub kind: NodeKind,
    pub name: String,
}

impl NodeKey {
    pub fn new(kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// Identity of a rendered link: source id and target id
///
/// Kept as two fields so ids containing '-' cannot collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkKey {
    pub source: String,
    pub target: String,
}

impl LinkKey {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Partition of keys between two consecutive element sets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedDiff<K> {
    /// In next, not in previous (next order)
    pub entering: Vec<K>,
    /// In both (next order)
    pub updating: Vec<K>,
    /// In previous, not in next (previous order)
    pub exiting: Vec<K>,
}

impl<K> Default for KeyedDiff<K> {
    fn default() -> Self {
        Self {
            entering: Vec::new(),
            updating: Vec::new(),
            exiting: Vec::new(),
        }
    }
}

impl<K> KeyedDiff<K> {
    pub fn is_unchanged(&self) -> bool {
        self.entering.is_empty() && self.exiting.is_empty()
    }
}

/// Classify keys as entering, updating or exiting
///
/// Keys are compared by exact equality. A key repeated in `next` is
/// classified once, at its first occurrence.
pub fn diff<K>(previous: &[K], next: &[K]) -> KeyedDiff<K>
where
    K: Clone + Eq + Hash,
{
    let previous_set: HashSet<&K> = previous.iter().collect();
    let mut next_set: HashSet<&K> = HashSet::with_capacity(next.len());
    let mut result = KeyedDiff::default();

    for key in next {
        if !next_set.insert(key) {
            continue;
        }
        if previous_set.contains(key) {
            result.updating.push(key.clone());
        } else {
            result.entering.push(key.clone());
        }
    }

    let mut seen_exiting: HashSet<&K> = HashSet::new();
    for key in previous {
        if !next_set.contains(key) && seen_exiting.insert(key) {
            result.exiting.push(key.clone());
        }
    }

    result
}

/// The three sequential phases of one reconciliation cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Exiting elements fade out and are removed at the end
    FadeOut,
    /// Updating elements move/recolour; entering ones are placed nearly invisible
    Settle,
    /// Entering elements fade up to full opacity
    FadeIn,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::FadeOut, Phase::Settle, Phase::FadeIn];

    fn index(self) -> u32 {
        match self {
            Phase::FadeOut => 0,
            Phase::Settle => 1,
            Phase::FadeIn => 2,
        }
    }
}

/// Fixed three-phase timeline applied to every element family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choreography {
    /// Duration of each phase; zero settles every transition immediately
    pub step: Duration,
}

impl Default for Choreography {
    fn default() -> Self {
        Self {
            step: DEFAULT_PHASE_DURATION,
        }
    }
}

impl Choreography {
    pub fn new(step: Duration) -> Self {
        Self { step }
    }

    /// Settle-immediately timeline
    pub fn instant() -> Self {
        Self {
            step: Duration::ZERO,
        }
    }

    /// Offset of `phase` from the start of the cycle
    pub fn delay(&self, phase: Phase) -> Duration {
        self.step * phase.index()
    }

    /// Length of the whole cycle
    pub fn total(&self) -> Duration {
        self.step * 3
    }
}

/// One phase of a plan: what happens, to which keys, and when
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStep<K> {
    pub phase: Phase,
    pub delay: Duration,
    pub duration: Duration,
    pub keys: Vec<K>,
}

/// Ordered animation plan for one family and one cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationPlan<K> {
    pub steps: Vec<PlanStep<K>>,
}

impl<K: Clone> AnimationPlan<K> {
    /// Lay a diff onto the timeline
    ///
    /// Entering keys appear in both the settle step (placement at near-zero
    /// opacity) and the fade-in step.
    pub fn from_diff(diff: &KeyedDiff<K>, choreography: &Choreography) -> Self {
        let steps = Phase::ALL
            .iter()
            .map(|&phase| {
                let keys = match phase {
                    Phase::FadeOut => diff.exiting.clone(),
                    Phase::Settle => diff
                        .updating
                        .iter()
                        .chain(diff.entering.iter())
                        .cloned()
                        .collect(),
                    Phase::FadeIn => diff.entering.clone(),
                };
                PlanStep {
                    phase,
                    delay: choreography.delay(phase),
                    duration: choreography.step,
                    keys,
                }
            })
            .collect();

        Self { steps }
    }

    #[cfg(test)]
    pub fn step(&self, phase: Phase) -> Option<&PlanStep<K>> {
        self.steps.iter().find(|step| step.phase == phase)
    }
}
