// Trace selection state machine

use crate::layout::PositionedTree;
use crate::model::NodeRole;
use std::collections::BTreeSet;

/// What the user is currently tracing and which member links are hidden
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceSelection {
    pub selected_entity: Option<String>,
    pub selected_shard: Option<String>,
    /// Entity id being typed, committed on Enter
    pub pending_input: String,
    pub hidden_members: BTreeSet<String>,
}

/// User interactions that change the selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    ClickEntity(String),
    ClickShard(String),
    /// Toggle link visibility for a member address
    ClickMember(String),
    KeyDigit(char),
    KeyDash,
    KeyBackspace,
    KeyEnter,
}

/// Maps an entity id to the shard that owns it
pub trait ShardLookup {
    fn owning_shard(&self, entity: &str) -> Option<String>;
}

impl ShardLookup for PositionedTree {
    fn owning_shard(&self, entity: &str) -> Option<String> {
        let idx = self
            .nodes()
            .iter()
            .position(|node| node.kind.role == NodeRole::Entity && node.name == entity)?;
        self.parent_of(idx)
            .filter(|parent| parent.kind.role == NodeRole::Shard)
            .map(|parent| parent.name.clone())
    }
}

impl TraceSelection {
    pub fn is_entity_traced(&self, name: &str) -> bool {
        self.selected_entity.as_deref() == Some(name)
    }

    pub fn is_shard_traced(&self, name: &str) -> bool {
        self.selected_shard.as_deref() == Some(name)
    }

    /// True when a hidden member address contains `ip`
    pub fn is_member_hidden(&self, ip: &str) -> bool {
        self.hidden_members
            .iter()
            .any(|address| crate::address::matches_host(address, ip))
    }

    pub fn is_member_address_hidden(&self, address: &str) -> bool {
        self.hidden_members.contains(address)
    }
}

/// Apply one event and return the next selection
pub fn apply(
    mut state: TraceSelection,
    event: SelectionEvent,
    shards: &impl ShardLookup,
) -> TraceSelection {
    match event {
        SelectionEvent::ClickEntity(name) => {
            if state.is_entity_traced(&name) {
                state.selected_entity = None;
                state.selected_shard = None;
            } else {
                state.selected_shard = shards.owning_shard(&name);
                state.selected_entity = Some(name);
            }
        }
        SelectionEvent::ClickShard(name) => {
            state.selected_entity = None;
            if state.is_shard_traced(&name) {
                state.selected_shard = None;
            } else {
                state.selected_shard = Some(name);
            }
        }
        SelectionEvent::ClickMember(address) => {
            if !state.hidden_members.remove(&address) {
                state.hidden_members.insert(address);
            }
        }
        SelectionEvent::KeyDigit(digit) => {
            if digit.is_ascii_digit() {
                state.pending_input.push(digit);
            }
        }
        SelectionEvent::KeyDash => state.pending_input.push('-'),
        SelectionEvent::KeyBackspace => {
            state.pending_input.pop();
        }
        SelectionEvent::KeyEnter => {
            let entity = std::mem::take(&mut state.pending_input);
            if entity.is_empty() {
                state.selected_entity = None;
                state.selected_shard = None;
            } else {
                state.selected_shard = shards.owning_shard(&entity);
                state.selected_entity = Some(entity);
            }
        }
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{layout, FULL_CIRCLE};
    use crate::model::fixtures::sample_tree;
    use proptest::prelude::*;

    fn tree() -> PositionedTree {
        layout(&sample_tree(), FULL_CIRCLE, 40.0)
    }

    fn run(events: Vec<SelectionEvent>) -> TraceSelection {
        let tree = tree();
        events
            .into_iter()
            .fold(TraceSelection::default(), |state, event| apply(state, event, &tree))
    }

    #[test]
    fn test_owning_shard_lookup() {
        let tree = tree();
        assert_eq!(tree.owning_shard("1202"), Some("12".to_string()));
        assert_eq!(tree.owning_shard("701"), Some("7".to_string()));
        assert_eq!(tree.owning_shard("12"), None);
        assert_eq!(tree.owning_shard("missing"), None);
    }

    #[test]
    fn test_click_entity_selects_entity_and_shard() {
        let state = run(vec![SelectionEvent::ClickEntity("1201".to_string())]);
        assert!(state.is_entity_traced("1201"));
        assert!(state.is_shard_traced("12"));
    }

    #[test]
    fn test_double_click_entity_returns_to_empty() {
        let state = run(vec![
            SelectionEvent::ClickEntity("1201".to_string()),
            SelectionEvent::ClickEntity("1201".to_string()),
        ]);
        assert_eq!(state, TraceSelection::default());
    }

    #[test]
    fn test_click_other_entity_moves_selection() {
        let state = run(vec![
            SelectionEvent::ClickEntity("1201".to_string()),
            SelectionEvent::ClickEntity("701".to_string()),
        ]);
        assert!(state.is_entity_traced("701"));
        assert!(state.is_shard_traced("7"));
    }

    #[test]
    fn test_click_shard_toggles_and_clears_entity() {
        let state = run(vec![
            SelectionEvent::ClickEntity("1201".to_string()),
            SelectionEvent::ClickShard("7".to_string()),
        ]);
        assert_eq!(state.selected_entity, None);
        assert!(state.is_shard_traced("7"));

        let tree = tree();
        let state = apply(state, SelectionEvent::ClickShard("7".to_string()), &tree);
        assert_eq!(state.selected_shard, None);
    }

    #[test]
    fn test_click_member_toggles_hidden() {
        let address = "akka://cluster@172.17.0.4:25520".to_string();
        let state = run(vec![SelectionEvent::ClickMember(address.clone())]);
        assert!(state.is_member_hidden("172.17.0.4"));
        assert!(!state.is_member_hidden("172.17.0.3"));
        assert!(state.is_member_address_hidden(&address));

        let state = apply(state, SelectionEvent::ClickMember(address), &tree());
        assert!(state.hidden_members.is_empty());
    }

    #[test]
    fn test_typed_entity_committed_on_enter() {
        let state = run(vec![
            SelectionEvent::KeyDigit('7'),
            SelectionEvent::KeyDigit('0'),
            SelectionEvent::KeyDigit('9'),
            SelectionEvent::KeyBackspace,
            SelectionEvent::KeyDigit('1'),
        ]);
        assert_eq!(state.pending_input, "701");
        assert_eq!(state.selected_entity, None);

        let state = apply(state, SelectionEvent::KeyEnter, &tree());
        assert!(state.pending_input.is_empty());
        assert!(state.is_entity_traced("701"));
        assert!(state.is_shard_traced("7"));
    }

    #[test]
    fn test_enter_with_unknown_entity_has_no_shard() {
        let state = run(vec![
            SelectionEvent::KeyDash,
            SelectionEvent::KeyDigit('4'),
            SelectionEvent::KeyEnter,
        ]);
        assert!(state.is_entity_traced("-4"));
        assert_eq!(state.selected_shard, None);
    }

    #[test]
    fn test_enter_with_empty_buffer_clears() {
        let state = run(vec![
            SelectionEvent::ClickEntity("1201".to_string()),
            SelectionEvent::KeyEnter,
        ]);
        assert_eq!(state.selected_entity, None);
        assert_eq!(state.selected_shard, None);
    }

    #[test]
    fn test_non_digit_ignored() {
        let state = run(vec![SelectionEvent::KeyDigit('x')]);
        assert!(state.pending_input.is_empty());
    }

    fn event_strategy() -> impl Strategy<Value = SelectionEvent> {
        let names = prop::sample::select(vec!["1201", "1202", "701", "12", "7", "nope"]);
        prop_oneof![
            names.clone().prop_map(|n| SelectionEvent::ClickEntity(n.to_string())),
            names.clone().prop_map(|n| SelectionEvent::ClickShard(n.to_string())),
            prop::sample::select(vec![
                "akka://cluster@172.17.0.3:25520",
                "akka://cluster@172.17.0.4:25520",
            ])
            .prop_map(|a| SelectionEvent::ClickMember(a.to_string())),
            prop::char::range('0', '9').prop_map(SelectionEvent::KeyDigit),
            Just(SelectionEvent::KeyDash),
            Just(SelectionEvent::KeyBackspace),
            Just(SelectionEvent::KeyEnter),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Clicking the same entity twice undoes the first click's entity
        /// and shard selection
        #[test]
        fn prop_double_click_entity_clears(
            events in proptest::collection::vec(event_strategy(), 0..20),
            entity in prop::sample::select(vec!["1201", "701", "nope"]),
        ) {
            let tree = tree();
            let state = events
                .into_iter()
                .fold(TraceSelection::default(), |s, e| apply(s, e, &tree));
            let clicked = apply(state.clone(), SelectionEvent::ClickEntity(entity.to_string()), &tree);
            let twice = apply(clicked.clone(), SelectionEvent::ClickEntity(entity.to_string()), &tree);

            prop_assert!(clicked.is_entity_traced(entity) || state.is_entity_traced(entity));
            if !state.is_entity_traced(entity) {
                prop_assert_eq!(twice.selected_entity, None);
                prop_assert_eq!(twice.selected_shard, None);
                prop_assert_eq!(twice.hidden_members, state.hidden_members);
                prop_assert_eq!(twice.pending_input, state.pending_input);
            }
        }
    }
}
