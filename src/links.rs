// Activity cross-referencing
//
// Activity records only name peers by id and IP. Each cycle they are joined
// against the freshly positioned tree to produce the client and server link
// sets. References that do not resolve are dropped for the cycle.

use crate::layout::{Column, Point, PositionedNode, PositionedTree};
use crate::model::{ClientActivity, ServerActivity};
use crate::reconcile::LinkKey;
use crate::selection::TraceSelection;
use std::collections::HashSet;
use tracing::debug;

/// A link between two positioned endpoints
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedLink {
    pub source_id: String,
    pub target_id: String,
    pub source: Point,
    pub target: Point,
}

impl RenderedLink {
    pub fn key(&self) -> LinkKey {
        LinkKey::new(self.source_id.as_str(), self.target_id.as_str())
    }
}

/// Locate the node hosting the server at `ip`
///
/// Returns `None` when no node matches or when the member's links are
/// currently hidden.
fn resolve_server<'a>(
    tree: &'a PositionedTree,
    ip: &str,
    selection: &TraceSelection,
) -> Option<&'a PositionedNode> {
    if selection.is_member_hidden(ip) {
        return None;
    }
    let node = tree.find_containing(ip);
    if node.is_none() {
        debug!(ip, "No hierarchy node for server");
    }
    node
}

/// Server node -> entity node links, in server then link order
pub fn resolve_server_links(
    servers: &[ServerActivity],
    tree: &PositionedTree,
    selection: &TraceSelection,
) -> Vec<RenderedLink> {
    let mut links = Vec::new();

    for activity in servers {
        let Some(server) = resolve_server(tree, &activity.server.ip, selection) else {
            continue;
        };

        for entity_ref in &activity.links {
            match tree.find_named(&entity_ref.entity_id) {
                Some(entity) => links.push(RenderedLink {
                    source_id: activity.server.id.clone(),
                    target_id: entity_ref.entity_id.clone(),
                    source: server.point(),
                    target: entity.point(),
                }),
                None => debug!(
                    server = %activity.server.id,
                    entity = %entity_ref.entity_id,
                    "Dropping link to unknown entity"
                ),
            }
        }
    }

    links
}

/// Client row -> server node links, deduplicated
///
/// Client `i` is anchored on row `i` of `column`.
pub fn resolve_client_links(
    clients: &[ClientActivity],
    tree: &PositionedTree,
    selection: &TraceSelection,
    column: Column,
) -> Vec<RenderedLink> {
    let mut links = Vec::new();

    for (row, activity) in clients.iter().enumerate() {
        let source = column.row_anchor(row);

        for server_ref in &activity.links {
            if let Some(server) = resolve_server(tree, &server_ref.server.ip, selection) {
                links.push(RenderedLink {
                    source_id: activity.client.id.clone(),
                    target_id: server_ref.server.id.clone(),
                    source,
                    target: server.point(),
                });
            }
        }
    }

    dedup(links)
}

/// Collapse links sharing a (source id, target id) pair, keeping the first
pub fn dedup(links: Vec<RenderedLink>) -> Vec<RenderedLink> {
    let mut seen: HashSet<LinkKey> = HashSet::with_capacity(links.len());
    links
        .into_iter()
        .filter(|link| seen.insert(link.key()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{layout, Viewport, FULL_CIRCLE};
    use crate::model::fixtures::{peer, sample_snapshot, sample_tree};
    use crate::model::ServerRef;
    use crate::selection::{apply, SelectionEvent};
    use proptest::prelude::*;

    fn positioned() -> PositionedTree {
        layout(&sample_tree(), FULL_CIRCLE, 40.0)
    }

    fn link(source: &str, target: &str, x: f64) -> RenderedLink {
        RenderedLink {
            source_id: source.to_string(),
            target_id: target.to_string(),
            source: Point::new(x, 0.0),
            target: Point::ORIGIN,
        }
    }

    #[test]
    fn test_server_links_resolve_entities() {
        let tree = positioned();
        let snapshot = sample_snapshot();
        let links =
            resolve_server_links(&snapshot.server_activities, &tree, &TraceSelection::default());

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].key(), LinkKey::new("3", "1201"));
        assert_eq!(links[1].key(), LinkKey::new("3", "701"));

        let member = tree.find_named("akka://cluster@172.17.0.3:25520").unwrap();
        assert_eq!(links[0].source, member.point());
        assert_eq!(links[0].target, tree.find_named("1201").unwrap().point());
    }

    #[test]
    fn test_unresolved_server_emits_nothing() {
        let tree = positioned();
        let mut snapshot = sample_snapshot();
        snapshot.server_activities[0].server = peer("3", "10.9.9.9");

        let links =
            resolve_server_links(&snapshot.server_activities, &tree, &TraceSelection::default());
        assert!(links.is_empty());
    }

    #[test]
    fn test_unknown_entity_is_dropped() {
        let tree = positioned();
        let mut snapshot = sample_snapshot();
        snapshot.server_activities[0].links[0].entity_id = "9999".to_string();

        let links =
            resolve_server_links(&snapshot.server_activities, &tree, &TraceSelection::default());
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target_id, "701");
    }

    #[test]
    fn test_hidden_member_suppresses_server_and_client_links() {
        let tree = positioned();
        let snapshot = sample_snapshot();
        let hidden = apply(
            TraceSelection::default(),
            SelectionEvent::ClickMember("akka://cluster@172.17.0.3:25520".to_string()),
            &tree,
        );

        assert!(resolve_server_links(&snapshot.server_activities, &tree, &hidden).is_empty());

        let column = Viewport::default().client_column();
        assert!(
            resolve_client_links(&snapshot.client_activities, &tree, &hidden, column).is_empty()
        );
    }

    #[test]
    fn test_client_links_anchor_on_rows() {
        let tree = positioned();
        let mut snapshot = sample_snapshot();
        let mut second = snapshot.client_activities[0].clone();
        second.client = peer("10", "172.17.0.10");
        snapshot.client_activities.push(second);

        let column = Viewport::default().client_column();
        let links = resolve_client_links(
            &snapshot.client_activities,
            &tree,
            &TraceSelection::default(),
            column,
        );

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].source, column.row_anchor(0));
        assert_eq!(links[1].source, column.row_anchor(1));
        assert!(links[1].source.y > links[0].source.y);
        assert_eq!(links[1].key(), LinkKey::new("10", "3"));
    }

    #[test]
    fn test_client_links_are_deduplicated() {
        let tree = positioned();
        let mut snapshot = sample_snapshot();
        snapshot.client_activities[0].links.push(ServerRef {
            server: peer("3", "172.17.0.3"),
        });

        let links = resolve_client_links(
            &snapshot.client_activities,
            &tree,
            &TraceSelection::default(),
            Viewport::default().client_column(),
        );
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn test_dedup_keeps_first_in_order() {
        let links = vec![
            link("1", "a", 1.0),
            link("2", "a", 2.0),
            link("1", "a", 3.0),
            link("1", "b", 4.0),
        ];
        let result = dedup(links);
        let xs: Vec<f64> = result.iter().map(|l| l.source.x).collect();
        assert_eq!(xs, vec![1.0, 2.0, 4.0]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// dedup(dedup(L)) = dedup(L), with first occurrences in input order
        #[test]
        fn prop_dedup_idempotent(pairs in proptest::collection::vec((0u8..5, 0u8..5), 0..40)) {
            let links: Vec<RenderedLink> = pairs
                .iter()
                .enumerate()
                .map(|(i, (s, t))| link(&s.to_string(), &t.to_string(), i as f64))
                .collect();

            let once = dedup(links.clone());
            prop_assert_eq!(dedup(once.clone()), once.clone());

            let keys: HashSet<LinkKey> = once.iter().map(RenderedLink::key).collect();
            prop_assert_eq!(keys.len(), once.len());

            // Survivors are first occurrences, so their positions increase
            prop_assert!(once.windows(2).all(|w| w[0].source.x < w[1].source.x));
            for survivor in &once {
                let first = links.iter().find(|l| l.key() == survivor.key()).unwrap();
                prop_assert_eq!(first.source.x, survivor.source.x);
            }
        }
    }
}
