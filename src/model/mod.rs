// Snapshot data model
//
// One snapshot is a complete observation of the cluster: the sharding
// hierarchy plus flat client/server activity lists. Snapshots are decoded
// wholesale from the push channel and never mutated in place.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failure to decode an inbound snapshot payload
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot root must be a cluster node, got {0}")]
    RootNotCluster(NodeKind),
}

/// Base role of a hierarchy node, independent of membership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeRole {
    Cluster,
    HttpServer,
    Singleton,
    Shard,
    Entity,
    /// A node typed only as `member`
    Member,
    /// Type string with no recognised role
    Unknown,
}

impl NodeRole {
    fn token(self) -> Option<&'static str> {
        match self {
            Self::Cluster => Some("cluster"),
            Self::HttpServer => Some("httpServer"),
            Self::Singleton => Some("singleton"),
            Self::Shard => Some("shard"),
            Self::Entity => Some("entity"),
            Self::Member | Self::Unknown => None,
        }
    }
}

/// Node type: a base role optionally qualified as a cluster member
///
/// The wire format is a space separated token list such as `"member"`,
/// `"member httpServer"` or `"shard"`. When several roles appear, the
/// precedence is entity > shard > singleton > httpServer > cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct NodeKind {
    pub role: NodeRole,
    pub member: bool,
}

impl NodeKind {
    pub const CLUSTER: NodeKind = NodeKind::plain(NodeRole::Cluster);
    pub const SHARD: NodeKind = NodeKind::plain(NodeRole::Shard);
    pub const ENTITY: NodeKind = NodeKind::plain(NodeRole::Entity);
    pub const MEMBER: NodeKind = NodeKind {
        role: NodeRole::Member,
        member: true,
    };

    pub const fn plain(role: NodeRole) -> Self {
        Self {
            role,
            member: false,
        }
    }

    pub const fn member_of(role: NodeRole) -> Self {
        Self { role, member: true }
    }

    /// Parse a wire type string
    pub fn parse(raw: &str) -> Self {
        let mut member = false;
        let mut found: Vec<NodeRole> = Vec::new();

        for token in raw.split_whitespace() {
            match token {
                "member" => member = true,
                "cluster" => found.push(NodeRole::Cluster),
                "httpServer" => found.push(NodeRole::HttpServer),
                "singleton" => found.push(NodeRole::Singleton),
                "shard" => found.push(NodeRole::Shard),
                "entity" => found.push(NodeRole::Entity),
                _ => {}
            }
        }

        let precedence = [
            NodeRole::Entity,
            NodeRole::Shard,
            NodeRole::Singleton,
            NodeRole::HttpServer,
            NodeRole::Cluster,
        ];
        let role = precedence
            .into_iter()
            .find(|role| found.contains(role))
            .unwrap_or(if member {
                NodeRole::Member
            } else {
                NodeRole::Unknown
            });

        Self { role, member }
    }

    pub fn is_member(&self) -> bool {
        self.member
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.member, self.role.token()) {
            (true, Some(token)) => write!(f, "member {}", token),
            (true, None) => write!(f, "member"),
            (false, Some(token)) => write!(f, "{}", token),
            (false, None) => write!(f, "unknown"),
        }
    }
}

impl From<String> for NodeKind {
    fn from(raw: String) -> Self {
        NodeKind::parse(&raw)
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        kind.to_string()
    }
}

/// A node of the cluster's logical tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyNode {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub events: u64,
    #[serde(default)]
    pub children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            events: 0,
            children: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn with_children(mut self, children: Vec<HierarchyNode>) -> Self {
        self.children = children;
        self
    }

    /// Number of nodes in this subtree, including self
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(HierarchyNode::node_count).sum::<usize>()
    }
}

/// Identity of an HTTP client or server process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    pub id: String,
    pub ip: String,
}

/// Reference from a client to the server it talks to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRef {
    pub server: Peer,
}

/// Reference from a server to an entity it routed traffic to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRef {
    pub entity_id: String,
}

/// Activity counters for one HTTP client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientActivity {
    pub client: Peer,
    #[serde(default)]
    pub message_count: i64,
    #[serde(default)]
    pub links: Vec<ServerRef>,
}

/// Activity counters for one HTTP server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerActivity {
    pub server: Peer,
    #[serde(default)]
    pub message_count: i64,
    #[serde(default)]
    pub links: Vec<EntityRef>,
}

/// One complete decoded observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub client_activities: Vec<ClientActivity>,
    #[serde(default)]
    pub server_activities: Vec<ServerActivity>,
    pub tree: HierarchyNode,
}

impl Snapshot {
    /// Empty snapshot rendered while no real data has arrived
    pub fn placeholder() -> Self {
        Self {
            client_activities: Vec::new(),
            server_activities: Vec::new(),
            tree: HierarchyNode::new("cluster", NodeKind::CLUSTER),
        }
    }

    /// Decode a snapshot from the push channel's text payload
    pub fn decode(payload: &str) -> Result<Self, SnapshotError> {
        let snapshot: Snapshot = serde_json::from_str(payload)?;
        if snapshot.tree.kind.role != NodeRole::Cluster {
            return Err(SnapshotError::RootNotCluster(snapshot.tree.kind));
        }
        Ok(snapshot)
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::placeholder()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_kind_parse_plain_roles() {
        assert_eq!(NodeKind::parse("cluster"), NodeKind::CLUSTER);
        assert_eq!(NodeKind::parse("shard"), NodeKind::SHARD);
        assert_eq!(NodeKind::parse("entity"), NodeKind::ENTITY);
        assert_eq!(
            NodeKind::parse("singleton"),
            NodeKind::plain(NodeRole::Singleton)
        );
    }

    #[test]
    fn test_node_kind_parse_member_variants() {
        assert_eq!(NodeKind::parse("member"), NodeKind::MEMBER);
        assert_eq!(
            NodeKind::parse("member httpServer"),
            NodeKind::member_of(NodeRole::HttpServer)
        );
        // Extra whitespace left behind by the server's type rewriting
        assert_eq!(NodeKind::parse(" member  "), NodeKind::MEMBER);
        assert!(NodeKind::parse("member shard").is_member());
        assert!(!NodeKind::parse("shard").is_member());
    }

    #[test]
    fn test_node_kind_parse_unknown() {
        let kind = NodeKind::parse("gateway");
        assert_eq!(kind.role, NodeRole::Unknown);
        assert!(!kind.member);
    }

    #[test]
    fn test_node_kind_display_round_trip() {
        for raw in ["cluster", "member", "member httpServer", "shard", "entity", "singleton"] {
            let kind = NodeKind::parse(raw);
            assert_eq!(kind.to_string(), raw);
            assert_eq!(NodeKind::parse(&kind.to_string()), kind);
        }
    }

    #[test]
    fn test_decode_full_snapshot() {
        let payload = r#"{
            "clientActivities": [
                { "client": {"id": "9", "ip": "172.17.0.9"}, "messageCount": 40,
                  "links": [ {"server": {"id": "3", "ip": "172.17.0.3"}} ] }
            ],
            "serverActivities": [
                { "server": {"id": "3", "ip": "172.17.0.3"}, "messageCount": 150,
                  "links": [ {"entityId": "1201"} ] }
            ],
            "tree": {
                "name": "cluster", "type": "cluster", "events": 0,
                "children": [
                    { "name": "akka://cluster@172.17.0.3:25520", "type": "member httpServer",
                      "children": [ { "name": "12", "type": "shard",
                                      "children": [ { "name": "1201", "type": "entity", "events": 4 } ] } ] }
                ]
            }
        }"#;

        let snapshot = Snapshot::decode(payload).unwrap();
        assert_eq!(snapshot.client_activities.len(), 1);
        assert_eq!(snapshot.client_activities[0].links[0].server.ip, "172.17.0.3");
        assert_eq!(snapshot.server_activities[0].message_count, 150);
        assert_eq!(snapshot.server_activities[0].links[0].entity_id, "1201");

        let member = &snapshot.tree.children[0];
        assert_eq!(member.kind, NodeKind::member_of(NodeRole::HttpServer));
        assert_eq!(member.children[0].children[0].events, 4);
        assert_eq!(snapshot.tree.node_count(), 4);
    }

    #[test]
    fn test_decode_placeholder_shape() {
        let payload = r#"{"clientActivities": [], "serverActivities": [],
                          "tree": {"name": "cluster", "type": "cluster"}}"#;
        assert_eq!(Snapshot::decode(payload).unwrap(), Snapshot::placeholder());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            Snapshot::decode("not json"),
            Err(SnapshotError::Json(_))
        ));
    }

    #[test]
    fn test_decode_rejects_non_cluster_root() {
        let payload = r#"{"tree": {"name": "12", "type": "shard"}}"#;
        assert!(matches!(
            Snapshot::decode(payload),
            Err(SnapshotError::RootNotCluster(_))
        ));
    }
}
