// Member address handling
//
// Cluster members are identified by addresses of the shape
// `scheme://system@host:port`. Hierarchy node names embed these addresses,
// while activity records only carry the bare host IP, so the IP fragment is
// the join key between the two.

/// Suffix shown when an address does not have the expected IPv4 shape
pub const UNKNOWN_SUFFIX: &str = "X";

/// Check whether `address` embeds `ip_fragment`
///
/// This is a plain substring test, matching how node names embed the
/// member address they were created for.
pub fn matches_host(address: &str, ip_fragment: &str) -> bool {
    address.contains(ip_fragment)
}

/// Extract the short member label (last IPv4 octet) from a member address
///
/// Expected shape: `akka://cluster@172.17.0.3:25520` -> `"3"`.
/// Anything else (hostnames, IPv6, missing port) yields [`UNKNOWN_SUFFIX`];
/// that is common input, not an error.
pub fn extract_member_suffix(address: &str) -> String {
    let fields: Vec<&str> = address.split(':').collect();
    if fields.len() != 3 {
        return UNKNOWN_SUFFIX.to_string();
    }

    // Middle field is "//system@host"
    let octets: Vec<&str> = fields[1].split('.').collect();
    if octets.len() != 4 {
        return UNKNOWN_SUFFIX.to_string();
    }

    octets[3].to_string()
}

/// Scheme and actor-system name used to build member addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberAddressFormat {
    pub scheme: String,
    pub system: String,
}

impl Default for MemberAddressFormat {
    fn default() -> Self {
        Self {
            scheme: "akka".to_string(),
            system: "cluster".to_string(),
        }
    }
}

impl MemberAddressFormat {
    /// Build the canonical address sent back to the server for a member
    pub fn compose(&self, ip: &str, port: u16) -> String {
        format!("{}://{}@{}:{}", self.scheme, self.system, ip, port)
    }
}
