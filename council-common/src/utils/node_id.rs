use serde::{Deserialize, Serialize};

/// Name of a council member, used as the protocol-level sender id.
///
/// `NodeId` is a thin wrapper around `String` so member names cannot be
/// confused with hosts or values at API boundaries.
#[derive(Default, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    /// Example:
    /// ```rust
    /// use council_common::NodeId;
    /// let id: NodeId = "M1".into();
    /// assert_eq!(id.as_str(), "M1");
    /// ```
    fn from(s: &str) -> Self {
        NodeId(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_node_id_display() {
        let id = NodeId("M7".to_string());
        assert_eq!(format!("{}", id), "M7");
    }

    #[test]
    fn test_node_id_hashing() {
        let set: HashSet<NodeId> = ["M1", "M2", "M1"].iter().map(|s| NodeId::from(*s)).collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&NodeId::from("M2")));
    }

    #[test]
    fn test_node_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&NodeId::from("M3")).unwrap();
        assert_eq!(json, "\"M3\"");
    }
}
