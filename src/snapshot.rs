use std::collections::{BTreeMap, BTreeSet};

use crate::stats::{hash_range, HashRange, KeyDistribution};

/// A virtual node as it sits on the ring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualNode {
    pub hash: u32,
    pub name: String,
    pub server: String,
}

/// A key whose owner differs between two snapshots. `None` means the key
/// had no owner on that side, or was not tracked there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMove {
    pub key: String,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Owned copy of a ring's state, produced by [`crate::HashRing::inspect`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RingSnapshot {
    pub servers: Vec<String>,
    /// Sorted by hash.
    pub virtual_nodes: Vec<VirtualNode>,
    /// Physical server -> hashes of its virtual nodes, ascending.
    pub server_hashes: BTreeMap<String, Vec<u32>>,
    pub keys: Vec<String>,
    /// Hashes of `keys`, ascending.
    pub key_hashes: Vec<u32>,
    /// Physical server -> tracked keys it owns. Lists every server.
    pub server_keys: BTreeMap<String, Vec<String>>,
    pub sorted_server_key_counts: Vec<usize>,
}

impl RingSnapshot {
    pub fn is_empty(&self) -> bool {
        self.virtual_nodes.is_empty()
    }

    pub fn sorted_server_hashes(&self) -> Vec<u32> {
        self.virtual_nodes.iter().map(|node| node.hash).collect()
    }

    pub fn virtual_node_at(&self, hash: u32) -> Option<&VirtualNode> {
        let idx = self
            .virtual_nodes
            .binary_search_by_key(&hash, |node| node.hash)
            .ok()?;
        self.virtual_nodes.get(idx)
    }

    pub fn server_keys(&self, server: &str) -> &[String] {
        self.server_keys.get(server).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn key_distribution(&self) -> Option<KeyDistribution> {
        KeyDistribution::from_counts(&self.sorted_server_key_counts)
    }

    /// Hash ranges owned by `server`, one per virtual node that owns a
    /// non-empty arc.
    pub fn hash_ranges(&self, server: &str) -> Vec<HashRange> {
        let sorted = self.sorted_server_hashes();
        self.server_hashes
            .get(server)
            .map(|hashes| {
                hashes
                    .iter()
                    .filter_map(|hash| hash_range(*hash, &sorted))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Tracked keys whose owning server changed between `self` and `after`.
    pub fn reassigned_keys(&self, after: &RingSnapshot) -> Vec<KeyMove> {
        let before = self.owners();
        let after = after.owners();

        let keys: BTreeSet<&str> = before.keys().chain(after.keys()).copied().collect();
        keys.into_iter()
            .filter_map(|key| {
                let from = before.get(key).copied();
                let to = after.get(key).copied();
                (from != to).then(|| KeyMove {
                    key: key.to_owned(),
                    from: from.map(str::to_owned),
                    to: to.map(str::to_owned),
                })
            })
            .collect()
    }

    fn owners(&self) -> BTreeMap<&str, &str> {
        self.server_keys
            .iter()
            .flat_map(|(server, keys)| keys.iter().map(move |key| (key.as_str(), server.as_str())))
            .collect()
    }
}
