use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::{debug, info, trace};
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::config::RingConfig;
use crate::error::{Error, Result};
use crate::hash::{RingHasher, Xmur3, RING_SIZE};
use crate::snapshot::{RingSnapshot, VirtualNode};
use crate::tree::SearchTree;

/// Length of keys generated by [`HashRing::add_random_keys`].
pub const RANDOM_KEY_LEN: usize = 8;

/// Consistent hashing ring.
///
/// Every server is placed on the ring `virtual_node_count` times, under the
/// names `{server}_0 .. {server}_{n-1}`. A key is owned by the first virtual
/// node whose hash is strictly greater than the key's hash, wrapping around
/// to the smallest hash on the ring.
///
/// The ring is not synchronized; see [`crate::SharedRing`] for a handle
/// that can be shared between tasks.
#[derive(Debug)]
pub struct HashRing<H = Xmur3> {
    /// Virtual node hash -> virtual node name.
    index: SearchTree<u32, String>,
    servers: BTreeSet<String>,
    /// Virtual node name -> physical server.
    virtual_servers: HashMap<String, String>,
    keys: BTreeSet<String>,
    virtual_node_count: usize,
    hasher: H,
}

impl HashRing<Xmur3> {
    pub fn new(virtual_node_count: usize) -> Result<Self> {
        Self::with_hasher(virtual_node_count, Xmur3)
    }

    pub fn from_config(config: &RingConfig) -> Result<Self> {
        Self::new(config.virtual_node_count)
    }
}

impl<H: RingHasher> HashRing<H> {
    pub fn with_hasher(virtual_node_count: usize, hasher: H) -> Result<Self> {
        if virtual_node_count < 1 {
            return Err(Error::InvalidVirtualNodeCount(virtual_node_count));
        }

        info!("Creating hash ring with {} virtual node(s) per server", virtual_node_count);
        Ok(HashRing {
            index: SearchTree::new(),
            servers: BTreeSet::new(),
            virtual_servers: HashMap::new(),
            keys: BTreeSet::new(),
            virtual_node_count,
            hasher,
        })
    }

    pub fn hash(&self, input: &str) -> u32 {
        self.hasher.hash(input)
    }

    /// Places all virtual nodes of `server` on the ring. Adding a server
    /// twice leaves the ring unchanged.
    pub fn add_server(&mut self, server: &str) {
        for virtual_name in self.virtual_server_names(server) {
            let hash = self.hash(&virtual_name);
            if let Some(previous) = self.index.insert(hash, virtual_name.clone()) {
                if previous != virtual_name {
                    debug!("Virtual node {} replaced {} at #{:08x}", virtual_name, previous, hash);
                }
            }
            self.virtual_servers.insert(virtual_name, server.to_owned());
        }
        self.servers.insert(server.to_owned());

        debug!("Added server {} ({} virtual nodes on ring)", server, self.index.len());
    }

    /// Takes all virtual nodes of `server` off the ring. Unknown servers are
    /// ignored.
    pub fn remove_server(&mut self, server: &str) {
        if !self.servers.remove(server) {
            return;
        }

        for virtual_name in self.virtual_server_names(server) {
            let hash = self.hash(&virtual_name);
            if self.index.get(&hash) == Some(&virtual_name) {
                self.index.remove(&hash);
            }
            self.virtual_servers.remove(&virtual_name);
        }

        debug!("Removed server {} ({} virtual nodes on ring)", server, self.index.len());
    }

    pub fn add_key(&mut self, key: &str) {
        self.keys.insert(key.to_owned());
    }

    pub fn remove_key(&mut self, key: &str) {
        self.keys.remove(key);
    }

    /// Tracks `count` random alphanumeric keys and returns them.
    pub fn add_random_keys<R: Rng>(&mut self, rng: &mut R, count: usize) -> Vec<String> {
        let keys: Vec<String> = (0..count)
            .map(|_| {
                (0..RANDOM_KEY_LEN)
                    .map(|_| char::from(rng.sample(Alphanumeric)))
                    .collect()
            })
            .collect();
        for key in &keys {
            self.add_key(key);
        }
        keys
    }

    /// Name of the virtual node owning `key`, `None` on an empty ring.
    pub fn lookup_virtual_server(&self, key: &str) -> Option<&str> {
        let hash = self.hash(key);
        let (node_hash, virtual_name) = self
            .index
            .find_nearest_greater_than(&hash)
            .or_else(|| self.index.first())?;

        trace!("Key {} (#{:08x}) routed to {} (#{:08x})", key, hash, virtual_name, node_hash);
        Some(virtual_name.as_str())
    }

    /// Name of the physical server owning `key`, `None` on an empty ring.
    pub fn lookup_server(&self, key: &str) -> Option<&str> {
        let virtual_name = self.lookup_virtual_server(key)?;
        self.server_of_virtual(virtual_name)
    }

    pub fn server_of_virtual(&self, virtual_name: &str) -> Option<&str> {
        self.virtual_servers.get(virtual_name).map(String::as_str)
    }

    pub fn virtual_server_names(&self, server: &str) -> Vec<String> {
        (0..self.virtual_node_count)
            .map(|i| format!("{}_{}", server, i))
            .collect()
    }

    /// Ring positions `server` occupies, or would occupy once added.
    pub fn virtual_server_hashes(&self, server: &str) -> Vec<u32> {
        self.virtual_server_names(server)
            .iter()
            .map(|name| self.hash(name))
            .collect()
    }

    /// Fraction of the hash space owned by each server. The fractions sum
    /// to 1.0 on a non-empty ring.
    pub fn partition_sizes_by_server(&self) -> BTreeMap<String, f64> {
        let mut sizes: BTreeMap<&str, u64> = BTreeMap::new();
        let mut first_server: Option<&str> = None;
        let mut last_hash = 0u64;

        for (hash, virtual_name) in &self.index {
            let Some(server) = self.server_of_virtual(virtual_name) else {
                continue;
            };
            if first_server.is_none() {
                first_server = Some(server);
            }
            *sizes.entry(server).or_default() += u64::from(*hash) - last_hash;
            last_hash = u64::from(*hash);
        }

        // the arc from the last node across zero belongs to the first node
        if let Some(server) = first_server {
            *sizes.entry(server).or_default() += RING_SIZE - last_hash;
        }

        sizes
            .into_iter()
            .map(|(server, size)| (server.to_owned(), size as f64 / RING_SIZE as f64))
            .collect()
    }

    /// Point-in-time copy of the ring, with every tracked key resolved to
    /// its current owner.
    pub fn inspect(&self) -> RingSnapshot {
        let virtual_nodes: Vec<VirtualNode> = self
            .index
            .iter()
            .map(|(hash, name)| VirtualNode {
                hash: *hash,
                name: name.clone(),
                server: self.server_of_virtual(name).unwrap_or_default().to_owned(),
            })
            .collect();

        let mut server_hashes: BTreeMap<String, Vec<u32>> = BTreeMap::new();
        for node in &virtual_nodes {
            server_hashes.entry(node.server.clone()).or_default().push(node.hash);
        }

        let mut server_keys: BTreeMap<String, Vec<String>> = self
            .servers
            .iter()
            .map(|server| (server.clone(), Vec::new()))
            .collect();
        for key in &self.keys {
            if let Some(server) = self.lookup_server(key) {
                server_keys.entry(server.to_owned()).or_default().push(key.clone());
            }
        }

        let mut sorted_server_key_counts: Vec<usize> =
            server_keys.values().map(Vec::len).collect();
        sorted_server_key_counts.sort_unstable();

        let mut key_hashes: Vec<u32> = self.keys.iter().map(|key| self.hash(key)).collect();
        key_hashes.sort_unstable();

        RingSnapshot {
            servers: self.servers.iter().cloned().collect(),
            virtual_nodes,
            server_hashes,
            keys: self.keys.iter().cloned().collect(),
            key_hashes,
            server_keys,
            sorted_server_key_counts,
        }
    }

    /// ASCII drawing of the virtual node index.
    pub fn render_index(&self) -> Vec<String> {
        self.index.render()
    }

    pub fn servers(&self) -> impl Iterator<Item = &str> {
        self.servers.iter().map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    pub fn contains_server(&self, server: &str) -> bool {
        self.servers.contains(server)
    }

    pub fn server_count(&self) -> usize {
        self.servers.len()
    }

    /// Virtual nodes currently on the ring.
    pub fn vnode_count(&self) -> usize {
        self.index.len()
    }

    pub fn virtual_node_count(&self) -> usize {
        self.virtual_node_count
    }
}
