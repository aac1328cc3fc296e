use std::collections::BTreeMap;
use std::mem;

use log::debug;
use tokio::sync::RwLock;

use crate::hash::{RingHasher, Xmur3};
use crate::ring::HashRing;
use crate::snapshot::RingSnapshot;

/// A [`HashRing`] behind a single read-write lock. Mutations are
/// serialized against each other and against every query; queries may run
/// concurrently. Results are returned as owned values.
#[derive(Debug)]
pub struct SharedRing<H = Xmur3> {
    ring: RwLock<HashRing<H>>,
}

impl<H: RingHasher> SharedRing<H> {
    pub fn new(ring: HashRing<H>) -> Self {
        SharedRing {
            ring: RwLock::new(ring),
        }
    }

    pub async fn add_server(&self, server: &str) {
        let mut ring = self.ring.write().await;
        (*ring).add_server(server)
    }

    pub async fn remove_server(&self, server: &str) {
        let mut ring = self.ring.write().await;
        (*ring).remove_server(server)
    }

    pub async fn add_key(&self, key: &str) {
        let mut ring = self.ring.write().await;
        (*ring).add_key(key)
    }

    pub async fn remove_key(&self, key: &str) {
        let mut ring = self.ring.write().await;
        (*ring).remove_key(key)
    }

    pub async fn lookup_server(&self, key: &str) -> Option<String> {
        let ring = self.ring.read().await;
        (*ring).lookup_server(key).map(str::to_owned)
    }

    pub async fn lookup_virtual_server(&self, key: &str) -> Option<String> {
        let ring = self.ring.read().await;
        (*ring).lookup_virtual_server(key).map(str::to_owned)
    }

    pub async fn partition_sizes_by_server(&self) -> BTreeMap<String, f64> {
        let ring = self.ring.read().await;
        (*ring).partition_sizes_by_server()
    }

    pub async fn inspect(&self) -> RingSnapshot {
        let ring = self.ring.read().await;
        (*ring).inspect()
    }

    /// Swaps in `ring` wholesale and hands back the previous one.
    pub async fn reset(&self, ring: HashRing<H>) -> HashRing<H> {
        let mut current = self.ring.write().await;
        debug!(
            "Resetting ring ({} servers, {} virtual nodes per server)",
            ring.server_count(),
            ring.virtual_node_count()
        );
        mem::replace(&mut *current, ring)
    }

    pub fn into_inner(self) -> HashRing<H> {
        self.ring.into_inner()
    }
}
