pub mod config;
pub mod error;
pub mod hash;

pub mod ring;
pub mod shared;
pub mod snapshot;
pub mod stats;
pub mod tree;

pub use config::RingConfig;
pub use error::{Error, Result};
pub use hash::{xmur3, RingHasher, Sha256Prefix, Xmur3};
pub use ring::HashRing;
pub use shared::SharedRing;
pub use snapshot::{KeyMove, RingSnapshot, VirtualNode};
pub use tree::SearchTree;
