//! Derived figures for reporting: hash ranges per virtual node, ring
//! successors and key counts per server.

use crate::hash::MAX_HASH;

/// Arc of key hashes routed to one virtual node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashRange {
    /// The node is alone on the ring and owns every hash.
    Full { end: u32 },
    /// Inclusive bounds. `start > end` when the arc crosses zero.
    Partial { start: u32, end: u32 },
}

impl HashRange {
    /// Splits the range into inclusive segments that do not wrap.
    pub fn segments(&self) -> Vec<(u32, u32)> {
        match *self {
            HashRange::Full { .. } => vec![(0, MAX_HASH)],
            HashRange::Partial { start, end } if start > end => {
                vec![(start, MAX_HASH), (0, end)]
            }
            HashRange::Partial { start, end } => vec![(start, end)],
        }
    }
}

/// Range of key hashes owned by the node at `server_hash`.
///
/// A key belongs to the first node hash strictly greater than its own, so
/// the range ends one below `server_hash` and starts at the predecessor's
/// hash. Returns `None` for an empty ring, or when the range collapses.
pub fn hash_range(server_hash: u32, sorted_hashes: &[u32]) -> Option<HashRange> {
    match sorted_hashes.len() {
        0 => return None,
        1 => return Some(HashRange::Full { end: server_hash }),
        _ => {}
    }

    let end_idx = sorted_hashes.iter().position(|h| *h >= server_hash);
    let start_idx = match end_idx {
        Some(idx) if idx > 0 => idx - 1,
        _ => sorted_hashes.len() - 1,
    };

    let start = sorted_hashes[start_idx];
    let end = server_hash.checked_sub(1).unwrap_or(MAX_HASH);

    if start == end {
        return None;
    }

    Some(HashRange::Partial { start, end })
}

/// Hash following `hash` in `sorted_hashes`, wrapping at the end.
pub fn successor_wrapping(hash: u32, sorted_hashes: &[u32]) -> Option<u32> {
    if sorted_hashes.len() < 2 {
        return None;
    }

    let idx = sorted_hashes.iter().position(|h| *h == hash)?;
    sorted_hashes.get(idx + 1).or(sorted_hashes.first()).copied()
}

/// Share of values dropped from each end for [`KeyDistribution::trimmed_mean`].
pub const TRIM_ALPHA: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyDistribution {
    pub min: usize,
    pub max: usize,
    pub median: f64,
    pub trimmed_mean: f64,
}

impl KeyDistribution {
    pub fn from_counts(counts: &[usize]) -> Option<Self> {
        if counts.is_empty() {
            return None;
        }

        let mut sorted = counts.to_vec();
        sorted.sort_unstable();
        let len = sorted.len();

        let median = if len % 2 == 1 {
            sorted[len / 2] as f64
        } else {
            (sorted[len / 2] + sorted[len / 2 - 1]) as f64 / 2.0
        };

        let k = (TRIM_ALPHA * len as f64).floor() as usize;
        let trimmed = &sorted[k..len - k];
        let trimmed_mean = trimmed.iter().sum::<usize>() as f64 / trimmed.len() as f64;

        Some(KeyDistribution {
            min: sorted[0],
            max: sorted[len - 1],
            median,
            trimmed_mean,
        })
    }
}
