use sha2::{Digest, Sha256};

pub const MIN_HASH: u32 = 0x0000_0000;
pub const MAX_HASH: u32 = 0xffff_ffff;

/// Number of distinct positions on the ring, `2^32`.
pub const RING_SIZE: u64 = MAX_HASH as u64 + 1;

/// Maps a name onto a position of the ring.
pub trait RingHasher {
    fn hash(&self, input: &str) -> u32;
}

/// The xmur3 string hash. Default hasher of [`crate::HashRing`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Xmur3;

impl RingHasher for Xmur3 {
    fn hash(&self, input: &str) -> u32 {
        xmur3(input)
    }
}

/// First four bytes of the SHA-256 digest, big endian.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sha256Prefix;

impl RingHasher for Sha256Prefix {
    fn hash(&self, input: &str) -> u32 {
        generate_hash32(input.as_bytes())
    }
}

/// 32 bit xmur3 hash.
///
/// Operates on UTF-16 code units so digests agree with other xmur3
/// implementations for any input, not only ASCII.
pub fn xmur3(input: &str) -> u32 {
    let length = input.encode_utf16().count() as u32;
    let mut h = 1_779_033_703u32 ^ length;

    for unit in input.encode_utf16() {
        h = (h ^ u32::from(unit)).wrapping_mul(3_432_918_353);
        h = h.rotate_left(13);
    }

    h = (h ^ (h >> 16)).wrapping_mul(2_246_822_507);
    h = (h ^ (h >> 13)).wrapping_mul(3_266_489_909);
    h ^ (h >> 16)
}

pub fn generate_hash32(input: &[u8]) -> u32 {
    let mut hasher = Sha256::new();
    hasher.update(input);
    let hash = hasher.finalize();
    u32::from_be_bytes([hash[0], hash[1], hash[2], hash[3]])
}

#[test]
fn test_xmur3_same_input_same_hash() {
    let hash = xmur3("foo");
    let hash_retry = xmur3("foo");

    assert_eq!(hash, hash_retry);
}

#[test]
fn test_xmur3_similar_inputs_differ() {
    assert_ne!(xmur3("foo"), xmur3("boo"));
}

#[test]
fn test_xmur3_reference_values() {
    assert_eq!(xmur3("foo"), 602_511_389);
    assert_eq!(xmur3("boo"), 3_500_046_822);
    assert_eq!(xmur3(""), 167_010_153);
    assert_eq!(xmur3("a"), 519_299_066);
    assert_eq!(xmur3("node-11_0"), 1_930_743_626);
}

#[test]
fn test_xmur3_hashes_utf16_code_units() {
    assert_eq!(xmur3("ü"), 2_814_341_230);
    // surrogate pair, two code units
    assert_eq!(xmur3("😀"), 3_276_203_938);
}

#[test]
fn test_generate_hash32() {
    let hash = generate_hash32(b"foo");
    let hash_retry = generate_hash32(b"foo");

    assert_eq!(hash, hash_retry);
    assert_eq!(hash, 740_734_059);
    assert_eq!(Sha256Prefix.hash("foo"), hash);
}
