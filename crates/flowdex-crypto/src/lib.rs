//! # flowdex-crypto: Composite key derivation
//!
//! Derives the stable, collision-resistant identity of a
//! `(sender, receiver, token)` triple:
//!
//! 1. ABI-encode the `(sender, receiver)` tuple: each address left-padded
//!    to a 32-byte word, sender first.
//! 2. Keccak-256 the 64-byte encoding into a [`PairHash`].
//! 3. Suffix the token address to form the [`CompositeKey`].
//!
//! The pair hash is deliberately independent of the token: composite keys
//! for every token flowing between one pair share a prefix, so "all tokens
//! between this pair" stays an efficient grouped lookup.
//!
//! Everything here is a pure function of its inputs. Same triple, same key,
//! on every machine, forever; the derived state's identity scheme depends
//! on it.

use sha3::{Digest, Keccak256};

use flowdex_types::{Address, CompositeKey, PairHash};

/// Length of the ABI encoding of an `(address, address)` tuple.
const PAIR_ENCODING_LENGTH: usize = 64;

/// ABI-encodes the `(sender, receiver)` tuple.
///
/// Each address occupies the low 20 bytes of a 32-byte word, matching the
/// canonical `abi.encode(address, address)` layout the upstream contract
/// events are keyed by.
#[must_use]
pub fn encode_pair(sender: Address, receiver: Address) -> [u8; PAIR_ENCODING_LENGTH] {
    let mut out = [0u8; PAIR_ENCODING_LENGTH];
    out[12..32].copy_from_slice(sender.as_bytes());
    out[44..64].copy_from_slice(receiver.as_bytes());
    out
}

/// Computes the Keccak-256 pair hash of `(sender, receiver)`.
#[must_use]
pub fn pair_hash(sender: Address, receiver: Address) -> PairHash {
    let digest = Keccak256::digest(encode_pair(sender, receiver));
    let bytes: [u8; 32] = digest.into();

    // Postcondition: hash isn't degenerate
    debug_assert!(
        bytes.iter().any(|&b| b != 0),
        "Keccak-256 produced all-zero hash, indicating a bug"
    );

    PairHash::from_bytes(bytes)
}

/// Derives the composite key for a `(sender, receiver, token)` triple.
#[must_use]
pub fn composite_key(sender: Address, receiver: Address, token: Address) -> CompositeKey {
    CompositeKey::new(pair_hash(sender, receiver), token)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    #[test]
    fn encoding_left_pads_each_address() {
        let encoded = encode_pair(addr(0x11), addr(0x22));

        assert!(encoded[..12].iter().all(|&b| b == 0));
        assert!(encoded[12..32].iter().all(|&b| b == 0x11));
        assert!(encoded[32..44].iter().all(|&b| b == 0));
        assert!(encoded[44..].iter().all(|&b| b == 0x22));
    }

    #[test]
    fn pair_hash_is_deterministic() {
        let h1 = pair_hash(addr(1), addr(2));
        let h2 = pair_hash(addr(1), addr(2));
        assert_eq!(h1, h2);
    }

    #[test]
    fn pair_hash_is_direction_sensitive() {
        // A→B and B→A are different streams.
        assert_ne!(pair_hash(addr(1), addr(2)), pair_hash(addr(2), addr(1)));
    }

    #[test]
    fn different_pairs_hash_differently() {
        assert_ne!(pair_hash(addr(1), addr(2)), pair_hash(addr(1), addr(3)));
        assert_ne!(pair_hash(addr(1), addr(2)), pair_hash(addr(4), addr(2)));
    }

    #[test]
    fn composite_key_shares_pair_prefix_across_tokens() {
        let usdc = composite_key(addr(1), addr(2), addr(0xA0));
        let dai = composite_key(addr(1), addr(2), addr(0xB0));

        assert_eq!(usdc.pair_hash, dai.pair_hash);
        assert_ne!(usdc, dai);
    }

    #[test]
    fn composite_key_is_revision_independent() {
        // The key never encodes lifecycle state; only the triple.
        let k1 = composite_key(addr(1), addr(2), addr(3));
        let k2 = composite_key(addr(1), addr(2), addr(3));
        assert_eq!(k1, k2);
    }

    #[test]
    fn matches_reference_keccak_vector() {
        // keccak256(abi.encode(address(0), address(0))): 64 zero bytes.
        let digest = Keccak256::digest([0u8; 64]);
        let expected = pair_hash(Address::ZERO, Address::ZERO);
        assert_eq!(expected.as_bytes(), &<[u8; 32]>::from(digest));
    }
}
