//! Hashing primitives.
//!
//! Every identity in the protocol is a SHA-256 digest: block hashes, the
//! transaction ids a header commits to, and the chunk roots peers vote on
//! during synchronization. [`merkle_root`] is the shared commitment over an
//! ordered hash list that all of those roots are built with.

use sha2::{Digest, Sha256};

/// SHA-256 digest of `data`.
#[inline]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// SHA-256 digest of several slices fed in sequence, without concatenating
/// them into a buffer first.
pub fn sha256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Hash of an interior Merkle node from its two children.
fn hash_pair(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    sha256_concat(&[left, right])
}

/// Merkle root of an ordered list of 32-byte hashes.
///
/// The empty list commits to the zero hash, which is also how an empty chunk
/// enumeration is encoded on the wire. A single leaf is its own root. Each
/// level pairs nodes left to right; a trailing odd node is paired with
/// itself. The construction is order sensitive, so reordered leaves produce
/// a different root.
pub fn merkle_root(hashes: &[[u8; 32]]) -> [u8; 32] {
    match hashes {
        [] => [0u8; 32],
        [leaf] => *leaf,
        _ => {
            let mut level = hashes.to_vec();
            while level.len() > 1 {
                level = level
                    .chunks(2)
                    .map(|pair| {
                        let left = &pair[0];
                        let right = pair.get(1).unwrap_or(left);
                        hash_pair(left, right)
                    })
                    .collect();
            }
            level[0]
        }
    }
}
