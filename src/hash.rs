//! Content Hashing
//!
//! Every state descriptor in this crate is identified by a 64-bit *content
//! hash*: a hash of its observable fields, independent of allocation order or
//! memory address. Content hashes are the keys of every [`ResourcePool`] and
//! the basis of the deduplication guarantee — identical configurations
//! collapse to one live native object.
//!
//! # Hash Function
//!
//! Descriptors feed their fields through their `std::hash::Hash` impl into a
//! streaming xxh3 hasher. Float fields are hashed bit-exact via
//! `f32::to_bits`, so two descriptors compare and hash identically exactly
//! when their bit patterns match.
//!
//! # Composition
//!
//! Composite objects do not re-hash their children's fields. They combine
//! child hashes with the order-sensitive operators below:
//!
//! - [`combine`] — sequential mixing for fixed fields.
//! - [`combine_indexed`] — positional salt for list-valued children
//!   (viewports, scissors, attachments), so reordering a list changes the
//!   resulting hash while field-identical lists always collapse.
//!
//! # Memoization
//!
//! Long-lived composite descriptors cache their hash in a [`HashCell`] on
//! first access. The cell is a `OnceCell<u64>`, not a zero-valued sentinel:
//! a computed hash of exactly zero is stored and served like any other
//! value.
//!
//! [`ResourcePool`]: crate::pool::ResourcePool

use std::hash::{Hash, Hasher};

use once_cell::sync::OnceCell;
use xxhash_rust::xxh3::Xxh3;

/// 64-bit content hash attached to every state/description object.
pub type ContentHash = u64;

// ─── Hashing Helpers ──────────────────────────────────────────────────────────

/// Compute the content hash of any `Hash`-able value via streaming xxh3.
#[inline]
#[must_use]
pub fn hash_value<T: Hash>(value: &T) -> ContentHash {
    let mut hasher = Xxh3::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Order-sensitive sequential mix of two hashes.
///
/// `combine(a, b) != combine(b, a)` except by coincidence.
#[inline]
#[must_use]
pub fn combine(a: ContentHash, b: ContentHash) -> ContentHash {
    let mut hasher = Xxh3::new();
    hasher.write_u64(a);
    hasher.write_u64(b);
    hasher.finish()
}

/// Mix a list element's hash with its position.
///
/// Used before XOR-folding list-valued children so that element order
/// affects the final hash even though XOR itself is commutative.
#[inline]
#[must_use]
pub fn combine_indexed(h: ContentHash, index: usize) -> ContentHash {
    combine(h, index as u64)
}

// ─── HashCell ─────────────────────────────────────────────────────────────────

/// Lazily computed, memoized content hash.
///
/// Thread-safe: two threads racing on the first computation both derive the
/// same value from the (immutable) descriptor fields and `OnceCell`
/// publishes one of them. After the first access the value never changes.
#[derive(Debug, Default)]
pub struct HashCell {
    cell: OnceCell<ContentHash>,
}

impl HashCell {
    /// An empty, not-yet-computed cell.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Return the cached hash, computing it with `compute` on first access.
    #[inline]
    pub fn get_or_compute(&self, compute: impl FnOnce() -> ContentHash) -> ContentHash {
        *self.cell.get_or_init(compute)
    }

    /// The cached hash, if it has been computed.
    #[must_use]
    pub fn get(&self) -> Option<ContentHash> {
        self.cell.get().copied()
    }
}

impl Clone for HashCell {
    fn clone(&self) -> Self {
        let cell = OnceCell::new();
        if let Some(&h) = self.cell.get() {
            // A clone of immutable data has the same hash.
            let _ = cell.set(h);
        }
        Self { cell }
    }
}

// ─── Hashed<T> ────────────────────────────────────────────────────────────────

/// A value paired with its memoized content hash.
///
/// Used for descriptors that are published to a pool and looked up
/// repeatedly: the wrapped value is immutable from construction, so the hash
/// is computed at most once.
#[derive(Debug, Clone)]
pub struct Hashed<T> {
    value: T,
    hash: HashCell,
}

impl<T: Hash> Hashed<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            hash: HashCell::new(),
        }
    }

    /// The memoized content hash of the wrapped value.
    #[inline]
    pub fn content_hash(&self) -> ContentHash {
        self.hash.get_or_compute(|| hash_value(&self.value))
    }
}

impl<T> std::ops::Deref for Hashed<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> AsRef<T> for Hashed<T> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_value_is_deterministic() {
        let a = hash_value(&("rasterizer", 4u32));
        let b = hash_value(&("rasterizer", 4u32));
        assert_eq!(a, b);
        assert_ne!(a, hash_value(&("rasterizer", 5u32)));
    }

    #[test]
    fn combine_is_order_sensitive() {
        let a = hash_value(&1u64);
        let b = hash_value(&2u64);
        assert_ne!(combine(a, b), combine(b, a));
    }

    #[test]
    fn combine_indexed_distinguishes_positions() {
        let h = hash_value(&42u64);
        assert_ne!(combine_indexed(h, 0), combine_indexed(h, 1));
    }

    #[test]
    fn hash_cell_computes_once() {
        let cell = HashCell::new();
        let mut calls = 0;
        let first = cell.get_or_compute(|| {
            calls += 1;
            7
        });
        let second = cell.get_or_compute(|| {
            calls += 1;
            99
        });
        assert_eq!(first, 7);
        assert_eq!(second, 7);
        assert_eq!(calls, 1);
    }

    #[test]
    fn hash_cell_caches_a_true_zero_hash() {
        // Zero is a valid hash value, not an "uncomputed" sentinel.
        let cell = HashCell::new();
        assert_eq!(cell.get_or_compute(|| 0), 0);
        assert_eq!(cell.get(), Some(0));
        assert_eq!(cell.get_or_compute(|| 1), 0);
    }

    #[test]
    fn hashed_wrapper_memoizes() {
        let h = Hashed::new(("blend", true));
        let first = h.content_hash();
        assert_eq!(h.content_hash(), first);
        assert_eq!(*h, ("blend", true));
    }
}
