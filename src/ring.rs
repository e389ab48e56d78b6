//! Consistent-hash ring with virtual replicas.
//!
//! Each peer occupies `replicas` positions on the ring, one per
//! `hash(i ++ peer_name)` for `i` in `0..replicas`. Spreading a peer across
//! many positions smooths the keyspace it ends up owning — with only one
//! position per peer, losing or adding a single peer could move a wildly
//! uneven share of keys; with enough virtual replicas the share moved is
//! close to `1/peer_count` regardless of which peer changed.
//!
//! `get` hashes the key, binary-searches the sorted position list for the
//! first position `>=` that hash, and wraps around to position `0` if the
//! key's hash falls past every node — the ring has no "end", position `0`
//! is simply the successor of the highest position.
//!
//! ```text
//!            p2victim
//!         ,-------.
//!        /         \
//!       |  A1   B1  |
//!       |           |
//!       |  C1      A2
//!       |           |
//!        \   B2   C2/
//!         `-------'
//!   key "x" hashes here --> first node walking clockwise owns it
//! ```

use std::collections::HashMap;

/// A pluggable hash function over arbitrary bytes, returning a 32-bit digest.
pub trait RingHash: Send + Sync {
    /// Hashes `data` to a 32-bit digest.
    fn hash(&self, data: &[u8]) -> u32;
}

/// The default hash: CRC32-IEEE, matching the reference Go source's
/// `crc32.ChecksumIEEE`, so independently-built peers that both use the
/// default hasher agree on key ownership.
#[derive(Debug, Default, Clone, Copy)]
pub struct Crc32Hash;

impl RingHash for Crc32Hash {
    fn hash(&self, data: &[u8]) -> u32 {
        crc32fast::hash(data)
    }
}

/// A consistent-hash ring mapping keys to peer names.
///
/// Construction is `new` + repeated `add`; `get` is the read path. Both are
/// intentionally free of interior locking — callers that need to share a
/// `Ring` across threads wrap it themselves (see
/// `transport::http::pool::HttpPeerPool`, which owns one behind a
/// `parking_lot::Mutex`), matching spec.md §4.2's note that the ring itself
/// carries no mutex.
pub struct Ring<H: RingHash = Crc32Hash> {
    hash_fn: H,
    replicas: usize,
    sorted_hashes: Vec<u32>,
    hash_to_peer: HashMap<u32, String>,
}

/// Default number of virtual replicas per peer, matching the reference
/// source.
pub const DEFAULT_REPLICAS: usize = 50;

impl Ring<Crc32Hash> {
    /// Constructs a ring with the default CRC32-IEEE hash function.
    ///
    /// # Panics
    ///
    /// Panics if `replicas == 0` — a ring with zero virtual nodes per peer
    /// cannot place anything on the ring, which is a construction-time
    /// programming error rather than a runtime condition to recover from.
    pub fn new(replicas: usize) -> Self {
        Self::with_hash(replicas, Crc32Hash)
    }
}

impl<H: RingHash> Ring<H> {
    /// Constructs a ring with a custom hash function.
    ///
    /// # Panics
    ///
    /// Panics if `replicas == 0`.
    pub fn with_hash(replicas: usize, hash_fn: H) -> Self {
        assert!(replicas >= 1, "ring replicas must be >= 1");
        Self {
            hash_fn,
            replicas,
            sorted_hashes: Vec::new(),
            hash_to_peer: HashMap::new(),
        }
    }

    /// Adds each named peer at `replicas` virtual positions.
    ///
    /// If two positions collide (rare, since the hash space is 2^32 and
    /// collisions only redistribute a negligible slice of keyspace), the
    /// most recently added peer wins that position.
    pub fn add<S: AsRef<str>>(&mut self, peers: impl IntoIterator<Item = S>) {
        for peer in peers {
            let peer = peer.as_ref();
            for i in 0..self.replicas {
                let mut buf = itoa_decimal(i);
                buf.push_str(peer);
                let h = self.hash_fn.hash(buf.as_bytes());
                self.sorted_hashes.push(h);
                self.hash_to_peer.insert(h, peer.to_string());
            }
        }
        self.sorted_hashes.sort_unstable();
    }

    /// Removes every virtual position belonging to `peer`.
    ///
    /// Not part of the reference source (which has no peer-departure path)
    /// but a direct, low-risk extension of `add` that embedders driving
    /// dynamic peer membership need; `Group`/`HttpPeerPool` never call it on
    /// their own, keeping the core's "peer set changes only via `Set`/`add`"
    /// contract intact.
    pub fn remove(&mut self, peer: &str) {
        let dead: Vec<u32> = self
            .hash_to_peer
            .iter()
            .filter(|(_, p)| p.as_str() == peer)
            .map(|(h, _)| *h)
            .collect();
        for h in &dead {
            self.hash_to_peer.remove(h);
        }
        self.sorted_hashes.retain(|h| !dead.contains(h));
    }

    /// Resolves `key` to the name of the peer that owns it.
    ///
    /// Returns `None` for an empty key or an empty ring.
    pub fn get(&self, key: &str) -> Option<&str> {
        if key.is_empty() || self.sorted_hashes.is_empty() {
            return None;
        }
        let h = self.hash_fn.hash(key.as_bytes());
        let idx = match self.sorted_hashes.binary_search(&h) {
            Ok(i) => i,
            Err(i) => i % self.sorted_hashes.len(),
        };
        self.hash_to_peer.get(&self.sorted_hashes[idx]).map(String::as_str)
    }

    /// `true` if the ring has no peers on it.
    pub fn is_empty(&self) -> bool {
        self.sorted_hashes.is_empty()
    }
}

/// Renders `i` as ASCII decimal digits, matching Go's `strconv.Itoa`
/// concatenation order (`"<i><peer>"`) used when hashing a virtual replica.
fn itoa_decimal(i: usize) -> String {
    i.to_string()
}

impl<H: RingHash> std::fmt::Debug for Ring<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ring")
            .field("replicas", &self.replicas)
            .field("positions", &self.sorted_hashes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn empty_ring_returns_none() {
        let ring = Ring::new(50);
        assert_eq!(ring.get("anything"), None);
    }

    #[test]
    fn empty_key_returns_none() {
        let mut ring = Ring::new(50);
        ring.add(["A", "B"]);
        assert_eq!(ring.get(""), None);
    }

    #[test]
    fn deterministic_across_independent_instances() {
        // spec.md §8 scenario 5.
        let build = || {
            let mut r = Ring::new(50);
            r.add(["A", "B", "C"]);
            r
        };
        let r1 = build();
        let r2 = build();
        for key in ["Tom", "Jack", "Sam"] {
            assert_eq!(r1.get(key), r2.get(key));
        }
    }

    #[test]
    fn repeated_calls_are_stable() {
        let mut ring = Ring::new(50);
        ring.add(["A", "B", "C"]);
        let first = ring.get("Tom").map(str::to_string);
        for _ in 0..10 {
            assert_eq!(ring.get("Tom").map(str::to_string), first);
        }
    }

    #[test]
    fn coverage_every_key_maps_to_a_known_peer() {
        let mut ring = Ring::new(50);
        let peers: HashSet<&str> = ["A", "B", "C"].into_iter().collect();
        ring.add(peers.iter().copied());
        for i in 0..500 {
            let key = format!("key-{i}");
            let owner = ring.get(&key).expect("non-empty ring must resolve a peer");
            assert!(peers.contains(owner));
        }
    }

    #[test]
    fn single_peer_owns_everything() {
        let mut ring = Ring::new(10);
        ring.add(["only"]);
        for i in 0..50 {
            assert_eq!(ring.get(&format!("k{i}")), Some("only"));
        }
    }

    #[test]
    #[should_panic(expected = "replicas must be >= 1")]
    fn zero_replicas_panics() {
        let _ = Ring::new(0);
    }

    #[test]
    fn remove_peer_redistributes_its_keys() {
        let mut ring = Ring::new(50);
        ring.add(["A", "B"]);
        ring.remove("A");
        for i in 0..50 {
            assert_eq!(ring.get(&format!("k{i}")), Some("B"));
        }
    }
}
