//! Least Recently Used (LRU) cache with byte-budget eviction.
//!
//! # How the accounting works
//!
//! Unlike a count-limited LRU, this one tracks a running `used_bytes` total
//! — `Σ (key.len() + value.cache_len())` over all live entries — and evicts
//! from the LRU end until `used_bytes <= max_bytes` holds again. A
//! `max_bytes` of `0` disables eviction entirely (an unbounded cache), which
//! is mainly useful for tests that want to observe raw accounting without
//! any entries disappearing underneath them.
//!
//! # Data structure
//!
//! A `HashMap<String, usize>` maps each key to a slot index into a `Vec` of
//! nodes; the nodes form a doubly linked list via `prev`/`next` slot indices
//! rather than raw pointers, so the whole module is `unsafe`-free. Removed
//! slots are pushed onto a free list and reused by later inserts instead of
//! shifting the `Vec`, keeping `get`/`add`/evict at O(1) amortized (plus the
//! O(log n) `HashMap` operations).
//!
//! ```text
//! map: { "a" -> 2, "b" -> 0, "c" -> 1 }
//!
//! nodes: [ Some(b) <-> Some(c) <-> Some(a) ]
//!              ^                     ^
//!             tail (LRU)            head (MRU)
//! ```

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

/// The capability the LRU requires of its values: a caller-defined notion of
/// "how many bytes does this count as" for budget accounting.
///
/// [`crate::byte_view::ByteView`] is the only implementor this crate ships,
/// but the trait (rather than hardcoding `ByteView`) keeps `Lru` reusable
/// the way the teacher's cache types were generic over value type.
pub trait CacheValue: Clone {
    /// The number of bytes this value counts as, for budget accounting.
    fn cache_len(&self) -> usize;
}

struct Node<V> {
    key: String,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

/// A key's accounted size: `key.len() + value.cache_len()`.
fn entry_size(key: &str, value: &impl CacheValue) -> usize {
    key.len() + value.cache_len()
}

/// A recency-ordered, byte-budgeted key→value store.
///
/// See the module documentation for the accounting rules and the internal
/// list representation. `on_evicted`, if set, is invoked once per entry
/// removed by the budget-eviction loop inside [`Lru::add`], with the key and
/// value as they existed at eviction — never for entries removed for other
/// reasons (there are none; this type has no explicit `remove`).
pub struct Lru<V: CacheValue> {
    max_bytes: usize,
    used_bytes: usize,
    map: HashMap<String, usize>,
    nodes: Vec<Option<Node<V>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    on_evicted: Option<Box<dyn FnMut(&str, &V) + Send>>,
}

impl<V: CacheValue> Lru<V> {
    /// Constructs an empty cache. `max_bytes == 0` means unbounded.
    pub fn new(max_bytes: usize, on_evicted: Option<Box<dyn FnMut(&str, &V) + Send>>) -> Self {
        Self {
            max_bytes,
            used_bytes: 0,
            map: HashMap::new(),
            nodes: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            on_evicted,
        }
    }

    /// The configured byte budget (`0` means unbounded).
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// The sum of `key.len() + value.cache_len()` over all live entries.
    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    /// The number of entries currently stored.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Looks up `key`, moving it to the most-recently-used end on a hit.
    ///
    /// Reordering never changes `used_bytes`; only [`Lru::add`]'s budget loop
    /// does.
    pub fn get<Q>(&mut self, key: &Q) -> Option<V>
    where
        String: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let idx = *self.map.get(key)?;
        self.move_to_front(idx);
        self.nodes[idx].as_ref().map(|n| n.value.clone())
    }

    /// Inserts or updates `key`, then evicts from the LRU end while
    /// `max_bytes > 0 && used_bytes > max_bytes`.
    ///
    /// Updating an existing key moves it to the MRU end *before* the
    /// eviction loop runs, so a value large enough to blow the budget can
    /// evict other entries but never evicts itself.
    pub fn add(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        if let Some(&idx) = self.map.get(&key) {
            let old_size = {
                let node = self.nodes[idx].as_ref().expect("indexed node missing");
                entry_size(&node.key, &node.value)
            };
            let new_size = entry_size(&key, &value);
            self.nodes[idx].as_mut().expect("indexed node missing").value = value;
            self.used_bytes = self.used_bytes + new_size - old_size;
            self.move_to_front(idx);
        } else {
            let size = entry_size(&key, &value);
            let idx = self.alloc_slot();
            self.nodes[idx] = Some(Node {
                key: key.clone(),
                value,
                prev: None,
                next: None,
            });
            self.map.insert(key, idx);
            self.attach_front(idx);
            self.used_bytes += size;
        }

        while self.max_bytes > 0 && self.used_bytes > self.max_bytes {
            if !self.evict_oldest() {
                break;
            }
        }
    }

    /// Evicts the single least-recently-used entry, invoking `on_evicted` if
    /// set. Returns `false` if the cache was empty.
    fn evict_oldest(&mut self) -> bool {
        let Some(idx) = self.tail else {
            return false;
        };
        self.detach(idx);
        let node = self.nodes[idx].take().expect("tail node missing");
        self.free.push(idx);
        self.map.remove(&node.key);
        self.used_bytes -= entry_size(&node.key, &node.value);
        if let Some(cb) = self.on_evicted.as_mut() {
            cb(&node.key, &node.value);
        }
        true
    }

    fn alloc_slot(&mut self) -> usize {
        if let Some(idx) = self.free.pop() {
            idx
        } else {
            self.nodes.push(None);
            self.nodes.len() - 1
        }
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }
        self.detach(idx);
        self.attach_front(idx);
    }

    fn attach_front(&mut self, idx: usize) {
        {
            let node = self.nodes[idx].as_mut().expect("missing node");
            node.prev = None;
            node.next = self.head;
        }
        if let Some(head) = self.head {
            self.nodes[head].as_mut().expect("missing head").prev = Some(idx);
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    fn detach(&mut self, idx: usize) {
        let (prev, next) = {
            let node = self.nodes[idx].as_ref().expect("missing node");
            (node.prev, node.next)
        };
        match prev {
            Some(p) => self.nodes[p].as_mut().expect("missing prev").next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].as_mut().expect("missing next").prev = prev,
            None => self.tail = prev,
        }
    }
}

impl<V: CacheValue> std::fmt::Debug for Lru<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lru")
            .field("max_bytes", &self.max_bytes)
            .field("used_bytes", &self.used_bytes)
            .field("len", &self.len())
            .finish()
    }
}
