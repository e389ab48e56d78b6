//! The namespace-local cache shell: a mutex around a lazily-constructed
//! [`Lru`], so a [`crate::group::Group`] that is only ever read through
//! (hits always resolved by a peer, say) never allocates an LRU table at
//! all.

use crate::byte_view::ByteView;
use crate::lru::Lru;
use parking_lot::Mutex;

/// A thread-safe, lazily-initialized LRU cache keyed by string, valued by
/// [`ByteView`].
///
/// The lock is held only across in-memory work (`get`/`add`/the eviction
/// loop/the eviction callback); it is never held across a loader or peer
/// call, which always happen above this type, in
/// [`crate::group::Group::load`].
pub struct CacheShell {
    max_bytes: usize,
    inner: Mutex<Option<Lru<ByteView>>>,
}

impl CacheShell {
    /// Constructs a shell with no backing `Lru` yet; `max_bytes` is recorded
    /// and used the first time [`CacheShell::add`] actually constructs one.
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            inner: Mutex::new(None),
        }
    }

    /// Looks up `key`. Returns `(value, false)` without allocating anything
    /// if no entry has ever been added to this shell.
    pub fn get(&self, key: &str) -> Option<ByteView> {
        let mut guard = self.inner.lock();
        guard.as_mut()?.get(key)
    }

    /// Inserts or updates `key`, constructing the backing `Lru` on first use.
    pub fn add(&self, key: impl Into<String>, value: ByteView) {
        let mut guard = self.inner.lock();
        guard.get_or_insert_with(|| Lru::new(self.max_bytes, None)).add(key, value);
    }

    /// The number of entries currently cached, or `0` if the `Lru` hasn't
    /// been constructed yet.
    pub fn len(&self) -> usize {
        self.inner.lock().as_ref().map_or(0, Lru::len)
    }

    /// `true` if the shell holds no entries (including the not-yet-allocated
    /// case).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for CacheShell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheShell")
            .field("max_bytes", &self.max_bytes)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_shell_has_no_entries_and_reports_empty() {
        let shell = CacheShell::new(1024);
        assert_eq!(shell.get("k"), None);
        assert!(shell.is_empty());
    }

    #[test]
    fn add_then_get_round_trips() {
        let shell = CacheShell::new(1024);
        shell.add("k", ByteView::copy_from(b"v"));
        assert_eq!(shell.get("k").unwrap().as_str_lossy(), "v");
        assert_eq!(shell.len(), 1);
    }

    #[test]
    fn respects_configured_budget() {
        let shell = CacheShell::new(4);
        shell.add("aa", ByteView::copy_from(b"bb")); // size 4, fits exactly
        shell.add("cc", ByteView::copy_from(b"dd")); // evicts "aa"
        assert_eq!(shell.get("aa"), None);
        assert_eq!(shell.get("cc").unwrap().as_str_lossy(), "dd");
    }
}
