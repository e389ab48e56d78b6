//! The process-wide name→[`Group`] directory.
//!
//! A single lazily-initialized, reader-writer-locked map, matching the
//! reference Go source's package-level `groups map[string]*Group` guarded by
//! a `sync.RWMutex`. [`crate::group::Group::new`] takes the write lock;
//! [`get_group`] takes the read lock. There is no removal API: once a name
//! is registered it lives for the process's lifetime, since the HTTP
//! transport resolves incoming requests by looking a group name up in this
//! same table and a group disappearing mid-flight would be a much harder
//! problem than this crate's scope covers (see spec.md §1 Non-goals).

use crate::group::Group;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

fn registry() -> &'static RwLock<HashMap<String, Arc<Group>>> {
    static REGISTRY: OnceLock<RwLock<HashMap<String, Arc<Group>>>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Inserts `group` under `name`.
///
/// # Panics
///
/// Panics if `name` is already registered — a programming error per
/// spec.md §4.5 ("Duplicate `name` is a programming error"), not a
/// recoverable runtime condition.
pub(crate) fn insert(name: String, group: Arc<Group>) {
    let mut map = registry().write();
    assert!(!map.contains_key(&name), "group {name:?} already registered");
    map.insert(name, group);
}

/// Looks up a previously-registered group by name.
pub fn get_group(name: &str) -> Option<Arc<Group>> {
    registry().read().get(name).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::loader_fn;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn unique_name(tag: &str) -> String {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        format!("{tag}-{}", COUNTER.fetch_add(1, Ordering::SeqCst))
    }

    #[tokio::test]
    async fn round_trips_through_the_global_registry() {
        let name = unique_name("registry-roundtrip");
        let group = Group::new(name.clone(), 1024, loader_fn(|_key: &str| async {
            Ok(bytes::Bytes::from_static(b"v"))
        }));
        let found = get_group(&name).expect("group registers itself on construction");
        assert!(Arc::ptr_eq(&group, &found));
    }

    #[tokio::test]
    #[should_panic(expected = "already registered")]
    async fn duplicate_name_is_a_programming_error() {
        let name = unique_name("dup-test");
        let _g1 = Group::new(name.clone(), 1024, loader_fn(|_key: &str| async {
            Ok(bytes::Bytes::from_static(b"v"))
        }));
        let _g2 = Group::new(name, 1024, loader_fn(|_key: &str| async {
            Ok(bytes::Bytes::from_static(b"v"))
        }));
    }
}
