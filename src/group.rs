//! The namespace orchestrator: the one piece of the crate that sequences
//! "local hit → peer pick → remote fetch → local loader → populate" under
//! concurrent access.
//!
//! `Group::get` is the entire public read path. Everything else in this
//! module exists to make exactly one path through [`Group::load`] run per
//! key per in-flight window, regardless of how many callers or peers are
//! asking for it at once.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::byte_view::ByteView;
use crate::cache::CacheShell;
use crate::error::CacheError;
use crate::peer::PeerPicker;
use crate::registry;
use crate::singleflight::SingleFlight;

/// Materializes a value for a key the local cache and all peers have missed.
///
/// Exactly one implementor is registered per [`Group`] at construction; it
/// is the embedder's hook into whatever backing store the cache is fronting
/// (a database, an object store, a computed value, …).
#[async_trait::async_trait]
pub trait Loader: Send + Sync {
    /// Produces the bytes for `key`, or a [`CacheError::LoaderError`] if the
    /// key has no value (e.g. it doesn't exist in the backing store).
    ///
    /// The returned bytes are copied by the caller before being retained, so
    /// a loader may safely reuse or mutate its backing buffer afterward.
    async fn load(&self, key: &str) -> Result<Bytes, CacheError>;
}

struct LoaderFn<F>(F);

#[async_trait::async_trait]
impl<F, Fut> Loader for LoaderFn<F>
where
    F: Fn(&str) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Bytes, CacheError>> + Send,
{
    async fn load(&self, key: &str) -> Result<Bytes, CacheError> {
        (self.0)(key).await
    }
}

/// Wraps a plain async closure as a [`Loader`], the way the reference source
/// wraps a bare function as a `GetterFunc`.
pub fn loader_fn<F, Fut>(f: F) -> impl Loader
where
    F: Fn(&str) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Bytes, CacheError>> + Send,
{
    LoaderFn(f)
}

/// A named cache namespace: its own loader, its own bounded LRU, and
/// (optionally) a shared view of the peer group it participates in.
pub struct Group {
    name: String,
    loader: Arc<dyn Loader>,
    main_cache: CacheShell,
    peers: parking_lot::Mutex<Option<Arc<dyn PeerPicker>>>,
    single_flight: SingleFlight,
}

impl Group {
    /// Constructs a new group, registers it under `name` in the process-wide
    /// registry, and returns a shared handle.
    ///
    /// # Panics
    ///
    /// Panics if `name` is already registered (spec.md §4.5: duplicate names
    /// are a programming error, not a recoverable condition).
    pub fn new<L>(name: impl Into<String>, max_bytes: usize, loader: L) -> Arc<Self>
    where
        L: Loader + 'static,
    {
        Self::new_with_loader(name, max_bytes, Arc::new(loader))
    }

    /// As [`Group::new`], taking an already-shared loader.
    pub fn new_with_loader(name: impl Into<String>, max_bytes: usize, loader: Arc<dyn Loader>) -> Arc<Self> {
        let name = name.into();
        let group = Arc::new(Self {
            name: name.clone(),
            loader,
            main_cache: CacheShell::new(max_bytes),
            peers: parking_lot::Mutex::new(None),
            single_flight: SingleFlight::new(),
        });
        registry::insert(name, group.clone());
        group
    }

    /// This group's name, as registered.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up a previously-constructed group by name.
    pub fn get_group(name: &str) -> Option<Arc<Self>> {
        registry::get_group(name)
    }

    /// Installs the peer picker this group forwards remote-owned keys
    /// through.
    ///
    /// # Panics
    ///
    /// Panics if called twice (spec.md §4.5: "may be called at most once").
    pub fn register_peers(&self, picker: Arc<dyn PeerPicker>) {
        let mut slot = self.peers.lock();
        assert!(slot.is_none(), "register_peers called more than once");
        *slot = Some(picker);
    }

    /// Resolves `key`: a local-cache hit short-circuits everything else;
    /// otherwise a single-flight window decides whether to forward to a
    /// peer or invoke the local loader.
    ///
    /// # Errors
    ///
    /// [`CacheError::InvalidInput`] for an empty key; otherwise whatever the
    /// peer fetch or loader reports.
    pub async fn get(&self, key: &str) -> Result<ByteView, CacheError> {
        if key.is_empty() {
            return Err(CacheError::InvalidInput);
        }
        if let Some(hit) = self.main_cache.get(key) {
            debug!(group = %self.name, key, "cache hit");
            return hit.into_ok();
        }
        self.load(key).await
    }

    /// The single-flight-guarded miss path: peer fetch (if applicable) with
    /// local fallthrough on failure, else straight to the local loader.
    async fn load(&self, key: &str) -> Result<ByteView, CacheError> {
        self.single_flight
            .do_call(key, || async move {
                let picker = self.peers.lock().clone();
                if let Some(picker) = picker {
                    if let Some(peer) = picker.pick_peer(key) {
                        match self.get_from_peer(peer.as_ref(), key).await {
                            Ok(view) => return Ok(view),
                            Err(err) => {
                                warn!(group = %self.name, key, error = %err, "peer fetch failed, falling back to local loader");
                            }
                        }
                    }
                }
                self.get_locally(key).await
            })
            .await
    }

    async fn get_from_peer(&self, peer: &dyn crate::peer::PeerGetter, key: &str) -> Result<ByteView, CacheError> {
        let bytes = peer.get(&self.name, key).await?;
        // Deliberately not populated into main_cache: the owning peer is the
        // single authoritative home for this key (spec.md §4.5).
        Ok(ByteView::new(bytes))
    }

    async fn get_locally(&self, key: &str) -> Result<ByteView, CacheError> {
        let bytes = self.loader.load(key).await?;
        let view = ByteView::copy_from(&bytes);
        self.main_cache.add(key, view.clone());
        Ok(view)
    }
}

impl std::fmt::Debug for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Group").field("name", &self.name).finish()
    }
}

/// Helper so `get`'s cache-hit branch and `load`'s success branch share one
/// return shape without an extra `Result::Ok` import at every call site.
trait IntoOk {
    fn into_ok(self) -> Result<ByteView, CacheError>;
}
impl IntoOk for ByteView {
    fn into_ok(self) -> Result<ByteView, CacheError> {
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    fn unique_name(tag: &str) -> String {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        format!("{tag}-{}", COUNTER.fetch_add(1, Ordering::SeqCst))
    }

    #[tokio::test]
    async fn hit_count_scenario() {
        // spec.md §8 scenario 2.
        let db: HashMap<&str, &str> =
            [("Sally", "110"), ("Collin", "150"), ("Link", "150")].into_iter().collect();
        let load_counts: Arc<StdMutex<HashMap<String, usize>>> = Arc::new(StdMutex::new(HashMap::new()));
        let counts = load_counts.clone();

        let group = Group::new(
            unique_name("hitcount"),
            2 << 10,
            loader_fn(move |key: &str| {
                let counts = counts.clone();
                let value = db.get(key).copied();
                async move {
                    match value {
                        Some(v) => {
                            *counts.lock().unwrap().entry(key.to_string()).or_insert(0) += 1;
                            Ok(Bytes::from(v.to_string()))
                        }
                        None => Err(CacheError::loader_msg(format!("{key} cannot find"))),
                    }
                }
            }),
        );

        for key in ["Sally", "Collin", "Link"] {
            let v1 = group.get(key).await.unwrap();
            let v2 = group.get(key).await.unwrap();
            assert_eq!(v1.as_str_lossy(), v2.as_str_lossy());
        }
        let counts = load_counts.lock().unwrap();
        for key in ["Sally", "Collin", "Link"] {
            assert_eq!(counts[key], 1);
        }
    }

    #[tokio::test]
    async fn miss_is_an_error_with_no_byteview() {
        // spec.md §8 scenario 3.
        let group = Group::new(unique_name("miss"), 1024, loader_fn(|key: &str| {
            let key = key.to_string();
            async move { Err(CacheError::loader_msg(format!("{key} cannot find"))) }
        }));
        let err = group.get("unknown").await.unwrap_err();
        assert!(matches!(err, CacheError::LoaderError(_)));
    }

    #[tokio::test]
    async fn empty_key_is_invalid_input() {
        let group = Group::new(unique_name("empty"), 1024, loader_fn(|_: &str| async { Ok(Bytes::new()) }));
        assert!(matches!(group.get("").await, Err(CacheError::InvalidInput)));
    }

    #[tokio::test]
    #[should_panic(expected = "register_peers called more than once")]
    async fn double_register_peers_panics() {
        struct NoPeers;
        impl PeerPicker for NoPeers {
            fn pick_peer(&self, _key: &str) -> Option<Arc<dyn crate::peer::PeerGetter>> {
                None
            }
        }
        let group = Group::new(unique_name("double-register"), 1024, loader_fn(|_: &str| async { Ok(Bytes::new()) }));
        group.register_peers(Arc::new(NoPeers));
        group.register_peers(Arc::new(NoPeers));
    }

    #[tokio::test]
    async fn self_pick_short_circuits_to_local_loader() {
        // spec.md §8 scenario 6.
        struct AlwaysSelf;
        impl PeerPicker for AlwaysSelf {
            fn pick_peer(&self, _key: &str) -> Option<Arc<dyn crate::peer::PeerGetter>> {
                None // "self" owns every key: never forward.
            }
        }
        let loader_calls = Arc::new(AtomicUsize::new(0));
        let calls = loader_calls.clone();
        let group = Group::new(
            unique_name("self-shortcircuit"),
            1024,
            loader_fn(move |_key: &str| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Bytes::from_static(b"local"))
                }
            }),
        );
        group.register_peers(Arc::new(AlwaysSelf));
        let v = group.get("k").await.unwrap();
        assert_eq!(v.as_str_lossy(), "local");
        assert_eq!(loader_calls.load(Ordering::SeqCst), 1);
    }
}
