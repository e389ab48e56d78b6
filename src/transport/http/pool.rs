//! Combines a [`Ring`] with a set of [`HttpPeerGetter`]s into a
//! [`PeerPicker`], the way the reference Go source's `HTTPPool` is both the
//! request server and (indirectly, via `consistenthash.Map`) the peer
//! picker for the same process.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::peer::{PeerGetter, PeerPicker};
use crate::ring::{Ring, DEFAULT_REPLICAS};

use super::client::HttpPeerGetter;

/// A fixed-membership HTTP peer set: every peer is named by its base URL
/// (e.g. `"http://10.0.0.2:8080/_groupcache/"`), including this process's
/// own address, so the ring can resolve "owned locally" by literal string
/// equality against `self_addr`.
pub struct HttpPeerPool {
    self_addr: String,
    replicas: usize,
    ring: Mutex<Ring>,
    getters: Mutex<HashMap<String, Arc<HttpPeerGetter>>>,
    client: reqwest::Client,
}

impl HttpPeerPool {
    /// Constructs an empty pool identified by `self_addr`; call
    /// [`HttpPeerPool::set_peers`] to populate the ring.
    pub fn new(self_addr: impl Into<String>) -> Self {
        Self::with_replicas(self_addr, DEFAULT_REPLICAS)
    }

    /// As [`HttpPeerPool::new`], with a non-default virtual replica count.
    pub fn with_replicas(self_addr: impl Into<String>, replicas: usize) -> Self {
        Self {
            self_addr: self_addr.into(),
            replicas,
            ring: Mutex::new(Ring::new(replicas)),
            getters: Mutex::new(HashMap::new()),
            client: reqwest::Client::new(),
        }
    }

    /// Replaces the full peer set, including `self_addr`'s own position on
    /// the ring. Existing in-flight requests to peers removed by this call
    /// are unaffected; only subsequent `pick_peer` calls see the new set.
    pub fn set_peers(&self, addrs: impl IntoIterator<Item = String>) {
        let addrs: Vec<String> = addrs.into_iter().collect();

        let mut ring = Ring::new(self.replicas);
        ring.add(addrs.iter());
        *self.ring.lock() = ring;

        let mut getters = self.getters.lock();
        getters.clear();
        for addr in &addrs {
            if addr != &self.self_addr {
                getters.insert(addr.clone(), Arc::new(HttpPeerGetter::new(self.client.clone(), addr.clone())));
            }
        }
    }
}

impl PeerPicker for HttpPeerPool {
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>> {
        let owner = self.ring.lock().get(key)?.to_string();
        if owner == self.self_addr {
            return None;
        }
        self.getters.lock().get(&owner).map(|g| g.clone() as Arc<dyn PeerGetter>)
    }
}

impl std::fmt::Debug for HttpPeerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPeerPool")
            .field("self_addr", &self.self_addr)
            .field("peers", &self.getters.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_address_never_resolves_to_a_getter() {
        let pool = HttpPeerPool::new("http://self:8080/_groupcache/");
        pool.set_peers([
            "http://self:8080/_groupcache/".to_string(),
            "http://peer-b:8080/_groupcache/".to_string(),
        ]);
        // every key resolves to either self (None) or peer-b (Some); never panics either way.
        for i in 0..50 {
            let _ = pool.pick_peer(&format!("k{i}"));
        }
    }

    #[test]
    fn single_self_peer_pool_always_resolves_locally() {
        let pool = HttpPeerPool::new("http://self:8080/_groupcache/");
        pool.set_peers(["http://self:8080/_groupcache/".to_string()]);
        for i in 0..20 {
            assert!(pool.pick_peer(&format!("k{i}")).is_none());
        }
    }
}
