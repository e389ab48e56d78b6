//! The two narrow capabilities [`crate::group::Group`] needs from whatever
//! transport wires peers together. Neither trait mentions HTTP, sockets, or
//! any other transport detail — [`crate::transport::http`] is one
//! implementation of both, chosen for this crate's reference adapter, but a
//! `Group` built against these traits doesn't know that.

use crate::error::CacheError;
use bytes::Bytes;
use std::sync::Arc;

/// Resolves a key to the peer that owns it.
///
/// A pure function of `key` and the picker's current peer set: the same key
/// against the same peer set must always resolve to the same peer (or lack
/// thereof), regardless of how many times it's called or by whom.
pub trait PeerPicker: Send + Sync {
    /// Returns the peer that owns `key`, or `None` if the owner is this
    /// process itself or the picker has no peers registered.
    ///
    /// Implementations must return `None` rather than a self-referencing
    /// [`PeerGetter`] when the ring resolves `key` to this process's own
    /// peer name — [`crate::group::Group::load`] relies on `None` meaning
    /// "handle locally" to avoid forwarding a request to itself forever.
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>>;
}

/// Fetches a single key's value from one specific remote peer.
#[async_trait::async_trait]
pub trait PeerGetter: Send + Sync {
    /// Fetches `(group, key)` from this peer.
    ///
    /// Any transport or decoding failure is reported as
    /// [`CacheError::PeerError`]; a successful return is the peer's
    /// authoritative bytes for that key.
    async fn get(&self, group: &str, key: &str) -> Result<Bytes, CacheError>;
}
