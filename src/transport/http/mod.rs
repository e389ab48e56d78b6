//! A reference peer transport over HTTP + protobuf, mirroring the reference
//! Go source's `HTTPPool` (`http.go`): [`server`] answers incoming peer
//! requests, [`client`] issues outgoing ones, and [`pool`] combines a
//! [`crate::ring::Ring`] with a set of clients to implement
//! [`crate::peer::PeerPicker`] across a fixed peer list.

pub mod client;
pub mod pool;
pub mod server;

/// The default request path prefix, analogous to the reference source's
/// `defaultBasePath` (`"/_gocache/"`).
pub const DEFAULT_BASE_PATH: &str = "/_groupcache/";

pub use client::HttpPeerGetter;
pub use pool::HttpPeerPool;
pub use server::router;
