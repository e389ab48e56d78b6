//! Generated protobuf message types for the peer wire protocol.
//!
//! `Request { group, key }` / `Response { value }`, compiled from
//! `proto/groupcache.proto` by `build.rs`. The reference Go source's
//! `gocachepb` package carries the same two messages.

#![allow(clippy::derive_partial_eq_without_eq)]

include!(concat!(env!("OUT_DIR"), "/groupcache.rs"));
