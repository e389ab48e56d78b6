//! Wire formats and network adapters. Nothing in [`crate::group`] or
//! [`crate::peer`] depends on this module; it exists to satisfy those traits
//! over an actual network, the way the reference Go source's `http.go` and
//! `gocachepb` package satisfy the same traits over `net/http` and protobuf.

pub mod http;
pub mod proto;
