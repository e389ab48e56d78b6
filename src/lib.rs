#![doc = include_str!("../README.md")]

pub mod byte_view;
pub mod cache;
pub mod error;
pub mod group;
pub mod lru;
pub mod peer;
pub mod registry;
pub mod ring;
pub mod singleflight;
pub mod transport;

pub use byte_view::ByteView;
pub use error::CacheError;
pub use group::Group;
pub use peer::{PeerGetter, PeerPicker};
pub use ring::Ring;
