//! An immutable view over cached bytes.
//!
//! # Why not just `Bytes`
//!
//! [`bytes::Bytes`] is already a cheap-to-clone immutable buffer, so
//! `ByteView` is a thin wrapper rather than a reimplementation: it exists so
//! the rest of the crate has one named type that carries the "this came out
//! of the cache and nobody may see the original write-side buffer" meaning,
//! and so that [`ByteView::byte_slice`] always hands out a defensive copy
//! instead of a shared reference that callers could be tempted to mutate in
//! place (a `Bytes` clone is shared storage; a `Vec<u8>` copy is not).
//!
//! A `ByteView` is created once, at populate time, from either a
//! loader-returned buffer (copied in) or a peer response body (ownership
//! taken directly, since the response was already decoded into an owned
//! buffer). It is shared by every concurrent reader that hits the cache and
//! dropped when its entry is evicted.

use bytes::Bytes;
use std::fmt;

/// An immutable, cheaply-cloned view over cached bytes.
///
/// Cloning a `ByteView` is an `Arc`-style refcount bump (via [`bytes::Bytes`]),
/// not a copy; the copy only happens when a caller asks for a mutable slice
/// via [`ByteView::byte_slice`].
#[derive(Clone, Eq, PartialEq)]
pub struct ByteView {
    bytes: Bytes,
}

impl ByteView {
    /// Wraps an already-owned buffer with no further copying.
    ///
    /// Used when the bytes are freshly allocated and uniquely owned by the
    /// caller (e.g. a peer response body that was just read off the wire).
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Copies `bytes` into a new `ByteView`.
    ///
    /// Used at populate time for loader-returned buffers, whose lifetime and
    /// aliasing the crate cannot vouch for.
    pub fn copy_from(bytes: &[u8]) -> Self {
        Self {
            bytes: Bytes::copy_from_slice(bytes),
        }
    }

    /// Returns the number of bytes in this view.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if this view holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns a defensive copy of the underlying bytes.
    ///
    /// Mutating the returned `Vec` never affects this `ByteView` or any other
    /// clone of it, nor any subsequent `get` of the same cache entry.
    pub fn byte_slice(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    /// Borrows the underlying bytes without copying.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the view's backing [`bytes::Bytes`] handle directly.
    ///
    /// Cheap (refcount bump); prefer this over [`ByteView::byte_slice`] when
    /// the caller only needs to read, not mutate.
    pub fn as_bytes_handle(&self) -> Bytes {
        self.bytes.clone()
    }

    /// Returns a UTF-8 string projection, replacing invalid sequences.
    ///
    /// Mirrors the reference source's `String()` method, which performs the
    /// analogous lossy conversion implicitly.
    pub fn as_str_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

impl crate::lru::CacheValue for ByteView {
    fn cache_len(&self) -> usize {
        self.len()
    }
}

impl fmt::Debug for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteView").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn len_and_is_empty() {
        let v = ByteView::copy_from(b"hello");
        assert_eq!(v.len(), 5);
        assert!(!v.is_empty());
        assert!(ByteView::copy_from(b"").is_empty());
    }

    #[test]
    fn byte_slice_is_a_defensive_copy() {
        let v = ByteView::copy_from(b"hello");
        let mut slice = v.byte_slice();
        slice[0] = b'H';
        assert_eq!(v.as_str_lossy(), "hello");
        assert_eq!(slice, b"Hello");
    }

    #[test]
    fn string_projection() {
        let v = ByteView::copy_from(b"abc");
        assert_eq!(v.as_str_lossy(), "abc");
    }

    #[test]
    fn clone_shares_storage_cheaply() {
        let v = ByteView::copy_from(b"shared");
        let v2 = v.clone();
        assert_eq!(v, v2);
        assert_eq!(v.as_bytes().as_ptr(), v2.as_bytes().as_ptr());
    }
}
