// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Core data types that cross the mux/demux boundary.
//!
//! - [`MetaBuffer`]: the one owned byte buffer type, either shared
//!   (`bytes::Bytes`, refcounted) or plain (`Vec<u8>`)
//! - [`MetadataFrame`]: an application-side timed-metadata event
//! - [`MetadataPacket`]: the container-side form of the same event
//!
//! Payload bytes are opaque everywhere in this crate. Shared storage is never
//! mutated in place; the last holder to drop a `Bytes` frees it.

use std::ops::Deref;

use bytes::Bytes;
use serde::Serialize;

use crate::error::Result;

/// Payload storage with an explicit length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaBuffer {
    /// Reference-counted storage; cloning takes another reference.
    Shared(Bytes),
    /// Plain owned storage; sharing it requires a copy.
    Owned(Vec<u8>),
}

impl MetaBuffer {
    pub fn empty() -> Self {
        Self::Shared(Bytes::new())
    }

    pub fn as_slice(&self) -> &[u8] {
        match self {
            Self::Shared(bytes) => bytes,
            Self::Owned(vec) => vec,
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    pub const fn is_shared(&self) -> bool {
        matches!(self, Self::Shared(_))
    }

    /// Returns shareable storage for these bytes: a new reference when the
    /// storage is already shared, a fallible copy otherwise.
    ///
    /// # Errors
    ///
    /// Returns `TrackMetaError::AllocationFailure` if the copy cannot be
    /// allocated.
    pub fn share(&self) -> Result<Bytes> {
        match self {
            Self::Shared(bytes) => Ok(bytes.clone()),
            Self::Owned(vec) => copy_to_bytes(vec),
        }
    }
}

/// Copies `data` into freshly allocated shared storage without aborting on
/// allocation failure.
pub(crate) fn copy_to_bytes(data: &[u8]) -> Result<Bytes> {
    let mut storage = Vec::new();
    storage.try_reserve_exact(data.len())?;
    storage.extend_from_slice(data);
    Ok(Bytes::from(storage))
}

impl Default for MetaBuffer {
    fn default() -> Self {
        Self::empty()
    }
}

impl Deref for MetaBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl AsRef<[u8]> for MetaBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl From<Bytes> for MetaBuffer {
    fn from(bytes: Bytes) -> Self {
        Self::Shared(bytes)
    }
}

impl From<Vec<u8>> for MetaBuffer {
    fn from(vec: Vec<u8>) -> Self {
        Self::Owned(vec)
    }
}

impl From<&'static [u8]> for MetaBuffer {
    fn from(slice: &'static [u8]) -> Self {
        Self::Shared(Bytes::from_static(slice))
    }
}

impl<const N: usize> From<&'static [u8; N]> for MetaBuffer {
    fn from(array: &'static [u8; N]) -> Self {
        Self::Shared(Bytes::from_static(array))
    }
}

impl From<&'static str> for MetaBuffer {
    fn from(s: &'static str) -> Self {
        Self::Shared(Bytes::from_static(s.as_bytes()))
    }
}

impl Serialize for MetaBuffer {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        crate::base64_bytes::serialize_slice(self.as_slice(), serializer)
    }
}

/// A timed-metadata event as produced or consumed by the application.
///
/// `dts` equals `pts` for frames produced by the metadata codec; it is kept
/// so that decode-order information from the transport survives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataFrame {
    pub pts: i64,
    pub dts: i64,
    pub payload: MetaBuffer,
}

impl MetadataFrame {
    /// Creates a frame whose decode time equals its presentation time.
    pub fn new(pts: i64, payload: impl Into<MetaBuffer>) -> Self {
        Self { pts, dts: pts, payload: payload.into() }
    }
}

/// The container-level encoding of a [`MetadataFrame`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataPacket {
    pub pts: i64,
    pub dts: i64,
    pub data: MetaBuffer,
}

impl MetadataPacket {
    pub fn new(pts: i64, dts: i64, data: impl Into<MetaBuffer>) -> Self {
        Self { pts, dts, data: data.into() }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_share_takes_reference_for_shared_storage() {
        let bytes = Bytes::from_static(b"payload");
        let buffer = MetaBuffer::from(bytes.clone());
        let shared = buffer.share().unwrap();
        assert_eq!(shared.as_ptr(), bytes.as_ptr());
    }

    #[test]
    fn test_share_copies_owned_storage() {
        let buffer = MetaBuffer::from(b"payload".to_vec());
        let shared = buffer.share().unwrap();
        assert_eq!(&shared[..], b"payload");
        assert_ne!(shared.as_ptr(), buffer.as_slice().as_ptr());
    }

    #[test]
    fn test_embedded_zero_bytes_keep_length() {
        let buffer = MetaBuffer::from(vec![b'a', 0, b'b', 0]);
        assert_eq!(buffer.len(), 4);
        assert_eq!(&buffer[..], &[b'a', 0, b'b', 0]);
    }

    #[test]
    fn test_frame_new_synthesizes_dts() {
        let frame = MetadataFrame::new(-40, "x");
        assert_eq!(frame.dts, -40);
        assert!(frame.payload.is_shared());
    }
}
