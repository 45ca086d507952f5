// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Track reference side data.
//!
//! The demuxer exposes a track's references as a side-data blob next to the
//! metadata descriptor. The layout (big-endian) is:
//!
//! ```text
//! u32 group_count
//! group_count x { tag: 4 bytes, count: u32, track_ids: count x u32 }
//! ```

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::descriptor::MetadataDescriptor;
use crate::error::Result;
use crate::track_ref::TrackReferenceRegistry;
use crate::wire::{len_prefix, put_fourcc, put_u32, ByteReader};

/// Serializes every reference group of `registry`, in registry order.
///
/// # Errors
///
/// Returns `TrackMetaError::AllocationFailure` if the output buffer cannot be
/// allocated.
pub fn encode_references(registry: &TrackReferenceRegistry) -> Result<Vec<u8>> {
    let size = 4 + registry.iter().map(|r| 8 + 4 * r.len()).sum::<usize>();
    let mut out = Vec::new();
    out.try_reserve_exact(size)?;

    put_u32(&mut out, len_prefix(registry.len(), "track reference group count")?);
    for reference in registry {
        put_fourcc(&mut out, reference.tag());
        put_u32(&mut out, len_prefix(reference.len(), "track id list")?);
        for &id in reference.track_ids() {
            put_u32(&mut out, id);
        }
    }
    Ok(out)
}

/// Parses track reference side data into a fresh registry.
///
/// Groups are merged with the registry's usual rules: a repeated tag extends
/// the existing group and repeated ids collapse.
///
/// # Errors
///
/// Returns `TrackMetaError::TruncatedInput` if a declared count runs past the
/// end of `buf`, or `TrackMetaError::AllocationFailure` if the registry cannot
/// grow. No partial registry is returned.
pub fn decode_references(buf: &[u8]) -> Result<TrackReferenceRegistry> {
    let mut reader = ByteReader::new(buf);
    let group_count = reader.read_len()?;

    let mut registry = TrackReferenceRegistry::new();
    let mut ids = Vec::new();
    for _ in 0..group_count {
        let tag = reader.read_fourcc()?;
        let count = reader.read_len()?;
        // Validate the whole id block before reserving anything for it.
        let raw = reader.take(count.saturating_mul(4))?;

        ids.clear();
        ids.try_reserve(count)?;
        ids.extend(raw.chunks_exact(4).map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]])));
        registry.map_source_tracks(&ids, tag)?;
    }

    if reader.remaining() > 0 {
        tracing::trace!(padding = reader.remaining(), "Ignoring trailing bytes after track references");
    }
    Ok(registry)
}

/// The two side-data blobs a metadata track carries across the container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSideData {
    #[serde(default, with = "crate::base64_bytes::option", skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<Bytes>,
    #[serde(default, with = "crate::base64_bytes::option", skip_serializing_if = "Option::is_none")]
    pub references: Option<Bytes>,
}

impl StreamSideData {
    /// Encodes a track's descriptor and references. An empty registry yields
    /// no references blob.
    ///
    /// # Errors
    ///
    /// Propagates encoding failures from either blob.
    pub fn encode(
        descriptor: Option<&MetadataDescriptor>,
        references: &TrackReferenceRegistry,
    ) -> Result<Self> {
        let descriptor = descriptor.map(MetadataDescriptor::encode).transpose()?.map(Bytes::from);
        let references = if references.is_empty() {
            None
        } else {
            Some(Bytes::from(encode_references(references)?))
        };
        Ok(Self { descriptor, references })
    }
}
