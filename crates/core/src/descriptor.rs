// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Timed-metadata descriptor side data.
//!
//! A [`MetadataDescriptor`] tells a consumer how to interpret an opaque
//! metadata stream: a scheme tag and URI naming the metadata format, plus a
//! configuration blob tagged with its own code. It travels out of band as
//! stream side data with this big-endian layout:
//!
//! ```text
//! 0..4        scheme_tag
//! 4..8        uri_length (u32)
//! 8..8+U      uri
//! +4          config_tag
//! +4          config_length (u32)
//! +C          config
//! ```
//!
//! Both regions carry explicit lengths, so URIs and configurations may contain
//! any byte including zero. Decoding never looks past the declared regions;
//! transports are free to pad the side-data buffer.

use std::borrow::Cow;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::fourcc::FourCC;
use crate::types::copy_to_bytes;
use crate::wire::{len_prefix, put_fourcc, put_u32, ByteReader};

/// Size of the fixed part of an encoded descriptor: two tags and two lengths.
pub const DESCRIPTOR_HEADER_SIZE: usize = 16;

/// Describes one metadata elementary stream. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataDescriptor {
    scheme_tag: FourCC,
    #[serde(with = "crate::base64_bytes")]
    uri: Bytes,
    config_tag: FourCC,
    #[serde(with = "crate::base64_bytes")]
    config: Bytes,
}

impl MetadataDescriptor {
    pub fn new(
        scheme_tag: FourCC,
        uri: impl Into<Bytes>,
        config_tag: FourCC,
        config: impl Into<Bytes>,
    ) -> Self {
        Self { scheme_tag, uri: uri.into(), config_tag, config: config.into() }
    }

    pub const fn scheme_tag(&self) -> FourCC {
        self.scheme_tag
    }

    pub fn uri(&self) -> &[u8] {
        &self.uri
    }

    /// The URI as text, with invalid UTF-8 replaced.
    pub fn uri_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.uri)
    }

    pub const fn config_tag(&self) -> FourCC {
        self.config_tag
    }

    pub fn config(&self) -> &[u8] {
        &self.config
    }

    pub(crate) fn uri_bytes(&self) -> Bytes {
        self.uri.clone()
    }

    pub(crate) fn config_bytes(&self) -> Bytes {
        self.config.clone()
    }

    /// Number of bytes [`encode`](Self::encode) produces.
    pub fn encoded_len(&self) -> usize {
        DESCRIPTOR_HEADER_SIZE + self.uri.len() + self.config.len()
    }

    /// Serializes the descriptor into one contiguous buffer.
    ///
    /// # Errors
    ///
    /// Returns `TrackMetaError::AllocationFailure` if the buffer cannot be
    /// allocated, or `TrackMetaError::Configuration` if a region does not fit
    /// a 32-bit length.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.encode_into(&mut out)?;
        Ok(out)
    }

    /// Appends the encoded descriptor to `out`. On error `out` is unchanged.
    ///
    /// # Errors
    ///
    /// See [`encode`](Self::encode).
    pub fn encode_into(&self, out: &mut Vec<u8>) -> Result<()> {
        let uri_len = len_prefix(self.uri.len(), "URI")?;
        let config_len = len_prefix(self.config.len(), "configuration")?;
        out.try_reserve_exact(self.encoded_len())?;

        put_fourcc(out, self.scheme_tag);
        put_u32(out, uri_len);
        out.extend_from_slice(&self.uri);
        put_fourcc(out, self.config_tag);
        put_u32(out, config_len);
        out.extend_from_slice(&self.config);
        Ok(())
    }

    /// Parses a descriptor, copying the URI and configuration out of `buf`.
    ///
    /// # Errors
    ///
    /// Returns `TrackMetaError::TruncatedInput` if `buf` is shorter than the
    /// lengths it declares, or `TrackMetaError::AllocationFailure` if the
    /// copies cannot be allocated. No partial descriptor is produced.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let layout = Layout::parse(buf)?;
        Ok(Self {
            scheme_tag: layout.scheme_tag,
            uri: copy_to_bytes(&buf[layout.uri])?,
            config_tag: layout.config_tag,
            config: copy_to_bytes(&buf[layout.config])?,
        })
    }

    /// Parses a descriptor out of shared storage without copying; the URI and
    /// configuration keep a reference to `buf`.
    ///
    /// # Errors
    ///
    /// Returns `TrackMetaError::TruncatedInput` if `buf` is shorter than the
    /// lengths it declares.
    pub fn decode_shared(buf: &Bytes) -> Result<Self> {
        let layout = Layout::parse(buf)?;
        Ok(Self {
            scheme_tag: layout.scheme_tag,
            uri: buf.slice(layout.uri),
            config_tag: layout.config_tag,
            config: buf.slice(layout.config),
        })
    }
}

/// Field positions of a validated descriptor buffer.
struct Layout {
    scheme_tag: FourCC,
    uri: std::ops::Range<usize>,
    config_tag: FourCC,
    config: std::ops::Range<usize>,
}

impl Layout {
    fn parse(buf: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(buf);
        let scheme_tag = reader.read_fourcc()?;
        let uri_len = reader.read_len()?;
        let uri = reader.take_range(uri_len)?;
        let config_tag = reader.read_fourcc()?;
        let config_len = reader.read_len()?;
        let config = reader.take_range(config_len)?;

        if reader.remaining() > 0 {
            tracing::trace!(
                consumed = reader.position(),
                padding = reader.remaining(),
                "Ignoring trailing bytes after metadata descriptor"
            );
        }
        Ok(Self { scheme_tag, uri, config_tag, config })
    }
}
