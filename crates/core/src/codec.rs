// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Passthrough codec for timed metadata.
//!
//! The metadata codec never looks at payload bytes. Encoding and decoding only
//! move timestamps and storage between [`MetadataFrame`] and
//! [`MetadataPacket`]: shared storage gets a new reference, plain storage is
//! copied into fresh shared storage.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{MetaBuffer, MetadataFrame, MetadataPacket};

/// Broad kind of media a codec handles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
    Subtitle,
    #[default]
    Data,
}

/// Registration record describing a codec to the surrounding pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CodecDescriptor {
    pub name: &'static str,
    pub long_name: &'static str,
    pub kind: MediaKind,
}

/// Frame <-> packet conversion for one metadata stream.
///
/// Implementations are stateless per call: nothing carries over between
/// frames, so one instance can serve any number of streams.
pub trait MetadataCodec {
    fn descriptor(&self) -> &CodecDescriptor;

    /// Turns an application frame into a container packet.
    ///
    /// # Errors
    ///
    /// Returns `TrackMetaError::AllocationFailure` if packet storage cannot
    /// be obtained. The frame is untouched either way.
    fn encode(&self, frame: &MetadataFrame) -> Result<MetadataPacket>;

    /// Turns a demuxed packet back into a frame. One packet, one frame.
    ///
    /// # Errors
    ///
    /// Returns `TrackMetaError::AllocationFailure` if frame storage cannot be
    /// obtained.
    fn decode(&self, packet: &MetadataPacket) -> Result<MetadataFrame>;
}

/// The timed-metadata codec (`meta`).
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataFrameCodec;

impl MetadataFrameCodec {
    pub const DESCRIPTOR: CodecDescriptor =
        CodecDescriptor { name: "meta", long_name: "Timed Metadata", kind: MediaKind::Data };

    pub const fn new() -> Self {
        Self
    }
}

impl MetadataCodec for MetadataFrameCodec {
    fn descriptor(&self) -> &CodecDescriptor {
        &Self::DESCRIPTOR
    }

    fn encode(&self, frame: &MetadataFrame) -> Result<MetadataPacket> {
        let data = MetaBuffer::Shared(frame.payload.share()?);
        tracing::trace!(pts = frame.pts, len = data.len(), "Encoded metadata frame");
        // Frames carry a single timestamp; decode time mirrors presentation time.
        Ok(MetadataPacket { pts: frame.pts, dts: frame.pts, data })
    }

    fn decode(&self, packet: &MetadataPacket) -> Result<MetadataFrame> {
        let payload = MetaBuffer::Shared(packet.data.share()?);
        tracing::trace!(pts = packet.pts, dts = packet.dts, len = payload.len(), "Decoded metadata packet");
        Ok(MetadataFrame { pts: packet.pts, dts: packet.dts, payload })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use bytes::Bytes;

    use super::*;

    #[test]
    fn test_hello_scenario() {
        let codec = MetadataFrameCodec::new();
        let frame = MetadataFrame::new(1000, b"hello".to_vec());

        let packet = codec.encode(&frame).unwrap();
        assert_eq!(packet.pts, 1000);
        assert_eq!(packet.dts, 1000);
        assert_eq!(packet.data.as_slice(), b"hello");

        let decoded = codec.decode(&packet).unwrap();
        assert_eq!(decoded.pts, frame.pts);
        assert_eq!(decoded.payload.as_slice(), frame.payload.as_slice());
    }

    #[test]
    fn test_empty_payload_round_trip() {
        let codec = MetadataFrameCodec::new();
        for frame in [MetadataFrame::new(0, Vec::new()), MetadataFrame::new(-7, Bytes::new())] {
            let decoded = codec.decode(&codec.encode(&frame).unwrap()).unwrap();
            assert_eq!(decoded.pts, frame.pts);
            assert!(decoded.payload.is_empty());
        }
    }

    #[test]
    fn test_encode_synthesizes_dts_from_pts() {
        let codec = MetadataFrameCodec::new();
        let frame = MetadataFrame { pts: 90, dts: 10, payload: MetaBuffer::from("x") };
        let packet = codec.encode(&frame).unwrap();
        assert_eq!((packet.pts, packet.dts), (90, 90));
    }

    #[test]
    fn test_decode_keeps_transport_dts() {
        let codec = MetadataFrameCodec::new();
        let packet = MetadataPacket::new(200, 100, Bytes::from_static(b"out of order"));
        let frame = codec.decode(&packet).unwrap();
        assert_eq!((frame.pts, frame.dts), (200, 100));
    }

    #[test]
    fn test_shared_storage_is_referenced_not_copied() {
        let codec = MetadataFrameCodec::new();
        let storage = Bytes::from(vec![1u8, 2, 3, 4]);
        let frame = MetadataFrame::new(5, storage.clone());

        let packet = codec.encode(&frame).unwrap();
        assert_eq!(packet.data.as_slice().as_ptr(), storage.as_ptr());

        let decoded = codec.decode(&packet).unwrap();
        assert_eq!(decoded.payload.as_slice().as_ptr(), storage.as_ptr());
    }

    #[test]
    fn test_owned_storage_is_copied() {
        let codec = MetadataFrameCodec::new();
        let frame = MetadataFrame::new(5, vec![9u8; 16]);
        let packet = codec.encode(&frame).unwrap();
        assert!(packet.data.is_shared());
        assert_ne!(packet.data.as_slice().as_ptr(), frame.payload.as_slice().as_ptr());
        assert_eq!(packet.data.as_slice(), frame.payload.as_slice());
    }

    #[test]
    fn test_descriptor() {
        let codec = MetadataFrameCodec::new();
        assert_eq!(codec.descriptor().name, "meta");
        assert_eq!(codec.descriptor().kind, MediaKind::Data);
    }
}
