// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Demuxer boundary.
//!
//! The reader pulls packets through [`PacketSource`]. [`Capture`] is the
//! source this crate ships: a serializable snapshot of what a demuxer exposes
//! (streams with their side data, then packets tagged by stream index),
//! loaded from JSON or YAML or built directly from a [`MuxTrackTable`].

use std::path::Path;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::codec::MediaKind;
use crate::error::{Result, TrackMetaError};
use crate::mux::MuxTrackTable;
use crate::side_data::StreamSideData;
use crate::types::MetadataPacket;

/// A packet as delivered by a demuxer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePacket {
    pub stream_index: usize,
    pub packet: MetadataPacket,
}

/// Stream description and packet delivery, in file order.
pub trait PacketSource {
    fn streams(&self) -> &[CaptureStream];

    /// Returns the next packet, or `None` at end of input.
    ///
    /// # Errors
    ///
    /// Implementations report read failures; the reader passes them through.
    fn next_packet(&mut self) -> Result<Option<SourcePacket>>;
}

/// One demuxed stream and its side data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureStream {
    pub kind: MediaKind,
    /// Container track id. Readers fall back to `stream index + 1`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_id: Option<u32>,
    #[serde(default, with = "crate::base64_bytes::option", skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<Bytes>,
    #[serde(default, with = "crate::base64_bytes::option", skip_serializing_if = "Option::is_none")]
    pub references: Option<Bytes>,
}

impl CaptureStream {
    pub const fn new(kind: MediaKind) -> Self {
        Self { kind, track_id: None, descriptor: None, references: None }
    }

    #[must_use]
    pub fn with_track_id(mut self, track_id: u32) -> Self {
        self.track_id = Some(track_id);
        self
    }

    #[must_use]
    pub fn with_side_data(mut self, side_data: StreamSideData) -> Self {
        self.descriptor = side_data.descriptor;
        self.references = side_data.references;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturePacket {
    pub stream_index: usize,
    pub pts: i64,
    /// Defaults to `pts`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dts: Option<i64>,
    #[serde(with = "crate::base64_bytes")]
    pub data: Bytes,
}

/// Recorded demuxer output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capture {
    pub streams: Vec<CaptureStream>,
    #[serde(default)]
    pub packets: Vec<CapturePacket>,
    #[serde(skip)]
    cursor: usize,
}

impl Capture {
    /// Builds and validates a capture.
    ///
    /// # Errors
    ///
    /// Returns `TrackMetaError::InvalidCapture` if a packet names a stream
    /// that does not exist.
    pub fn new(streams: Vec<CaptureStream>, packets: Vec<CapturePacket>) -> Result<Self> {
        let capture = Self { streams, packets, cursor: 0 };
        capture.validate()?;
        Ok(capture)
    }

    /// # Errors
    ///
    /// Returns `TrackMetaError::InvalidCapture` for malformed JSON, bad
    /// base64 or a dangling stream index.
    pub fn from_json(text: &str) -> Result<Self> {
        let capture: Self = serde_json::from_str(text)
            .map_err(|e| TrackMetaError::InvalidCapture(format!("JSON: {e}")))?;
        capture.validate()?;
        Ok(capture)
    }

    /// # Errors
    ///
    /// Returns `TrackMetaError::InvalidCapture` for malformed YAML, bad
    /// base64 or a dangling stream index.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let capture: Self = serde_saphyr::from_str(text)
            .map_err(|e| TrackMetaError::InvalidCapture(format!("YAML: {e}")))?;
        capture.validate()?;
        Ok(capture)
    }

    /// Loads a capture file, choosing the format from the extension
    /// (`.yaml`/`.yml` for YAML, JSON otherwise).
    ///
    /// # Errors
    ///
    /// Returns `TrackMetaError::Io` if the file cannot be read, or the
    /// parse errors of [`from_json`](Self::from_json) and
    /// [`from_yaml`](Self::from_yaml).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
        tracing::debug!(path = %path.display(), yaml = is_yaml, "Loading capture");
        if is_yaml {
            Self::from_yaml(&text)
        } else {
            Self::from_json(&text)
        }
    }

    /// Snapshots what a demuxer would expose for a file written from `table`:
    /// one stream per track with its encoded side data, then `packets`.
    ///
    /// # Errors
    ///
    /// Propagates side-data encoding failures, and returns
    /// `TrackMetaError::InvalidCapture` for a packet naming an unknown track.
    pub fn from_mux(
        table: &MuxTrackTable,
        packets: impl IntoIterator<Item = SourcePacket>,
    ) -> Result<Self> {
        let mut streams = Vec::new();
        streams.try_reserve_exact(table.len())?;
        for (index, track) in table.tracks().iter().enumerate() {
            streams.push(
                CaptureStream::new(track.kind)
                    .with_track_id(track.track_id)
                    .with_side_data(table.side_data(index)?),
            );
        }

        let packets = packets
            .into_iter()
            .map(|source| -> Result<CapturePacket> {
                Ok(CapturePacket {
                    stream_index: source.stream_index,
                    pts: source.packet.pts,
                    dts: Some(source.packet.dts),
                    data: source.packet.data.share()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(streams, packets)
    }

    /// Restarts packet delivery from the first packet.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    fn validate(&self) -> Result<()> {
        if let Some((position, packet)) =
            self.packets.iter().enumerate().find(|(_, p)| p.stream_index >= self.streams.len())
        {
            return Err(TrackMetaError::InvalidCapture(format!(
                "packet {position} names stream {} but the capture has {} streams",
                packet.stream_index,
                self.streams.len()
            )));
        }
        Ok(())
    }
}

impl PacketSource for Capture {
    fn streams(&self) -> &[CaptureStream] {
        &self.streams
    }

    fn next_packet(&mut self) -> Result<Option<SourcePacket>> {
        let Some(packet) = self.packets.get(self.cursor) else {
            return Ok(None);
        };
        self.cursor += 1;
        Ok(Some(SourcePacket {
            stream_index: packet.stream_index,
            packet: MetadataPacket::new(
                packet.pts,
                packet.dts.unwrap_or(packet.pts),
                packet.data.clone(),
            ),
        }))
    }
}
