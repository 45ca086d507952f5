// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Consumer side: turns demuxed metadata streams into report records.
//!
//! [`MetadataStreamReader::open`] selects the metadata streams of a
//! [`PacketSource`] and decodes their side data once. Afterwards every packet
//! of a selected stream is decoded into exactly one [`FrameRecord`] that
//! carries the frame together with its track's descriptor and referenced
//! tracks. A missing or undecodable descriptor or reference blob is not an
//! error: the affected fields are `None` and the problem is noted in the
//! track's [`TrackSummary::issues`].

use bytes::Bytes;
use serde::Serialize;

use crate::capture::{CaptureStream, PacketSource};
use crate::codec::{MediaKind, MetadataCodec, MetadataFrameCodec};
use crate::config::ReaderConfig;
use crate::descriptor::MetadataDescriptor;
use crate::error::{Result, TrackMetaError};
use crate::fourcc::FourCC;
use crate::side_data::decode_references;
use crate::track_ref::TrackReferenceRegistry;
use crate::types::MetaBuffer;

/// What the reader knows about one selected metadata stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackSummary {
    pub stream_index: usize,
    pub track_id: u32,
    /// Serialized as the list of reference groups.
    pub references: Option<TrackReferenceRegistry>,
    pub descriptor: Option<MetadataDescriptor>,
    /// Side-data problems that made a part absent.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

impl TrackSummary {
    /// Ordered union of the referenced ids accepted by `tag_filter`, or
    /// `None` when the track references nothing.
    pub fn referenced_track_ids(&self, tag_filter: Option<FourCC>) -> Option<Vec<u32>> {
        let ids = self.references.as_ref()?.referenced_track_ids(tag_filter);
        (!ids.is_empty()).then_some(ids)
    }
}

/// One decoded frame with the metadata needed to interpret it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameRecord {
    pub track_id: u32,
    pub stream_index: usize,
    pub referenced_track_ids: Option<Vec<u32>>,
    pub scheme_tag: Option<FourCC>,
    #[serde(with = "crate::base64_bytes::option")]
    pub uri: Option<Bytes>,
    pub config_tag: Option<FourCC>,
    #[serde(with = "crate::base64_bytes::option")]
    pub config: Option<Bytes>,
    pub pts: i64,
    pub dts: i64,
    pub payload: MetaBuffer,
}

/// Reads the timed-metadata streams of a packet source.
pub struct MetadataStreamReader<S, C = MetadataFrameCodec> {
    source: S,
    config: ReaderConfig,
    codec: C,
    summaries: Vec<TrackSummary>,
    /// Filtered referenced ids, one entry per summary.
    referenced: Vec<Option<Vec<u32>>>,
    /// Per source stream, the position of its summary if selected.
    selected: Vec<Option<usize>>,
}

impl<S: PacketSource> MetadataStreamReader<S> {
    /// Selects the metadata streams of `source` and decodes their side data.
    ///
    /// # Errors
    ///
    /// Returns `TrackMetaError::Configuration` for an invalid `config`, or
    /// `TrackMetaError::AllocationFailure`. Bad side data never fails here.
    pub fn open(source: S, config: ReaderConfig) -> Result<Self> {
        Self::with_codec(source, config, MetadataFrameCodec::new())
    }
}

impl<S: PacketSource, C: MetadataCodec> MetadataStreamReader<S, C> {
    /// Like [`open`](MetadataStreamReader::open), decoding packets with
    /// `codec`.
    ///
    /// # Errors
    ///
    /// Same as [`open`](MetadataStreamReader::open).
    pub fn with_codec(source: S, config: ReaderConfig, codec: C) -> Result<Self> {
        config.validate()?;

        let streams = source.streams();
        let mut summaries = Vec::new();
        let mut referenced = Vec::new();
        let mut selected = Vec::new();
        selected.try_reserve_exact(streams.len())?;

        for (stream_index, stream) in streams.iter().enumerate() {
            if config.data_streams_only && stream.kind != MediaKind::Data {
                selected.push(None);
                continue;
            }
            let summary = summarize(stream_index, stream, &config)?;
            summaries.try_reserve(1)?;
            referenced.try_reserve(1)?;
            referenced.push(summary.referenced_track_ids(config.reference_tag));
            summaries.push(summary);
            selected.push(Some(summaries.len() - 1));
        }

        if summaries.is_empty() {
            tracing::warn!(streams = streams.len(), "No timed metadata streams found");
        } else {
            tracing::debug!(
                selected = summaries.len(),
                streams = streams.len(),
                codec = codec.descriptor().name,
                "Opened metadata reader"
            );
        }

        Ok(Self { source, config, codec, summaries, referenced, selected })
    }

    /// One summary per selected stream, in stream order.
    pub fn summaries(&self) -> &[TrackSummary] {
        &self.summaries
    }

    pub const fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Decodes the next packet that belongs to a selected stream.
    ///
    /// # Errors
    ///
    /// Passes through source errors and codec allocation failures.
    pub fn next_record(&mut self) -> Result<Option<FrameRecord>> {
        loop {
            let Some(source_packet) = self.source.next_packet()? else {
                return Ok(None);
            };
            let Some(position) = self.selected.get(source_packet.stream_index).copied().flatten()
            else {
                tracing::trace!(stream_index = source_packet.stream_index, "Skipping packet");
                continue;
            };

            let frame = self.codec.decode(&source_packet.packet)?;
            let summary = &self.summaries[position];
            let descriptor = summary.descriptor.as_ref();
            return Ok(Some(FrameRecord {
                track_id: summary.track_id,
                stream_index: summary.stream_index,
                referenced_track_ids: self.referenced[position].clone(),
                scheme_tag: descriptor.map(MetadataDescriptor::scheme_tag),
                uri: descriptor.map(MetadataDescriptor::uri_bytes),
                config_tag: descriptor.map(MetadataDescriptor::config_tag),
                config: descriptor.map(MetadataDescriptor::config_bytes),
                pts: frame.pts,
                dts: frame.dts,
                payload: frame.payload,
            }));
        }
    }

    /// Iterator over the remaining records. Stops after the first error.
    pub fn records(&mut self) -> Records<'_, S, C> {
        Records { reader: self, done: false }
    }

    pub fn into_source(self) -> S {
        self.source
    }
}

/// Iterator returned by [`MetadataStreamReader::records`].
pub struct Records<'a, S, C = MetadataFrameCodec> {
    reader: &'a mut MetadataStreamReader<S, C>,
    done: bool,
}

impl<S: PacketSource, C: MetadataCodec> Iterator for Records<'_, S, C> {
    type Item = Result<FrameRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            },
            Err(e) => {
                self.done = true;
                Some(Err(e))
            },
        }
    }
}

fn summarize(stream_index: usize, stream: &CaptureStream, config: &ReaderConfig) -> Result<TrackSummary> {
    let track_id = match stream.track_id {
        Some(id) => id,
        None => u32::try_from(stream_index + 1).map_err(|_| {
            TrackMetaError::InvalidCapture(format!("stream index {stream_index} has no track id"))
        })?,
    };
    let mut issues = Vec::new();

    let descriptor = match &stream.descriptor {
        None => None,
        Some(blob) if blob.len() > config.max_descriptor_size => {
            tracing::warn!(
                track_id,
                len = blob.len(),
                max = config.max_descriptor_size,
                "Metadata descriptor exceeds size limit, ignoring"
            );
            issues.push(format!(
                "descriptor of {} bytes exceeds limit of {} bytes",
                blob.len(),
                config.max_descriptor_size
            ));
            None
        },
        Some(blob) => match MetadataDescriptor::decode_shared(blob) {
            Ok(descriptor) => Some(descriptor),
            Err(e @ TrackMetaError::AllocationFailure(_)) => return Err(e),
            Err(e) => {
                tracing::warn!(track_id, error = %e, "Undecodable metadata descriptor, ignoring");
                issues.push(format!("descriptor: {e}"));
                None
            },
        },
    };

    let references = match &stream.references {
        None => None,
        Some(blob) if blob.len() > config.max_references_size => {
            tracing::warn!(
                track_id,
                len = blob.len(),
                max = config.max_references_size,
                "Track references exceed size limit, ignoring"
            );
            issues.push(format!(
                "references of {} bytes exceed limit of {} bytes",
                blob.len(),
                config.max_references_size
            ));
            None
        },
        Some(blob) => match decode_references(blob) {
            Ok(registry) => Some(registry),
            Err(e @ TrackMetaError::AllocationFailure(_)) => return Err(e),
            Err(e) => {
                tracing::warn!(track_id, error = %e, "Undecodable track references, ignoring");
                issues.push(format!("references: {e}"));
                None
            },
        },
    };

    Ok(TrackSummary { stream_index, track_id, references, descriptor, issues })
}
