// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! trackmeta core - track references and timed-metadata streams for
//! ISO-base-media style containers.
//!
//! ## Core Modules
//!
//! - [`track_ref`]: per-track registry of tagged track references
//! - [`descriptor`]: the self-describing metadata descriptor blob
//! - [`codec`]: timestamp-preserving passthrough codec for metadata frames
//! - [`reader`]: combines descriptors, references and frames for consumers
//! - [`mux`]: muxer-side track table (source tracks, hint tracks, side data)
//! - [`side_data`]: wire form of a track's references
//! - [`capture`]: the demuxer boundary and a serializable packet source
//! - [`report`]: plain-text rendering of reader output
//! - [`fourcc`]: 4-byte tags
//! - [`config`], [`error`]: reader settings and error types
//!
//! ## Quick Start
//!
//! ```
//! use trackmeta_core::{
//!     Capture, FourCC, MediaKind, MetadataDescriptor, MetadataFrame, MetadataFrameCodec,
//!     MetadataCodec, MetadataStreamReader, MuxTrackTable, ReaderConfig, SourcePacket,
//! };
//!
//! # fn main() -> trackmeta_core::Result<()> {
//! let mut table = MuxTrackTable::new();
//! let video = table.add_track(1, MediaKind::Video)?;
//! let meta = table.add_track(2, MediaKind::Data)?;
//! table.set_descriptor(
//!     meta,
//!     MetadataDescriptor::new(FourCC::new(*b"urim"), &b"urn:example"[..], FourCC::new(*b"conf"), &b""[..]),
//! )?;
//! table.set_source_tracks(meta, &[video])?;
//! table.map_source_tracks(meta, FourCC::CDSC)?;
//!
//! let packet = MetadataFrameCodec::new().encode(&MetadataFrame::new(1000, "hello"))?;
//! let capture = Capture::from_mux(&table, [SourcePacket { stream_index: meta, packet }])?;
//!
//! let mut reader = MetadataStreamReader::open(capture, ReaderConfig::default())?;
//! let record = reader.next_record()?.expect("one frame");
//! assert_eq!(record.referenced_track_ids, Some(vec![1]));
//! assert_eq!(record.payload.as_slice(), b"hello");
//! # Ok(())
//! # }
//! ```

pub mod base64_bytes;
pub mod capture;
pub mod codec;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod fourcc;
pub mod mux;
pub mod reader;
pub mod report;
pub mod side_data;
pub mod track_ref;
pub mod types;

mod wire;

// Error handling
pub use error::{Result, TrackMetaError};

// Track references
pub use fourcc::FourCC;
pub use track_ref::{TrackReference, TrackReferenceHandle, TrackReferenceRegistry};

// Descriptor and frame codec
pub use codec::{CodecDescriptor, MediaKind, MetadataCodec, MetadataFrameCodec};
pub use descriptor::MetadataDescriptor;
pub use types::{MetaBuffer, MetadataFrame, MetadataPacket};

// Mux and demux boundaries
pub use capture::{Capture, CapturePacket, CaptureStream, PacketSource, SourcePacket};
pub use mux::{MuxTrack, MuxTrackTable};
pub use side_data::StreamSideData;

// Reading
pub use config::ReaderConfig;
pub use reader::{FrameRecord, MetadataStreamReader, TrackSummary};
