// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use tracing::{debug, info};
use trackmeta_core::report::{render_frame, render_summary};
use trackmeta_core::{
    Capture, CaptureStream, FourCC, FrameRecord, MediaKind, MetadataDescriptor,
    MetadataStreamReader, ReaderConfig, StreamSideData, TrackReferenceRegistry, TrackSummary,
};

use crate::config::OutputFormat;

/// Counts of what `inspect` reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InspectStats {
    pub tracks: usize,
    pub frames: usize,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    tracks: &'a [TrackSummary],
    frames: Vec<FrameRecord>,
}

/// Reads a capture file and writes a report of its timed-metadata tracks and
/// frames to `out`.
///
/// # Errors
///
/// Returns an error if:
/// - The capture cannot be read or parsed
/// - The capture has no timed-metadata streams
/// - Writing the report fails
pub fn inspect(
    capture_path: &Path,
    reader_config: &ReaderConfig,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<InspectStats> {
    let capture = Capture::from_path(capture_path)
        .with_context(|| format!("Failed to load capture '{}'", capture_path.display()))?;
    let mut reader = MetadataStreamReader::open(capture, reader_config.clone())
        .context("Failed to open metadata reader")?;

    let summaries = reader.summaries().to_vec();
    if summaries.is_empty() {
        bail!("No timed metadata streams in '{}'", capture_path.display());
    }
    info!(tracks = summaries.len(), "Inspecting timed metadata");

    let mut stats = InspectStats { tracks: summaries.len(), frames: 0 };
    match format {
        OutputFormat::Text => {
            for summary in &summaries {
                out.write_all(render_summary(summary, reader_config.reference_tag).as_bytes())?;
            }
            for record in reader.records() {
                let record = record.context("Failed to decode metadata frame")?;
                out.write_all(render_frame(&record).as_bytes())?;
                stats.frames += 1;
            }
        },
        OutputFormat::Json => {
            let frames = reader
                .records()
                .collect::<trackmeta_core::Result<Vec<_>>>()
                .context("Failed to decode metadata frame")?;
            stats.frames = frames.len();
            serde_json::to_writer_pretty(&mut *out, &JsonReport { tracks: &summaries, frames })?;
            writeln!(out)?;
        },
    }
    out.flush()?;

    debug!(frames = stats.frames, "Inspection finished");
    Ok(stats)
}

/// Descriptor fields for [`make_stream`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorFields {
    pub scheme_tag: FourCC,
    pub uri: String,
    pub config_tag: FourCC,
    pub config: Vec<u8>,
}

/// Builds a capture stream entry carrying encoded side data, for authoring
/// capture files by hand.
///
/// # Errors
///
/// Returns an error if the side data cannot be encoded.
pub fn make_stream(
    track_id: Option<u32>,
    descriptor: Option<DescriptorFields>,
    references: &[(FourCC, Vec<u32>)],
) -> Result<CaptureStream> {
    let descriptor = descriptor.map(|d| {
        MetadataDescriptor::new(d.scheme_tag, d.uri.into_bytes(), d.config_tag, d.config)
    });

    let mut registry = TrackReferenceRegistry::new();
    for (tag, ids) in references {
        registry.map_source_tracks(ids, *tag).context("Failed to add track references")?;
    }

    let side_data = StreamSideData::encode(descriptor.as_ref(), &registry)
        .context("Failed to encode side data")?;
    let mut stream = CaptureStream::new(MediaKind::Data).with_side_data(side_data);
    stream.track_id = track_id;
    Ok(stream)
}

/// Serializes a stream entry as YAML (`Text`) or JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_stream(stream: &CaptureStream, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => serde_saphyr::to_string(stream).context("Failed to write YAML")?,
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(stream)?;
            json.push('\n');
            json
        },
    })
}

/// Parses `TAG=ID[,ID...]`, e.g. `cdsc=1,2`.
///
/// # Errors
///
/// Returns a message if the tag or an id is malformed.
pub fn parse_reference(s: &str) -> std::result::Result<(FourCC, Vec<u32>), String> {
    let (tag, ids) = s.split_once('=').ok_or_else(|| format!("expected TAG=ID[,ID...], got '{s}'"))?;
    let tag: FourCC = tag.parse().map_err(|e| format!("{e}"))?;
    let ids = ids
        .split(',')
        .map(|id| id.trim().parse::<u32>().map_err(|e| format!("invalid track id '{id}': {e}")))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok((tag, ids))
}

/// Decodes `--config-base64` input.
///
/// # Errors
///
/// Returns a message for invalid base64.
pub fn parse_base64(s: &str) -> std::result::Result<Vec<u8>, String> {
    STANDARD.decode(s.trim()).map_err(|e| format!("invalid base64: {e}"))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn test_parse_reference() {
        assert_eq!(parse_reference("cdsc=1, 2").unwrap(), (FourCC::CDSC, vec![1, 2]));
        assert!(parse_reference("cdsc").is_err());
        assert!(parse_reference("cd=1").is_err());
        assert!(parse_reference("cdsc=x").is_err());
    }

    #[test]
    fn test_make_stream_encodes_side_data() {
        let descriptor = DescriptorFields {
            scheme_tag: FourCC::new(*b"urim"),
            uri: "urn:example".to_string(),
            config_tag: FourCC::new(*b"conf"),
            config: vec![0, 1],
        };
        let stream =
            make_stream(Some(3), Some(descriptor), &[(FourCC::CDSC, vec![1, 2, 1])]).unwrap();
        assert_eq!(stream.track_id, Some(3));
        assert_eq!(stream.kind, MediaKind::Data);

        let decoded = MetadataDescriptor::decode(stream.descriptor.as_ref().unwrap()).unwrap();
        assert_eq!(decoded.uri(), b"urn:example");
        let references =
            trackmeta_core::side_data::decode_references(stream.references.as_ref().unwrap())
                .unwrap();
        assert_eq!(references.find(FourCC::CDSC).unwrap().track_ids(), &[1, 2]);
    }

    #[test]
    fn test_rendered_stream_loads_back_as_capture() {
        let stream = make_stream(None, None, &[(FourCC::HINT, vec![4])]).unwrap();
        let json = render_stream(&stream, OutputFormat::Json).unwrap();
        let capture = Capture::from_json(&format!(r#"{{"streams": [{json}]}}"#)).unwrap();
        assert_eq!(capture.streams[0], stream);

        let yaml = render_stream(&stream, OutputFormat::Text).unwrap();
        assert!(yaml.contains("kind: data"));
    }
}
