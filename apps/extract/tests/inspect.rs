// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::{Path, PathBuf};
use std::process::Command;

use trackmeta_core::{
    Capture, FourCC, MediaKind, MetadataCodec, MetadataDescriptor, MetadataFrame,
    MetadataFrameCodec, MuxTrackTable, ReaderConfig, SourcePacket,
};
use trackmeta_extract::{inspect, InspectStats, OutputFormat};

const BIN: &str = env!("CARGO_BIN_EXE_tmeta-extract");

/// Writes a capture with a video track, and a metadata track describing it.
fn write_capture(dir: &Path, name: &str) -> PathBuf {
    let mut table = MuxTrackTable::new();
    let video = table.add_track(1, MediaKind::Video).unwrap();
    let meta = table.add_track(2, MediaKind::Data).unwrap();
    table
        .set_descriptor(
            meta,
            MetadataDescriptor::new(
                FourCC::new(*b"urim"),
                &b"urn:example:gps"[..],
                FourCC::new(*b"conf"),
                &b"v1"[..],
            ),
        )
        .unwrap();
    table.set_source_tracks(meta, &[video]).unwrap();
    table.map_source_tracks(meta, FourCC::CDSC).unwrap();

    let codec = MetadataFrameCodec::new();
    let packets = [(video, 0, "idr"), (meta, 1000, "lat=1"), (meta, 2000, "lat=\\2")]
        .into_iter()
        .map(|(stream_index, pts, payload)| SourcePacket {
            stream_index,
            packet: codec.encode(&MetadataFrame::new(pts, payload)).unwrap(),
        });
    let capture = Capture::from_mux(&table, packets).unwrap();

    let path = dir.join(name);
    let text = if name.ends_with(".json") {
        serde_json::to_string_pretty(&capture).unwrap()
    } else {
        serde_saphyr::to_string(&capture).unwrap()
    };
    std::fs::write(&path, text).unwrap();
    path
}

#[test]
fn test_inspect_text_report() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_capture(dir.path(), "capture.json");

    let mut out = Vec::new();
    let stats = inspect(&path, &ReaderConfig::default(), OutputFormat::Text, &mut out).unwrap();
    assert_eq!(stats, InspectStats { tracks: 1, frames: 2 });

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines[0], "Track #2 describing track #1 with tref urim url: urn:example:gps ");
    assert_eq!(lines[1], " configuration conf tag conf, 2 bytes: v 1");
    assert_eq!(lines[2], "track #2 at 1000 (5 bytes), lat=1");
    assert_eq!(lines[3], "track #2 at 2000 (6 bytes), lat=\\\\2");
    assert_eq!(lines.len(), 4);
}

#[test]
fn test_inspect_json_report_from_yaml_capture() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_capture(dir.path(), "capture.yaml");

    let mut out = Vec::new();
    inspect(&path, &ReaderConfig::default(), OutputFormat::Json, &mut out).unwrap();

    let report: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(report["tracks"][0]["track_id"], 2);
    assert_eq!(report["tracks"][0]["references"][0]["tag"], "cdsc");
    assert_eq!(report["frames"].as_array().unwrap().len(), 2);
    assert_eq!(report["frames"][1]["pts"], 2000);
    assert_eq!(report["frames"][1]["referenced_track_ids"], serde_json::json!([1]));
}

#[test]
fn test_inspect_without_metadata_streams_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("video.json");
    std::fs::write(&path, r#"{"streams": [{"kind": "video"}], "packets": []}"#).unwrap();

    let err = inspect(&path, &ReaderConfig::default(), OutputFormat::Text, &mut Vec::new())
        .unwrap_err();
    assert!(err.to_string().contains("No timed metadata streams"));
}

#[test]
fn test_binary_inspect_and_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let capture = write_capture(dir.path(), "capture.json");
    let config = dir.path().join("tmeta.toml");
    std::fs::write(&config, "[reader]\nreference_tag = \"hint\"\n").unwrap();

    let output = Command::new(BIN)
        .arg("inspect")
        .arg(&capture)
        .arg("--config")
        .arg(&config)
        .env_remove("RUST_LOG")
        .output()
        .expect("run tmeta-extract");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("No track references!\n"));
    assert!(stdout.contains("track #2 at 1000 (5 bytes), lat=1\n"));

    let output = Command::new(BIN)
        .args(["inspect", "--reference-tag", "cdsc"])
        .arg(&capture)
        .arg("--config")
        .arg(&config)
        .output()
        .expect("run tmeta-extract");
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("Track #2 describing track #1 "));
}

#[test]
fn test_binary_make_stream() {
    let output = Command::new(BIN)
        .args([
            "make-stream",
            "--track-id",
            "3",
            "--scheme",
            "urim",
            "--uri",
            "urn:example",
            "--reference",
            "cdsc=1,2",
            "--format",
            "json",
        ])
        .output()
        .expect("run tmeta-extract");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let json = String::from_utf8(output.stdout).unwrap();
    let capture = Capture::from_json(&format!(r#"{{"streams": [{json}]}}"#)).unwrap();
    let stream = &capture.streams[0];
    assert_eq!(stream.track_id, Some(3));
    let descriptor = MetadataDescriptor::decode(stream.descriptor.as_ref().unwrap()).unwrap();
    assert_eq!(descriptor.uri_lossy(), "urn:example");
    assert_eq!(descriptor.config_tag(), FourCC::new([0; 4]));
}

#[test]
fn test_binary_missing_capture_exits_nonzero() {
    let output = Command::new(BIN)
        .args(["inspect", "/nonexistent/capture.json"])
        .output()
        .expect("run tmeta-extract");
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}
