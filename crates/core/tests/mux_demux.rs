// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Mux-side setup through capture and back out of the reader.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use bytes::Bytes;
use trackmeta_core::report::{render_frame, render_summary};
use trackmeta_core::{
    Capture, FourCC, MediaKind, MetaBuffer, MetadataCodec, MetadataDescriptor, MetadataFrame,
    MetadataFrameCodec, MetadataStreamReader, MuxTrackTable, ReaderConfig, SourcePacket,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

struct Session {
    table: MuxTrackTable,
    video: usize,
    audio: usize,
    gps: usize,
    notes: usize,
}

/// A video and an audio track, a GPS metadata track describing both, and a
/// metadata track with neither descriptor nor references.
fn session() -> Session {
    let mut table = MuxTrackTable::new();
    let video = table.add_track(1, MediaKind::Video).unwrap();
    let audio = table.add_track(2, MediaKind::Audio).unwrap();
    let gps = table.add_track(3, MediaKind::Data).unwrap();
    let notes = table.add_track(4, MediaKind::Data).unwrap();

    table
        .set_descriptor(
            gps,
            MetadataDescriptor::new(
                FourCC::new(*b"urim"),
                Bytes::from_static(b"urn:example:gps\0v2"),
                FourCC::new(*b"conf"),
                Bytes::from_static(&[b'h', b'z', 0x00, 0x0a]),
            ),
        )
        .unwrap();
    table.set_source_tracks(gps, &[video, audio, video]).unwrap();
    table.map_source_tracks(gps, FourCC::CDSC).unwrap();

    Session { table, video, audio, gps, notes }
}

fn encode(stream_index: usize, pts: i64, payload: impl Into<MetaBuffer>) -> SourcePacket {
    let packet = MetadataFrameCodec::new().encode(&MetadataFrame::new(pts, payload)).unwrap();
    SourcePacket { stream_index, packet }
}

#[test]
fn test_round_trip_through_capture() {
    init_tracing();
    let s = session();

    let packets = vec![
        encode(s.video, 0, "frame"),
        encode(s.gps, 1000, "lat=1;lon=2"),
        encode(s.audio, 0, "pcm"),
        encode(s.notes, 1500, b"a\\b\n".to_vec()),
        encode(s.gps, 2000, ""),
    ];
    let capture = Capture::from_mux(&s.table, packets).unwrap();

    let mut reader = MetadataStreamReader::open(capture, ReaderConfig::default()).unwrap();
    let summaries = reader.summaries().to_vec();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].track_id, 3);
    assert_eq!(summaries[0].referenced_track_ids(None), Some(vec![1, 2]));
    assert_eq!(summaries[0].descriptor.as_ref().unwrap().uri(), b"urn:example:gps\0v2");
    assert_eq!(summaries[1].track_id, 4);
    assert!(summaries[1].descriptor.is_none());

    let records: Vec<_> = reader.records().map(Result::unwrap).collect();
    let pts: Vec<_> = records.iter().map(|r| (r.track_id, r.pts)).collect();
    assert_eq!(pts, vec![(3, 1000), (4, 1500), (3, 2000)]);

    assert_eq!(records[0].payload.as_slice(), b"lat=1;lon=2");
    assert_eq!(records[0].config.as_deref(), Some(&[b'h', b'z', 0x00, 0x0a][..]));
    assert!(records[1].referenced_track_ids.is_none());
    assert!(records[2].payload.is_empty());

    assert_eq!(
        render_summary(&summaries[0], None),
        "Track #3 describing tracks #1 #2 with tref urim url: urn:example:gps\0v2 \n \
         configuration conf tag conf, 4 bytes: h z  0  a\n"
    );
    assert_eq!(render_summary(&summaries[1], None), "No track references!\n");
    assert_eq!(render_frame(&records[1]), "track #4 at 1500 (4 bytes), a\\\\b\\0x a\n");
}

#[test]
fn test_capture_survives_json_and_yaml() {
    let s = session();
    let capture = Capture::from_mux(&s.table, vec![encode(s.gps, 10, "x")]).unwrap();

    let json = serde_json::to_string_pretty(&capture).unwrap();
    assert_eq!(Capture::from_json(&json).unwrap(), capture);

    let yaml = serde_saphyr::to_string(&capture).unwrap();
    assert_eq!(Capture::from_yaml(&yaml).unwrap(), capture);
}

#[test]
fn test_failed_mapping_leaves_references_untouched() {
    let mut s = session();
    let before = s.table.track(s.gps).unwrap().references.clone();

    s.table.track_mut(s.gps).unwrap().src_tracks.push(42);
    assert!(s.table.map_source_tracks(s.gps, FourCC::CDSC).is_err());
    assert_eq!(s.table.track(s.gps).unwrap().references, before);
}

#[test]
fn test_hint_track_references_survive_demux() {
    let mut s = session();
    let hint = s.table.add_track(9, MediaKind::Data).unwrap();
    s.table.set_hint_track(s.video, hint).unwrap();
    s.table.map_source_tracks(hint, FourCC::HINT).unwrap();

    let capture = Capture::from_mux(&s.table, vec![encode(hint, 5, "rtp")]).unwrap();
    let config = ReaderConfig { reference_tag: Some(FourCC::HINT), ..Default::default() };
    let mut reader = MetadataStreamReader::open(capture, config).unwrap();
    let record = reader.next_record().unwrap().expect("hint packet");
    assert_eq!(record.track_id, 9);
    assert_eq!(record.referenced_track_ids, Some(vec![1]));
}
