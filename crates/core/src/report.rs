// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Plain-text rendering of reader output, one line per frame.

use crate::fourcc::FourCC;
use crate::reader::{FrameRecord, TrackSummary};

const fn is_printable(byte: u8) -> bool {
    matches!(byte, 0x20..=0x7e)
}

/// Describes a metadata track.
///
/// ```text
/// Track #3 describing tracks #1 #2 with tref urim url: urn:example:loc
///  configuration conf tag conf, 2 bytes: v 1
/// ```
///
/// Tracks without references or descriptor render as `No track references!`
/// or `No metadata info!`.
pub fn render_summary(summary: &TrackSummary, tag_filter: Option<FourCC>) -> String {
    let Some(ids) = summary.referenced_track_ids(tag_filter) else {
        return "No track references!\n".to_string();
    };
    let Some(descriptor) = &summary.descriptor else {
        return "No metadata info!\n".to_string();
    };

    let plural = if ids.len() > 1 { "s" } else { "" };
    let mut out = format!("Track #{} describing track{plural} ", summary.track_id);
    for id in &ids {
        out.push_str(&format!("#{id} "));
    }
    out.push_str(&format!(
        "with tref {} url: {} \n configuration conf tag {}, {} bytes:",
        descriptor.scheme_tag(),
        descriptor.uri_lossy(),
        descriptor.config_tag(),
        descriptor.config().len()
    ));
    for &byte in descriptor.config() {
        if is_printable(byte) {
            out.push(' ');
            out.push(char::from(byte));
        } else {
            out.push_str(&format!(" {byte:2x}"));
        }
    }
    out.push('\n');
    out
}

/// One frame as `track #<id> at <pts> (<n> bytes), <payload>`. In the
/// payload a backslash is doubled and other non-printable bytes are written
/// as `\0x<hex>`.
pub fn render_frame(record: &FrameRecord) -> String {
    let payload = record.payload.as_slice();
    let mut out = format!("track #{} at {} ({} bytes), ", record.track_id, record.pts, payload.len());
    escape_into(&mut out, payload);
    out.push('\n');
    out
}

fn escape_into(out: &mut String, bytes: &[u8]) {
    for &byte in bytes {
        match byte {
            b'\\' => out.push_str("\\\\"),
            b if is_printable(b) => out.push(char::from(b)),
            b => out.push_str(&format!("\\0x{b:2x}")),
        }
    }
}
