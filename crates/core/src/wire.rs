// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Bounds-checked big-endian reading and writing for side-data blobs.

use std::ops::Range;

use crate::error::{Result, TrackMetaError};
use crate::fourcc::FourCC;

/// Cursor over a borrowed buffer. Every read checks the declared length
/// against what is left and fails with `TruncatedInput` instead of reading
/// past the end.
pub(crate) struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) const fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) const fn position(&self) -> usize {
        self.pos
    }

    pub(crate) const fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Claims the next `len` bytes and returns their range in the buffer.
    pub(crate) fn take_range(&mut self, len: usize) -> Result<Range<usize>> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.buf.len())
            .ok_or_else(|| {
                TrackMetaError::truncated(self.pos.saturating_add(len), self.buf.len())
            })?;
        let range = self.pos..end;
        self.pos = end;
        Ok(range)
    }

    pub(crate) fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let range = self.take_range(len)?;
        Ok(&self.buf[range])
    }

    pub(crate) fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32> {
        self.read_array::<4>().map(u32::from_be_bytes)
    }

    /// Reads a `u32` length prefix as a `usize`.
    pub(crate) fn read_len(&mut self) -> Result<usize> {
        let len = self.read_u32()?;
        usize::try_from(len).map_err(|_| TrackMetaError::truncated(usize::MAX, self.buf.len()))
    }

    pub(crate) fn read_fourcc(&mut self) -> Result<FourCC> {
        self.read_array::<4>().map(FourCC)
    }
}

/// Converts a region length into its `u32` length prefix.
pub(crate) fn len_prefix(len: usize, what: &str) -> Result<u32> {
    u32::try_from(len).map_err(|_| {
        TrackMetaError::Configuration(format!("{what} of {len} bytes exceeds the 32-bit length field"))
    })
}

pub(crate) fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

pub(crate) fn put_fourcc(out: &mut Vec<u8>, tag: FourCC) {
    out.extend_from_slice(tag.as_bytes());
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_reads_are_bounds_checked() {
        let buf = [0, 0, 0, 5, b'a', b'b'];
        let mut reader = ByteReader::new(&buf);
        assert_eq!(reader.read_len().unwrap(), 5);
        let err = reader.take(5).unwrap_err();
        assert!(matches!(err, TrackMetaError::TruncatedInput { needed: 9, available: 6 }));
        // A failed read does not advance the cursor.
        assert_eq!(reader.position(), 4);
        assert_eq!(reader.take(2).unwrap(), b"ab");
        assert_eq!(reader.remaining(), 0);
    }
}
