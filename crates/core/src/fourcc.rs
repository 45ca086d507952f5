// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Four-character codes.
//!
//! Track reference kinds, metadata schemes and configuration blobs are all
//! identified by a [`FourCC`]. The bytes are opaque: equality is exact byte
//! equality and no ordering is defined. For diagnostics a code renders as
//! text when every byte is printable ASCII and as hex otherwise.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TrackMetaError;

/// An opaque 4-byte code.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// Content description: this track describes the referenced tracks.
    pub const CDSC: Self = Self(*b"cdsc");
    /// Hint track: this track hints the referenced tracks.
    pub const HINT: Self = Self(*b"hint");
    /// Timecode track used by the referenced tracks.
    pub const TMCD: Self = Self(*b"tmcd");
    /// Chapter list for the referenced tracks.
    pub const CHAP: Self = Self(*b"chap");
    /// Subtitle track for the referenced tracks.
    pub const SUBT: Self = Self(*b"subt");
    /// Font track used by the referenced tracks.
    pub const FONT: Self = Self(*b"font");
    /// Auxiliary video depth track.
    pub const VDEP: Self = Self(*b"vdep");

    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    pub const fn to_u32(self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    /// Returns true when every byte is printable ASCII (space through `~`).
    pub fn is_printable(&self) -> bool {
        self.0.iter().all(|b| (0x20..0x7f).contains(b))
    }
}

impl From<[u8; 4]> for FourCC {
    fn from(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }
}

impl From<u32> for FourCC {
    fn from(value: u32) -> Self {
        Self(value.to_be_bytes())
    }
}

impl From<FourCC> for u32 {
    fn from(value: FourCC) -> Self {
        value.to_u32()
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_printable() {
            for &b in &self.0 {
                write!(f, "{}", char::from(b))?;
            }
            Ok(())
        } else {
            write!(f, "0x{:08x}", self.to_u32())
        }
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC({self})")
    }
}

impl FromStr for FourCC {
    type Err = TrackMetaError;

    /// Parses either exactly four bytes of text (`"cdsc"`) or the hex form
    /// produced by `Display` (`"0x00a9616c"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(hex) = s.strip_prefix("0x") {
            if hex.len() == 8 {
                return u32::from_str_radix(hex, 16).map(Self::from).map_err(|e| {
                    TrackMetaError::Configuration(format!("Invalid four-character code '{s}': {e}"))
                });
            }
        }
        <[u8; 4]>::try_from(s.as_bytes()).map(Self).map_err(|_| {
            TrackMetaError::Configuration(format!(
                "Four-character code must be exactly 4 bytes, got '{s}'"
            ))
        })
    }
}

impl Serialize for FourCC {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FourCC {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_display_printable_and_binary() {
        assert_eq!(FourCC::CDSC.to_string(), "cdsc");
        assert_eq!(FourCC::new([0xa9, b'a', b'l', b'b']).to_string(), "0xa9616c62");
        assert_eq!(FourCC::new([0, 0, 0, 1]).to_string(), "0x00000001");
    }

    #[test]
    fn test_parse_text_and_hex() {
        assert_eq!("hint".parse::<FourCC>().unwrap(), FourCC::HINT);
        assert_eq!("0xa9616c62".parse::<FourCC>().unwrap(), FourCC::new([0xa9, b'a', b'l', b'b']));
        assert!("toolong".parse::<FourCC>().is_err());
        assert!("abc".parse::<FourCC>().is_err());
    }

    #[test]
    fn test_u32_conversion() {
        let tag = FourCC::from(0x6364_7363);
        assert_eq!(tag, FourCC::CDSC);
        assert_eq!(u32::from(tag), 0x6364_7363);
    }

    #[test]
    fn test_serde_uses_display_form() {
        let json = serde_json::to_string(&FourCC::TMCD).unwrap();
        assert_eq!(json, "\"tmcd\"");
        let back: FourCC = serde_json::from_str(&json).unwrap();
        assert_eq!(back, FourCC::TMCD);
    }
}
