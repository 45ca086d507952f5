// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackMetaError};
use crate::fourcc::FourCC;

/// The `u32` group count every references blob starts with.
const REFERENCES_HEADER_SIZE: usize = 4;

const fn default_max_descriptor_size() -> usize {
    1024 * 1024
}

const fn default_max_references_size() -> usize {
    64 * 1024
}

const fn default_data_streams_only() -> bool {
    true
}

/// Settings for [`MetadataStreamReader`](crate::reader::MetadataStreamReader).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Descriptor side data larger than this is treated as absent (default: 1 MiB).
    #[serde(default = "default_max_descriptor_size")]
    pub max_descriptor_size: usize,
    /// Track reference side data larger than this is treated as absent
    /// (default: 64 KiB, about 16k track ids).
    #[serde(default = "default_max_references_size")]
    pub max_references_size: usize,
    /// Only this reference kind contributes to a frame's referenced tracks.
    /// `None` (the default) merges every kind.
    pub reference_tag: Option<FourCC>,
    /// Select only streams flagged as data streams (default: true).
    /// When false every stream is decoded as timed metadata.
    #[serde(default = "default_data_streams_only")]
    pub data_streams_only: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_descriptor_size: default_max_descriptor_size(),
            max_references_size: default_max_references_size(),
            reference_tag: None,
            data_streams_only: default_data_streams_only(),
        }
    }
}

impl ReaderConfig {
    /// Checks values that deserialize fine but cannot work.
    ///
    /// # Errors
    ///
    /// Returns `TrackMetaError::Configuration` if `max_descriptor_size` is
    /// smaller than an empty descriptor, or `max_references_size` cannot hold
    /// the group count.
    pub fn validate(&self) -> Result<()> {
        if self.max_descriptor_size < crate::descriptor::DESCRIPTOR_HEADER_SIZE {
            return Err(TrackMetaError::Configuration(format!(
                "max_descriptor_size must be at least {} bytes, got {}",
                crate::descriptor::DESCRIPTOR_HEADER_SIZE,
                self.max_descriptor_size
            )));
        }
        if self.max_references_size < REFERENCES_HEADER_SIZE {
            return Err(TrackMetaError::Configuration(format!(
                "max_references_size must be at least {REFERENCES_HEADER_SIZE} bytes, got {}",
                self.max_references_size
            )));
        }
        Ok(())
    }
}
