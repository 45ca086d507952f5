// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Structured error types for trackmeta.
//!
//! Every fallible operation in this crate is all-or-nothing: when one of these
//! errors is returned, the receiver is in exactly the state it was in before
//! the call. Missing metadata at read time is not an error; the reader reports
//! it as an absent field instead.

use std::collections::TryReserveError;

use thiserror::Error;

/// Main error type for track reference and timed-metadata operations.
#[derive(Debug, Error)]
pub enum TrackMetaError {
    /// A storage request could not be satisfied.
    ///
    /// Raised when growing a registry, an id list, or a payload buffer fails.
    #[error("Allocation failure: {0}")]
    AllocationFailure(String),

    /// A declared length exceeds the bytes actually available.
    #[error("Truncated input: needed {needed} bytes, {available} available")]
    TruncatedInput { needed: usize, available: usize },

    /// A registry handle was used after the registry was released.
    #[error("Stale track reference handle")]
    StaleHandle,

    /// A mux-side stream index does not name a known track.
    #[error("Unknown track: stream index {0}")]
    UnknownTrack(usize),

    /// A capture document is malformed.
    #[error("Invalid capture: {0}")]
    InvalidCapture(String),

    /// Configuration or parameter validation error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for Results using `TrackMetaError`.
pub type Result<T> = std::result::Result<T, TrackMetaError>;

impl From<TryReserveError> for TrackMetaError {
    fn from(err: TryReserveError) -> Self {
        Self::AllocationFailure(err.to_string())
    }
}

impl From<smallvec::CollectionAllocErr> for TrackMetaError {
    fn from(err: smallvec::CollectionAllocErr) -> Self {
        Self::AllocationFailure(format!("{err:?}"))
    }
}

impl TrackMetaError {
    /// Builds a `TruncatedInput` error from the two lengths involved.
    pub(crate) const fn truncated(needed: usize, available: usize) -> Self {
        Self::TruncatedInput { needed, available }
    }
}
