// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! tmeta-extract: reports the timed-metadata tracks of a demux capture.

pub mod commands;
pub mod config;
pub mod logging;

pub use commands::{
    inspect, make_stream, parse_base64, parse_reference, render_stream, DescriptorFields,
    InspectStats,
};
pub use config::{Config, LogLevel, OutputFormat};
pub use logging::init_logging;
