// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

// Allow println/eprintln in CLI client - these are for direct user output, not logging
#![allow(clippy::disallowed_macros)]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::error;
use trackmeta_core::FourCC;
use trackmeta_extract::{config, DescriptorFields, LogLevel, OutputFormat};

#[derive(Parser, Debug)]
#[command(author, version, about = "Timed metadata extraction tool", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the metadata tracks and frames of a capture file (JSON or YAML)
    Inspect {
        /// Path to the capture file
        capture: PathBuf,
        /// Report format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
        /// Only report references with this tag (e.g. cdsc)
        #[arg(long)]
        reference_tag: Option<FourCC>,
        /// Treat every stream as timed metadata, not just data streams
        #[arg(long)]
        all_streams: bool,
        /// Ignore descriptors larger than this many bytes
        #[arg(long)]
        max_descriptor_size: Option<usize>,
    },
    /// Print a capture stream entry with encoded descriptor and references
    #[command(name = "make-stream")]
    MakeStream(MakeStreamArgs),
}

#[derive(Args, Debug)]
struct MakeStreamArgs {
    /// Container track id
    #[arg(long)]
    track_id: Option<u32>,
    /// Metadata scheme tag (e.g. urim)
    #[arg(long, requires = "uri")]
    scheme: Option<FourCC>,
    /// Metadata scheme URI
    #[arg(long, requires = "scheme")]
    uri: Option<String>,
    /// Configuration tag (default: four zero bytes)
    #[arg(long, default_value = "0x00000000")]
    config_tag: FourCC,
    /// Configuration payload as text
    #[arg(long, conflicts_with = "config_base64")]
    config_text: Option<String>,
    /// Configuration payload as base64
    #[arg(long)]
    config_base64: Option<String>,
    /// Track reference as TAG=ID[,ID...]; repeatable
    #[arg(long = "reference", value_parser = trackmeta_extract::parse_reference)]
    references: Vec<(FourCC, Vec<u32>)>,
    /// Output format (text prints YAML)
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

fn main() {
    let cli = Cli::parse();

    let mut config = match config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(2);
        },
    };
    if let Some(level) = cli.log_level {
        config.log.level = level;
    }
    trackmeta_extract::init_logging(config.log.level);

    match cli.command {
        Commands::Inspect {
            capture,
            format,
            reference_tag,
            all_streams,
            max_descriptor_size,
        } => {
            if reference_tag.is_some() {
                config.reader.reference_tag = reference_tag;
            }
            if all_streams {
                config.reader.data_streams_only = false;
            }
            if let Some(max) = max_descriptor_size {
                config.reader.max_descriptor_size = max;
            }
            let format = format.unwrap_or(config.output.format);

            let mut stdout = std::io::stdout().lock();
            if let Err(e) = trackmeta_extract::inspect(&capture, &config.reader, format, &mut stdout)
            {
                error!(error = %format!("{e:#}"), "Failed to inspect capture");
                std::process::exit(1);
            }
        },
        Commands::MakeStream(args) => {
            let config_bytes = match (args.config_base64, args.config_text) {
                (Some(encoded), _) => match trackmeta_extract::parse_base64(&encoded) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        eprintln!("--config-base64: {e}");
                        std::process::exit(2);
                    },
                },
                (None, Some(text)) => text.into_bytes(),
                (None, None) => Vec::new(),
            };
            let descriptor = args.scheme.zip(args.uri).map(|(scheme_tag, uri)| DescriptorFields {
                scheme_tag,
                uri,
                config_tag: args.config_tag,
                config: config_bytes,
            });
            let rendered = trackmeta_extract::make_stream(args.track_id, descriptor, &args.references)
                .and_then(|stream| trackmeta_extract::render_stream(&stream, args.format));
            match rendered {
                Ok(text) => print!("{text}"),
                Err(e) => {
                    error!(error = %format!("{e:#}"), "Failed to build stream entry");
                    std::process::exit(1);
                },
            }
        },
    }
}
