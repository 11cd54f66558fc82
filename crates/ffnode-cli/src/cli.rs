//! CLI argument definitions for the ffnode tool.
//!
//! Configuration flags (tool, shell, logging, ...) are split off before
//! these definitions are parsed; see `config.rs`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use ffnode_core::operation::{
    CONVERT_TEMPLATE, CUSTOM_TEMPLATE, DEFAULT_MIN_FILES, DEFAULT_OUTPUT_BINARY,
    DEFAULT_OUTPUT_FILE_NAME, DEFAULT_OUTPUT_FORMAT, MERGE_TEMPLATE, OVERLAY_TEMPLATE,
};
use ffnode_core::{
    ConvertParams, CustomParams, MergeParams, Operation, OutputSpec, OverlayParams,
};

/// Command-line interface for the ffnode media tool.
#[derive(Parser, Debug)]
#[command(
    name = "ffnode",
    version,
    about = "Runs ffmpeg-backed media operations over JSON items",
    disable_help_subcommand = true
)]
pub(crate) struct Cli {
    /// Reads the JSON item array from this file instead of standard input.
    #[arg(long, value_name = "PATH")]
    pub(crate) input: Option<PathBuf>,
    /// Pretty-prints the JSON records.
    #[arg(long)]
    pub(crate) pretty: bool,
    /// The operation to run.
    #[command(subcommand)]
    pub(crate) operation: OperationCommand,
}

/// Where the produced file is delivered.
#[derive(Args, Debug, Clone)]
pub(crate) struct OutputArgs {
    /// Name given to the produced file.
    #[arg(long, value_name = "NAME", default_value = DEFAULT_OUTPUT_FILE_NAME)]
    output_file_name: String,
    /// Binary property receiving the produced file.
    #[arg(long, value_name = "KEY", default_value = DEFAULT_OUTPUT_BINARY)]
    output_binary: String,
}

impl From<OutputArgs> for OutputSpec {
    fn from(args: OutputArgs) -> Self {
        Self::new(args.output_file_name, args.output_binary)
    }
}

/// Media operations.
#[derive(Subcommand, Debug, Clone)]
pub(crate) enum OperationCommand {
    /// Concatenates the first payload of every item into one file.
    Merge {
        /// Minimum number of items carrying binary data.
        #[arg(long, value_name = "N", default_value_t = DEFAULT_MIN_FILES)]
        min_files: usize,
        /// Command template; `{input}` is the concat list.
        #[arg(long, allow_hyphen_values = true, default_value = MERGE_TEMPLATE)]
        template: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Combines a video payload with an audio payload per item.
    Overlay {
        /// Command template using `{video}`, `{audio}` and `{output}`.
        #[arg(long, allow_hyphen_values = true, default_value = OVERLAY_TEMPLATE)]
        template: String,
        #[command(flatten)]
        output: OutputArgs,
        /// Binary key of the video payload (default: first payload).
        #[arg(long, value_name = "KEY")]
        video_binary: Option<String>,
        /// Binary key of the audio payload (default: next payload).
        #[arg(long, value_name = "KEY")]
        audio_binary: Option<String>,
    },
    /// Reports container and stream metadata for each item.
    Info,
    /// Runs a free-form command template against each item.
    Custom {
        /// Command template using `{input}` and `{output}`.
        #[arg(long, allow_hyphen_values = true, default_value = CUSTOM_TEMPLATE)]
        template: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Re-encodes each item into another format.
    Convert {
        /// Command template using `{input}`, `{output}` and `{bitrate_option}`.
        #[arg(long, allow_hyphen_values = true, default_value = CONVERT_TEMPLATE)]
        template: String,
        #[command(flatten)]
        output: OutputArgs,
        /// Target format, e.g. mp3, flac, webm, gif.
        #[arg(long, value_name = "FORMAT", default_value = DEFAULT_OUTPUT_FORMAT)]
        output_format: String,
        /// Audio bitrate such as 192k; empty keeps the tool default.
        #[arg(long, value_name = "RATE", default_value = "")]
        bitrate: String,
    },
}

impl From<OperationCommand> for Operation {
    fn from(command: OperationCommand) -> Self {
        match command {
            OperationCommand::Merge {
                min_files,
                template,
                output,
            } => Self::Merge(MergeParams {
                min_files,
                template,
                output: output.into(),
            }),
            OperationCommand::Overlay {
                template,
                output,
                video_binary,
                audio_binary,
            } => Self::Overlay(OverlayParams {
                template,
                output: output.into(),
                video_binary,
                audio_binary,
            }),
            OperationCommand::Info => Self::Info,
            OperationCommand::Custom { template, output } => Self::Custom(CustomParams {
                template,
                output: output.into(),
            }),
            OperationCommand::Convert {
                template,
                output,
                output_format,
                bitrate,
            } => Self::Convert(ConvertParams {
                template,
                output: output.into(),
                output_format,
                bitrate,
            }),
        }
    }
}
