//! Media operation pipeline driving an external transcoding tool.
//!
//! The `ffnode-core` crate implements five media operations (merge, overlay,
//! info, custom, and convert) as parameterisations of one pipeline. Each job
//! decodes base64 payloads from the host's items into scoped temporary
//! files, renders a command template with their paths, runs the tool
//! synchronously, reads the produced file back, and emits a result record
//! paired with its source item. Temporary files are released on every path.
//!
//! # Architecture
//!
//! [`Pipeline::run`] plans an [`Operation`] over the item list into ordered
//! jobs and executes each through a [`ToolExecutor`]. The production executor
//! is [`process::ShellExecutor`], which hands the rendered command line to a
//! shell so quoting written into templates behaves as at a terminal. The info
//! operation captures the probe tool's JSON report and parses it with
//! [`probe::parse_report`].
//!
//! # Example
//!
//! ```rust,no_run
//! use ffnode_core::operation::{ConvertParams, Operation};
//! use ffnode_core::process::ShellExecutor;
//! use ffnode_core::protocol::{BinaryPayload, Item};
//! use ffnode_core::{Pipeline, PipelineSettings};
//!
//! let item = Item::with_binary("data", BinaryPayload::from_bytes(b"...", Some("clip.mov"), None));
//! let operation = Operation::Convert(ConvertParams {
//!     output_format: "webm".into(),
//!     ..ConvertParams::default()
//! });
//!
//! let pipeline = Pipeline::new(ShellExecutor::default(), PipelineSettings::default());
//! let records = pipeline.run(&operation, &[item]).expect("ffmpeg is installed");
//! assert_eq!(records.len(), 1);
//! ```

pub mod error;
pub mod mime;
pub mod operation;
pub mod probe;
pub mod process;
pub mod protocol;
pub mod runner;
pub mod staging;
pub mod template;

#[cfg(test)]
mod tests;

pub use self::error::{PipelineError, ToolFailure};
pub use self::operation::{
    ConvertParams, CustomParams, MergeParams, Operation, OutputSpec, OverlayParams,
};
pub use self::process::{ShellExecutor, ToolCommand};
pub use self::protocol::{BinaryPayload, Item, PairedItem, RecordSummary, ResultRecord};
pub use self::runner::{Pipeline, PipelineSettings, ToolExecutor};
pub use self::staging::StagingArea;
