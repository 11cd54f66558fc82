//! Crate-level test doubles and behavioural tests.

use std::cell::RefCell;
use std::fs;
use std::sync::Arc;

use mockall::mock;
use tempfile::TempDir;

use crate::error::ToolFailure;
use crate::process::ToolCommand;
use crate::protocol::{BinaryPayload, Item};
use crate::runner::{PipelineSettings, ToolExecutor};
use crate::staging::StagingArea;

mod behaviour;

mock! {
    pub Executor {}
    impl ToolExecutor for Executor {
        fn run(&self, command: &ToolCommand) -> Result<(), ToolFailure>;
        fn capture(&self, command: &ToolCommand) -> Result<String, ToolFailure>;
    }
}

/// What the recording executor observed during one call.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub command: ToolCommand,
    pub manifest: Option<String>,
    pub staged_present: bool,
}

/// Executor double that writes a fixed output file and records each call.
///
/// Calls whose zero-based position is listed in `failing_calls` fail with a
/// non-zero exit instead.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    pub output: Vec<u8>,
    pub report: String,
    pub failing_calls: Vec<usize>,
    pub calls: RefCell<Vec<Invocation>>,
}

impl RecordingExecutor {
    pub fn writing(output: &[u8]) -> Self {
        Self {
            output: output.to_vec(),
            ..Self::default()
        }
    }

    pub fn reporting(report: &str) -> Self {
        Self {
            report: report.to_owned(),
            ..Self::default()
        }
    }

    pub fn failing_on(mut self, calls: &[usize]) -> Self {
        self.failing_calls = calls.to_vec();
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    fn record(&self, command: &ToolCommand) -> usize {
        let manifest = command
            .staged()
            .iter()
            .find(|path| path.extension().is_some_and(|ext| ext == "txt"))
            .and_then(|path| fs::read_to_string(path).ok());
        let staged_present = command.staged().iter().all(|path| path.exists());
        let mut calls = self.calls.borrow_mut();
        calls.push(Invocation {
            command: command.clone(),
            manifest,
            staged_present,
        });
        calls.len() - 1
    }
}

impl ToolExecutor for RecordingExecutor {
    fn run(&self, command: &ToolCommand) -> Result<(), ToolFailure> {
        let position = self.record(command);
        if self.failing_calls.contains(&position) {
            return Err(ToolFailure::ExitStatus(1));
        }
        if let Some(output) = command.output() {
            fs::write(output, &self.output).map_err(|err| ToolFailure::Spawn(Arc::new(err)))?;
        }
        Ok(())
    }

    fn capture(&self, command: &ToolCommand) -> Result<String, ToolFailure> {
        let position = self.record(command);
        if self.failing_calls.contains(&position) {
            return Err(ToolFailure::ExitStatus(1));
        }
        Ok(self.report.clone())
    }
}

/// Settings staging into `dir` with the default tool names.
pub fn settings_in(dir: &TempDir) -> PipelineSettings {
    PipelineSettings::new("ffmpeg", "ffprobe").with_staging(StagingArea::new(dir.path()))
}

/// An item with one payload named `data`.
pub fn media_item(file_name: &str, bytes: &[u8]) -> Item {
    Item::with_binary("data", BinaryPayload::from_bytes(bytes, Some(file_name), None))
}

/// Number of entries left in the staging directory.
pub fn leftovers(dir: &TempDir) -> usize {
    fs::read_dir(dir.path()).map(Iterator::count).unwrap_or_default()
}

/// A minimal probe report for a two-stream file.
pub const PROBE_REPORT: &str = r#"{
    "streams": [
        {"index": 0, "codec_type": "video", "codec_name": "h264", "width": 1920,
         "height": 1080, "r_frame_rate": "30000/1001", "pix_fmt": "yuv420p"},
        {"index": 1, "codec_type": "audio", "codec_name": "aac",
         "sample_rate": "48000", "channels": 2, "channel_layout": "stereo"}
    ],
    "format": {"format_name": "mov,mp4,m4a,3gp,3g2,mj2", "duration": "12.5",
               "size": "1048576", "bit_rate": "671088", "nb_streams": 2}
}"#;
