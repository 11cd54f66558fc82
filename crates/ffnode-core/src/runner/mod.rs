//! Pipeline orchestrating one operation over an ordered item list.
//!
//! [`Pipeline::run`] first turns the operation and its items into an ordered
//! list of jobs, then drives every job through the same routine: stage the
//! inputs, render the command, invoke the tool, read the output back, build
//! a [`ResultRecord`], and release every staged file whatever the outcome.
//!
//! Process execution sits behind the [`ToolExecutor`] trait so tests can
//! substitute doubles that never spawn a real tool.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{FileAction, PipelineError, ToolFailure};
use crate::mime::mime_for_format;
use crate::operation::{ConvertParams, CustomParams, MergeParams, Operation, OverlayParams};
use crate::probe::{PROBE_ARGUMENTS, parse_report};
use crate::process::ToolCommand;
use crate::protocol::{BinaryPayload, Item, PairedItem, RecordSummary, ResultRecord};
use crate::staging::{StagedFiles, StagingArea};
use crate::template::{
    AUDIO, BITRATE_OPTION, INPUT, OUTPUT, Substitution, VIDEO, bitrate_option, render,
};

/// Tracing target for pipeline orchestration.
const RUNNER_TARGET: &str = "ffnode_core::runner";

/// Trait abstracting external tool execution for testability.
///
/// The production implementation is
/// [`ShellExecutor`](crate::process::ShellExecutor), which hands the command
/// line to a shell and blocks until it exits.
///
/// # Example
///
/// ```
/// use ffnode_core::error::ToolFailure;
/// use ffnode_core::process::ToolCommand;
/// use ffnode_core::runner::ToolExecutor;
///
/// struct Succeed;
///
/// impl ToolExecutor for Succeed {
///     fn run(&self, _command: &ToolCommand) -> Result<(), ToolFailure> {
///         Ok(())
///     }
///
///     fn capture(&self, _command: &ToolCommand) -> Result<String, ToolFailure> {
///         Ok(String::from("{}"))
///     }
/// }
/// ```
pub trait ToolExecutor {
    /// Runs the command to completion, passing its output streams through.
    ///
    /// # Errors
    ///
    /// Returns a [`ToolFailure`] if the process cannot be spawned, times
    /// out, or exits unsuccessfully.
    fn run(&self, command: &ToolCommand) -> Result<(), ToolFailure>;

    /// Runs the command to completion and returns its standard output.
    ///
    /// # Errors
    ///
    /// Returns a [`ToolFailure`] under the same conditions as
    /// [`ToolExecutor::run`].
    fn capture(&self, command: &ToolCommand) -> Result<String, ToolFailure>;
}

/// Execution settings shared by every job of a run.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    tool: String,
    probe_tool: String,
    staging: StagingArea,
    continue_on_failure: bool,
}

impl PipelineSettings {
    /// Creates settings for the given tool and probe programs.
    #[must_use]
    pub fn new(tool: impl Into<String>, probe_tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            probe_tool: probe_tool.into(),
            staging: StagingArea::system(),
            continue_on_failure: false,
        }
    }

    /// Stages temporary files in `staging`.
    #[must_use]
    pub fn with_staging(mut self, staging: StagingArea) -> Self {
        self.staging = staging;
        self
    }

    /// When set, a failed item yields an error record instead of aborting.
    #[must_use]
    pub const fn with_continue_on_failure(mut self, continue_on_failure: bool) -> Self {
        self.continue_on_failure = continue_on_failure;
        self
    }

    /// Media tool program.
    #[must_use]
    pub const fn tool(&self) -> &str {
        self.tool.as_str()
    }

    /// Probe tool program.
    #[must_use]
    pub const fn probe_tool(&self) -> &str {
        self.probe_tool.as_str()
    }

    /// Staging area for temporary files.
    #[must_use]
    pub const fn staging(&self) -> &StagingArea {
        &self.staging
    }

    /// Whether failed items are reported as records.
    #[must_use]
    pub const fn continue_on_failure(&self) -> bool {
        self.continue_on_failure
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

/// Runs operations over item lists through an executor.
#[derive(Debug)]
pub struct Pipeline<E> {
    executor: E,
    settings: PipelineSettings,
}

impl<E> Pipeline<E> {
    /// Creates a pipeline with the given executor and settings.
    #[must_use]
    pub const fn new(executor: E, settings: PipelineSettings) -> Self {
        Self { executor, settings }
    }

    /// Returns the executor.
    #[must_use]
    pub const fn executor(&self) -> &E {
        &self.executor
    }

    /// Returns the settings.
    #[must_use]
    pub const fn settings(&self) -> &PipelineSettings {
        &self.settings
    }
}

impl<E: ToolExecutor> Pipeline<E> {
    /// Runs `operation` over `items`, returning one record per job in input
    /// order.
    ///
    /// Items without the payloads an operation needs are skipped, so the
    /// result may be shorter than the input; each record's `pairedItem`
    /// points back at its source position.
    ///
    /// # Errors
    ///
    /// Returns the first job's error unless the settings continue on
    /// failure, and [`PipelineError::InsufficientInputs`] when a merge has
    /// fewer inputs than required.
    pub fn run(
        &self,
        operation: &Operation,
        items: &[Item],
    ) -> Result<Vec<ResultRecord>, PipelineError> {
        let jobs = plan(operation, items)?;
        info!(
            target: RUNNER_TARGET,
            operation = operation.label(),
            items = items.len(),
            jobs = jobs.len(),
            "running operation"
        );

        let mut records = Vec::with_capacity(jobs.len());
        for job in &jobs {
            match self.execute_job(job) {
                Ok(record) => records.push(record),
                Err(err) if self.settings.continue_on_failure => {
                    warn!(
                        target: RUNNER_TARGET,
                        operation = job.label,
                        item = job.paired_item,
                        error = %err,
                        "job failed, continuing"
                    );
                    records.push(failure_record(job, &err));
                }
                Err(err) => return Err(err),
            }
        }
        Ok(records)
    }

    fn execute_job(&self, job: &Job<'_>) -> Result<ResultRecord, PipelineError> {
        debug!(
            target: RUNNER_TARGET,
            operation = job.label,
            item = job.paired_item,
            "starting job"
        );
        let mut staged = StagedFiles::new();
        let outcome = match &job.task {
            Task::Probe(source) => self.probe(job, source, &mut staged),
            Task::Transcode(transcode) => self.transcode(job, transcode, &mut staged),
        };
        let released = staged.release_all();
        let record = outcome?;
        released?;
        Ok(record)
    }

    fn probe(
        &self,
        job: &Job<'_>,
        source: &Source<'_>,
        staged: &mut StagedFiles,
    ) -> Result<ResultRecord, PipelineError> {
        let input = self.stage(job.label, source, staged)?;
        let file_size = fs::metadata(&input)
            .map(|meta| meta.len())
            .map_err(|err| PipelineError::filesystem(FileAction::Read, &input, err))?;
        let arguments = format!("{PROBE_ARGUMENTS} \"{}\"", input.display());
        let command =
            ToolCommand::new(self.settings.probe_tool(), arguments).with_staged(vec![input]);

        let line = command.command_line();
        info!(target: RUNNER_TARGET, command = %line, "probing input");
        let report = self
            .executor
            .capture(&command)
            .map_err(|reason| external_tool(&command, reason))?;
        let media = parse_report(&report).map_err(|source| PipelineError::ProbeOutput {
            command: line.clone(),
            source: Arc::new(source),
        })?;

        let summary = RecordSummary {
            success: true,
            file_size: Some(file_size),
            input_file_name: source.file_name(),
            command: line,
            media: Some(media),
            ..RecordSummary::default()
        };
        Ok(ResultRecord::new(summary, PairedItem::new(job.paired_item)))
    }

    fn transcode(
        &self,
        job: &Job<'_>,
        transcode: &Transcode<'_>,
        staged: &mut StagedFiles,
    ) -> Result<ResultRecord, PipelineError> {
        let mut substitutions = self.stage_inputs(job.label, &transcode.inputs, staged)?;
        let output = self
            .settings
            .staging
            .reserve_output(job.label, &transcode.delivery.format)?;
        substitutions.push((OUTPUT, path_text(output.path())));
        if let Some(option) = &transcode.bitrate_option {
            substitutions.push((BITRATE_OPTION, option.clone()));
        }

        let arguments = render(transcode.template, &substitutions);
        let command = ToolCommand::new(self.settings.tool(), arguments)
            .with_output(output.path().to_path_buf())
            .with_staged(staged.paths());
        info!(target: RUNNER_TARGET, command = %command, "invoking tool");

        let produced = self
            .executor
            .run(&command)
            .map_err(|reason| external_tool(&command, reason))
            .and_then(|()| output.read());
        staged.push(output);
        let bytes = produced?;

        let delivery = &transcode.delivery;
        let file_size = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        let payload = BinaryPayload::from_bytes(
            &bytes,
            Some(&delivery.file_name),
            Some(mime_for_format(&delivery.format)),
        );
        let summary = RecordSummary {
            success: true,
            file_size: Some(file_size),
            output_file_name: Some(delivery.file_name.clone()),
            command: command.command_line(),
            ..transcode.inputs.summary()
        };
        Ok(ResultRecord::new(summary, PairedItem::new(job.paired_item))
            .with_binary(delivery.binary_property, payload))
    }

    fn stage_inputs(
        &self,
        label: &str,
        inputs: &Inputs<'_>,
        staged: &mut StagedFiles,
    ) -> Result<Vec<Substitution>, PipelineError> {
        match inputs {
            Inputs::Single(source) => {
                let path = self.stage(label, source, staged)?;
                Ok(vec![(INPUT, path_text(&path))])
            }
            Inputs::Concat(sources) => {
                let mut paths = Vec::with_capacity(sources.len());
                for source in sources {
                    paths.push(self.stage(label, source, staged)?);
                }
                let listed: Vec<&Path> = paths.iter().map(PathBuf::as_path).collect();
                let manifest = self.settings.staging.stage_manifest(label, &listed)?;
                let manifest_path = path_text(manifest.path());
                staged.push(manifest);
                Ok(vec![(INPUT, manifest_path)])
            }
            Inputs::VideoAudio { video, audio } => {
                let video_path = self.stage(label, video, staged)?;
                let audio_path = self.stage(label, audio, staged)?;
                Ok(vec![
                    (VIDEO, path_text(&video_path)),
                    (AUDIO, path_text(&audio_path)),
                ])
            }
        }
    }

    fn stage(
        &self,
        label: &str,
        source: &Source<'_>,
        staged: &mut StagedFiles,
    ) -> Result<PathBuf, PipelineError> {
        let file = self
            .settings
            .staging
            .stage_input(label, source.item, source.payload)?;
        let path = file.path().to_path_buf();
        staged.push(file);
        Ok(path)
    }
}

// ---------------------------------------------------------------------------
// Job planning
// ---------------------------------------------------------------------------

/// One tool invocation and the record it produces.
#[derive(Debug)]
struct Job<'a> {
    label: &'static str,
    paired_item: usize,
    task: Task<'a>,
}

#[derive(Debug)]
enum Task<'a> {
    Probe(Source<'a>),
    Transcode(Transcode<'a>),
}

#[derive(Debug)]
struct Transcode<'a> {
    inputs: Inputs<'a>,
    template: &'a str,
    bitrate_option: Option<String>,
    delivery: Delivery<'a>,
}

/// How a produced file is named, typed, and stored.
#[derive(Debug)]
struct Delivery<'a> {
    file_name: String,
    format: String,
    binary_property: &'a str,
}

#[derive(Debug)]
enum Inputs<'a> {
    Single(Source<'a>),
    Concat(Vec<Source<'a>>),
    VideoAudio { video: Source<'a>, audio: Source<'a> },
}

impl Inputs<'_> {
    /// Input names for the record.
    fn summary(&self) -> RecordSummary {
        match self {
            Self::Single(source) | Self::VideoAudio { video: source, .. } => RecordSummary {
                input_file_name: source.file_name(),
                ..RecordSummary::default()
            },
            Self::Concat(sources) => RecordSummary {
                input_file_names: sources
                    .iter()
                    .map(|source| source.file_name().unwrap_or_default())
                    .collect(),
                ..RecordSummary::default()
            },
        }
    }
}

/// A payload together with the position of the item carrying it.
#[derive(Debug, Clone, Copy)]
struct Source<'a> {
    item: usize,
    payload: &'a BinaryPayload,
}

impl Source<'_> {
    fn file_name(&self) -> Option<String> {
        self.payload.file_name().map(str::to_owned)
    }
}

fn plan<'a>(operation: &'a Operation, items: &'a [Item]) -> Result<Vec<Job<'a>>, PipelineError> {
    let label = operation.label();
    match operation {
        Operation::Merge(params) => plan_merge(params, items),
        Operation::Overlay(params) => Ok(plan_overlay(params, items)),
        Operation::Info => Ok(plan_single(label, items, Task::Probe)),
        Operation::Custom(params) => Ok(plan_custom(label, params, items)),
        Operation::Convert(params) => Ok(plan_convert(label, params, items)),
    }
}

/// One job per item carrying at least one payload.
fn plan_single<'a>(
    label: &'static str,
    items: &'a [Item],
    task: impl Fn(Source<'a>) -> Task<'a>,
) -> Vec<Job<'a>> {
    first_sources(label, items)
        .map(|source| Job {
            label,
            paired_item: source.item,
            task: task(source),
        })
        .collect()
}

fn plan_custom<'a>(
    label: &'static str,
    params: &'a CustomParams,
    items: &'a [Item],
) -> Vec<Job<'a>> {
    plan_single(label, items, |source| {
        Task::Transcode(Transcode {
            inputs: Inputs::Single(source),
            template: &params.template,
            bitrate_option: None,
            delivery: Delivery {
                file_name: params.output.file_name.clone(),
                format: params.output.extension().to_owned(),
                binary_property: &params.output.binary_property,
            },
        })
    })
}

fn plan_convert<'a>(
    label: &'static str,
    params: &'a ConvertParams,
    items: &'a [Item],
) -> Vec<Job<'a>> {
    plan_single(label, items, |source| {
        Task::Transcode(Transcode {
            inputs: Inputs::Single(source),
            template: &params.template,
            bitrate_option: Some(bitrate_option(&params.bitrate)),
            delivery: Delivery {
                file_name: params.output_file_name(),
                format: params.format().to_owned(),
                binary_property: &params.output.binary_property,
            },
        })
    })
}

fn plan_overlay<'a>(params: &'a OverlayParams, items: &'a [Item]) -> Vec<Job<'a>> {
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let Some((video, audio)) = pick_pair(params, item) else {
                debug!(
                    target: RUNNER_TARGET,
                    operation = "overlay",
                    item = index,
                    "skipping item without video and audio payloads"
                );
                return None;
            };
            Some(Job {
                label: "overlay",
                paired_item: index,
                task: Task::Transcode(Transcode {
                    inputs: Inputs::VideoAudio {
                        video: Source { item: index, payload: video },
                        audio: Source { item: index, payload: audio },
                    },
                    template: &params.template,
                    bitrate_option: None,
                    delivery: Delivery {
                        file_name: params.output.file_name.clone(),
                        format: params.output.extension().to_owned(),
                        binary_property: &params.output.binary_property,
                    },
                }),
            })
        })
        .collect()
}

/// Video and audio payloads for an overlay job.
///
/// A configured key selects its payload; the other side falls back to the
/// first payload with data under a different key. With no keys the first
/// two payloads with data are video and audio, in that order.
fn pick_pair<'a>(
    params: &OverlayParams,
    item: &'a Item,
) -> Option<(&'a BinaryPayload, &'a BinaryPayload)> {
    match (params.video_binary.as_deref(), params.audio_binary.as_deref()) {
        (Some(video_key), Some(audio_key)) => Some((
            item.binary_named(video_key)?,
            item.binary_named(audio_key)?,
        )),
        (Some(video_key), None) => {
            let video = item.binary_named(video_key)?;
            Some((video, first_other(item, video_key)?))
        }
        (None, Some(audio_key)) => {
            let audio = item.binary_named(audio_key)?;
            Some((first_other(item, audio_key)?, audio))
        }
        (None, None) => {
            let (video_key, video) = item.first_binary()?;
            Some((video, first_other(item, video_key)?))
        }
    }
}

fn first_other<'a>(item: &'a Item, taken: &str) -> Option<&'a BinaryPayload> {
    item.binaries_with_data()
        .find(|(name, _)| *name != taken)
        .map(|(_, payload)| payload)
}

fn plan_merge<'a>(
    params: &'a MergeParams,
    items: &'a [Item],
) -> Result<Vec<Job<'a>>, PipelineError> {
    let label = "merge";
    let sources: Vec<Source<'a>> = first_sources(label, items).collect();
    // Nothing to merge is a skip; too few inputs is an error.
    let Some(first) = sources.first().map(|source| source.item) else {
        return Ok(Vec::new());
    };
    if sources.len() < params.min_files {
        return Err(PipelineError::InsufficientInputs {
            required: params.min_files,
            available: sources.len(),
        });
    }
    Ok(vec![Job {
        label,
        paired_item: first,
        task: Task::Transcode(Transcode {
            inputs: Inputs::Concat(sources),
            template: &params.template,
            bitrate_option: None,
            delivery: Delivery {
                file_name: params.output.file_name.clone(),
                format: params.output.extension().to_owned(),
                binary_property: &params.output.binary_property,
            },
        }),
    }])
}

/// First payload of every item that has one, logging the skipped items.
fn first_sources<'a>(
    label: &'static str,
    items: &'a [Item],
) -> impl Iterator<Item = Source<'a>> {
    items.iter().enumerate().filter_map(move |(index, item)| {
        let Some((_, payload)) = item.first_binary() else {
            debug!(
                target: RUNNER_TARGET,
                operation = label,
                item = index,
                "skipping item without binary data"
            );
            return None;
        };
        Some(Source {
            item: index,
            payload,
        })
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn external_tool(command: &ToolCommand, reason: ToolFailure) -> PipelineError {
    PipelineError::ExternalTool {
        command: command.command_line(),
        reason,
    }
}

fn failure_record(job: &Job<'_>, err: &PipelineError) -> ResultRecord {
    let inputs = match &job.task {
        Task::Probe(source) => RecordSummary {
            input_file_name: source.file_name(),
            ..RecordSummary::default()
        },
        Task::Transcode(transcode) => transcode.inputs.summary(),
    };
    let summary = RecordSummary {
        success: false,
        command: err.command().unwrap_or_default().to_owned(),
        error: Some(err.to_string()),
        ..inputs
    };
    ResultRecord::new(summary, PairedItem::new(job.paired_item))
}

fn path_text(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
