//! Operation requests and their defaults.
//!
//! An [`Operation`] is resolved once per execution and handed to the
//! pipeline; each variant carries everything its jobs need, so nothing is
//! looked up again per item.

use std::path::Path;

/// Default merge template, read through the concat demuxer.
pub const MERGE_TEMPLATE: &str =
    "-f concat -safe 0 -i \"{input}\" -c:v libx264 -c:a aac \"{output}\"";

/// Default overlay template: video stream copied, audio re-encoded.
pub const OVERLAY_TEMPLATE: &str = "-i \"{video}\" -i \"{audio}\" -c:v copy -c:a aac \"{output}\"";

/// Default custom template.
pub const CUSTOM_TEMPLATE: &str = "-i \"{input}\" -vf \"transpose=1\" \"{output}\"";

/// Default convert template.
pub const CONVERT_TEMPLATE: &str = "-i \"{input}\"{bitrate_option} \"{output}\"";

/// Default name given to produced files.
pub const DEFAULT_OUTPUT_FILE_NAME: &str = "output.mp4";

/// Default binary property receiving produced files.
pub const DEFAULT_OUTPUT_BINARY: &str = "outputData";

/// Default minimum number of inputs for a merge.
pub const DEFAULT_MIN_FILES: usize = 2;

/// Default container format for convert.
pub const DEFAULT_OUTPUT_FORMAT: &str = "mp4";

/// Stem used when an output file name has none.
const FALLBACK_STEM: &str = "output";

/// Where and under which name a produced file is delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSpec {
    /// Name given to the produced file.
    pub file_name: String,
    /// Binary property the file is stored under.
    pub binary_property: String,
}

impl OutputSpec {
    /// Creates an output specification.
    #[must_use]
    pub fn new(file_name: impl Into<String>, binary_property: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            binary_property: binary_property.into(),
        }
    }

    /// Extension of the configured file name, without the dot.
    #[must_use]
    pub fn extension(&self) -> &str {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
    }

    /// File name without directories or extension.
    #[must_use]
    pub fn stem(&self) -> &str {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .unwrap_or(FALLBACK_STEM)
    }
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_FILE_NAME, DEFAULT_OUTPUT_BINARY)
    }
}

/// Parameters for concatenating every item's first payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeParams {
    /// Fewer qualifying inputs than this is an error, unless there are none.
    pub min_files: usize,
    /// Command template; `{input}` is the concat manifest.
    pub template: String,
    /// Output delivery.
    pub output: OutputSpec,
}

impl Default for MergeParams {
    fn default() -> Self {
        Self {
            min_files: DEFAULT_MIN_FILES,
            template: MERGE_TEMPLATE.to_owned(),
            output: OutputSpec::default(),
        }
    }
}

/// Parameters for combining a video payload with an audio payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayParams {
    /// Command template using `{video}`, `{audio}` and `{output}`.
    pub template: String,
    /// Output delivery.
    pub output: OutputSpec,
    /// Binary key holding the video; the first payload when unset.
    pub video_binary: Option<String>,
    /// Binary key holding the audio; the second payload when unset.
    pub audio_binary: Option<String>,
}

impl Default for OverlayParams {
    fn default() -> Self {
        Self {
            template: OVERLAY_TEMPLATE.to_owned(),
            output: OutputSpec::default(),
            video_binary: None,
            audio_binary: None,
        }
    }
}

/// Parameters for an arbitrary single-input command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomParams {
    /// Command template using `{input}` and `{output}`.
    pub template: String,
    /// Output delivery.
    pub output: OutputSpec,
}

impl Default for CustomParams {
    fn default() -> Self {
        Self {
            template: CUSTOM_TEMPLATE.to_owned(),
            output: OutputSpec::default(),
        }
    }
}

/// Parameters for re-encoding into another container format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertParams {
    /// Command template using `{input}`, `{output}` and `{bitrate_option}`.
    pub template: String,
    /// Output delivery; only the stem of the file name is kept.
    pub output: OutputSpec,
    /// Target container format, e.g. `mp3` or `webm`.
    pub output_format: String,
    /// Audio bitrate such as `192k`; empty leaves the tool's default.
    pub bitrate: String,
}

impl ConvertParams {
    /// Target format without a leading dot.
    #[must_use]
    pub fn format(&self) -> &str {
        self.output_format.trim().trim_start_matches('.')
    }

    /// Name of the delivered file: the configured stem plus the target format.
    #[must_use]
    pub fn output_file_name(&self) -> String {
        format!("{}.{}", self.output.stem(), self.format())
    }
}

impl Default for ConvertParams {
    fn default() -> Self {
        Self {
            template: CONVERT_TEMPLATE.to_owned(),
            output: OutputSpec::default(),
            output_format: DEFAULT_OUTPUT_FORMAT.to_owned(),
            bitrate: String::new(),
        }
    }
}

/// A fully parameterised media operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Concatenate the first payload of every item into one file.
    Merge(MergeParams),
    /// Combine a video and an audio payload per item.
    Overlay(OverlayParams),
    /// Report container and stream metadata per item.
    Info,
    /// Run a free-form template against each item.
    Custom(CustomParams),
    /// Re-encode each item into another format.
    Convert(ConvertParams),
}

impl Operation {
    /// Short name used in staged file names and log events.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Merge(_) => "merge",
            Self::Overlay(_) => "overlay",
            Self::Info => "info",
            Self::Custom(_) => "custom",
            Self::Convert(_) => "convert",
        }
    }

    /// Output delivery, for operations that produce a file.
    #[must_use]
    pub const fn output(&self) -> Option<&OutputSpec> {
        match self {
            Self::Merge(params) => Some(&params.output),
            Self::Overlay(params) => Some(&params.output),
            Self::Custom(params) => Some(&params.output),
            Self::Convert(params) => Some(&params.output),
            Self::Info => None,
        }
    }
}

#[cfg(test)]
mod tests;
