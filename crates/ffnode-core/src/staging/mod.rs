//! Scoped temporary files surrounding one tool invocation.
//!
//! Every job stages its inputs, an optional concat manifest, and a reserved
//! output path in the staging directory. Names combine the operation label,
//! the file's purpose, a millisecond timestamp, and a random token, so jobs
//! from concurrent runs never collide. A [`StagedFile`] removes its file when
//! released and, as a backstop, when dropped; a file that is already gone is
//! not an error.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{Builder, TempPath};
use time::OffsetDateTime;
use tracing::debug;

use crate::error::{FileAction, PipelineError};
use crate::protocol::BinaryPayload;

/// Tracing target for staging operations.
const STAGING_TARGET: &str = "ffnode_core::staging";

/// Extension used when an input's original file name has none.
const FALLBACK_EXTENSION: &str = "tmp";

/// Length of the random token in staged file names.
const RANDOM_LEN: usize = 10;

/// Role a staged file plays in a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilePurpose {
    /// Decoded input payload.
    Input,
    /// Path reserved for the tool's output.
    Output,
    /// Concat manifest listing staged inputs.
    Manifest,
}

impl FilePurpose {
    /// Short tag used in staged file names.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Input => "in",
            Self::Output => "out",
            Self::Manifest => "list",
        }
    }
}

impl fmt::Display for FilePurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A temporary file owned by exactly one job.
#[derive(Debug)]
pub struct StagedFile {
    path: TempPath,
    purpose: FilePurpose,
}

impl StagedFile {
    /// Filesystem location of the staged file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Role of the file in its job.
    #[must_use]
    pub const fn purpose(&self) -> FilePurpose {
        self.purpose
    }

    /// Reads the whole file into memory.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Filesystem`] when the file cannot be read,
    /// including when the tool never created it.
    pub fn read(&self) -> Result<Vec<u8>, PipelineError> {
        fs::read(self.path())
            .map_err(|err| PipelineError::filesystem(FileAction::Read, self.path(), err))
    }

    /// Removes the file if it exists.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Filesystem`] when an existing file cannot be
    /// removed.
    pub fn release(self) -> Result<(), PipelineError> {
        let location = self.path().to_path_buf();
        if !location.exists() {
            debug!(
                target: STAGING_TARGET,
                path = %location.display(),
                "staged file already absent"
            );
            return Ok(());
        }
        self.path
            .close()
            .map_err(|err| PipelineError::filesystem(FileAction::Remove, &location, err))?;
        debug!(target: STAGING_TARGET, path = %location.display(), "released staged file");
        Ok(())
    }
}

/// Every file staged for one job, released together.
#[derive(Debug, Default)]
pub struct StagedFiles {
    files: Vec<StagedFile>,
}

impl StagedFiles {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { files: Vec::new() }
    }

    /// Takes ownership of a staged file.
    pub fn push(&mut self, file: StagedFile) {
        self.files.push(file);
    }

    /// Paths of every file in the set, in staging order.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|file| file.path().to_path_buf()).collect()
    }

    /// Releases every file, attempting all of them even after a failure.
    ///
    /// # Errors
    ///
    /// Returns the first removal error encountered.
    pub fn release_all(self) -> Result<(), PipelineError> {
        let mut first_error = None;
        for file in self.files {
            if let Err(err) = file.release() {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Directory in which jobs stage their files.
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    /// Stages files under `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Stages files under the platform temporary directory.
    #[must_use]
    pub fn system() -> Self {
        Self::new(std::env::temp_dir())
    }

    /// The staging directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.dir.as_path()
    }

    /// Decodes `payload` and writes it to a fresh input file.
    ///
    /// The extension is taken from the payload's original file name, falling
    /// back to `.tmp`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidPayload`] when the data is not base64
    /// and [`PipelineError::Filesystem`] when the file cannot be written.
    pub fn stage_input(
        &self,
        label: &str,
        item: usize,
        payload: &BinaryPayload,
    ) -> Result<StagedFile, PipelineError> {
        let bytes = payload
            .decode()
            .map_err(|source| PipelineError::InvalidPayload { item, source })?;
        let extension = payload
            .file_name()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .unwrap_or(FALLBACK_EXTENSION);
        self.write_file(label, FilePurpose::Input, extension, &bytes)
    }

    /// Writes a concat manifest referencing `inputs` in order.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Filesystem`] when the manifest cannot be
    /// written.
    pub fn stage_manifest(
        &self,
        label: &str,
        inputs: &[&Path],
    ) -> Result<StagedFile, PipelineError> {
        let body = concat_manifest(inputs);
        self.write_file(label, FilePurpose::Manifest, "txt", body.as_bytes())
    }

    /// Reserves a collision-free output path without creating the file.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Filesystem`] when no name can be generated.
    pub fn reserve_output(
        &self,
        label: &str,
        extension: &str,
    ) -> Result<StagedFile, PipelineError> {
        let prefix = file_prefix(label, FilePurpose::Output);
        let suffix = extension_suffix(extension);
        let reserved = Builder::new()
            .prefix(&prefix)
            .suffix(&suffix)
            .rand_bytes(RANDOM_LEN)
            .make_in(&self.dir, |path| Ok(path.to_path_buf()))
            .map_err(|err| PipelineError::filesystem(FileAction::Write, &self.dir, err))?;
        let staged = StagedFile {
            path: reserved.into_temp_path(),
            purpose: FilePurpose::Output,
        };
        debug!(target: STAGING_TARGET, path = %staged.path().display(), "reserved output path");
        Ok(staged)
    }

    fn write_file(
        &self,
        label: &str,
        purpose: FilePurpose,
        extension: &str,
        bytes: &[u8],
    ) -> Result<StagedFile, PipelineError> {
        let prefix = file_prefix(label, purpose);
        let suffix = extension_suffix(extension);
        let mut file = Builder::new()
            .prefix(&prefix)
            .suffix(&suffix)
            .rand_bytes(RANDOM_LEN)
            .tempfile_in(&self.dir)
            .map_err(|err| PipelineError::filesystem(FileAction::Write, &self.dir, err))?;

        // Keep the file owned by a TempPath before writing so a failed write
        // still removes it.
        let write_result = file.write_all(bytes).and_then(|()| file.flush());
        let staged = StagedFile {
            path: file.into_temp_path(),
            purpose,
        };
        write_result
            .map_err(|err| PipelineError::filesystem(FileAction::Write, staged.path(), err))?;

        debug!(
            target: STAGING_TARGET,
            path = %staged.path().display(),
            purpose = %purpose,
            bytes = bytes.len(),
            "staged file"
        );
        Ok(staged)
    }
}

impl Default for StagingArea {
    fn default() -> Self {
        Self::system()
    }
}

/// Renders the concat demuxer manifest: one `file '<path>'` line per input.
///
/// Single quotes inside paths are written as `'\''`.
#[must_use]
pub fn concat_manifest(inputs: &[&Path]) -> String {
    inputs
        .iter()
        .map(|path| {
            let escaped = path.to_string_lossy().replace('\'', "'\\''");
            format!("file '{escaped}'\n")
        })
        .collect()
}

fn file_prefix(label: &str, purpose: FilePurpose) -> String {
    format!("ff{label}_{}_{}_", purpose.tag(), timestamp_millis())
}

fn extension_suffix(extension: &str) -> String {
    let trimmed = extension.trim_start_matches('.');
    if trimmed.is_empty() {
        format!(".{FALLBACK_EXTENSION}")
    } else {
        format!(".{trimmed}")
    }
}

fn timestamp_millis() -> i64 {
    let now = OffsetDateTime::now_utc();
    now.unix_timestamp() * 1000 + i64::from(now.millisecond())
}

#[cfg(test)]
mod tests;
