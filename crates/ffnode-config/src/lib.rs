//! Shared configuration for the `ffnode` media pipeline.
//!
//! Configuration is layered by `ortho_config`: built-in defaults, then an
//! optional TOML file (`--config-path` or `FFNODE_CONFIG_PATH`), then
//! `FFNODE_*` environment variables, then command-line flags. The resolved
//! [`Config`] is built once per execution and handed to the pipeline; nothing
//! re-reads it while items are being processed.

mod defaults;
mod logging;
mod policy;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_PROBE_TOOL, DEFAULT_SHELL, DEFAULT_TOOL, default_failure_policy,
    default_log_filter, default_log_filter_string, default_log_format, default_probe_tool,
    default_shell, default_staging_dir, default_tool,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use policy::{FailurePolicy, FailurePolicyParseError};

/// Runtime configuration resolved from defaults, files, environment and CLI.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "FFNODE")]
pub struct Config {
    /// External media tool invoked with each rendered command line.
    #[serde(default = "default_tool")]
    tool: String,
    /// Metadata probe invoked by the info operation.
    #[serde(default = "default_probe_tool")]
    probe_tool: String,
    /// Shell used to interpret rendered command lines.
    #[serde(default = "default_shell")]
    shell: String,
    /// Directory receiving temporary files; the platform default when unset.
    #[serde(default)]
    staging_dir: Option<Utf8PathBuf>,
    /// Upper bound on a single tool invocation; unbounded when unset.
    #[serde(default)]
    timeout_secs: Option<u64>,
    /// Whether an item failure aborts the run or is recorded and skipped.
    #[serde(default = "default_failure_policy")]
    failure_policy: FailurePolicy,
    /// Tracing filter expression.
    #[serde(default = "default_log_filter_string")]
    log_filter: String,
    /// Log output format.
    #[serde(default = "default_log_format")]
    log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tool: default_tool(),
            probe_tool: default_probe_tool(),
            shell: default_shell(),
            staging_dir: None,
            timeout_secs: None,
            failure_policy: default_failure_policy(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// External media tool program name.
    #[must_use]
    pub fn tool(&self) -> &str {
        self.tool.as_str()
    }

    /// Probe program used by the info operation.
    #[must_use]
    pub fn probe_tool(&self) -> &str {
        self.probe_tool.as_str()
    }

    /// Shell used to run rendered command lines.
    #[must_use]
    pub fn shell(&self) -> &str {
        self.shell.as_str()
    }

    /// Configured staging directory override, if any.
    #[must_use]
    pub fn staging_dir_override(&self) -> Option<&Utf8Path> {
        self.staging_dir.as_deref()
    }

    /// Staging directory, falling back to the platform temporary directory.
    #[must_use]
    pub fn staging_dir(&self) -> Utf8PathBuf {
        self.staging_dir.clone().unwrap_or_else(default_staging_dir)
    }

    /// Per-invocation timeout in seconds, if bounded.
    #[must_use]
    pub const fn timeout_secs(&self) -> Option<u64> {
        self.timeout_secs
    }

    /// Item failure policy.
    #[must_use]
    pub const fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Replaces the tool program name.
    #[must_use]
    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = tool.into();
        self
    }

    /// Replaces the staging directory override.
    #[must_use]
    pub fn with_staging_dir(mut self, dir: Utf8PathBuf) -> Self {
        self.staging_dir = Some(dir);
        self
    }

    /// Replaces the tracing filter expression.
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Replaces the failure policy.
    #[must_use]
    pub const fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}
