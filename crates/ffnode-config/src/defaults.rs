use camino::Utf8PathBuf;

use crate::logging::LogFormat;
use crate::policy::FailurePolicy;

/// Program invoked for every rendered command.
pub const DEFAULT_TOOL: &str = "ffmpeg";

/// Program invoked by the info operation.
pub const DEFAULT_PROBE_TOOL: &str = "ffprobe";

/// Shell used to interpret rendered command lines.
#[cfg(unix)]
pub const DEFAULT_SHELL: &str = "sh";

/// Shell used to interpret rendered command lines.
#[cfg(not(unix))]
pub const DEFAULT_SHELL: &str = "cmd";

/// Default log filter expression used by the binary.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default log filter expression used by the binary.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binary.
pub fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

/// Owned default tool name.
pub fn default_tool() -> String {
    DEFAULT_TOOL.to_owned()
}

/// Owned default probe tool name.
pub fn default_probe_tool() -> String {
    DEFAULT_PROBE_TOOL.to_owned()
}

/// Owned default shell name.
pub fn default_shell() -> String {
    DEFAULT_SHELL.to_owned()
}

/// Default failure policy: abort the run on the first failing item.
pub fn default_failure_policy() -> FailurePolicy {
    FailurePolicy::Abort
}

/// Directory used for staging when no override is configured.
///
/// Falls back to `/tmp` when the platform temporary directory is not valid
/// UTF-8.
pub fn default_staging_dir() -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(std::env::temp_dir())
        .unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}
