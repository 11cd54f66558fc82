//! Fixed output-format to MIME type table.

/// MIME type used when the format is not in the table.
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Maps an output format (file extension without the dot) to its MIME type.
///
/// Matching ignores ASCII case and a leading dot; anything outside the
/// table maps to [`FALLBACK_MIME_TYPE`].
///
/// # Example
///
/// ```
/// use ffnode_core::mime::mime_for_format;
///
/// assert_eq!(mime_for_format("gif"), "image/gif");
/// assert_eq!(mime_for_format("xyz"), "application/octet-stream");
/// ```
#[must_use]
pub fn mime_for_format(format: &str) -> &'static str {
    let normalised = format.trim_start_matches('.').to_ascii_lowercase();
    match normalised.as_str() {
        "mp3" => "audio/mpeg",
        "aac" => "audio/aac",
        "flac" => "audio/flac",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "mov" => "video/quicktime",
        "gif" => "image/gif",
        _ => FALLBACK_MIME_TYPE,
    }
}
