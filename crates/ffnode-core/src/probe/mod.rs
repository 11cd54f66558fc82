//! Parsing of the probe tool's JSON report into record metadata.
//!
//! The info operation runs the probe against a staged input with
//! `-print_format json -show_format -show_streams` and captures its stdout.
//! The probe reports most numbers as strings; they are converted here so the
//! record carries real numbers where the value parses and omits them where
//! it does not.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Fixed arguments placed before the input path in the probe command.
pub const PROBE_ARGUMENTS: &str = "-v quiet -print_format json -show_format -show_streams";

/// Container-level and per-stream metadata for one media file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MediaInfo {
    /// Container information.
    pub format: FormatInfo,
    /// One entry per stream, in probe order.
    pub streams: Vec<StreamInfo>,
}

/// Container-level metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FormatInfo {
    /// Short format name (e.g. `mov,mp4,m4a,3gp,3g2,mj2`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_name: Option<String>,
    /// Descriptive format name (e.g. `QuickTime / MOV`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_long_name: Option<String>,
    /// Duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// File size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Overall bitrate in bits per second.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bit_rate: Option<u64>,
    /// Number of streams in the container.
    #[serde(default)]
    pub stream_count: usize,
    /// Container tags such as `title` or `creation_time`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

/// Metadata for a single audio, video, or other stream.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StreamInfo {
    /// Stream position inside the container.
    pub index: u32,
    /// `video`, `audio`, `subtitle`, `data`, ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec_type: Option<String>,
    /// Codec short name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec_name: Option<String>,
    /// Codec descriptive name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec_long_name: Option<String>,
    /// Frame width in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Frame height in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Frames per second.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<f64>,
    /// Pixel format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pix_fmt: Option<String>,
    /// Sample rate in Hz.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    /// Audio channel count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<u32>,
    /// Audio channel layout (e.g. `stereo`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_layout: Option<String>,
    /// Stream duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Stream bitrate in bits per second.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bit_rate: Option<u64>,
}

/// Parses the probe's JSON report.
///
/// # Errors
///
/// Returns the JSON error when `report` is not a probe JSON document.
pub fn parse_report(report: &str) -> Result<MediaInfo, serde_json::Error> {
    let raw: RawReport = serde_json::from_str(report)?;
    Ok(MediaInfo {
        format: raw.format.map(FormatInfo::from).unwrap_or_default(),
        streams: raw.streams.into_iter().map(StreamInfo::from).collect(),
    })
}

// Probe JSON as emitted; numeric fields arrive as strings.

#[derive(Debug, Deserialize)]
struct RawReport {
    #[serde(default)]
    format: Option<RawFormat>,
    #[serde(default)]
    streams: Vec<RawStream>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    format_name: Option<String>,
    format_long_name: Option<String>,
    duration: Option<String>,
    size: Option<String>,
    bit_rate: Option<String>,
    nb_streams: Option<usize>,
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct RawStream {
    #[serde(default)]
    index: u32,
    codec_type: Option<String>,
    codec_name: Option<String>,
    codec_long_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    pix_fmt: Option<String>,
    sample_rate: Option<String>,
    channels: Option<u32>,
    channel_layout: Option<String>,
    duration: Option<String>,
    bit_rate: Option<String>,
}

impl From<RawFormat> for FormatInfo {
    fn from(raw: RawFormat) -> Self {
        Self {
            format_name: raw.format_name,
            format_long_name: raw.format_long_name,
            duration: parse_number(raw.duration.as_deref()),
            size: parse_number(raw.size.as_deref()),
            bit_rate: parse_number(raw.bit_rate.as_deref()),
            stream_count: raw.nb_streams.unwrap_or(0),
            tags: raw.tags,
        }
    }
}

impl From<RawStream> for StreamInfo {
    fn from(raw: RawStream) -> Self {
        Self {
            index: raw.index,
            codec_type: raw.codec_type,
            codec_name: raw.codec_name,
            codec_long_name: raw.codec_long_name,
            width: raw.width,
            height: raw.height,
            frame_rate: raw.r_frame_rate.as_deref().and_then(parse_rate),
            pix_fmt: raw.pix_fmt,
            sample_rate: parse_number(raw.sample_rate.as_deref()),
            channels: raw.channels,
            channel_layout: raw.channel_layout,
            duration: parse_number(raw.duration.as_deref()),
            bit_rate: parse_number(raw.bit_rate.as_deref()),
        }
    }
}

fn parse_number<T: std::str::FromStr>(value: Option<&str>) -> Option<T> {
    value.and_then(|text| text.trim().parse().ok())
}

/// Parses `30000/1001` style rates; `0/0` (unknown) yields `None`.
#[expect(
    clippy::float_arithmetic,
    reason = "frame rates are reported as rational numbers"
)]
fn parse_rate(rate: &str) -> Option<f64> {
    rate.split_once('/').map_or_else(
        || rate.trim().parse().ok(),
        |(top, bottom)| {
            let numerator: f64 = top.trim().parse().ok()?;
            let denominator: f64 = bottom.trim().parse().ok()?;
            (denominator != 0.0).then(|| numerator / denominator)
        },
    )
}
