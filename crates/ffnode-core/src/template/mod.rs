//! Command template rendering.
//!
//! Templates carry `{name}` placeholders. Rendering is a single left-to-right
//! pass: each `{name}` whose name appears in the substitution list is replaced
//! by its value, every other brace sequence is copied through untouched, and
//! substituted text is never scanned again. No quoting is added; templates
//! embed whatever quotes the tool's command line needs.

/// Placeholder for the primary input path (or the concat manifest for merge).
pub const INPUT: &str = "input";
/// Placeholder for the output path.
pub const OUTPUT: &str = "output";
/// Placeholder for the overlay video input path.
pub const VIDEO: &str = "video";
/// Placeholder for the overlay audio input path.
pub const AUDIO: &str = "audio";
/// Placeholder for the optional convert bitrate fragment.
pub const BITRATE_OPTION: &str = "bitrate_option";

/// Placeholder name paired with its replacement text.
pub type Substitution = (&'static str, String);

/// Renders `template`, replacing every known placeholder.
///
/// # Example
///
/// ```
/// use ffnode_core::template::{self, render};
///
/// let rendered = render(
///     "-i \"{input}\" -vf \"{filter}\" \"{output}\"",
///     &[
///         (template::INPUT, String::from("/tmp/a.mov")),
///         (template::OUTPUT, String::from("/tmp/b.mp4")),
///     ],
/// );
/// assert_eq!(rendered, "-i \"/tmp/a.mov\" -vf \"{filter}\" \"/tmp/b.mp4\"");
/// ```
#[must_use]
pub fn render(template: &str, substitutions: &[Substitution]) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        let (before, from_brace) = rest.split_at(open);
        rendered.push_str(before);

        // A brace that does not open a known placeholder is copied as-is.
        let (value, consumed) = placeholder_at(from_brace, substitutions).unwrap_or(("{", 1));
        rendered.push_str(value);
        rest = from_brace.get(consumed..).unwrap_or_default();
    }

    rendered.push_str(rest);
    rendered
}

/// Matches a known `{name}` token at the start of `text`.
///
/// Returns the replacement and the number of bytes the token spans.
fn placeholder_at<'a>(text: &str, substitutions: &'a [Substitution]) -> Option<(&'a str, usize)> {
    let close = text.find('}')?;
    let name = text.get(1..close)?;
    substitutions
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, value)| (value.as_str(), close + 1))
}

/// Renders the convert operation's optional bitrate fragment.
///
/// An empty (or blank) bitrate yields an empty fragment so the tool keeps its
/// default; otherwise the fragment is ` -b:a <bitrate>` with a leading space.
#[must_use]
pub fn bitrate_option(bitrate: &str) -> String {
    let trimmed = bitrate.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(" -b:a {trimmed}")
    }
}
