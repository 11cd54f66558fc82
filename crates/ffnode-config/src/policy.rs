use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How the pipeline reacts when processing a single item fails.
///
/// `Abort` stops the whole run at the first failure and surfaces the error.
/// `Continue` records the failure on the item's result record and moves on to
/// the next item.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum FailurePolicy {
    /// Fail fast: the first item error aborts the run.
    #[default]
    Abort,
    /// Isolate failures to the item that produced them.
    Continue,
}

/// Errors encountered while parsing a [`FailurePolicy`] from text.
pub type FailurePolicyParseError = strum::ParseError;
