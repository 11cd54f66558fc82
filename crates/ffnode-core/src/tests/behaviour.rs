//! Behaviour-driven tests for the operation pipeline.

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

use crate::error::PipelineError;
use crate::operation::{ConvertParams, MergeParams, Operation};
use crate::protocol::{Item, ResultRecord};
use crate::runner::Pipeline;

use super::{Invocation, RecordingExecutor, leftovers, media_item, settings_in};

// ---------------------------------------------------------------------------
// Test world
// ---------------------------------------------------------------------------

struct TestWorld {
    dir: TempDir,
    items: Vec<Item>,
    output: Vec<u8>,
    failing_calls: Vec<usize>,
    continue_on_failure: bool,
    outcome: Option<Result<Vec<ResultRecord>, PipelineError>>,
    invocations: Vec<Invocation>,
}

#[fixture]
fn world() -> TestWorld {
    TestWorld {
        dir: TempDir::new().expect("create staging dir"),
        items: Vec::new(),
        output: Vec::new(),
        failing_calls: Vec::new(),
        continue_on_failure: false,
        outcome: None,
        invocations: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn run_operation(world: &mut TestWorld, operation: &Operation) {
    let executor = RecordingExecutor::writing(&world.output).failing_on(&world.failing_calls);
    let settings = settings_in(&world.dir).with_continue_on_failure(world.continue_on_failure);
    let pipeline = Pipeline::new(executor, settings);
    world.outcome = Some(pipeline.run(operation, &world.items));
    world.invocations = pipeline.executor().invocations();
}

/// Extracts the records of a successful run.
/// Panics if nothing ran or the run failed.
fn records(world: &TestWorld) -> &[ResultRecord] {
    world
        .outcome
        .as_ref()
        .expect("no operation ran")
        .as_ref()
        .expect("expected success but got error")
}

fn record_at(world: &TestWorld, position: usize) -> &ResultRecord {
    records(world).get(position).expect("record exists")
}

// ---------------------------------------------------------------------------
// Given steps
// ---------------------------------------------------------------------------

#[given("an item carrying {file_name}")]
fn given_item(world: &mut TestWorld, file_name: String) {
    let name = file_name.trim_matches('"');
    world.items.push(media_item(name, name.as_bytes()));
}

#[given("an item without binary data")]
fn given_empty_item(world: &mut TestWorld) {
    world.items.push(Item::new());
}

#[given("a tool that writes {content}")]
fn given_tool_output(world: &mut TestWorld, content: String) {
    world.output = content.trim_matches('"').as_bytes().to_vec();
}

#[given("a tool that fails on its first call")]
fn given_failing_tool(world: &mut TestWorld) {
    world.failing_calls = vec![0];
}

#[given("failures are recorded and processing continues")]
fn given_continue_policy(world: &mut TestWorld) {
    world.continue_on_failure = true;
}

// ---------------------------------------------------------------------------
// When steps
// ---------------------------------------------------------------------------

#[when("the convert operation runs with format {format}")]
fn when_convert(world: &mut TestWorld, format: String) {
    let operation = Operation::Convert(ConvertParams {
        output_format: format.trim_matches('"').to_owned(),
        ..ConvertParams::default()
    });
    run_operation(world, &operation);
}

#[when("the merge operation runs")]
fn when_merge(world: &mut TestWorld) {
    run_operation(world, &Operation::Merge(MergeParams::default()));
}

// ---------------------------------------------------------------------------
// Then steps
// ---------------------------------------------------------------------------

#[then("one record is produced for item {item}")]
fn then_single_record(world: &mut TestWorld, item: usize) {
    let produced = records(world);
    assert_eq!(produced.len(), 1);
    assert_eq!(record_at(world, 0).paired_item().item(), item);
}

#[then("no records are produced")]
fn then_no_records(world: &mut TestWorld) {
    assert!(records(world).is_empty());
}

#[then("the output is named {file_name} with type {mime}")]
fn then_output_named(world: &mut TestWorld, file_name: String, mime: String) {
    let record = record_at(world, 0);
    let payload = record
        .binary()
        .get("outputData")
        .expect("output payload present");
    assert_eq!(payload.file_name(), Some(file_name.trim_matches('"')));
    assert_eq!(payload.mime_type(), Some(mime.trim_matches('"')));
}

#[then("the tool was invoked {count} times")]
fn then_invocations(world: &mut TestWorld, count: usize) {
    assert_eq!(world.invocations.len(), count);
}

#[then("the manifest listed {count} files")]
fn then_manifest(world: &mut TestWorld, count: usize) {
    let manifest = world
        .invocations
        .first()
        .and_then(|call| call.manifest.as_deref())
        .expect("manifest was staged");
    assert_eq!(manifest.lines().count(), count);
}

#[then("record {position} reports a failure mentioning {text}")]
fn then_failure_record(world: &mut TestWorld, position: usize, text: String) {
    let summary = record_at(world, position).json();
    assert!(!summary.success);
    let error = summary.error.as_deref().expect("error text present");
    assert!(error.contains(text.trim_matches('"')), "unexpected error: {error}");
}

#[then("record {position} reports success")]
fn then_success_record(world: &mut TestWorld, position: usize) {
    assert!(record_at(world, position).json().success);
}

#[then("no staged files remain")]
fn then_clean(world: &mut TestWorld) {
    assert_eq!(leftovers(&world.dir), 0);
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/pipeline.feature",
    name = "Converting a single clip"
)]
fn converting_a_single_clip(world: TestWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/pipeline.feature", name = "Merging two clips")]
fn merging_two_clips(world: TestWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/pipeline.feature",
    name = "Items without binary data are skipped"
)]
fn items_without_binary_are_skipped(world: TestWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/pipeline.feature",
    name = "A failing tool under the continue policy"
)]
fn failing_tool_under_continue_policy(world: TestWorld) {
    let _ = world;
}
