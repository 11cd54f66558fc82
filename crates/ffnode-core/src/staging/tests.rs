//! Unit tests for temporary file staging.

use std::path::Path;

use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::*;

#[fixture]
fn dir() -> TempDir {
    TempDir::new().expect("create staging dir")
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[rstest]
fn stage_input_writes_decoded_bytes(dir: TempDir) {
    let area = StagingArea::new(dir.path());
    let payload = BinaryPayload::from_bytes(b"frames", Some("clip.mov"), None);

    let staged = area.stage_input("convert", 0, &payload).expect("stage input");

    assert_eq!(staged.purpose(), FilePurpose::Input);
    assert!(staged.path().starts_with(dir.path()));
    assert_eq!(std::fs::read(staged.path()).expect("read staged"), b"frames");
    let name = file_name(staged.path());
    assert!(name.starts_with("ffconvert_in_"), "unexpected name {name}");
    assert!(name.ends_with(".mov"), "unexpected name {name}");
}

#[rstest]
#[case::no_name(None)]
#[case::no_extension(Some("recording"))]
fn stage_input_falls_back_to_tmp_extension(dir: TempDir, #[case] name: Option<&str>) {
    let area = StagingArea::new(dir.path());
    let payload = BinaryPayload::from_bytes(b"x", name, None);
    let staged = area.stage_input("custom", 0, &payload).expect("stage input");
    assert!(file_name(staged.path()).ends_with(".tmp"));
}

#[rstest]
fn stage_input_rejects_bad_base64(dir: TempDir) {
    let area = StagingArea::new(dir.path());
    let err = area
        .stage_input("convert", 3, &BinaryPayload::new("%%%"))
        .expect_err("decode should fail");
    assert!(matches!(err, PipelineError::InvalidPayload { item: 3, .. }));
    let leftovers = std::fs::read_dir(dir.path()).expect("list dir").count();
    assert_eq!(leftovers, 0, "nothing should be staged for a bad payload");
}

#[rstest]
fn names_are_unique_within_a_millisecond(dir: TempDir) {
    let area = StagingArea::new(dir.path());
    let payload = BinaryPayload::from_bytes(b"x", Some("a.mp4"), None);
    let first = area.stage_input("merge", 0, &payload).expect("first");
    let second = area.stage_input("merge", 1, &payload).expect("second");
    assert_ne!(first.path(), second.path());
}

#[rstest]
fn reserved_output_does_not_exist_yet(dir: TempDir) {
    let area = StagingArea::new(dir.path());
    let output = area.reserve_output("convert", "mp4").expect("reserve");
    assert_eq!(output.purpose(), FilePurpose::Output);
    assert!(!output.path().exists());
    assert!(file_name(output.path()).ends_with(".mp4"));
}

#[rstest]
fn release_removes_file_and_tolerates_absence(dir: TempDir) {
    let area = StagingArea::new(dir.path());
    let staged = area
        .stage_input("convert", 0, &BinaryPayload::from_bytes(b"x", None, None))
        .expect("stage");
    let path = staged.path().to_path_buf();
    staged.release().expect("release existing");
    assert!(!path.exists());

    let never_written = area.reserve_output("convert", "mp4").expect("reserve");
    never_written.release().expect("release absent file");
}

#[rstest]
fn drop_removes_file(dir: TempDir) {
    let area = StagingArea::new(dir.path());
    let staged = area
        .stage_input("overlay_video", 0, &BinaryPayload::from_bytes(b"x", None, None))
        .expect("stage");
    let path = staged.path().to_path_buf();
    drop(staged);
    assert!(!path.exists());
}

#[rstest]
fn read_of_missing_output_is_filesystem_error(dir: TempDir) {
    let area = StagingArea::new(dir.path());
    let output = area.reserve_output("custom", "mp4").expect("reserve");
    let err = output.read().expect_err("nothing was written");
    assert!(matches!(
        err,
        PipelineError::Filesystem {
            action: FileAction::Read,
            ..
        }
    ));
}

#[rstest]
fn manifest_lists_inputs_in_order(dir: TempDir) {
    let area = StagingArea::new(dir.path());
    let manifest = area
        .stage_manifest("merge", &[Path::new("/tmp/a.mp4"), Path::new("/tmp/b.mp4")])
        .expect("stage manifest");
    let body = std::fs::read_to_string(manifest.path()).expect("read manifest");
    assert_eq!(body, "file '/tmp/a.mp4'\nfile '/tmp/b.mp4'\n");
    assert_eq!(manifest.purpose(), FilePurpose::Manifest);
}

#[test]
fn manifest_escapes_single_quotes() {
    let body = concat_manifest(&[Path::new("/tmp/it's.mp4")]);
    assert_eq!(body, "file '/tmp/it'\\''s.mp4'\n");
}

#[rstest]
fn release_all_clears_every_file(dir: TempDir) {
    let area = StagingArea::new(dir.path());
    let mut files = StagedFiles::new();
    files.push(
        area.stage_input("merge", 0, &BinaryPayload::from_bytes(b"a", None, None))
            .expect("stage a"),
    );
    files.push(area.reserve_output("merge", "mp4").expect("reserve"));
    let paths = files.paths();
    assert_eq!(paths.len(), 2);

    files.release_all().expect("release all");
    assert!(paths.iter().all(|path| !path.exists()));
}
