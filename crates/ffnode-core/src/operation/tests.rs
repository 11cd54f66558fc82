//! Unit tests for operation parameters.

use rstest::rstest;

use super::*;

#[test]
fn defaults_match_the_node_parameters() {
    let merge = MergeParams::default();
    assert_eq!(merge.min_files, 2);
    assert_eq!(merge.output.file_name, "output.mp4");
    assert_eq!(merge.output.binary_property, "outputData");

    let convert = ConvertParams::default();
    assert_eq!(convert.output_format, "mp4");
    assert!(convert.bitrate.is_empty());
    assert_eq!(convert.template, "-i \"{input}\"{bitrate_option} \"{output}\"");
}

#[rstest]
#[case::replaces_extension("song.wav", "mp3", "song.mp3")]
#[case::default_name("output.mp4", "webm", "output.webm")]
#[case::drops_directories("renders/final.mov", "gif", "final.gif")]
#[case::no_extension("clip", "mkv", "clip.mkv")]
#[case::dotted_format("clip.mp4", ".flac", "clip.flac")]
#[case::empty_name("", "mp4", "output.mp4")]
fn convert_output_name_uses_stem_and_format(
    #[case] file_name: &str,
    #[case] format: &str,
    #[case] expected: &str,
) {
    let params = ConvertParams {
        output: OutputSpec::new(file_name, DEFAULT_OUTPUT_BINARY),
        output_format: format.to_owned(),
        ..ConvertParams::default()
    };
    assert_eq!(params.output_file_name(), expected);
}

#[rstest]
#[case("output.mp4", "mp4")]
#[case("anim.GIF", "GIF")]
#[case("noext", "")]
fn output_extension(#[case] file_name: &str, #[case] expected: &str) {
    assert_eq!(OutputSpec::new(file_name, "data").extension(), expected);
}

#[rstest]
#[case(Operation::Merge(MergeParams::default()), "merge")]
#[case(Operation::Overlay(OverlayParams::default()), "overlay")]
#[case(Operation::Info, "info")]
#[case(Operation::Custom(CustomParams::default()), "custom")]
#[case(Operation::Convert(ConvertParams::default()), "convert")]
fn labels(#[case] operation: Operation, #[case] label: &str) {
    assert_eq!(operation.label(), label);
}

#[test]
fn info_has_no_output() {
    assert!(Operation::Info.output().is_none());
    assert!(Operation::Custom(CustomParams::default()).output().is_some());
}
