//! Unit tests for the item and record wire types.

use rstest::rstest;
use serde_json::json;

use super::*;

#[test]
fn item_binary_keeps_document_order() {
    let item: Item = serde_json::from_value(json!({
        "json": {},
        "binary": {
            "zeta": { "data": "AAAA", "fileName": "z.mp4" },
            "alpha": { "data": "BBBB", "fileName": "a.mp4" }
        }
    }))
    .expect("deserialise item");

    let keys: Vec<&str> = item.binary().iter().map(|(key, _)| key).collect();
    assert_eq!(keys, vec!["zeta", "alpha"]);
    assert_eq!(item.first_binary().map(|(key, _)| key), Some("zeta"));
}

#[rstest]
#[case::missing_binary(json!({ "json": { "a": 1 } }))]
#[case::null_binary(json!({ "binary": null }))]
#[case::empty_binary(json!({ "binary": {} }))]
#[case::empty_data(json!({ "binary": { "data": { "data": "", "fileName": "x.mov" } } }))]
fn items_without_usable_binary_have_no_first_payload(#[case] raw: serde_json::Value) {
    let item: Item = serde_json::from_value(raw).expect("deserialise item");
    assert!(item.first_binary().is_none());
}

#[test]
fn first_binary_skips_empty_payloads() {
    let item = Item::with_binary("empty", BinaryPayload::new(""))
        .and_binary("real", BinaryPayload::new("AAAA"));
    assert_eq!(item.first_binary().map(|(key, _)| key), Some("real"));
}

#[test]
fn binary_named_ignores_empty_payload() {
    let item = Item::with_binary("video", BinaryPayload::new(""));
    assert!(item.binary_named("video").is_none());
    assert!(item.binary_named("audio").is_none());
}

#[test]
fn payload_round_trips_bytes() {
    let payload =
        BinaryPayload::from_bytes(b"\x00\x01media", Some("clip.mov"), Some("video/quicktime"));
    assert_eq!(payload.decode().expect("decode"), b"\x00\x01media");
    assert_eq!(payload.file_size(), Some(7));
    assert_eq!(payload.file_name(), Some("clip.mov"));
}

#[test]
fn invalid_base64_is_reported() {
    let payload = BinaryPayload::new("not base64!");
    assert!(payload.decode().is_err());
}

#[test]
fn record_serialises_host_shape() {
    let summary = RecordSummary {
        success: true,
        file_size: Some(3),
        input_file_name: Some(String::from("clip.mov")),
        output_file_name: Some(String::from("output.mp4")),
        command: String::from("ffmpeg -i in out"),
        ..RecordSummary::default()
    };
    let record = ResultRecord::new(summary, PairedItem::new(4)).with_binary(
        "outputData",
        BinaryPayload::from_bytes(b"abc", Some("output.mp4"), Some("video/mp4")),
    );

    let value = serde_json::to_value(&record).expect("serialise record");
    assert_eq!(value["json"]["success"], json!(true));
    assert_eq!(value["json"]["outputFileName"], json!("output.mp4"));
    assert_eq!(value["json"]["inputFileName"], json!("clip.mov"));
    assert_eq!(value["binary"]["outputData"]["mimeType"], json!("video/mp4"));
    assert_eq!(value["pairedItem"]["item"], json!(4));
    assert!(value["json"].get("error").is_none());
    assert!(value["json"].get("inputFileNames").is_none());
}

#[test]
fn record_without_binary_omits_binary_field() {
    let record = ResultRecord::new(RecordSummary::default(), PairedItem::new(0));
    let value = serde_json::to_value(&record).expect("serialise record");
    assert!(value.get("binary").is_none());
}
