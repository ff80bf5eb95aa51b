//! Integration tests for the frame codec
//!
//! Covers the wire contract: round trips under both compression settings,
//! the empty-buffer sentinel, schema enforcement, coalesced buffers, malformed
//! input, the encode whitelist and sticky handling.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::uninlined_format_args
)]

use relay_protocol::core::frame::{decode, encode, encode_record, FrameCodec};
use relay_protocol::core::message::{Message, MessageKind, Record};
use relay_protocol::error::{DecodeCause, ProtocolError};
use relay_protocol::utils::compression::CompressionKind;
use serde_json::{json, Value};

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

fn raw_frame(value: Value) -> Vec<u8> {
    let mut text = value.to_string();
    text.push('\n');
    text.into_bytes()
}

fn sample_messages() -> Vec<Message> {
    vec![
        Message::register(0, json!({"role": "toy", "name": "rover"})),
        Message::register(1, json!(null)).with_uid("pre-assigned"),
        Message::status(2, json!({"battery": 81, "ok": true}), "toy-1"),
        Message::command(3, json!({"left": -0.5, "right": 0.5}), "ctl-1").with_sticky(true),
        Message::ping(4, json!({}), "toy-1"),
        Message::error(5, json!("channel full"), "ctl-1"),
    ]
}

#[test]
fn test_roundtrip_both_compression_settings() {
    for compressed in [false, true] {
        for msg in sample_messages() {
            let bytes = encode(&msg, compressed).expect("encode");
            let decoded = decode(&bytes, compressed)
                .expect("decode")
                .expect("non-empty buffer");
            assert_eq!(decoded, msg, "compressed={}", compressed);
        }
    }
}

#[test]
fn test_roundtrip_restricted_to_whitelist() {
    let msg = Message::status(9, json!([1, 2, 3]), "toy-9").with_extra("remote", "10.1.1.1");
    for compressed in [false, true] {
        let bytes = encode(&msg, compressed).unwrap();
        let decoded = decode(&bytes, compressed).unwrap().unwrap();
        assert_eq!(decoded, msg.whitelisted());
        assert!(decoded.extra().is_empty());
    }
}

#[test]
fn test_zstd_roundtrip() {
    let codec = FrameCodec::new(CompressionKind::Zstd);
    for msg in sample_messages() {
        let bytes = codec.encode(&msg, true).unwrap();
        assert_eq!(codec.decode(&bytes, true).unwrap(), Some(msg));
    }
}

#[test]
fn test_empty_buffer_is_sentinel() {
    assert!(decode(&[], false).unwrap().is_none());
    assert!(decode(&[], true).unwrap().is_none());

    let zstd = FrameCodec::new(CompressionKind::Zstd);
    assert!(zstd.decode(&[], true).unwrap().is_none());
}

#[test]
fn test_missing_required_fields_per_kind() {
    for kind in MessageKind::ALL {
        for field in ["seq", "data", "uid"] {
            if field == "uid" && kind == MessageKind::Register {
                continue;
            }
            let mut rec = record(json!({"type": kind.as_str(), "seq": 1, "data": {}, "uid": "x"}));
            rec.remove(field);
            let bytes = raw_frame(Value::Object(rec));

            match decode(&bytes, false) {
                Err(ProtocolError::MissingField(name)) => assert_eq!(name, field),
                other => panic!("{} without {}: {:?}", kind, field, other),
            }
        }
    }
}

#[test]
fn test_register_without_uid_valid_others_invalid() {
    let bytes = raw_frame(json!({"type": "register", "seq": 1, "data": {}}));
    let msg = decode(&bytes, false).unwrap().unwrap();
    assert_eq!(msg.kind(), MessageKind::Register);
    assert_eq!(msg.uid(), None);

    for kind in ["status", "command", "ping", "error"] {
        let bytes = raw_frame(json!({"type": kind, "seq": 1, "data": {}}));
        assert!(matches!(
            decode(&bytes, false),
            Err(ProtocolError::MissingField("uid"))
        ));
    }
}

#[test]
fn test_unknown_type() {
    let bytes = raw_frame(json!({"type": "foo", "seq": 1, "data": {}, "uid": "x"}));
    match decode(&bytes, false) {
        Err(ProtocolError::UnknownType(name)) => assert_eq!(name, "foo"),
        other => panic!("Expected UnknownType, got {:?}", other),
    }

    let bytes = raw_frame(json!({"seq": 1, "data": {}, "uid": "x"}));
    assert!(matches!(
        decode(&bytes, false),
        Err(ProtocolError::UnknownType(_))
    ));
}

#[test]
fn test_multi_frame_with_trailing_delimiter() {
    let text = "{\"type\":\"ping\",\"seq\":1,\"data\":\"A\",\"uid\":\"u\"}\n\
                {\"type\":\"ping\",\"seq\":2,\"data\":\"B\",\"uid\":\"u\"}\n";
    let msg = decode(text.as_bytes(), false).unwrap().unwrap();
    assert_eq!(msg.seq(), 2);
    assert_eq!(msg.data(), &json!("B"));
}

#[test]
fn test_multi_frame_without_trailing_delimiter() {
    let text = "{\"type\":\"ping\",\"seq\":1,\"data\":\"A\",\"uid\":\"u\"}\n\
                {\"type\":\"ping\",\"seq\":2,\"data\":\"B\",\"uid\":\"u\"}";
    let msg = decode(text.as_bytes(), false).unwrap().unwrap();
    assert_eq!(msg.seq(), 2);
    assert_eq!(msg.data(), &json!("B"));
}

#[test]
fn test_multi_frame_compressed_buffer() {
    // A sender that batches frames before compressing
    let first = Message::status(1, json!("A"), "u");
    let second = Message::status(2, json!("B"), "u");
    let mut text = String::from_utf8(encode(&first, false).unwrap()).unwrap();
    text.push_str(&String::from_utf8(encode(&second, false).unwrap()).unwrap());

    let bytes = relay_protocol::utils::compression::compress(text.as_bytes(), &CompressionKind::Lz4)
        .unwrap();
    assert_eq!(decode(&bytes, true).unwrap(), Some(second));
}

#[test]
fn test_earlier_invalid_frames_are_ignored() {
    let text = "garbage that is not json\n{\"type\":\"register\",\"seq\":3,\"data\":{}}\n";
    let msg = decode(text.as_bytes(), false).unwrap().unwrap();
    assert_eq!(msg.seq(), 3);
}

#[test]
fn test_malformed_json_carries_raw_text() {
    let raw = "{\"type\": \"ping\", oops";
    match decode(raw.as_bytes(), false) {
        Err(ProtocolError::Decode {
            source: DecodeCause::Json(_),
            raw: payload,
        }) => assert_eq!(payload, raw),
        other => panic!("Expected Decode error, got {:?}", other),
    }
}

#[test]
fn test_decode_error_message_mentions_payload() {
    let err = decode(b"hello there", false).unwrap_err();
    assert!(err.to_string().contains("hello there"));
}

#[test]
fn test_non_object_is_corrupt() {
    assert!(matches!(
        decode(b"[1,2]\n", false),
        Err(ProtocolError::CorruptMessage)
    ));
}

#[test]
fn test_encode_drops_unrecognized_fields() {
    let rec = record(json!({
        "type": "command", "seq": 10, "data": {"x": 1}, "uid": "toy", "password": "hunter2"
    }));
    let bytes = encode_record(&rec, false).unwrap();
    let text = String::from_utf8(bytes.clone()).unwrap();
    assert!(!text.contains("password"));

    let decoded = decode(&bytes, false).unwrap().unwrap();
    assert!(decoded.extra().get("password").is_none());
    assert_eq!(decoded.kind(), MessageKind::Command);
}

#[test]
fn test_sticky_false_omitted() {
    let msg = Message::status(1, json!({}), "toy").with_sticky(false);
    let text = String::from_utf8(encode(&msg, false).unwrap()).unwrap();
    assert!(!text.contains("sticky"));

    let rec = record(json!({"type": "status", "seq": 1, "data": {}, "uid": "t", "sticky": false}));
    let text = String::from_utf8(encode_record(&rec, false).unwrap()).unwrap();
    assert!(!text.contains("sticky"));
}

#[test]
fn test_sticky_true_survives() {
    let msg = Message::command(1, json!({}), "toy").with_sticky(true);
    let bytes = encode(&msg, false).unwrap();
    assert!(String::from_utf8(bytes.clone()).unwrap().contains("\"sticky\":true"));
    assert!(decode(&bytes, false).unwrap().unwrap().is_sticky());
}

#[test]
fn test_exactly_one_terminator() {
    let bytes = encode(&Message::ping(1, json!("a\nb"), "u"), false).unwrap();
    let newlines = bytes.iter().filter(|b| **b == b'\n').count();
    assert_eq!(newlines, 1, "embedded newlines in data must be escaped");
    assert_eq!(bytes.last(), Some(&b'\n'));
}

#[test]
fn test_decode_keeps_unknown_fields() {
    let bytes = raw_frame(json!({
        "type": "status", "seq": 4, "data": {}, "uid": "t", "rssi": -40
    }));
    let msg = decode(&bytes, false).unwrap().unwrap();
    assert_eq!(msg.extra().get("rssi"), Some(&json!(-40)));
}

#[test]
fn test_falsy_required_values_accepted() {
    let bytes = raw_frame(json!({"type": "status", "seq": 0, "data": 0, "uid": ""}));
    let msg = decode(&bytes, false).unwrap().unwrap();
    assert_eq!(msg.seq(), 0);
    assert_eq!(msg.uid(), Some(""));
}

#[test]
fn test_present_but_mistyped_fields_are_invalid() {
    // Presence passes validation; the typed message still needs the right JSON types
    let cases = [
        (json!({"type": "ping", "seq": 1, "data": {}, "uid": null}), "uid"),
        (json!({"type": "status", "seq": "1", "data": {}, "uid": "t"}), "seq"),
        (json!({"type": "command", "seq": u64::MAX, "data": {}, "uid": "t"}), "seq"),
        (json!({"type": "register", "seq": 1, "data": {}, "sticky": 1}), "sticky"),
    ];

    for (value, expected) in cases {
        let bytes = raw_frame(value);
        match decode(&bytes, false) {
            Err(ProtocolError::InvalidField { field, .. }) => assert_eq!(field, expected),
            other => panic!("Expected InvalidField({}), got {:?}", expected, other),
        }
    }
}
