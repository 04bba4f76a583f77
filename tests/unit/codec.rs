//! Codec properties over the public API

use ghosttag::codec::{
    decode_payload, encode_hex_tag, encode_marker_and_tag, encode_marker_and_tag_bytes,
    locate_marker, parse_payload, tag_to_hex, try_parse_payload, MARKER, MARKER_HEX,
};
use ghosttag::errors::CodecError;

#[test]
fn test_marker_constants_agree() {
    assert_eq!(hex::encode(MARKER), MARKER_HEX);
}

#[test]
fn test_locate_after_arbitrary_prefix() {
    for tag in ["a", "mytag", "campaign-2024", "ünïcode"] {
        for prefix in ["", "0x", "0xdeadbeef", "0xa9059cbb000000000000"] {
            let input = format!("{}{}", prefix, encode_marker_and_tag(tag));
            assert_eq!(
                locate_marker(&input, &tag_to_hex(tag)),
                Some(input.len()),
                "tag {:?} after prefix {:?}",
                tag,
                prefix
            );
        }
    }
}

#[test]
fn test_locate_is_case_insensitive() {
    let input = format!("0x{}", encode_marker_and_tag("mytag")).to_uppercase();
    assert!(locate_marker(&input, &tag_to_hex("mytag")).is_some());
}

#[test]
fn test_locate_returns_first_occurrence() {
    let once = encode_marker_and_tag("t");
    let input = format!("0x{}aa{}bb", once, once);
    assert_eq!(locate_marker(&input, &tag_to_hex("t")), Some(2 + once.len()));
}

#[test]
fn test_tag_prefix_of_another_tag_matches() {
    // Detection is a plain substring search, so "my" also matches "mytag"
    let input = format!("0x{}", encode_marker_and_tag("mytag"));
    let offset = locate_marker(&input, &tag_to_hex("my")).unwrap();
    assert_eq!(decode_payload(&input[offset..]).unwrap(), "tag");
}

#[test]
fn test_hex_tag_and_bytes_variants() {
    assert_eq!(
        encode_hex_tag("0xCAFE").unwrap(),
        format!("{}cafe", MARKER_HEX)
    );
    assert_eq!(
        encode_marker_and_tag_bytes(b"hi").unwrap(),
        encode_marker_and_tag("hi")
    );
    assert!(matches!(
        encode_marker_and_tag_bytes(&[0xff, 0xfe]),
        Err(CodecError::InvalidUtf8(_))
    ));
}

#[test]
fn test_decode_errors() {
    assert!(matches!(decode_payload("abc"), Err(CodecError::InvalidHex(_))));
    assert!(matches!(decode_payload("ff"), Err(CodecError::InvalidUtf8(_))));
    assert_eq!(decode_payload("").unwrap(), "");
}

#[test]
fn test_json_projection_is_exact_subset() {
    let payload = r#"{"user":"alice","amount":30,"meta":{"a":[1,2]},"flag":true}"#;
    let keys = ["user", "amount", "meta", "flag", "absent"];
    let parsed = parse_payload(payload, &keys);

    assert_eq!(parsed.len(), 4);
    assert_eq!(parsed["user"], "alice");
    assert_eq!(parsed["amount"], "30");
    assert_eq!(parsed["meta"], r#"{"a":[1,2]}"#);
    assert_eq!(parsed["flag"], "true");

    // Same input, same output
    assert_eq!(parse_payload(payload, &keys), parsed);
}

#[test]
fn test_invalid_json_recovers_to_empty() {
    assert!(parse_payload(r#"{"a": }"#, &["a"]).is_empty());
    assert!(try_parse_payload(r#"{"a": }"#, &["a"]).is_err());
}

#[test]
fn test_flat_payload_examples() {
    let parsed = parse_payload("name:alice,age:30", &["name", "age"]);
    assert_eq!(parsed["name"], "alice");
    assert_eq!(parsed["age"], "30");

    let parsed = parse_payload("ref=abc123,campaign=q4", &["campaign"]);
    assert_eq!(parsed["campaign"], "q4");
}

#[test]
fn test_no_keys_means_no_fields() {
    let empty: [&str; 0] = [];
    assert!(parse_payload(r#"{"a":"b"}"#, &empty).is_empty());
    assert!(parse_payload("a:b", &empty).is_empty());
}
