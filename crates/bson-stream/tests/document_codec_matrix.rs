//! Byte-level matrix for the materializing encode/decode entry points.

use bson_stream::{
    decode, BsonBinary, BsonDecoder, BsonEncoder, BsonValue, DecodeError, DecoderOptions, Uuid,
};

fn doc(fields: &[(&str, BsonValue)]) -> Vec<(String, BsonValue)> {
    fields
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

/// Reference vectors: fields on the left must encode to exactly the bytes
/// on the right, and those bytes must decode back to the same fields.
#[test]
fn scalar_vector_matrix() {
    let cases: Vec<(Vec<(String, BsonValue)>, Vec<u8>)> = vec![
        (
            doc(&[("value", BsonValue::Integer(123))]),
            b"\x10\x00\x00\x00\x10value\x00\x7b\x00\x00\x00\x00".to_vec(),
        ),
        (
            doc(&[("value", BsonValue::Integer(1 << 33))]),
            b"\x14\x00\x00\x00\x12value\x00\x00\x00\x00\x00\x02\x00\x00\x00\x00".to_vec(),
        ),
        (
            doc(&[("value", BsonValue::Null)]),
            b"\x0c\x00\x00\x00\x0avalue\x00\x00".to_vec(),
        ),
        (
            doc(&[("value", BsonValue::Boolean(true))]),
            b"\x0d\x00\x00\x00\x08value\x00\x01\x00".to_vec(),
        ),
        (
            doc(&[("value", BsonValue::Boolean(false))]),
            b"\x0d\x00\x00\x00\x08value\x00\x00\x00".to_vec(),
        ),
        (
            doc(&[("value", BsonValue::Str("\u{03a9}hello".to_string()))]),
            b"\x18\x00\x00\x00\x02value\x00\x08\x00\x00\x00\xce\xa9hello\x00\x00".to_vec(),
        ),
        (
            doc(&[("value", BsonValue::MinKey)]),
            b"\x0c\x00\x00\x00\xffvalue\x00\x00".to_vec(),
        ),
        (
            doc(&[("value", BsonValue::MaxKey)]),
            b"\x0c\x00\x00\x00\x7fvalue\x00\x00".to_vec(),
        ),
        (
            doc(&[("value", BsonValue::Undefined)]),
            b"\x0c\x00\x00\x00\x06value\x00\x00".to_vec(),
        ),
    ];

    for (fields, expected) in cases {
        let bytes = BsonEncoder::new().encode_document(&fields).unwrap();
        assert_eq!(bytes, expected, "encode mismatch for {fields:?}");
        // The length field of every encoded document equals the full span,
        // terminator included.
        let stated = i32::from_le_bytes(bytes[0..4].try_into().unwrap());
        assert_eq!(stated as usize, bytes.len());
        assert_eq!(decode(&bytes).unwrap(), fields, "decode mismatch");
    }
}

#[test]
fn container_vector_matrix() {
    let nested = doc(&[
        (
            "key",
            BsonValue::Document(doc(&[("value", BsonValue::Str("a".to_string()))])),
        ),
        ("key2", BsonValue::Str("b".to_string())),
    ]);
    let bytes = BsonEncoder::new().encode_document(&nested).unwrap();
    assert_eq!(
        bytes,
        b"\x28\x00\x00\x00\x03key\x00\x12\x00\x00\x00\x02value\x00\x02\x00\x00\x00a\x00\x00\x02key2\x00\x02\x00\x00\x00b\x00\x00".as_slice()
    );
    assert_eq!(decode(&bytes).unwrap(), nested);

    let array = doc(&[(
        "value",
        BsonValue::Array((1..=5).map(BsonValue::Integer).collect()),
    )]);
    let bytes = BsonEncoder::new().encode_document(&array).unwrap();
    assert_eq!(
        bytes,
        b"\x34\x00\x00\x00\x04value\x00\x28\x00\x00\x00\x100\x00\x01\x00\x00\x00\x101\x00\x02\x00\x00\x00\x102\x00\x03\x00\x00\x00\x103\x00\x04\x00\x00\x00\x104\x00\x05\x00\x00\x00\x00\x00".as_slice()
    );
    assert_eq!(decode(&bytes).unwrap(), array);
}

#[test]
fn typed_integer_vector_matrix() {
    let data = b"\x39\x00\x00\x00\x10short_int\x00\xb0\x01\x00\x00\x12long_int\x00\x7b\x00\x00\x00\x00\x00\x00\x00\x11uint_type\x00\x7c\x00\x00\x00\x00\x00\x00\x00\x00";
    let options = DecoderOptions {
        typed_integers: true,
        ..Default::default()
    };
    let fields = BsonDecoder::with_options(options).decode(data).unwrap();
    assert_eq!(
        fields,
        doc(&[
            ("short_int", BsonValue::Int32(432)),
            ("long_int", BsonValue::Int64(123)),
            ("uint_type", BsonValue::UInt64(124)),
        ])
    );

    // Width-pinned values re-encode to the original bytes.
    let bytes = BsonEncoder::new().encode_document(&fields).unwrap();
    assert_eq!(bytes, data.as_slice());
}

#[test]
fn mixed_document_roundtrip() {
    let fields = doc(&[
        ("f", BsonValue::Float(-2.5)),
        ("s", BsonValue::Str("text".to_string())),
        (
            "d",
            BsonValue::Document(doc(&[("inner", BsonValue::Integer(-1))])),
        ),
        (
            "a",
            BsonValue::Array(vec![
                BsonValue::Null,
                BsonValue::Boolean(false),
                BsonValue::Array(vec![BsonValue::Str("deep".to_string())]),
            ]),
        ),
        (
            "bin",
            BsonValue::Binary(BsonBinary {
                subtype: 0x02,
                data: vec![0x00, 0xff, 0x7e],
            }),
        ),
        ("id", BsonValue::Uuid(Uuid::from_bytes([0x5a; 16]))),
        ("when", BsonValue::DateTime(1_642_719_035_015)),
        ("count", BsonValue::UInt64(u64::MAX)),
        ("neg", BsonValue::Integer(i64::MIN)),
        ("lo", BsonValue::MinKey),
        ("hi", BsonValue::MaxKey),
    ]);
    let bytes = BsonEncoder::new().encode_document(&fields).unwrap();
    assert_eq!(decode(&bytes).unwrap(), fields);
}

#[test]
fn empty_document_roundtrip() {
    let bytes = BsonEncoder::new().encode_document(&[]).unwrap();
    assert_eq!(bytes, b"\x05\x00\x00\x00\x00");
    assert_eq!(decode(&bytes).unwrap(), vec![]);
}

#[test]
fn keys_with_escaped_characters_roundtrip() {
    let fields = doc(&[
        ("dotted.key", BsonValue::Integer(1)),
        ("", BsonValue::Integer(2)),
        ("\u{03a9}", BsonValue::Integer(3)),
    ]);
    let bytes = BsonEncoder::new().encode_document(&fields).unwrap();
    assert_eq!(decode(&bytes).unwrap(), fields);
}

#[test]
fn deeply_nested_document_roundtrips_without_stack_overflow() {
    const DEPTH: usize = 10_000;

    // Build from the innermost level outward so construction itself never
    // recurses.
    let mut nested: Vec<(String, BsonValue)> =
        vec![("leaf".to_string(), BsonValue::Str("bottom".to_string()))];
    for i in (0..DEPTH).rev() {
        nested = vec![(i.to_string(), BsonValue::Document(nested))];
    }
    let mut fields = nested;
    fields.push(("test".to_string(), BsonValue::Str("passed?".to_string())));

    let bytes = BsonEncoder::new().encode_document(&fields).unwrap();
    let decoded = BsonDecoder::new().decode(&bytes).unwrap();

    // Top-level sibling key survived.
    assert!(decoded
        .iter()
        .any(|(k, v)| k == "test" && *v == BsonValue::Str("passed?".to_string())));

    // The chain is intact all the way down to the leaf.
    let mut cur: &[(String, BsonValue)] = &decoded;
    for i in 0..DEPTH {
        let key = i.to_string();
        let entry = cur
            .iter()
            .find(|(k, _)| *k == key)
            .unwrap_or_else(|| panic!("missing key at depth {i}"));
        match &entry.1 {
            BsonValue::Document(f) => cur = f,
            other => panic!("expected document at depth {i}, got {other:?}"),
        }
    }
    assert_eq!(cur.len(), 1);
    assert_eq!(cur[0].0, "leaf");
    assert_eq!(cur[0].1, BsonValue::Str("bottom".to_string()));

    // Re-encoding the decoded tree reproduces the bytes, which is a full
    // structural comparison without a recursive equality walk.
    let bytes2 = BsonEncoder::new().encode_document(&decoded).unwrap();
    assert_eq!(bytes, bytes2);

    // Tear both trees down iteratively; dropping a 10k-deep tree through
    // the default recursive drop glue is exactly the overflow the engines
    // avoid.
    dismantle(fields);
    dismantle(decoded);
}

fn dismantle(fields: Vec<(String, BsonValue)>) {
    let mut pending: Vec<BsonValue> = fields.into_iter().map(|(_, v)| v).collect();
    while let Some(value) = pending.pop() {
        match value {
            BsonValue::Document(f) => pending.extend(f.into_iter().map(|(_, v)| v)),
            BsonValue::Array(items) => pending.extend(items),
            _ => {}
        }
    }
}

#[test]
fn malformed_inputs_fail_cleanly() {
    // Empty input.
    assert_eq!(decode(b"").unwrap_err(), DecodeError::UnexpectedEof);
    // Length field shorter than the minimum frame.
    assert_eq!(
        decode(b"\x04\x00\x00\x00\x00").unwrap_err(),
        DecodeError::InvalidLength(4)
    );
    // Negative length field.
    assert_eq!(
        decode(b"\xff\xff\xff\xff\x00").unwrap_err(),
        DecodeError::InvalidLength(-1)
    );
    // Element truncated mid-payload.
    assert_eq!(
        decode(b"\x10\x00\x00\x00\x10value\x00\x7b\x00").unwrap_err(),
        DecodeError::InvalidLength(16)
    );
    // Key never terminated.
    assert_eq!(
        decode(b"\x0b\x00\x00\x00\x10valueXX").unwrap_err(),
        DecodeError::UnexpectedEof
    );
}
