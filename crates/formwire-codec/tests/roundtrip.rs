use std::collections::HashMap;
use std::net::Ipv4Addr;

use formwire_codec::{
    decode_message, encode_message, DecodeConfig, Field, FieldType, WireError,
};
use proptest::prelude::*;

fn typed_value() -> impl Strategy<Value = (FieldType, String)> {
    prop_oneof![
        "[ -~]{0,24}".prop_map(|s| (FieldType::Text, s)),
        any::<u16>().prop_map(|n| (FieldType::UInt16, n.to_string())),
        any::<[u8; 4]>().prop_map(|o| (FieldType::Ipv4, Ipv4Addr::from(o).to_string())),
        Just((FieldType::Ignored, String::new())),
    ]
}

fn form() -> impl Strategy<Value = Vec<Field>> {
    prop::collection::hash_map("[ -~]{0,12}", typed_value(), 0..8).prop_map(|fields| {
        fields
            .into_iter()
            .map(|(name, (field_type, value))| Field::new(name, field_type, value))
            .collect()
    })
}

fn lookup_for(fields: &[Field]) -> HashMap<String, FieldType> {
    fields
        .iter()
        .map(|field| (field.name.clone(), field.field_type))
        .collect()
}

proptest! {
    #[test]
    fn decode_inverts_encode(fields in form()) {
        let buf = encode_message(&fields).unwrap();
        let decoded = decode_message(&buf, &lookup_for(&fields), &DecodeConfig::default()).unwrap();
        prop_assert_eq!(decoded, fields);
    }

    #[test]
    fn text_with_control_byte_never_encodes(
        prefix in "[ -~]{0,8}",
        bad in prop_oneof![0u8..0x20, Just(0x7Fu8)],
        suffix in "[ -~]{0,8}",
    ) {
        let value = format!("{prefix}{}{suffix}", bad as char);
        let fields = [Field::text("f", value.clone())];
        let err = encode_message(&fields).unwrap_err();
        let is_expected = matches!(
            err,
            WireError::InvalidValueForType { value: ref got, .. } if *got == value
        );
        prop_assert!(is_expected);
    }

    #[test]
    fn text_encoding_never_emits_reserved_bytes(text in "[ -~]{0,64}") {
        let buf = encode_message(&[Field::text("t", text)]).unwrap();
        let value = &buf[2..];
        prop_assert!(value.iter().all(|&b| b != 0xFE && b != 0xFF));
    }
}

#[test]
fn one_bad_field_spoils_the_whole_message() {
    let fields = [
        Field::text("ssid", "home"),
        Field::new("ip", FieldType::Ipv4, "256.0.0.1"),
    ];
    assert!(encode_message(&fields).is_err());
}
