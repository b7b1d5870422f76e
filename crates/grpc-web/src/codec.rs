//! Wire value codec: [`DomainValue`] to and from the protobuf [`TypedValue`].
//!
//! Both directions are total. Encoding picks the variant matching the
//! domain value's tag; decoding returns the domain value of whichever
//! variant is set, and `Null` when none is.

use std::collections::BTreeMap;

use contract::DomainValue;

use crate::proto::{self, typed_value::Kind, TypedValue};

/// Encodes one value into its discriminated wire form.
pub fn encode(value: &DomainValue) -> TypedValue {
    let kind = match value {
        DomainValue::Null => Kind::NullValue(0),
        DomainValue::Bool(b) => Kind::BoolValue(*b),
        DomainValue::Integer(i) => Kind::IntValue(*i),
        DomainValue::Float(x) => Kind::FloatValue(*x),
        DomainValue::String(s) => Kind::StringValue(s.clone()),
        DomainValue::Bytes(bytes) => Kind::BytesValue(bytes.clone()),
    };
    TypedValue { kind: Some(kind) }
}

/// Decodes one wire value.
pub fn decode(value: TypedValue) -> DomainValue {
    match value.kind {
        None | Some(Kind::NullValue(_)) => DomainValue::Null,
        Some(Kind::BoolValue(b)) => DomainValue::Bool(b),
        Some(Kind::IntValue(i)) => DomainValue::Integer(i),
        Some(Kind::FloatValue(x)) => DomainValue::Float(x),
        Some(Kind::StringValue(s)) => DomainValue::String(s),
        Some(Kind::BytesValue(bytes)) => DomainValue::Bytes(bytes),
    }
}

/// Encodes every cell of a row.
pub fn encode_row(row: &contract::Row) -> proto::Row {
    proto::Row {
        columns: row
            .iter()
            .map(|(column, value)| (column.clone(), encode(value)))
            .collect(),
    }
}

/// Decodes every cell of a row.
pub fn decode_row(row: proto::Row) -> contract::Row {
    row.columns
        .into_iter()
        .map(|(column, value)| (column, decode(value)))
        .collect()
}

/// Flattens extra configuration keys into the string side-channel.
pub fn stringify(extra: &BTreeMap<String, DomainValue>) -> BTreeMap<String, String> {
    extra
        .iter()
        .map(|(key, value)| (key.clone(), value.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_each_variant_encodes_to_matching_kind() {
        assert_eq!(encode(&DomainValue::Null).kind, Some(Kind::NullValue(0)));
        assert_eq!(encode(&DomainValue::Bool(true)).kind, Some(Kind::BoolValue(true)));
        assert_eq!(encode(&DomainValue::Integer(1)).kind, Some(Kind::IntValue(1)));
        assert_eq!(encode(&DomainValue::Float(0.5)).kind, Some(Kind::FloatValue(0.5)));
        assert_eq!(
            encode(&DomainValue::from("a")).kind,
            Some(Kind::StringValue("a".into()))
        );
        assert_eq!(
            encode(&DomainValue::Bytes(vec![0, 1])).kind,
            Some(Kind::BytesValue(vec![0, 1]))
        );
    }

    #[test]
    fn test_unset_variant_decodes_to_null() {
        assert_eq!(decode(TypedValue { kind: None }), DomainValue::Null);
    }

    #[test]
    fn test_large_integers_keep_precision() {
        let big = i64::MAX - 1;
        assert_eq!(decode(encode(&DomainValue::Integer(big))), DomainValue::Integer(big));
    }

    #[test]
    fn test_stringify_extra() {
        let mut extra = BTreeMap::new();
        extra.insert("sslmode".to_string(), DomainValue::from("disable"));
        extra.insert("pool".to_string(), DomainValue::Integer(4));
        extra.insert("verify".to_string(), DomainValue::Bool(false));
        let flat = stringify(&extra);
        assert_eq!(flat["sslmode"], "disable");
        assert_eq!(flat["pool"], "4");
        assert_eq!(flat["verify"], "false");
    }

    fn domain_value() -> impl Strategy<Value = DomainValue> {
        prop_oneof![
            Just(DomainValue::Null),
            any::<bool>().prop_map(DomainValue::Bool),
            any::<i64>().prop_map(DomainValue::Integer),
            any::<f64>()
                .prop_filter("NaN never equals itself", |x| !x.is_nan())
                .prop_map(DomainValue::Float),
            ".*".prop_map(DomainValue::String),
            proptest::collection::vec(any::<u8>(), 0..64).prop_map(DomainValue::Bytes),
        ]
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(v in domain_value()) {
            prop_assert_eq!(decode(encode(&v)), v);
        }

        #[test]
        fn prop_row_survives_protobuf_bytes(
            row in proptest::collection::btree_map("[a-z]{1,8}", domain_value(), 0..8)
        ) {
            use prost::Message;
            let bytes = encode_row(&row).encode_to_vec();
            let wire = proto::Row::decode(bytes.as_slice()).unwrap();
            prop_assert_eq!(decode_row(wire), row);
        }
    }
}
