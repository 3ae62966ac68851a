//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::{Map, Value};

use knet_core::{Address, Domain, Keypair, Uuid};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a random UUID.
pub fn uuid() -> impl Strategy<Value = Uuid> {
    any::<u128>().prop_map(Uuid::from_u128)
}

/// Generate an address domain.
pub fn domain() -> impl Strategy<Value = Domain> {
    prop::sample::select(Domain::ALL.to_vec())
}

/// Generate a `host:port`, or empty for a local reference.
pub fn host_port() -> impl Strategy<Value = String> {
    prop_oneof![
        1 => Just(String::new()),
        3 => ("[a-z][a-z0-9-]{0,15}(\\.[a-z]{2,6})?", 1u16..=u16::MAX)
            .prop_map(|(host, port)| format!("{host}:{port}")),
    ]
}

/// Generate an address.
pub fn address() -> impl Strategy<Value = Address> {
    (host_port(), domain(), uuid()).prop_map(|(h, d, e)| Address::new(h, d, e))
}

/// Generate arbitrary JSON, nested up to a few levels.
pub fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        (-4000i32..4000).prop_map(|n| Value::from(f64::from(n) / 4.0)),
        "\\PC{0,12}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec(("[a-z_]{1,8}", inner), 0..6)
                .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

/// Rebuild every object in `value` with its keys inserted in reverse order.
pub fn reverse_key_order(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::new();
            for (k, v) in map.iter().rev() {
                out.insert(k.clone(), reverse_key_order(v));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(reverse_key_order).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knet_core::canonicalize;
    use knet_store::AddressCache;

    proptest! {
        #[test]
        fn address_string_roundtrip(addr in address()) {
            let parsed = Address::parse(&addr.to_string()).unwrap();
            prop_assert_eq!(parsed, addr);
        }

        #[test]
        fn canonical_form_ignores_key_order(value in json_value()) {
            let reordered = reverse_key_order(&value);
            prop_assert_eq!(canonicalize(&value), canonicalize(&reordered));
        }

        #[test]
        fn canonical_form_reparses_to_same_value(value in json_value()) {
            let text = canonicalize(&value);
            let reparsed: Value = serde_json::from_str(&text).unwrap();
            prop_assert_eq!(canonicalize(&reparsed), text);
        }

        #[test]
        fn signatures_verify_and_detect_tampering(
            kp in keypair(),
            message in prop::collection::vec(any::<u8>(), 1..256),
            flip in any::<prop::sample::Index>(),
        ) {
            let signature = kp.sign(&message);
            prop_assert!(kp.public_key().verify(&message, &signature).is_ok());

            let mut tampered = message.clone();
            let i = flip.index(tampered.len());
            tampered[i] ^= 0x01;
            prop_assert!(kp.public_key().verify(&tampered, &signature).is_err());
        }

        #[test]
        fn cache_never_exceeds_capacity(
            capacity in 1usize..16,
            entries in prop::collection::vec(address(), 0..64),
        ) {
            let mut cache = AddressCache::new(capacity);
            for addr in &entries {
                cache.put(addr.entity, addr.clone());
                prop_assert!(cache.len() <= capacity);
            }
            if let Some(last) = entries.last() {
                prop_assert_eq!(cache.get(&last.entity), Some(last.clone()));
            }
        }
    }
}
