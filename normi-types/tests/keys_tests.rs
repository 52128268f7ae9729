use normi_types::{derive_key, EntityKey, InvalidKeyError, QueryKey};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::HashMap;

// ── EntityKey: scalar ids ────────────────────────────────────────

#[test]
fn string_id_is_used_verbatim() {
    let key = derive_key("org", &json!("org-1")).unwrap();
    assert_eq!(key.as_str(), "org-org-1");
}

#[test]
fn numeric_id_uses_decimal_form() {
    assert_eq!(derive_key("user", &json!(42)).unwrap().as_str(), "user-42");
    assert_eq!(derive_key("user", &json!(-7)).unwrap().as_str(), "user--7");
}

#[test]
fn bool_id_uses_literal_form() {
    assert_eq!(derive_key("flag", &json!(true)).unwrap().as_str(), "flag-true");
}

#[test]
fn string_and_number_ids_share_a_key() {
    let a = derive_key("user", &json!("1")).unwrap();
    let b = derive_key("user", &json!(1)).unwrap();
    assert_eq!(a, b);
}

// ── EntityKey: composite ids ─────────────────────────────────────

#[test]
fn object_id_is_canonical_json() {
    let key = derive_key("membership", &json!({"user_id": "u1", "org_id": "o1"})).unwrap();
    assert_eq!(key.as_str(), r#"membership-{"org_id":"o1","user_id":"u1"}"#);
}

#[test]
fn object_id_ignores_field_order() {
    let a: Value = serde_json::from_str(r#"{"b": 2, "a": {"y": 1, "x": 0}}"#).unwrap();
    let b: Value = serde_json::from_str(r#"{"a": {"x": 0, "y": 1}, "b": 2}"#).unwrap();
    assert_eq!(derive_key("t", &a).unwrap(), derive_key("t", &b).unwrap());
}

#[test]
fn array_id_keeps_element_order() {
    let a = derive_key("pair", &json!(["a", "b"])).unwrap();
    let b = derive_key("pair", &json!(["b", "a"])).unwrap();
    assert_eq!(a.as_str(), r#"pair-["a","b"]"#);
    assert_ne!(a, b);
}

// ── EntityKey: failures ──────────────────────────────────────────

#[test]
fn null_id_is_rejected() {
    let err = derive_key("org", &Value::Null).unwrap_err();
    assert_eq!(
        err,
        InvalidKeyError::EmptyId {
            type_tag: "org".to_string()
        }
    );
    assert!(err.to_string().contains("empty id"));
}

#[test]
fn empty_type_tag_is_rejected() {
    let err = derive_key("", &json!(1)).unwrap_err();
    assert!(matches!(err, InvalidKeyError::InvalidTypeTag(_)));
}

#[test]
fn from_marker_requires_string_tag() {
    let err = EntityKey::from_marker(&json!(5), &json!("x")).unwrap_err();
    assert_eq!(err, InvalidKeyError::InvalidTypeTag("5".to_string()));

    let key = EntityKey::from_marker(&json!("org"), &json!("x")).unwrap();
    assert_eq!(key.to_string(), "org-x");
}

// ── EntityKey: map usage ─────────────────────────────────────────

#[test]
fn entity_key_can_be_looked_up_by_str() {
    let mut map = HashMap::new();
    map.insert(derive_key("org", &json!("org-1")).unwrap(), 1);
    assert_eq!(map.get("org-org-1"), Some(&1));
}

#[test]
fn entity_key_serializes_as_plain_string() {
    let key = derive_key("org", &json!("org-1")).unwrap();
    assert_eq!(serde_json::to_value(&key).unwrap(), json!("org-org-1"));
    let back: EntityKey = serde_json::from_value(json!("org-org-1")).unwrap();
    assert_eq!(back, key);
}

// ── QueryKey ─────────────────────────────────────────────────────

#[test]
fn query_key_without_input() {
    assert_eq!(QueryKey::new("orgs.get").as_str(), r#"["orgs.get"]"#);
}

#[test]
fn query_key_with_input() {
    let key = QueryKey::with_input("files.list", &json!({"path": "/", "limit": 10})).unwrap();
    assert_eq!(key.as_str(), r#"["files.list",{"limit":10,"path":"/"}]"#);
}

#[test]
fn query_key_input_order_does_not_matter() {
    let a: Value = serde_json::from_str(r#"{"x": 1, "y": 2}"#).unwrap();
    let b: Value = serde_json::from_str(r#"{"y": 2, "x": 1}"#).unwrap();
    assert_eq!(
        QueryKey::with_input("q", &a).unwrap(),
        QueryKey::with_input("q", &b).unwrap()
    );
}

#[test]
fn query_key_with_serializable_struct() {
    #[derive(serde::Serialize)]
    struct Args {
        library_id: u32,
    }
    let key = QueryKey::with_input("library.get", &Args { library_id: 3 }).unwrap();
    assert_eq!(key.as_str(), r#"["library.get",{"library_id":3}]"#);
}

#[test]
fn query_key_from_raw_is_untouched() {
    assert_eq!(QueryKey::from_raw("orgs.get").to_string(), "orgs.get");
}
