use super::*;

#[test]
fn scalar_values_parse() {
    assert_eq!(loads("\"str\"", &cfg()).unwrap(), Value::String("str".into()));
    assert_eq!(loads("123", &cfg()).unwrap(), Value::Integer(123));
    assert_eq!(loads("true", &cfg()).unwrap(), Value::Bool(true));
    assert_eq!(loads("false", &cfg()).unwrap(), Value::Bool(false));
    assert_eq!(loads("null", &cfg()).unwrap(), Value::Null);
}

#[test]
fn integer_vs_float_classification() {
    assert_eq!(loads("42", &cfg()).unwrap(), Value::Integer(42));
    assert_eq!(loads("42.0", &cfg()).unwrap(), Value::Float(42.0));
    assert_eq!(loads("4e2", &cfg()).unwrap(), Value::Float(400.0));
    assert_eq!(loads("-7", &cfg()).unwrap(), Value::Integer(-7));
}

#[test]
fn integer_overflow_widens_to_float() {
    let v = loads("99999999999999999999999999", &cfg()).unwrap();
    assert!(matches!(v, Value::Float(f) if f > 9.9e24));
}

#[test]
fn float_overflow_becomes_infinity() {
    let v = loads("1e999", &cfg()).unwrap();
    assert!(matches!(v, Value::Float(f) if f.is_infinite()));
}

#[test]
fn empty_input_is_unexpected_end() {
    let err = loads("", &cfg()).unwrap_err();
    match err {
        DecodeError::Parse(e) => assert_eq!(e.kind, SyntaxKind::UnexpectedEnd),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn whitespace_only_input_is_an_error() {
    assert!(loads("   \n\t ", &cfg()).is_err());
}

#[test]
fn nested_structures_parse() {
    let v = loads(r#"{"a": {"b": [1, {"c": null}]}}"#, &cfg()).unwrap();
    let inner = obj_get(obj_get(&v, "a"), "b");
    assert_eq!(inner.get_index(0).and_then(|v| v.as_i64()), Some(1));
    assert!(inner.get_index(1).unwrap().get("c").unwrap().is_null());
}

#[test]
fn object_keys_keep_insertion_order() {
    let v = loads(r#"{"z": 1, "a": 2, "m": 3}"#, &cfg()).unwrap();
    let keys: Vec<&str> = v.as_object().unwrap().keys().collect();
    assert_eq!(keys, ["z", "a", "m"]);
}

#[test]
fn duplicate_keys_last_wins_by_default() {
    let v = loads(r#"{"k": 1, "k": 2, "k": 3}"#, &raw_cfg()).unwrap();
    assert_eq!(obj_get(&v, "k").as_i64(), Some(3));
    assert_eq!(v.as_object().unwrap().len(), 1);
}

#[test]
fn duplicate_keys_coalesce_when_enabled() {
    let config = ParseConfig {
        duplicate_keys: true,
        ..raw_cfg()
    };
    let v = loads(r#"{"k": 1, "k": 2, "k": 3}"#, &config).unwrap();
    assert_eq!(obj_get(&v, "k").to_string(), "[1,2,3]");
}

#[test]
fn trailing_commas_tolerated_by_parser() {
    let v = loads("[1, 2,]", &raw_cfg()).unwrap();
    assert_eq!(v.to_string(), "[1,2]");
    let v = loads("{\"a\": 1,}", &raw_cfg()).unwrap();
    assert_eq!(v.to_string(), "{\"a\":1}");
}

#[test]
fn identifier_keys_accepted() {
    let v = loads("{key: 1}", &raw_cfg()).unwrap();
    assert_eq!(obj_get(&v, "key").as_i64(), Some(1));
}

#[test]
fn wrapper_identifier_followed_by_string_unwraps_late() {
    // preprocessing off: the parser's own late catch has to handle it
    let v = loads(r#"{"id": ObjectId "abc"}"#, &raw_cfg()).unwrap();
    assert_eq!(obj_get(&v, "id").as_str(), Some("abc"));
}

#[test]
fn bare_identifier_value_is_a_string() {
    let v = loads("{\"s\": pending}", &raw_cfg()).unwrap();
    assert_eq!(obj_get(&v, "s").as_str(), Some("pending"));
}

#[test]
fn missing_colon_is_an_error_when_unfixable() {
    // a comma after the key defeats the colon-insertion heuristic, so the
    // parser itself has to report it
    let err = loads("{\"a\", 1}", &raw_cfg()).unwrap_err();
    match err {
        DecodeError::Parse(e) => assert_eq!(e.kind, SyntaxKind::MissingColon),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn unclosed_object_is_an_error_without_repair() {
    let err = loads("{\"a\": 1", &raw_cfg()).unwrap_err();
    match err {
        DecodeError::Parse(e) => assert_eq!(e.kind, SyntaxKind::UnclosedStructure),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn error_positions_are_one_based() {
    let err = loads("{\"a\", 1}", &raw_cfg()).unwrap_err();
    let pos = err.position().unwrap();
    assert_eq!(pos.line, 1);
    assert!(pos.column >= 1);
}

#[test]
fn display_renders_compact_json() {
    let v = loads(r#"{"s": "a\"b", "n": [1.5, null]}"#, &cfg()).unwrap();
    assert_eq!(v.to_string(), r#"{"s":"a\"b","n":[1.5,null]}"#);
}
