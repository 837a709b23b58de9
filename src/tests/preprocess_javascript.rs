use super::*;

#[test]
fn mongodb_wrappers_unwrap_to_strings() {
    let s = r#"{"_id": ObjectId("507f1f77bcf86cd799439011"), "ts": Date("2025-01-01")}"#;
    let v = loads(s, &cfg()).unwrap();
    assert_eq!(
        obj_get(&v, "_id").as_str(),
        Some("507f1f77bcf86cd799439011")
    );
    assert_eq!(obj_get(&v, "ts").as_str(), Some("2025-01-01"));
}

#[test]
fn isodate_and_uuid_wrappers() {
    let s = r#"{"at": ISODate("2024-06-01T00:00:00Z"), "id": UUID("a-b-c")}"#;
    let v = loads(s, &cfg()).unwrap();
    assert_eq!(obj_get(&v, "at").as_str(), Some("2024-06-01T00:00:00Z"));
    assert_eq!(obj_get(&v, "id").as_str(), Some("a-b-c"));
}

#[test]
fn empty_wrapper_call_becomes_empty_string() {
    let v = loads(r#"{"d": Date()}"#, &cfg()).unwrap();
    assert_eq!(obj_get(&v, "d").as_str(), Some(""));
}

#[test]
fn bare_wrapper_argument_gets_quoted() {
    let v = loads("{\"id\": ObjectId(abc123)}", &cfg()).unwrap();
    assert_eq!(obj_get(&v, "id").as_str(), Some("abc123"));
}

#[test]
fn new_expressions_become_null() {
    let v = loads(r#"{"when": new Date("2024-01-01")}"#, &cfg()).unwrap();
    assert!(obj_get(&v, "when").is_null());
}

#[test]
fn function_definitions_become_null() {
    let s = r#"{"cb": function (a, b) { return a + b; }, "x": 1}"#;
    let v = loads(s, &cfg()).unwrap();
    assert!(obj_get(&v, "cb").is_null());
    assert_eq!(obj_get(&v, "x").as_i64(), Some(1));
}

#[test]
fn nonfinite_words_become_strings() {
    let v = loads(r#"{"a": NaN, "b": Infinity, "c": -Infinity}"#, &cfg()).unwrap();
    assert_eq!(obj_get(&v, "a").as_str(), Some("NaN"));
    assert_eq!(obj_get(&v, "b").as_str(), Some("Infinity"));
    assert_eq!(obj_get(&v, "c").as_str(), Some("-Infinity"));
}

#[test]
fn undefined_becomes_null() {
    let v = loads(r#"{"a": undefined}"#, &cfg()).unwrap();
    assert!(obj_get(&v, "a").is_null());
}

#[test]
fn hex_and_binary_literals_convert() {
    let v = loads(r#"{"h": 0x1A, "b": 0b1010, "o": 0o755}"#, &cfg()).unwrap();
    assert_eq!(obj_get(&v, "h").as_i64(), Some(26));
    assert_eq!(obj_get(&v, "b").as_i64(), Some(10));
    assert_eq!(obj_get(&v, "o").as_i64(), Some(493));
}

#[test]
fn legacy_octal_converts_only_in_numeric_context() {
    let v = loads(r#"{"mode": 025, "date": "2025-08-01"}"#, &cfg()).unwrap();
    assert_eq!(obj_get(&v, "mode").as_i64(), Some(21));
    assert_eq!(obj_get(&v, "date").as_str(), Some("2025-08-01"));
}

#[test]
fn regex_literal_in_value_position_becomes_string() {
    let v = loads(r#"{"pat": /ab[c]+/gi}"#, &cfg()).unwrap();
    assert_eq!(obj_get(&v, "pat").as_str(), Some("ab[c]+"));
}

#[test]
fn url_in_string_is_not_a_regex_literal() {
    let v = loads(r#"{"u": "http://x/y/z"}"#, &cfg()).unwrap();
    assert_eq!(obj_get(&v, "u").as_str(), Some("http://x/y/z"));
}

#[test]
fn template_literal_becomes_string() {
    let v = loads("{\"msg\": `hello ${name}`}", &cfg()).unwrap();
    assert_eq!(obj_get(&v, "msg").as_str(), Some("hello ${name}"));
}

#[test]
fn json_parse_unwraps() {
    let v = loads(r#"JSON.parse({"a": 1})"#, &cfg()).unwrap();
    assert_eq!(obj_get(&v, "a").as_i64(), Some(1));
}

#[test]
fn jsonp_callback_unwraps() {
    let v = loads("callback({\"a\": 2});", &cfg()).unwrap();
    assert_eq!(v.to_string(), "{\"a\":2}");
}

#[test]
fn return_statement_unwraps() {
    let v = loads("return {\"a\": 3};", &cfg()).unwrap();
    assert_eq!(v.to_string(), "{\"a\":3}");
}

#[test]
fn variable_declaration_unwraps() {
    let v = loads("const data = {\"a\": 4};", &cfg()).unwrap();
    assert_eq!(v.to_string(), "{\"a\":4}");
}

#[test]
fn explicit_string_concatenation_collapses() {
    let v = loads(r#"{"s": "hello" + " " + "world"}"#, &cfg()).unwrap();
    assert_eq!(obj_get(&v, "s").as_str(), Some("hello world"));
}

#[test]
fn mixed_quote_concatenation_collapses() {
    let v = loads(r#"{"s": 'foo' + "bar"}"#, &cfg()).unwrap();
    assert_eq!(obj_get(&v, "s").as_str(), Some("foobar"));
}

#[test]
fn adjacent_strings_in_value_position_merge() {
    let v = loads(r#"{"s": "ab" "cd"}"#, &cfg()).unwrap();
    assert_eq!(obj_get(&v, "s").as_str(), Some("abcd"));
}

#[test]
fn adjacent_strings_in_arrays_stay_separate() {
    let v = loads(r#"{"items": ["ab" "cd"]}"#, &cfg()).unwrap();
    assert_eq!(obj_get(&v, "items").to_string(), "[\"ab\",\"cd\"]");
}

#[test]
fn integer_arithmetic_evaluates() {
    let v = loads(r#"{"sum": 40 + 2, "diff": 50 - 8}"#, &cfg()).unwrap();
    assert_eq!(obj_get(&v, "sum").as_i64(), Some(42));
    assert_eq!(obj_get(&v, "diff").as_i64(), Some(42));
}

#[test]
fn dates_are_not_arithmetic() {
    let v = loads(r#"{"d": "2025-08-01"}"#, &cfg()).unwrap();
    assert_eq!(obj_get(&v, "d").as_str(), Some("2025-08-01"));
}

#[test]
fn version_quad_becomes_string() {
    let v = loads("{\"v\": 1.2.3.4}", &cfg()).unwrap();
    assert_eq!(obj_get(&v, "v").as_str(), Some("1.2.3.4"));
}

#[test]
fn trailing_dot_and_bare_exponent_normalize() {
    let v = loads("{\"a\": 42., \"b\": 15e}", &cfg()).unwrap();
    assert_eq!(obj_get(&v, "a").as_i64(), Some(42));
    assert_eq!(obj_get(&v, "b").as_f64(), Some(15.0));
}

#[test]
fn comment_valued_string_blanks() {
    let v = loads(r#"{"note": "// not a real value"}"#, &cfg()).unwrap();
    assert_eq!(obj_get(&v, "note").as_str(), Some(""));
}
