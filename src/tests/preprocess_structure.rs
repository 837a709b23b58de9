use super::*;

#[test]
fn sparse_array_with_trailing_comma() {
    let v = loads("[1,,3,]", &cfg()).unwrap();
    assert_eq!(v.to_string(), "[1,null,3]");
}

#[test]
fn leading_comma_becomes_null() {
    assert_eq!(loads("[,3]", &cfg()).unwrap().to_string(), "[null,3]");
    assert_eq!(
        loads("[,,3]", &cfg()).unwrap().to_string(),
        "[null,null,3]"
    );
}

#[test]
fn triple_commas_produce_two_nulls() {
    let v = loads("[1,,,4]", &cfg()).unwrap();
    assert_eq!(v.to_string(), "[1,null,null,4]");
}

#[test]
fn object_double_commas_collapse() {
    let v = loads("{\"a\": 1,, \"b\": 2}", &cfg()).unwrap();
    assert_eq!(v.to_string(), "{\"a\":1,\"b\":2}");
}

#[test]
fn trailing_comma_in_object() {
    let v = loads("{\"a\": 1,}", &cfg()).unwrap();
    assert_eq!(v.to_string(), "{\"a\":1}");
}

#[test]
fn assignment_operator_becomes_colon() {
    let v = loads("{\"a\" = 1, b = 2}", &cfg()).unwrap();
    assert_eq!(obj_get(&v, "a").as_i64(), Some(1));
    assert_eq!(obj_get(&v, "b").as_i64(), Some(2));
}

#[test]
fn missing_colon_after_quoted_key() {
    let v = loads("{\"a\" 1}", &cfg()).unwrap();
    assert_eq!(obj_get(&v, "a").as_i64(), Some(1));
}

#[test]
fn missing_value_before_close_becomes_null() {
    let v = loads("{\"a\": , \"b\": 2}", &cfg()).unwrap();
    assert!(obj_get(&v, "a").is_null());
    assert_eq!(obj_get(&v, "b").as_i64(), Some(2));
}

#[test]
fn missing_value_at_end_of_line_becomes_null() {
    let v = loads("{\n\"a\": 1,\n\"b\":\n}", &cfg()).unwrap();
    assert_eq!(obj_get(&v, "a").as_i64(), Some(1));
    assert!(obj_get(&v, "b").is_null());
}

#[test]
fn missing_comma_between_objects() {
    let v = loads("[{\"a\": 1} {\"b\": 2}]", &cfg()).unwrap();
    assert_eq!(v.to_string(), "[{\"a\":1},{\"b\":2}]");
}

#[test]
fn missing_comma_between_pairs_on_one_line() {
    let v = loads("{\"a\": \"x\" \"b\": 2}", &cfg()).unwrap();
    assert_eq!(v.to_string(), "{\"a\":\"x\",\"b\":2}");
}

#[test]
fn missing_comma_between_lines() {
    let v = loads("{\n\"a\": 1\n\"b\": 2\n}", &cfg()).unwrap();
    assert_eq!(v.to_string(), "{\"a\":1,\"b\":2}");
}

#[test]
fn missing_comma_before_bare_key_line() {
    let v = loads("{\n\"a\": 1\nb: 2\n}", &cfg()).unwrap();
    assert_eq!(v.to_string(), "{\"a\":1,\"b\":2}");
}

#[test]
fn unclosed_object_is_completed() {
    let v = loads("{\"a\": 1", &cfg()).unwrap();
    assert_eq!(v.to_string(), "{\"a\":1}");
}

#[test]
fn unclosed_nested_structures_close_in_lifo_order() {
    let v = loads("{\"a\": [1, {\"b\": 2", &cfg()).unwrap();
    assert_eq!(v.to_string(), "{\"a\":[1,{\"b\":2}]}");
}

#[test]
fn unclosed_string_then_structures() {
    let v = loads("{\"a\": \"text", &cfg()).unwrap();
    assert_eq!(obj_get(&v, "a").as_str(), Some("text"));
}

#[test]
fn parenthesized_object_becomes_braces() {
    let v = loads("(\"a\": 1)", &cfg()).unwrap();
    assert_eq!(v.to_string(), "{\"a\":1}");
}

#[test]
fn function_call_parens_are_not_objects() {
    let c = cfg();
    let out = crate::preprocess::preprocess(
        "{\"v\": unknownFn(\"x\": 1)}",
        &c.preprocessing,
        &c.limits,
    )
    .unwrap();
    assert!(!out.contains("unknownFn{"));
}

#[test]
fn set_literal_becomes_array() {
    let v = loads("{\"tags\": {1, 2, 3}}", &cfg()).unwrap();
    assert_eq!(obj_get(&v, "tags").to_string(), "[1,2,3]");
}

#[test]
fn adjacent_strings_in_array_get_commas() {
    let v = loads("[\"a\" \"b\" \"c\"]", &cfg()).unwrap();
    assert_eq!(v.to_string(), "[\"a\",\"b\",\"c\"]");
}
