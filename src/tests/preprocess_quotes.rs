use super::*;

#[test]
fn unquoted_keys_and_single_quotes() {
    let v = loads("{ name: 'Ada', age: 37 }", &cfg()).unwrap();
    assert_eq!(v.to_string(), "{\"name\":\"Ada\",\"age\":37}");
}

#[test]
fn single_quoted_keys_and_values_convert() {
    let v = loads("{'a': 'x', 'b': 'y'}", &cfg()).unwrap();
    assert_eq!(obj_get(&v, "a").as_str(), Some("x"));
    assert_eq!(obj_get(&v, "b").as_str(), Some("y"));
}

#[test]
fn apostrophes_inside_double_quoted_strings_survive() {
    let v = loads(r#"{"note": "it's fine"}"#, &cfg()).unwrap();
    assert_eq!(obj_get(&v, "note").as_str(), Some("it's fine"));
}

#[test]
fn double_quotes_inside_single_quoted_strings_are_escaped() {
    let v = loads(r#"{'quote': 'say "hi"'}"#, &cfg()).unwrap();
    assert_eq!(obj_get(&v, "quote").as_str(), Some("say \"hi\""));
}

#[test]
fn unicode_quotes_fold_to_ascii() {
    let v = loads("{\u{201C}key\u{201D}: \u{201C}value\u{201D}}", &cfg()).unwrap();
    assert_eq!(obj_get(&v, "key").as_str(), Some("value"));
}

#[test]
fn cjk_corner_brackets_fold() {
    let v = loads("{「k」: 「v」}", &cfg()).unwrap();
    assert_eq!(obj_get(&v, "k").as_str(), Some("v"));
}

#[test]
fn bare_identifier_value_gets_quoted() {
    let v = loads("{status: active}", &cfg()).unwrap();
    assert_eq!(obj_get(&v, "status").as_str(), Some("active"));
}

#[test]
fn bare_multiword_value_gets_quoted() {
    let v = loads("{msg: hello world}", &cfg()).unwrap();
    assert_eq!(obj_get(&v, "msg").as_str(), Some("hello world"));
}

#[test]
fn keyword_values_stay_literal() {
    let v = loads("{a: true, b: false, c: null}", &cfg()).unwrap();
    assert_eq!(obj_get(&v, "a").as_bool(), Some(true));
    assert_eq!(obj_get(&v, "b").as_bool(), Some(false));
    assert!(obj_get(&v, "c").is_null());
}

#[test]
fn numeric_values_stay_numeric() {
    let v = loads("{a: 1, b: -2.5, c: 1e3}", &cfg()).unwrap();
    assert_eq!(obj_get(&v, "a").as_i64(), Some(1));
    assert_eq!(obj_get(&v, "b").as_f64(), Some(-2.5));
    assert_eq!(obj_get(&v, "c").as_f64(), Some(1000.0));
}

#[test]
fn preprocessed_output_is_compact_strict_json() {
    let c = cfg();
    let out = crate::preprocess::preprocess("{foo: 1}", &c.preprocessing, &c.limits).unwrap();
    assert_eq!(out, "{\"foo\":1}");
}

#[test]
fn all_digit_keys_are_not_quoted() {
    let c = cfg();
    let out = crate::preprocess::preprocess("{123: 1}", &c.preprocessing, &c.limits).unwrap();
    assert!(out.starts_with("{123:"));
}

#[test]
fn timestamp_colons_inside_strings_survive() {
    let v = loads(r#"{"t": "12:34:56"}"#, &cfg()).unwrap();
    assert_eq!(obj_get(&v, "t").as_str(), Some("12:34:56"));
}

#[test]
fn url_values_are_not_split() {
    let v = loads("{\"u\": \"https://example.com/a\"}", &cfg()).unwrap();
    assert_eq!(obj_get(&v, "u").as_str(), Some("https://example.com/a"));
}
