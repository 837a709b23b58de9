use super::*;

#[test]
fn line_comments_are_stripped() {
    let s = "{\n  \"a\": 1, // count\n  \"b\": 2\n}";
    let v = loads(s, &cfg()).unwrap();
    assert_eq!(v.to_string(), "{\"a\":1,\"b\":2}");
}

#[test]
fn block_comments_are_stripped() {
    let s = "{\"a\": /* the answer */ 42}";
    let v = loads(s, &cfg()).unwrap();
    assert_eq!(obj_get(&v, "a").as_i64(), Some(42));
}

#[test]
fn block_comment_between_tokens_keeps_boundary() {
    // no whitespace on either side: removal must not glue the tokens
    let s = "[1,/*x*/2]";
    let v = loads(s, &cfg()).unwrap();
    assert_eq!(v.to_string(), "[1,2]");
}

#[test]
fn comment_markers_inside_strings_survive() {
    let s = "{\"url\": \"file:///tmp/a\", \"note\": \"a // b /* c */\"}";
    let v = loads(s, &conservative()).unwrap();
    assert_eq!(obj_get(&v, "note").as_str(), Some("a // b /* c */"));
}

#[test]
fn unterminated_block_comment_consumes_rest() {
    let s = "[1, 2] /* dangling";
    let v = loads(s, &cfg()).unwrap();
    assert_eq!(v.to_string(), "[1,2]");
}

#[test]
fn comment_only_line_inside_object() {
    let s = "{\n// header comment\n\"a\": true\n}";
    let v = loads(s, &cfg()).unwrap();
    assert_eq!(obj_get(&v, "a").as_bool(), Some(true));
}
