use super::*;

#[test]
fn parse_int_hook_transforms_integers() {
    let double = |n: i64| Value::Integer(n * 2);
    let hooks = Hooks {
        parse_int: Some(&double),
        ..Hooks::default()
    };
    let v = loads_with_hooks("{\"a\": 21, \"b\": [1, 2]}", &hooks, &cfg()).unwrap();
    assert_eq!(obj_get(&v, "a").as_i64(), Some(42));
    assert_eq!(obj_get(&v, "b").to_string(), "[2,4]");
}

#[test]
fn parse_float_hook_transforms_floats_only() {
    let stringify = |f: f64| Value::String(format!("f:{}", f));
    let hooks = Hooks {
        parse_float: Some(&stringify),
        ..Hooks::default()
    };
    let v = loads_with_hooks("{\"i\": 3, \"f\": 2.5}", &hooks, &cfg()).unwrap();
    assert_eq!(obj_get(&v, "i").as_i64(), Some(3));
    assert_eq!(obj_get(&v, "f").as_str(), Some("f:2.5"));
}

#[test]
fn parse_constant_hook_sees_infinity() {
    let name = |c: &str| Value::String(c.to_string());
    let hooks = Hooks {
        parse_constant: Some(&name),
        ..Hooks::default()
    };
    let v = loads_with_hooks("[1e999, -1e999]", &hooks, &cfg()).unwrap();
    assert_eq!(v.get_index(0).and_then(|v| v.as_str()), Some("Infinity"));
    assert_eq!(v.get_index(1).and_then(|v| v.as_str()), Some("-Infinity"));
}

#[test]
fn object_hook_fires_per_object_bottom_up() {
    let count = |m: Map| Value::Integer(m.len() as i64);
    let hooks = Hooks {
        object_hook: Some(&count),
        ..Hooks::default()
    };
    // the inner object collapses to a count before the outer one fires
    let v = loads_with_hooks("{\"x\": {\"a\": 1, \"b\": 2}}", &hooks, &cfg()).unwrap();
    assert_eq!(v.as_i64(), Some(1));
}

#[test]
fn object_pairs_hook_receives_source_order() {
    let keys = |pairs: Vec<(String, Value)>| {
        Value::Array(
            pairs
                .into_iter()
                .map(|(k, _)| Value::String(k))
                .collect(),
        )
    };
    let hooks = Hooks {
        object_pairs_hook: Some(&keys),
        ..Hooks::default()
    };
    let v = loads_with_hooks("{\"z\": 1, \"a\": 2}", &hooks, &cfg()).unwrap();
    assert_eq!(v.to_string(), "[\"z\",\"a\"]");
}

#[test]
fn pairs_hook_wins_over_object_hook() {
    let as_null = |_m: Map| Value::Null;
    let as_marker = |_p: Vec<(String, Value)>| Value::String("pairs".into());
    let hooks = Hooks {
        object_hook: Some(&as_null),
        object_pairs_hook: Some(&as_marker),
        ..Hooks::default()
    };
    let v = loads_with_hooks("{\"a\": 1}", &hooks, &cfg()).unwrap();
    assert_eq!(v.as_str(), Some("pairs"));
}

#[test]
fn hooks_apply_inside_arrays() {
    let negate = |n: i64| Value::Integer(-n);
    let hooks = Hooks {
        parse_int: Some(&negate),
        ..Hooks::default()
    };
    let v = loads_with_hooks("[[1], {\"k\": 2}]", &hooks, &cfg()).unwrap();
    assert_eq!(v.to_string(), "[[-1],{\"k\":-2}]");
}

#[test]
fn empty_hooks_are_identity() {
    let v1 = loads("{\"a\": [1, 2.5, null]}", &cfg()).unwrap();
    let v2 = loads_with_hooks("{\"a\": [1, 2.5, null]}", &Hooks::default(), &cfg()).unwrap();
    assert_eq!(v1, v2);
}
