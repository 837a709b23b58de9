use super::*;

fn limited(limits: ParseLimits) -> ParseConfig {
    ParseConfig {
        limits,
        ..ParseConfig::default()
    }
}

fn expect_fault(result: Result<Value, DecodeError>, kind: LimitKind) -> SecurityFault {
    match result.unwrap_err() {
        DecodeError::Security(fault) => {
            assert_eq!(fault.kind, kind);
            fault
        }
        other => panic!("expected security fault, got {:?}", other),
    }
}

#[test]
fn input_size_limit() {
    let config = limited(ParseLimits {
        max_input_size: 8,
        ..ParseLimits::default()
    });
    assert!(loads("[1, 2]", &config).is_ok());
    let fault = expect_fault(loads("[1, 2, 3]", &config), LimitKind::InputTooLarge);
    assert_eq!(fault.limit, 8);
    assert_eq!(fault.observed, 9);
}

#[test]
fn string_length_boundary() {
    let config = limited(ParseLimits {
        max_string_length: 5,
        ..ParseLimits::default()
    });
    assert!(loads("\"abcde\"", &config).is_ok());
    expect_fault(loads("\"abcdef\"", &config), LimitKind::StringTooLong);
}

#[test]
fn number_length_limit() {
    let config = limited(ParseLimits {
        max_number_length: 4,
        ..ParseLimits::default()
    });
    assert!(loads("1234", &config).is_ok());
    expect_fault(loads("12345", &config), LimitKind::NumberTooLong);
}

#[test]
fn nesting_depth_boundary() {
    let config = limited(ParseLimits {
        max_nesting_depth: 3,
        ..ParseLimits::default()
    });
    assert!(loads("[[[1]]]", &config).is_ok());
    let fault = expect_fault(loads("[[[[1]]]]", &config), LimitKind::NestingTooDeep);
    assert_eq!(fault.observed, 4);
}

#[test]
fn deep_object_chain_names_the_nesting_limit() {
    let depth = 101;
    let mut s = String::new();
    for _ in 0..depth {
        s.push_str("{\"a\":");
    }
    s.push_str("{}");
    for _ in 0..depth {
        s.push('}');
    }
    let fault = expect_fault(loads(&s, &cfg()), LimitKind::NestingTooDeep);
    assert_eq!(fault.kind.limit_name(), "max_nesting_depth");
    assert_eq!(fault.observed, 101);
}

#[test]
fn object_key_limit() {
    let config = limited(ParseLimits {
        max_object_keys: 2,
        ..ParseLimits::default()
    });
    assert!(loads("{\"a\":1,\"b\":2}", &config).is_ok());
    expect_fault(
        loads("{\"a\":1,\"b\":2,\"c\":3}", &config),
        LimitKind::TooManyKeys,
    );
}

#[test]
fn array_item_limit() {
    let config = limited(ParseLimits {
        max_array_items: 3,
        ..ParseLimits::default()
    });
    assert!(loads("[1,2,3]", &config).is_ok());
    expect_fault(loads("[1,2,3,4]", &config), LimitKind::TooManyItems);
}

#[test]
fn total_item_limit() {
    let config = limited(ParseLimits {
        max_total_items: 4,
        ..ParseLimits::default()
    });
    // three elements plus the array itself stay within the limit
    assert!(loads("[1,2,3]", &config).is_ok());
    expect_fault(loads("[1,2,3,4]", &config), LimitKind::TooManyTotalItems);
}

#[test]
fn security_faults_bypass_fallback() {
    // fallback would happily strict-parse this; limits must win
    let config = ParseConfig {
        limits: ParseLimits {
            max_nesting_depth: 1,
            ..ParseLimits::default()
        },
        fallback: true,
        ..ParseConfig::default()
    };
    expect_fault(loads("[[1]]", &config), LimitKind::NestingTooDeep);
}

#[test]
fn security_faults_bypass_recovery() {
    let config = limited(ParseLimits {
        max_nesting_depth: 2,
        ..ParseLimits::default()
    });
    let err = parse_partial("[[[1]]]", RecoveryLevel::ExtractAll, &config).unwrap_err();
    assert_eq!(err.kind, LimitKind::NestingTooDeep);
}

#[test]
fn preprocessing_iteration_overflow() {
    // a long explicit concatenation chain exceeds a tiny iteration budget
    let config = limited(ParseLimits {
        max_preprocessing_iterations: 1,
        ..ParseLimits::default()
    });
    let mut s = String::from("{\"s\": \"a\"");
    for _ in 0..64 {
        s.push_str(" + \"b\"");
    }
    s.push('}');
    expect_fault(loads(&s, &config), LimitKind::PreprocessingOverflow);
}

#[test]
fn limit_error_message_names_limit_and_value() {
    let config = limited(ParseLimits {
        max_array_items: 1,
        ..ParseLimits::default()
    });
    let err = loads("[1,2]", &config).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("max_array_items"));
    assert!(msg.contains('2'));
}
