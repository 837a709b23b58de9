use criterion::{criterion_group, criterion_main, Criterion};
use jsonmend::{loads, parse_partial, ParseConfig, RecoveryLevel};

fn bench_loads(c: &mut Criterion) {
    let mut group = c.benchmark_group("loads");
    let cases = vec![
        r#"{"a":1,"b":[true,false,null],"c":"strict"}"#,
        r#"{a:1, b: 'x', c: True,}"#,
        r#"```json
        {key: 'value', n: 0x1F}
        ```
        "#,
        r#"{"_id": ObjectId("507f1f77bcf86cd799439011"), "ts": Date("2025-01-01")}"#,
        r#"[1,,3,] // trailing"#,
        r#"{"unclosed": [1, {"deep": "text"#,
    ];
    let config = ParseConfig::default();
    for (i, s) in cases.into_iter().enumerate() {
        group.bench_function(format!("case_{}", i), |b| {
            b.iter(|| {
                let out = loads(std::hint::black_box(s), &config).unwrap();
                std::hint::black_box(out);
            })
        });
    }
    group.finish();
}

fn bench_partial(c: &mut Criterion) {
    let mut group = c.benchmark_group("partial");
    let s = r#"{"a": 1, "b": @, "c": [1, @, 3], "d": "ok"}"#;
    let config = ParseConfig::default();
    group.bench_function("skip_fields", |b| {
        b.iter(|| {
            let out = parse_partial(
                std::hint::black_box(s),
                RecoveryLevel::SkipFields,
                &config,
            )
            .unwrap();
            std::hint::black_box(out);
        })
    });
    group.finish();
}

fn bench_large_valid(c: &mut Criterion) {
    let mut group = c.benchmark_group("large_valid");
    let mut s = String::from("[");
    for i in 0..10_000 {
        if i > 0 {
            s.push(',');
        }
        s.push_str("{\"id\":");
        s.push_str(&i.to_string());
        s.push_str(",\"name\":\"item\"}");
    }
    s.push(']');
    let config = ParseConfig::default();
    group.bench_function("array_10k_objects", |b| {
        b.iter(|| {
            let out = loads(std::hint::black_box(&s), &config).unwrap();
            std::hint::black_box(out);
        })
    });
    group.finish();
}

criterion_group!(benches, bench_loads, bench_partial, bench_large_valid);
criterion_main!(benches);
