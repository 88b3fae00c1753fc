//! Benchmarks pour la résolution d'identité

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use region_label::{resolve, FeatureRecord, Level};
use serde_json::json;

fn bench_strict(c: &mut Criterion) {
    let record = FeatureRecord::from_pairs([
        ("SIG_CD", json!("11680")),
        ("SIG_KOR_NM", json!("강남구")),
        ("SIG_ENG_NM", json!("Gangnam-gu")),
    ]);

    c.bench_function("resolve_strict", |b| {
        b.iter(|| resolve(black_box(&record), Level::Municipality, 0))
    });
}

fn bench_scored(c: &mut Criterion) {
    let record = FeatureRecord::from_pairs([
        ("CTP_KOR_NM", json!("서울특별시")),
        ("label", json!("Gangnam-gu / 강남구 | 江南區")),
        ("name", json!("서울특별시  강남구")),
        ("lang", json!("ko")),
        ("full_nm", json!("Seoul Gangnam-gu 강남구")),
    ]);

    c.bench_function("resolve_scored", |b| {
        b.iter(|| resolve(black_box(&record), Level::Municipality, 0))
    });
}

criterion_group!(benches, bench_strict, bench_scored);
criterion_main!(benches);
