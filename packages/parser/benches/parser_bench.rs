use criterion::{black_box, criterion_group, criterion_main, Criterion};
use slotmark_parser::{scan, serialize, ComponentRegistry, SerializeOptions};

fn sample_text(repeat: usize) -> String {
    let paragraph = "Hi {@NAME}, your coupon {TLJ-PLLJ-ABC123} expires soon [微笑] \
                     also try {TLJ-PLJDLJ-JD42} or the old [TLJ-PLLJ-legacy] code. ";
    paragraph.repeat(repeat)
}

fn scan_short(c: &mut Criterion) {
    let registry = ComponentRegistry::with_builtins();
    let source = sample_text(1);

    c.bench_function("scan_short", |b| b.iter(|| scan(black_box(&source), &registry)));
}

fn scan_long(c: &mut Criterion) {
    let registry = ComponentRegistry::with_builtins();
    let source = sample_text(200);

    c.bench_function("scan_long", |b| b.iter(|| scan(black_box(&source), &registry)));
}

fn serialize_long(c: &mut Criterion) {
    let registry = ComponentRegistry::with_builtins();
    let doc = scan(&sample_text(200), &registry);

    c.bench_function("serialize_long", |b| {
        b.iter(|| serialize(black_box(&doc), &registry, SerializeOptions::default()))
    });
}

criterion_group!(benches, scan_short, scan_long, serialize_long);
criterion_main!(benches);
