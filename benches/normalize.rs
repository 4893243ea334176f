use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use recordlink::{compile, normalize_table, normalize_text, NormalizeConfig, RawFieldSpec, Table, Value};

const NAMES: &[&str] = &[
    "ACME Corp.",
    "  Globex   Corporation ",
    "Initech, LLC",
    "Société Générale",
    "\"Umbrella\" Inc",
    "Stark Industries!!",
];

fn sample_table(rows: usize) -> Table {
    let data = (0..rows)
        .map(|i| {
            vec![
                Value::from(NAMES[i % NAMES.len()]),
                Value::from(format!("{}.{:02}", i % 500, i % 100)),
                if i % 7 == 0 {
                    Value::Null
                } else {
                    Value::from(format!("Street {}  #{}", i, i % 13))
                },
            ]
        })
        .collect();
    Table::from_rows(["name", "price", "address"], data).expect("bench table")
}

fn text_bench(c: &mut Criterion) {
    let cfg = NormalizeConfig::default();
    c.bench_function("normalize_text_names", |b| {
        b.iter(|| {
            for name in NAMES {
                black_box(normalize_text(black_box(name), &cfg));
            }
        });
    });
}

fn table_bench(c: &mut Criterion) {
    let cfg = NormalizeConfig::default();
    let specs = compile(&[
        RawFieldSpec::from("name"),
        RawFieldSpec::from(("price", "Price")),
        RawFieldSpec::from(("address", "String", "has missing")),
    ])
    .expect("bench fields");

    let mut group = c.benchmark_group("normalize_table");
    for rows in [1_000usize, 10_000] {
        let table = sample_table(rows);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_function(format!("{rows}_rows"), |b| {
            b.iter(|| {
                let out = normalize_table(black_box(&table), &specs, &cfg).expect("normalize");
                black_box(out);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, text_bench, table_bench);
criterion_main!(benches);
