use criterion::{black_box, criterion_group, criterion_main, Criterion};
use jvm_remap::MappingFormat;

fn tiny_mapping(classes: usize) -> String {
    let mut text = String::from("tiny\t2\t0\tofficial\tintermediary\tnamed\n");
    for class in 0..classes {
        text.push_str(&format!("c\tc{0}\tnet/minecraft/class_{0}\tcom/example/Type{0}\n", class));
        for member in 0..8 {
            text.push_str(&format!("\tf\tI\tf{0}\tfield_{1}_{0}\tvalue{0}\n", member, class));
            text.push_str(&format!(
                "\tm\t(Lc{1};I)V\tm{0}\tmethod_{1}_{0}\trun{0}\n\t\tp\t2\t\t\tcount\n",
                member, class
            ));
        }
    }
    text
}

fn criterion_benchmark(c: &mut Criterion) {
    let tiny = tiny_mapping(500);
    c.bench_function("tiny v2 parsing", |b| {
        b.iter(|| MappingFormat::TinyV2.parse(black_box(&tiny)))
    });

    let mapping = MappingFormat::TinyV2.parse(&tiny).unwrap();
    c.bench_function("namespace swap", |b| {
        b.iter(|| {
            let mut mapping = mapping.clone();
            mapping.swap("official", "named").unwrap();
            mapping
        })
    });

    c.bench_function("tiny v2 generation", |b| {
        b.iter(|| MappingFormat::TinyV2.generate(black_box(&mapping)))
    });

    let mut swapped = mapping.clone();
    swapped.swap("official", "named").unwrap();
    c.bench_function("tiny v2 generation after swap", |b| {
        b.iter(|| MappingFormat::TinyV2.generate(black_box(&swapped)))
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(25);
    targets = criterion_benchmark
}
criterion_main!(benches);
