use criterion::criterion_group;
use criterion::criterion_main;
use criterion::Criterion;

pub mod decode;

pub fn bench_main(c: &mut Criterion) {
    oopmap::init_logger();
    decode::stream::bench(c);
    decode::roots::bench(c);
}

criterion_group!(benches, bench_main);
criterion_main!(benches);
