use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::io;
use std::thread;

use shmpipe::{ChannelKeys, Consumer, Producer};

fn bench(c: &mut Criterion) {
    let file = tempfile::NamedTempFile::new().unwrap();
    let keys = ChannelKeys::from_path(file.path()).unwrap();
    let input = vec![0xA5u8; 1 << 20];

    let mut group = c.benchmark_group("transfer_throughput");
    group.throughput(Throughput::Bytes(input.len() as u64));
    group.bench_function("1MiB", |b| {
        b.iter(|| {
            let producer = Producer::create(keys).unwrap();
            let consumer = Consumer::open(keys).unwrap();
            let input = &input;
            thread::scope(|s| {
                s.spawn(move || producer.run(&input[..]).unwrap());
                consumer.run(io::sink()).unwrap()
            })
        })
    });
    group.finish();
}

criterion_group!(benches, bench);
criterion_main!(benches);
