// Canonical codec benchmarks for the dPACE protocol.
//
// Covers single-payload encoding and decoding plus batch decoding at
// various sizes, since the node decodes one payload per signature check.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use dpace_protocol::codec::{decode, encode};
use dpace_protocol::crypto::keys::DpaceKeypair;
use dpace_protocol::crypto::sha256;
use dpace_protocol::identity::PartyId;

fn bench_encode(c: &mut Criterion) {
    let keypair = DpaceKeypair::generate();
    let destination = PartyId::from_public_key(&keypair.public_key());
    let digest = sha256(b"availability token");

    c.bench_function("codec/encode", |b| {
        b.iter(|| encode(&destination, true, &digest));
    });
}

fn bench_decode(c: &mut Criterion) {
    let keypair = DpaceKeypair::generate();
    let destination = PartyId::from_public_key(&keypair.public_key());
    let digest = sha256(b"availability token");
    let payload = encode(&destination, true, &digest);

    c.bench_function("codec/decode", |b| {
        b.iter(|| decode(&payload).unwrap());
    });
}

fn bench_decode_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec/decode_batch");

    for size in [10, 50, 100, 500] {
        let payloads: Vec<_> = (0..size)
            .map(|i| {
                let kp = DpaceKeypair::generate();
                let destination = PartyId::from_public_key(&kp.public_key());
                let digest = sha256(format!("token-{:06}", i).as_bytes());
                encode(&destination, i % 2 == 0, &digest)
            })
            .collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &payloads, |b, payloads| {
            b.iter(|| {
                for payload in payloads {
                    decode(payload).unwrap();
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_decode_batch);
criterion_main!(benches);
