use criterion::{criterion_group, criterion_main, Criterion};
use spamsum::Signature;

fn signature_pairs() -> Vec<(String, String)> {
    // Hash neighboring slices of one pseudorandom buffer so the pairs are
    // realistic: same block size, partially overlapping content.
    let mut state = 0x2545_f491u32;
    let data: Vec<u8> = (0..128 * 1024)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as u8
        })
        .collect();
    let step = 8 * 1024;
    (0..8)
        .map(|i| {
            let a = &data[i * step..(i + 8) * step];
            let b = &data[i * step + 512..(i + 8) * step + 512];
            (
                spamsum::hash(a).expect("hash"),
                spamsum::hash(b).expect("hash"),
            )
        })
        .collect()
}

fn bench_compare_strings(c: &mut Criterion) {
    let pairs = signature_pairs();
    c.bench_function("compare_strings", |b| {
        b.iter(|| {
            pairs
                .iter()
                .map(|(x, y)| spamsum::compare(x, y))
                .sum::<i32>()
        })
    });
}

fn bench_compare_parsed(c: &mut Criterion) {
    let pairs: Vec<(Signature, Signature)> = signature_pairs()
        .iter()
        .map(|(x, y)| {
            (
                Signature::parse(x).expect("parse"),
                Signature::parse(y).expect("parse"),
            )
        })
        .collect();
    c.bench_function("compare_parsed", |b| {
        b.iter(|| pairs.iter().map(|(x, y)| x.compare(y)).sum::<i32>())
    });
}

criterion_group!(benches, bench_compare_strings, bench_compare_parsed);
criterion_main!(benches);
