use criterion::{black_box, criterion_group, criterion_main, Criterion};
use izprime::{
    bitset::BitSet, sieve_eratosthenes, sieve_iz, sieve_izm, sieve_wheel, solve_for_x,
    wheel_construct, Matrix,
};

fn bench_sieve_eratosthenes_1m(c: &mut Criterion) {
    c.bench_function("sieve_eratosthenes(1_000_000)", |b| {
        b.iter(|| sieve_eratosthenes(black_box(1_000_000)));
    });
}

fn bench_sieve_wheel_1m(c: &mut Criterion) {
    c.bench_function("sieve_wheel(1_000_000)", |b| {
        b.iter(|| sieve_wheel(black_box(1_000_000)));
    });
}

fn bench_sieve_iz_1m(c: &mut Criterion) {
    c.bench_function("sieve_iz(1_000_000)", |b| {
        b.iter(|| sieve_iz(black_box(1_000_000)));
    });
}

fn bench_sieve_izm_1m(c: &mut Criterion) {
    c.bench_function("sieve_izm(1_000_000)", |b| {
        b.iter(|| sieve_izm(black_box(1_000_000)));
    });
}

fn bench_wheel_construct_vx6(c: &mut Criterion) {
    c.bench_function("wheel_construct(1_616_615)", |b| {
        b.iter(|| {
            let mut x5 = BitSet::new(1_616_615 + 2);
            let mut x7 = BitSet::new(1_616_615 + 2);
            wheel_construct(black_box(1_616_615), &mut x5, &mut x7);
            (x5.count_ones(), x7.count_ones())
        });
    });
}

fn bench_solve_for_x(c: &mut Criterion) {
    c.bench_function("solve_for_x over 10k primes", |b| {
        let primes = sieve_eratosthenes(200_000);
        let roots: Vec<u64> = primes.iter().filter(|&p| p > 19).collect();
        b.iter(|| {
            let mut acc = 0u64;
            for &p in roots.iter().take(10_000) {
                acc ^= solve_for_x(Matrix::Minus, black_box(p), 1_616_615, 12_345);
            }
            acc
        });
    });
}

criterion_group!(
    benches,
    bench_sieve_eratosthenes_1m,
    bench_sieve_wheel_1m,
    bench_sieve_iz_1m,
    bench_sieve_izm_1m,
    bench_wheel_construct_vx6,
    bench_solve_for_x,
);
criterion_main!(benches);
