//! Benchmark for reward rolls.
//!
//! Run with: cargo bench --package goodwill_economy --bench roll_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use goodwill_economy::{EconomyEngine, RarityTable, SeededRolls};

fn benchmark_tier_for(c: &mut Criterion) {
    let table = RarityTable::default();
    let mut group = c.benchmark_group("rarity");
    group.throughput(Throughput::Elements(1));

    group.bench_function("tier_for_neutral_luck", |b| {
        b.iter(|| table.tier_for(black_box(0.97), black_box(1.0)));
    });
    group.bench_function("tier_for_high_luck", |b| {
        b.iter(|| table.tier_for(black_box(0.97), black_box(7.5)));
    });

    group.finish();
}

fn benchmark_pack_opening(c: &mut Criterion) {
    let engine = EconomyEngine::builtin().unwrap();
    engine.adjust_goodwill(1, 2500.0).unwrap();
    let mut rolls = SeededRolls::new(42);

    let mut group = c.benchmark_group("packs");
    group.throughput(Throughput::Elements(10));
    group.bench_function("open_pack_10_draws", |b| {
        b.iter(|| engine.open_pack(1, black_box(1), 10, &mut rolls).unwrap());
    });
    group.finish();
}

fn benchmark_synthesis(c: &mut Criterion) {
    let engine = EconomyEngine::builtin().unwrap();
    let mut rolls = SeededRolls::new(7);

    c.bench_function("synthesize_two_commons", |b| {
        b.iter(|| {
            engine.add_item(2, 1).unwrap();
            engine.add_item(2, 2).unwrap();
            let outcome = engine.synthesize(2, 1, 2, &mut rolls).unwrap();
            engine.remove_item(2, outcome.item.id).unwrap();
            black_box(outcome)
        });
    });
}

criterion_group!(
    benches,
    benchmark_tier_for,
    benchmark_pack_opening,
    benchmark_synthesis
);
criterion_main!(benches);
