//! Cascade and round benchmarks

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rf_cluster::{
    ClusterDetector, GameDefinition, Grid, MultiplierOverlay, ReelSource, RoundController,
    RoundType,
};

fn bench_find_clusters(c: &mut Criterion) {
    let definition = GameDefinition::standard_7x7();
    let mut source = definition.strip_source(7);
    let _ = source.begin_spin(RoundType::Base);
    let grid = match Grid::populate_initial(definition.config.grid, &mut source) {
        Ok(grid) => grid,
        Err(e) => panic!("populate failed: {e}"),
    };
    let detector = ClusterDetector::default();

    c.bench_function("find_clusters_7x7", |b| {
        b.iter(|| detector.find_clusters(black_box(&grid)))
    });
}

fn bench_resolve_spin(c: &mut Criterion) {
    let definition = GameDefinition::standard_7x7();
    let engine = definition.config.engine();
    let mut source = definition.strip_source(11);

    c.bench_function("resolve_spin_7x7", |b| {
        b.iter(|| {
            let _ = source.begin_spin(RoundType::Base);
            let mut overlay =
                MultiplierOverlay::new(definition.config.grid, definition.config.overlay);
            let grid = Grid::populate_initial(definition.config.grid, &mut source).ok()?;
            engine
                .resolve(grid, &mut overlay, &definition.paytable, &mut source, None)
                .ok()
                .map(|outcome| black_box(outcome.total_payout))
        })
    });
}

fn bench_play_round(c: &mut Criterion) {
    let definition = GameDefinition::standard_7x7();
    let Ok(mut controller) =
        RoundController::from_definition(&definition, definition.strip_source(13))
    else {
        return;
    };

    c.bench_function("play_round_7x7", |b| {
        b.iter(|| controller.play_round().map(|s| black_box(s.total_payout)).ok())
    });
}

criterion_group!(benches, bench_find_clusters, bench_resolve_spin, bench_play_round);
criterion_main!(benches);
