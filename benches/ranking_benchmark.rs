use criterion::{criterion_group, criterion_main, Criterion};
use greencommute::models::{Coordinate, TransportMode};
use greencommute::services::points::route_points;
use greencommute::services::ranker::{rank, recommend};
use greencommute::services::RouteMenu;
use std::collections::HashSet;
use std::hint::black_box;

fn benchmark_plan(c: &mut Criterion) {
    let menu = RouteMenu::default();
    let origin = Coordinate::new(48.2082, 16.3738).expect("valid origin");
    let destination = Coordinate::new(47.0735, 15.4157).expect("valid destination");
    let allowed: HashSet<TransportMode> = TransportMode::ALL.iter().copied().collect();

    let mut group = c.benchmark_group("route_planning");

    group.bench_function("generate_candidates", |b| {
        b.iter(|| menu.generate_candidates(black_box(origin), black_box(destination), &allowed))
    });

    let candidates = menu
        .generate_candidates(origin, destination, &allowed)
        .expect("menu has candidates");

    group.bench_function("rank_and_recommend", |b| {
        b.iter(|| {
            let ranked = rank(black_box(candidates.clone()), 80.0).expect("valid balance");
            recommend(&ranked)
        })
    });

    group.bench_function("route_points", |b| {
        b.iter(|| {
            candidates
                .iter()
                .map(|c| route_points(black_box(c)))
                .sum::<u32>()
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_plan);
criterion_main!(benches);
