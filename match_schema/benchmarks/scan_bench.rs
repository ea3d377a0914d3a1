use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use match_schema::{
    encode_map, root_as_map, write_match, BodyType, MapState, MatchEvent, MatchFooterState,
    MatchHeaderState, MatchStream, RoundState, SpawnedBodyState, Team, Vec2,
};

fn arena(bodies: usize) -> MapState {
    MapState {
        name: Some("bench_arena".to_string()),
        min_corner: Vec2::ZERO,
        max_corner: Vec2::new(1000.0, 1000.0),
        bodies: (0..bodies)
            .map(|index| SpawnedBodyState {
                robot_id: index as i32,
                team: if index % 2 == 0 { Team::A } else { Team::B },
                body_type: BodyType::ALL[index % BodyType::ALL.len()],
                loc: Vec2::new((index % 1000) as f32, (index / 1000) as f32),
            })
            .collect(),
    }
}

fn replay(rounds: i32, movers: i32) -> Vec<MatchEvent> {
    let mut events = vec![MatchEvent::MatchHeader(MatchHeaderState {
        map: Some(arena(64)),
        max_rounds: rounds,
    })];
    events.extend((1..=rounds).map(|round_id| {
        MatchEvent::Round(RoundState {
            round_id,
            moved_ids: (0..movers).collect(),
            moved_locs: (0..movers)
                .map(|id| Vec2::new(id as f32, round_id as f32))
                .collect(),
            ..RoundState::default()
        })
    }));
    events.push(MatchEvent::MatchFooter(MatchFooterState {
        winner: Team::A,
        total_rounds: rounds,
    }));
    events
}

fn scan_map(buf: &[u8]) -> i64 {
    let Ok(map) = root_as_map(buf) else {
        return 0;
    };
    let Ok(bodies) = map.bodies() else {
        return 0;
    };
    bodies
        .iter()
        .filter_map(|body| body.and_then(|b| b.robot_id()).ok())
        .map(i64::from)
        .sum()
}

fn scan_stream(buf: &[u8]) -> usize {
    MatchStream::new(buf)
        .filter_map(Result::ok)
        .filter_map(|wrapper| wrapper.as_round().ok().flatten())
        .filter_map(|round| round.movement_count().ok())
        .sum()
}

fn bench_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("map");
    for &size in &[64usize, 1024, 16384] {
        let state = arena(size);
        group.bench_with_input(BenchmarkId::new("encode", size), &state, |b, state| {
            b.iter(|| encode_map(black_box(state)));
        });

        group.bench_with_input(BenchmarkId::new("scan", size), &size, |b, &size| {
            b.iter_batched(
                || encode_map(&arena(size)).unwrap_or_default(),
                |buf| black_box(scan_map(&buf)),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_stream");
    for &rounds in &[100i32, 1000] {
        let events = replay(rounds, 32);
        let bytes = write_match(&events).unwrap_or_default();
        group.bench_with_input(BenchmarkId::new("write", rounds), &events, |b, events| {
            b.iter(|| write_match(black_box(events)));
        });
        group.bench_with_input(BenchmarkId::new("scan", rounds), &bytes, |b, bytes| {
            b.iter(|| black_box(scan_stream(bytes)));
        });
    }
    group.finish();
}

criterion_group!(scan_benches, bench_map, bench_stream);
criterion_main!(scan_benches);
