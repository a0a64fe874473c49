//! ekk0 Benchmark Suite
//!
//! Performance targets (one 60 Hz frame is ~16.7 ms):
//!   tick_alive ..................... < 5μs
//!   tick_with_due_deferred ......... < 20μs
//!   action_feed .................... < 20μs
//!   thirty_action_cycle ............ < 5ms
//!   snapshot_json_round_trip ....... < 100μs

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

use ekk0_core::config::Ekk0Config;
use ekk0_core::persistence::{MemorySnapshotStore, SnapshotStore};
use ekk0_core::session::Session;
use ekk0_core::types::{ActionKind, Timestamp, VisitorId};

const FRAME_MS: i64 = 16;

fn session() -> Session {
    Session::seeded(VisitorId::from("bench"), Ekk0Config::default(), Timestamp(0), 42)
}

/// Run `ticks` frames after `from`; returns the last timestamp.
fn frames(s: &mut Session, from: i64, ticks: i64) -> i64 {
    let mut t = from;
    for _ in 0..ticks {
        t += FRAME_MS;
        s.tick(Timestamp(t));
    }
    t
}

/// Benchmark: one tick of a live creature with nothing pending.
fn bench_tick(c: &mut Criterion) {
    let mut s = session();
    let mut t = 0;
    c.bench_function("tick_alive", |b| {
        b.iter(|| {
            t += FRAME_MS;
            // Keep the creature alive across millions of iterations.
            if t % 600_000 == 0 {
                s.reset(Timestamp(t));
            }
            black_box(s.tick(Timestamp(t)));
        });
    });
}

/// Benchmark: a tick that releases a pattern and a directive.
fn bench_tick_with_deferred(c: &mut Criterion) {
    c.bench_function("tick_with_due_deferred", |b| {
        b.iter_batched(
            || {
                let mut s = session();
                let mut t = 0;
                for i in 0..10 {
                    s.perform_action(ActionKind::ALL[i % 4], Timestamp(t));
                    t = frames(&mut s, t, 120);
                }
                (s, t)
            },
            |(mut s, t)| black_box(s.tick(Timestamp(t + 2_000))),
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark: a single accepted feed.
fn bench_action(c: &mut Criterion) {
    c.bench_function("action_feed", |b| {
        b.iter_batched(
            session,
            |mut s| black_box(s.perform_action(ActionKind::Feed, Timestamp(0))),
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark: thirty actions, each followed by its two-second lockout.
fn bench_cycle(c: &mut Criterion) {
    c.bench_function("thirty_action_cycle", |b| {
        b.iter(|| {
            let mut s = session();
            let mut t = 0;
            for i in 0..30 {
                s.perform_action(ActionKind::ALL[i % 4], Timestamp(t));
                t = frames(&mut s, t, 120);
            }
            black_box(s.stats());
        });
    });
}

/// Benchmark: save then load through the in-memory store.
fn bench_snapshot(c: &mut Criterion) {
    let store = MemorySnapshotStore::new();
    let mut s = session();
    let mut t = 0;
    for i in 0..20 {
        s.perform_action(ActionKind::ALL[i % 4], Timestamp(t));
        t = frames(&mut s, t, 120);
    }
    let snapshot = s.snapshot(Timestamp(t), true);
    let visitor = s.visitor().clone();

    c.bench_function("snapshot_json_round_trip", |b| {
        b.iter(|| {
            let json = serde_json_round_trip(&snapshot);
            black_box(json);
        });
    });
    c.bench_function("memory_store_save_load", |b| {
        b.iter(|| {
            let _ = store.save_snapshot(&visitor, black_box(&snapshot), None);
            black_box(store.load_snapshot(&visitor).ok());
        });
    });
}

fn serde_json_round_trip(snapshot: &ekk0_core::persistence::Snapshot) -> Option<ekk0_core::persistence::Snapshot> {
    let bytes = serde_json::to_vec(snapshot).ok()?;
    serde_json::from_slice(&bytes).ok()
}

criterion_group!(
    benches,
    bench_tick,
    bench_tick_with_deferred,
    bench_action,
    bench_cycle,
    bench_snapshot,
);
criterion_main!(benches);
