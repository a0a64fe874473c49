//! Driver tests on a paused tokio clock.
//!
//! The runtime's virtual clock drives both the tick interval and the
//! simulation clock, so seconds of play run instantly and deterministically.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use ekk0_core::commentary::{
    Commentator, FEED_LINES, LocalCommentator, Reaction, ReactionRequest, ReactionSource,
};
use ekk0_core::config::Ekk0Config;
use ekk0_core::creature::CreatureState;
use ekk0_core::error::Result;
use ekk0_core::lifecycle::LifecycleNotice;
use ekk0_core::memory::{EventKind, MemoryStats};
use ekk0_core::persistence::{
    JsonFileStore, MemorySnapshotStore, SaveReceipt, Snapshot, SnapshotOrigin, SnapshotStore,
};
use ekk0_core::session::Session;
use ekk0_core::types::{ActionKind, Timestamp, VisitorId};
use ekk0_host::{Driver, DriverHandle, HostClock, HostCommand, HostEvent};

const EPOCH: Timestamp = Timestamp(1_000_000);

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Memory store that counts saves.
#[derive(Debug, Default)]
struct CountingStore {
    inner: MemorySnapshotStore,
    saves: AtomicUsize,
}

impl CountingStore {
    fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl SnapshotStore for CountingStore {
    fn load_snapshot(&self, visitor: &VisitorId) -> Result<Option<Snapshot>> {
        self.inner.load_snapshot(visitor)
    }

    fn save_snapshot(
        &self,
        visitor: &VisitorId,
        snapshot: &Snapshot,
        last_sync: Option<Timestamp>,
    ) -> Result<SaveReceipt> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save_snapshot(visitor, snapshot, last_sync)
    }
}

/// A generator that never answers.
struct SilentCommentator;

impl Commentator for SilentCommentator {
    fn generate_reaction(&self, _request: &ReactionRequest) -> impl Future<Output = Reaction> + Send {
        std::future::pending()
    }
}

fn visitor() -> VisitorId {
    VisitorId::from("host-test")
}

fn spawn_driver<C: Commentator + 'static>(
    commentator: C,
    remote: Arc<CountingStore>,
    local: Option<JsonFileStore>,
    config: Ekk0Config,
) -> DriverHandle {
    let session = Session::seeded(visitor(), config, EPOCH, 7);
    let (mut driver, events) = Driver::new(session, HostClock::starting_at(EPOCH), Arc::new(commentator));
    driver = driver.with_remote(remote);
    if let Some(local) = local {
        driver = driver.with_local(local);
    }
    driver.spawn(events)
}

async fn wait_for(handle: &mut DriverHandle, pred: impl Fn(&HostEvent) -> bool) -> HostEvent {
    tokio::time::timeout(Duration::from_secs(30), async {
        loop {
            let event = handle.events.recv().await.expect("driver running");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("event arrived in time")
}

fn snapshot_of(creature: CreatureState) -> Snapshot {
    Snapshot {
        creature,
        stats: MemoryStats::default(),
        events: Vec::new(),
        saved_at: Timestamp(0),
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn action_reports_capture_reaction_and_writes_local_snapshot() {
    let dir = tempfile::tempdir().expect("tempdir");
    let local = JsonFileStore::open(dir.path()).expect("open");
    let remote = Arc::new(CountingStore::default());
    let mut handle = spawn_driver(
        LocalCommentator::seeded(1),
        remote,
        Some(local),
        Ekk0Config::default(),
    );

    assert!(handle.send(HostCommand::Action(ActionKind::Feed)));
    wait_for(&mut handle, |e| {
        matches!(e, HostEvent::ActionAccepted { kind: ActionKind::Feed, .. })
    })
    .await;
    let capture = wait_for(&mut handle, |e| matches!(e, HostEvent::Memory(_))).await;
    let HostEvent::Memory(capture) = capture else { unreachable!() };
    assert_eq!(capture.kind, EventKind::Capture);

    let reaction = wait_for(&mut handle, |e| matches!(e, HostEvent::Reaction(_))).await;
    let HostEvent::Reaction(reaction) = reaction else { unreachable!() };
    assert_eq!(reaction.source, ReactionSource::Local);
    assert!(FEED_LINES.contains(&reaction.text.as_str()));

    let session = handle.shutdown().await.expect("join");
    assert_eq!(session.creature().total_feeds, 1);

    let reader = JsonFileStore::open(dir.path()).expect("open");
    let stored = reader.load_snapshot(&visitor()).expect("load").expect("some");
    assert_eq!(stored.creature.total_feeds, 1);
}

#[tokio::test(start_paused = true)]
async fn slow_commentary_never_blocks_ticking() {
    let remote = Arc::new(CountingStore::default());
    let mut handle = spawn_driver(SilentCommentator, remote, None, Ekk0Config::default());

    handle.send(HostCommand::Action(ActionKind::Play));
    wait_for(&mut handle, |e| matches!(e, HostEvent::ActionAccepted { .. })).await;

    // The lockout only runs out if ticks keep coming.
    tokio::time::sleep(Duration::from_millis(2500)).await;
    handle.send(HostCommand::Action(ActionKind::Sleep));
    wait_for(&mut handle, |e| {
        matches!(e, HostEvent::ActionAccepted { kind: ActionKind::Sleep, .. })
    })
    .await;

    let session = handle.shutdown().await.expect("join");
    assert_eq!(session.creature().total_actions(), 2);
}

#[tokio::test(start_paused = true)]
async fn actions_inside_lockout_are_reported_ignored() {
    let remote = Arc::new(CountingStore::default());
    let mut handle = spawn_driver(LocalCommentator::seeded(2), remote, None, Ekk0Config::default());

    handle.send(HostCommand::Action(ActionKind::Learn));
    handle.send(HostCommand::Action(ActionKind::Feed));
    wait_for(&mut handle, |e| matches!(e, HostEvent::ActionIgnored(ActionKind::Feed))).await;

    let session = handle.shutdown().await.expect("join");
    assert_eq!(session.creature().total_actions(), 1);
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn remote_saves_are_debounced() {
    let remote = Arc::new(CountingStore::default());
    let mut handle = spawn_driver(
        LocalCommentator::seeded(3),
        Arc::clone(&remote),
        None,
        Ekk0Config::default(),
    );

    handle.send(HostCommand::Action(ActionKind::Feed));
    tokio::time::sleep(Duration::from_millis(1000)).await;
    handle.send(HostCommand::Reset);
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(remote.saves(), 0, "deadline moved out by the reset");

    let saved = wait_for(&mut handle, |e| matches!(e, HostEvent::Saved(_))).await;
    let HostEvent::Saved(receipt) = saved else { unreachable!() };
    assert_eq!(remote.saves(), 1);
    assert_eq!(receipt.total_actions, 0);

    let session = handle.shutdown().await.expect("join");
    assert_eq!(remote.saves(), 1);
    assert_eq!(session.last_sync(), Some(receipt.updated_at));
}

#[tokio::test(start_paused = true)]
async fn pending_save_is_flushed_on_shutdown() {
    let remote = Arc::new(CountingStore::default());
    let mut handle = spawn_driver(
        LocalCommentator::seeded(4),
        Arc::clone(&remote),
        None,
        Ekk0Config::default(),
    );

    handle.send(HostCommand::Action(ActionKind::Sleep));
    wait_for(&mut handle, |e| matches!(e, HostEvent::ActionAccepted { .. })).await;
    let session = handle.shutdown().await.expect("join");

    assert_eq!(remote.saves(), 1);
    let stored = remote.load_snapshot(&visitor()).expect("load").expect("some");
    assert_eq!(stored.creature.total_sleeps, 1);
    assert!(session.last_sync().is_some());
}

#[tokio::test(start_paused = true)]
async fn autosave_writes_local_snapshot_without_actions() {
    let dir = tempfile::tempdir().expect("tempdir");
    let local = JsonFileStore::open(dir.path()).expect("open");
    let mut config = Ekk0Config::default();
    config.persistence.autosave_ticks = 30;
    let handle = spawn_driver(
        LocalCommentator::seeded(5),
        Arc::new(CountingStore::default()),
        Some(local),
        config,
    );

    tokio::time::sleep(Duration::from_millis(1000)).await;
    let reader = JsonFileStore::open(dir.path()).expect("open");
    assert!(reader.load_snapshot(&visitor()).expect("load").is_some());

    handle.shutdown().await.expect("join");
}

#[tokio::test(start_paused = true)]
async fn remote_snapshot_is_restored_on_start() {
    let remote = Arc::new(CountingStore::default());
    let mut creature = CreatureState::new(Timestamp(0));
    creature.total_feeds = 5;
    creature.total_learns = 4;
    remote
        .inner
        .save_snapshot(&visitor(), &snapshot_of(creature), None)
        .expect("seed");

    let mut handle = spawn_driver(
        LocalCommentator::seeded(6),
        Arc::clone(&remote),
        None,
        Ekk0Config::default(),
    );
    wait_for(&mut handle, |e| matches!(e, HostEvent::Restored(SnapshotOrigin::Remote))).await;

    handle.send(HostCommand::Status);
    let status = wait_for(&mut handle, |e| matches!(e, HostEvent::Status(_))).await;
    let HostEvent::Status(report) = status else { unreachable!() };
    assert_eq!(report.creature.total_actions(), 9);
    assert_eq!(report.stats.patterns, 3);
    assert!(report.last_sync.is_some());

    handle.shutdown().await.expect("join");
}

#[tokio::test(start_paused = true)]
async fn merged_progress_is_kept_by_later_saves() {
    let remote = Arc::new(CountingStore::default());
    remote
        .inner
        .save_snapshot(&visitor(), &snapshot_of(CreatureState::new(Timestamp(0))), None)
        .expect("seed");

    let mut handle = spawn_driver(
        LocalCommentator::seeded(8),
        Arc::clone(&remote),
        None,
        Ekk0Config::default(),
    );
    wait_for(&mut handle, |e| matches!(e, HostEvent::Restored(SnapshotOrigin::Remote))).await;

    // Another device writes after our load.
    let mut other = CreatureState::new(Timestamp(0));
    other.total_plays = 3;
    let mut newer = snapshot_of(other);
    newer.saved_at = Timestamp(500);
    remote.inner.save_snapshot(&visitor(), &newer, None).expect("other device");

    handle.send(HostCommand::Action(ActionKind::Feed));
    let saved = wait_for(&mut handle, |e| matches!(e, HostEvent::Saved(_))).await;
    let HostEvent::Saved(receipt) = saved else { unreachable!() };
    assert!(receipt.merged);
    assert_eq!(receipt.total_actions, 4);

    tokio::time::sleep(Duration::from_millis(500)).await;
    handle.send(HostCommand::Action(ActionKind::Sleep));
    wait_for(&mut handle, |e| {
        matches!(e, HostEvent::ActionAccepted { kind: ActionKind::Sleep, .. })
    })
    .await;
    let saved = wait_for(&mut handle, |e| matches!(e, HostEvent::Saved(_))).await;
    let HostEvent::Saved(receipt) = saved else { unreachable!() };
    assert!(!receipt.merged);
    assert_eq!(receipt.total_actions, 5);

    let stored = remote.load_snapshot(&visitor()).expect("load").expect("some");
    assert_eq!(stored.creature.total_plays, 3);
    assert_eq!(stored.creature.total_feeds, 1);
    assert_eq!(stored.creature.total_sleeps, 1);

    let session = handle.shutdown().await.expect("join");
    assert_eq!(session.creature().total_plays, 3);
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn starving_creature_dies_and_can_be_reset() {
    let remote = Arc::new(CountingStore::default());
    let mut creature = CreatureState::new(Timestamp(0));
    creature.hunger = 0.1;
    creature.energy = 0.1;
    remote
        .inner
        .save_snapshot(&visitor(), &snapshot_of(creature), None)
        .expect("seed");

    let mut handle = spawn_driver(
        LocalCommentator::seeded(7),
        Arc::clone(&remote),
        None,
        Ekk0Config::default(),
    );
    wait_for(&mut handle, |e| matches!(e, HostEvent::Notice(LifecycleNotice::Died))).await;

    handle.send(HostCommand::Action(ActionKind::Feed));
    wait_for(&mut handle, |e| matches!(e, HostEvent::ActionIgnored(ActionKind::Feed))).await;

    handle.send(HostCommand::Reset);
    wait_for(&mut handle, |e| matches!(e, HostEvent::Notice(LifecycleNotice::Reborn))).await;

    let session = handle.shutdown().await.expect("join");
    assert!(session.creature().alive);
    assert_eq!(session.creature().total_actions(), 0);
}
