//! The real-time driver.
//!
//! One tokio task owns the [`Session`] and is the only thing that mutates
//! it. Each loop iteration handles exactly one of:
//!
//! - a tick of the fixed-rate interval (default 60 Hz)
//! - a [`HostCommand`] from the front end
//! - a finished background job (remote load or save)
//!
//! Commentary and remote persistence run as detached tasks whose results
//! come back through the loop, so a slow model or an unreachable store
//! never delays a tick. Remote saves use a trailing debounce: every change
//! pushes the save deadline out, and only the last one in a burst is sent.
//! The local snapshot is written synchronously after every change and on
//! an autosave cadence.

use std::sync::Arc;
use std::time::Duration;

use ekk0_core::commentary::Commentator;
use ekk0_core::error::Result;
use ekk0_core::persistence::{JsonFileStore, SaveReceipt, Snapshot, SnapshotOrigin, SnapshotStore};
use ekk0_core::session::Session;
use ekk0_core::types::{ActionKind, Timestamp};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::{FrameBudget, tick_period};
use crate::events::{HostCommand, HostEvent, StatusReport};

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Maps the runtime's monotonic clock onto [`Timestamp`]s.
///
/// Built on `tokio::time::Instant`, so a paused test runtime drives the
/// simulation clock too.
#[derive(Debug, Clone, Copy)]
pub struct HostClock {
    epoch: Timestamp,
    started: Instant,
}

impl HostClock {
    /// A clock reading `epoch` right now.
    #[must_use]
    pub fn starting_at(epoch: Timestamp) -> Self {
        Self {
            epoch,
            started: Instant::now(),
        }
    }

    /// A clock anchored to the system wall clock.
    #[must_use]
    pub fn system() -> Self {
        Self::starting_at(Timestamp(chrono::Utc::now().timestamp_millis()))
    }

    /// Current time.
    #[must_use]
    pub fn now(&self) -> Timestamp {
        let elapsed = i64::try_from(self.started.elapsed().as_millis()).unwrap_or(i64::MAX);
        self.epoch.plus_millis(elapsed)
    }
}

// ---------------------------------------------------------------------------
// Background jobs
// ---------------------------------------------------------------------------

/// Result of a blocking persistence job.
#[derive(Debug)]
enum Job {
    Loaded(Result<Option<Snapshot>>),
    Saved(Result<SaveReceipt>),
}

/// Channels for talking to a spawned driver.
#[derive(Debug)]
pub struct DriverHandle {
    /// Send commands here.
    pub commands: mpsc::UnboundedSender<HostCommand>,
    /// Everything the driver reports.
    pub events: mpsc::UnboundedReceiver<HostEvent>,
    /// Resolves to the final session once the driver stops.
    pub task: JoinHandle<Session>,
}

impl DriverHandle {
    /// Queue a command. Returns `false` once the driver has stopped.
    pub fn send(&self, command: HostCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    /// Ask the driver to stop and wait for the final session.
    ///
    /// # Errors
    /// Returns the join error if the driver task panicked.
    pub async fn shutdown(self) -> std::result::Result<Session, JoinError> {
        let _ = self.commands.send(HostCommand::Shutdown);
        self.task.await
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Owns one session and runs it in real time.
pub struct Driver<C, S> {
    session: Session,
    clock: HostClock,
    commentator: Arc<C>,
    remote: Option<Arc<S>>,
    local: Option<JsonFileStore>,
    events: mpsc::UnboundedSender<HostEvent>,
    jobs: JoinSet<Job>,
    save_due: Option<Instant>,
    ticks_since_autosave: u64,
    budget: FrameBudget,
}

impl<C, S> std::fmt::Debug for Driver<C, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("visitor", self.session.visitor())
            .field("save_due", &self.save_due)
            .field("jobs", &self.jobs.len())
            .finish_non_exhaustive()
    }
}

impl<C, S> Driver<C, S>
where
    C: Commentator + 'static,
    S: SnapshotStore + 'static,
{
    /// Create a driver. The returned receiver yields every [`HostEvent`].
    #[must_use]
    pub fn new(
        session: Session,
        clock: HostClock,
        commentator: Arc<C>,
    ) -> (Self, mpsc::UnboundedReceiver<HostEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let driver = Self {
            session,
            clock,
            commentator,
            remote: None,
            local: None,
            events,
            jobs: JoinSet::new(),
            save_due: None,
            ticks_since_autosave: 0,
            budget: FrameBudget::default(),
        };
        (driver, rx)
    }

    /// Sync with a durable store (loaded on start, saved with debounce).
    #[must_use]
    pub fn with_remote(mut self, store: Arc<S>) -> Self {
        self.remote = Some(store);
        self
    }

    /// Keep a local snapshot file.
    #[must_use]
    pub fn with_local(mut self, store: JsonFileStore) -> Self {
        self.local = Some(store);
        self
    }

    /// The session being driven.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Spawn the driver on the current runtime.
    pub fn spawn(self, events: mpsc::UnboundedReceiver<HostEvent>) -> DriverHandle {
        let (commands, rx) = mpsc::unbounded_channel();
        DriverHandle {
            commands,
            events,
            task: tokio::spawn(self.run(rx)),
        }
    }

    /// Run until [`HostCommand::Shutdown`] or until every command sender is
    /// dropped, then flush saves and return the session.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<HostCommand>) -> Session {
        self.start();

        let period = tick_period(self.session.config().simulation.tick_rate_hz);
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let started = Instant::now();
                    self.on_tick();
                    self.budget.record(started.elapsed(), period);
                }
                command = commands.recv() => match command {
                    Some(HostCommand::Shutdown) | None => break,
                    Some(command) => self.on_command(command),
                },
                Some(joined) = self.jobs.join_next() => self.on_job(joined),
            }
        }

        self.shutdown().await;
        self.session
    }

    /// Restore the local snapshot now and start loading the remote one.
    fn start(&mut self) {
        let now = self.clock.now();
        if let Some(local) = &self.local {
            match local.load_snapshot(self.session.visitor()) {
                Ok(Some(snapshot)) => {
                    if self.session.restore(snapshot, SnapshotOrigin::Local, now) {
                        self.emit(HostEvent::Restored(SnapshotOrigin::Local));
                    }
                }
                Ok(None) => debug!(visitor = %self.session.visitor(), "No local snapshot"),
                Err(e) => warn!(error = %e, "Local snapshot unreadable"),
            }
        }

        if let Some(remote) = self.remote.clone() {
            let visitor = self.session.visitor().clone();
            self.jobs
                .spawn_blocking(move || Job::Loaded(remote.load_snapshot(&visitor)));
        }
        info!(visitor = %self.session.visitor(), "Driver started");
    }

    fn on_tick(&mut self) {
        let now = self.clock.now();
        let outcome = self.session.tick(now);
        for event in outcome.emitted {
            self.emit(HostEvent::Memory(event));
        }
        if let Some(notice) = outcome.notice {
            self.emit(HostEvent::Notice(notice));
            self.save_local(now);
            self.schedule_remote_save();
        }

        if self.save_due.is_some_and(|due| Instant::now() >= due) {
            self.flush_remote_save();
        }

        self.ticks_since_autosave += 1;
        if self.ticks_since_autosave >= self.session.config().persistence.autosave_ticks {
            self.ticks_since_autosave = 0;
            self.save_local(now);
        }
    }

    fn on_command(&mut self, command: HostCommand) {
        let now = self.clock.now();
        match command {
            HostCommand::Action(kind) => match self.session.perform_action(kind, now) {
                Some(outcome) => {
                    self.emit(HostEvent::ActionAccepted {
                        kind,
                        burst: outcome.burst,
                        stage: outcome.stage,
                        evolved: outcome.evolved,
                    });
                    self.emit(HostEvent::Memory(outcome.capture));
                    self.request_reaction(kind);
                    self.save_local(now);
                    self.schedule_remote_save();
                }
                None => self.emit(HostEvent::ActionIgnored(kind)),
            },
            HostCommand::Reset => {
                let notice = self.session.reset(now);
                self.emit(HostEvent::Notice(notice));
                self.save_local(now);
                self.schedule_remote_save();
            }
            HostCommand::Status => {
                let report = StatusReport {
                    creature: self.session.creature().clone(),
                    stats: self.session.stats(),
                    stage: self.session.creature().evolution_stage(),
                    accepts_actions: self.session.accepts_actions(),
                    pending_deferred: self.session.pending_deferred(),
                    last_sync: self.session.last_sync(),
                };
                self.emit(HostEvent::Status(Box::new(report)));
            }
            HostCommand::Shutdown => {}
        }
    }

    fn on_job(&mut self, joined: std::result::Result<Job, JoinError>) {
        let now = self.clock.now();
        match joined {
            Ok(Job::Loaded(Ok(Some(snapshot)))) => {
                if self.session.restore(snapshot, SnapshotOrigin::Remote, now) {
                    self.emit(HostEvent::Restored(SnapshotOrigin::Remote));
                    self.save_local(now);
                }
            }
            Ok(Job::Loaded(Ok(None))) => {
                debug!(visitor = %self.session.visitor(), "No remote snapshot");
            }
            Ok(Job::Saved(Ok(receipt))) => {
                if let Some(stored) = &receipt.merged_state {
                    self.session.absorb_merged(stored);
                    self.save_local(now);
                    info!(
                        visitor = %self.session.visitor(),
                        total_actions = receipt.total_actions,
                        "Remote save merged with a newer record"
                    );
                }
                self.session.mark_synced(receipt.updated_at);
                self.emit(HostEvent::Saved(receipt));
            }
            Ok(Job::Loaded(Err(e)) | Job::Saved(Err(e))) => {
                warn!(error = %e, "Remote store unavailable");
                self.emit(HostEvent::Offline(e.to_string()));
            }
            Err(e) => warn!(error = %e, "Persistence task failed"),
        }
    }

    /// Ask the commentator for a line without waiting for it.
    fn request_reaction(&self, kind: ActionKind) {
        let request = self.session.reaction_request(kind);
        let commentator = Arc::clone(&self.commentator);
        let events = self.events.clone();
        tokio::spawn(async move {
            let reaction = commentator.generate_reaction(&request).await;
            let _ = events.send(HostEvent::Reaction(reaction));
        });
    }

    fn save_local(&self, now: Timestamp) {
        let Some(local) = &self.local else { return };
        let snapshot = self.session.snapshot(now, true);
        if let Err(e) = local.save_snapshot(self.session.visitor(), &snapshot, None) {
            warn!(error = %e, "Local snapshot write failed");
        }
    }

    /// Push the remote save deadline out by the debounce window.
    fn schedule_remote_save(&mut self) {
        if self.remote.is_none() {
            return;
        }
        let debounce = Duration::from_millis(self.session.config().persistence.save_debounce_ms);
        self.save_due = Some(Instant::now() + debounce);
    }

    fn flush_remote_save(&mut self) {
        self.save_due = None;
        let Some(remote) = self.remote.clone() else { return };
        let visitor = self.session.visitor().clone();
        let snapshot = self.session.snapshot(self.clock.now(), false);
        let last_sync = self.session.last_sync();
        self.jobs.spawn_blocking(move || {
            Job::Saved(remote.save_snapshot(&visitor, &snapshot, last_sync))
        });
    }

    async fn shutdown(&mut self) {
        let now = self.clock.now();
        self.save_local(now);
        if self.save_due.is_some() {
            self.flush_remote_save();
        }
        while let Some(joined) = self.jobs.join_next().await {
            self.on_job(joined);
        }
        debug!(
            ticks = self.budget.ticks,
            mean_us = self.budget.mean_us(),
            slowest_us = self.budget.slowest_us,
            overruns = self.budget.overruns,
            "Frame budget"
        );
        info!(visitor = %self.session.visitor(), "Driver stopped");
    }

    fn emit(&self, event: HostEvent) {
        // The front end may have gone away; the simulation carries on.
        let _ = self.events.send(event);
    }
}
