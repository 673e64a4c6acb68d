//! Reconciliation engine: keeps scheduled actions in sync with calendars.
//!
//! Every refresh pass fetches the events of all watched calendars over a
//! sliding window, fingerprints them, and diffs the result against the
//! tracked set:
//!
//! 1. tracked fingerprints missing from the fetch are deactivated and
//!    dropped (untrack phase);
//! 2. fetched fingerprints not yet tracked are parsed, resolved, built and
//!    activated (track phase);
//! 3. fingerprints present on both sides are left alone, timers included.
//!
//! Passes are serialized by the state mutex, which [`stop`] also takes, so
//! a pass never interleaves with another pass or with teardown.
//!
//! [`stop`]: ReconciliationEngine::stop

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use chrono::TimeDelta;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use calswitch_domain::action::ActionPlan;
use calswitch_domain::calendar::{CalendarEvent, CalendarId, Fingerprint};
use calswitch_domain::error::{SchedulingError, TargetNotResolvable};
use calswitch_domain::id::PassId;
use calswitch_domain::summary;
use calswitch_domain::time::{self, TimeWindow, Timestamp};

use crate::ports::{
    AuditSink, CalendarSource, Dispatcher, ScheduledTask, TargetResolver, TaskIntrospection,
    Timer,
};
use crate::scheduled_action::{FireContext, ScheduledAction};

/// Default look-behind of a refresh pass.
pub const DEFAULT_HISTORIC_WINDOW: Duration = Duration::from_secs(300);
/// Default look-ahead of a refresh pass.
pub const DEFAULT_PRELOAD_WINDOW: Duration = Duration::from_secs(86_400);
/// Default delay between two refresh passes.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(300);

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Calendars to watch, merged in this order.
    pub calendars: Vec<CalendarId>,
    /// How far into the past a pass still looks.
    pub historic_window: Duration,
    /// How far into the future a pass looks.
    pub preload_window: Duration,
    /// Delay between two passes.
    pub refresh_interval: Duration,
}

impl EngineConfig {
    /// Watch `calendars` with default windows and interval.
    #[must_use]
    pub fn new(calendars: impl IntoIterator<Item = CalendarId>) -> Self {
        Self {
            calendars: calendars.into_iter().collect(),
            historic_window: DEFAULT_HISTORIC_WINDOW,
            preload_window: DEFAULT_PRELOAD_WINDOW,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }

    #[must_use]
    pub fn historic_window(mut self, window: Duration) -> Self {
        self.historic_window = window;
        self
    }

    #[must_use]
    pub fn preload_window(mut self, window: Duration) -> Self {
        self.preload_window = window;
        self
    }

    #[must_use]
    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Check invariants and drop duplicate calendars, keeping first
    /// occurrences in order.
    fn validated(mut self) -> Result<ValidConfig, EngineError> {
        let mut seen = std::collections::HashSet::new();
        self.calendars.retain(|calendar| seen.insert(calendar.clone()));

        if self.calendars.is_empty() {
            return Err(EngineError::InvalidConfig(
                "at least one calendar must be watched".to_string(),
            ));
        }
        if self.refresh_interval.is_zero() {
            return Err(EngineError::InvalidConfig(
                "refresh interval must be non-zero".to_string(),
            ));
        }
        let historic = TimeDelta::from_std(self.historic_window).map_err(|_| {
            EngineError::InvalidConfig("historic window is out of range".to_string())
        })?;
        let preload = TimeDelta::from_std(self.preload_window).map_err(|_| {
            EngineError::InvalidConfig("preload window is out of range".to_string())
        })?;

        Ok(ValidConfig {
            calendars: self.calendars,
            historic,
            preload,
            refresh_interval: self.refresh_interval,
        })
    }
}

struct ValidConfig {
    calendars: Vec<CalendarId>,
    historic: TimeDelta,
    preload: TimeDelta,
    refresh_interval: Duration,
}

/// Engine lifecycle errors.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// [`ReconciliationEngine::start`] was called while already running.
    #[error("engine is already running")]
    AlreadyRunning,

    /// The configuration failed validation.
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
}

/// Outcome of one refresh pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Whether the pass ran at all (it does not while stopped).
    pub ran: bool,
    /// Distinct fingerprints fetched across all calendars.
    pub fetched: usize,
    /// Calendars whose fetch failed.
    pub failed_calendars: usize,
    /// Actions deactivated because their event vanished.
    pub untracked: usize,
    /// Actions built and activated for new events.
    pub tracked: usize,
    /// New events left unscheduled: malformed, unresolved, degenerate, or
    /// with no timer registered.
    pub skipped: usize,
}

struct State {
    running: bool,
    tracked: HashMap<Fingerprint, ScheduledAction>,
}

struct Inner<C, R, T, D, A> {
    config: ValidConfig,
    calendars: C,
    resolver: R,
    timer: T,
    fire: FireContext<D, A>,
    state: Mutex<State>,
    // Outside `state` so it can be reached while a pass holds the lock.
    refresh_task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl<C, R, T, D, A> Inner<C, R, T, D, A> {
    fn abort_refresh_task(&self) {
        let task = self
            .refresh_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
        }
    }
}

/// Owns the tracked set and the lifecycle of every [`ScheduledAction`].
///
/// Lifecycle: `Stopped → Running → Stopped`. [`start`](Self::start) on a
/// running engine fails with [`EngineError::AlreadyRunning`];
/// [`stop`](Self::stop) on a stopped engine does nothing.
pub struct ReconciliationEngine<C, R, T, D, A> {
    inner: Arc<Inner<C, R, T, D, A>>,
}

impl<C, R, T, D, A> ReconciliationEngine<C, R, T, D, A>
where
    C: CalendarSource + 'static,
    R: TargetResolver + 'static,
    T: Timer + 'static,
    D: Dispatcher + 'static,
    A: AuditSink + 'static,
{
    /// Create a stopped engine.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] when no calendar is watched,
    /// the refresh interval is zero, or a window is too large.
    pub fn new(
        config: EngineConfig,
        calendars: C,
        resolver: R,
        timer: T,
        dispatcher: Arc<D>,
        audit: Arc<A>,
    ) -> Result<Self, EngineError> {
        let config = config.validated()?;
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                calendars,
                resolver,
                timer,
                fire: FireContext::new(dispatcher, audit),
                state: Mutex::new(State {
                    running: false,
                    tracked: HashMap::new(),
                }),
                refresh_task: std::sync::Mutex::new(None),
            }),
        })
    }

    /// Transition to Running and spawn the refresh loop.
    ///
    /// The loop's first pass runs immediately, then once per refresh
    /// interval. Ticks missed while a pass is still running are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::AlreadyRunning`] if the engine is running.
    pub async fn start(&self) -> Result<(), EngineError> {
        let mut state = self.inner.state.lock().await;
        if state.running {
            return Err(EngineError::AlreadyRunning);
        }

        tracing::info!(
            calendars = self.inner.config.calendars.len(),
            interval_secs = self.inner.config.refresh_interval.as_secs(),
            "starting calendar refresh loop"
        );
        state.running = true;
        let task = tokio::spawn(Inner::run(Arc::clone(&self.inner)));
        *self
            .inner
            .refresh_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(task);
        Ok(())
    }

    /// Stop the refresh loop, deactivate every tracked action and clear
    /// the tracked set.
    ///
    /// Waits for an in-flight pass to finish first. Safe to call at any
    /// time, any number of times.
    pub async fn stop(&self) {
        let mut state = self.inner.state.lock().await;
        self.inner.abort_refresh_task();
        if !state.running {
            return;
        }

        tracing::info!(tracked = state.tracked.len(), "stopping calendar refresh loop");
        state.running = false;
        for (fingerprint, mut action) in state.tracked.drain() {
            tracing::debug!(
                fingerprint = fingerprint.short(),
                label = action.display_label(),
                "untracking event"
            );
            action.deactivate();
        }
    }

    /// Run one refresh pass now.
    pub async fn refresh(&self) -> RefreshReport {
        self.inner.refresh_at(time::now()).await
    }

    /// Run one refresh pass as if the current time were `now`.
    pub async fn refresh_at(&self, now: Timestamp) -> RefreshReport {
        self.inner.refresh_at(now).await
    }

    pub async fn is_running(&self) -> bool {
        self.inner.state.lock().await.running
    }

    /// Fingerprints in the tracked set, sorted.
    pub async fn tracked_fingerprints(&self) -> Vec<Fingerprint> {
        let state = self.inner.state.lock().await;
        let mut fingerprints: Vec<_> = state.tracked.keys().cloned().collect();
        fingerprints.sort();
        fingerprints
    }
}

impl<C, R, T, D, A> TaskIntrospection for ReconciliationEngine<C, R, T, D, A>
where
    C: Send + Sync,
    R: Send + Sync,
    T: Send + Sync,
    D: Send + Sync,
    A: Send + Sync,
{
    fn scheduled_tasks(&self) -> Vec<ScheduledTask> {
        Vec::new()
    }
}

impl<C, R, T, D, A> Drop for ReconciliationEngine<C, R, T, D, A> {
    fn drop(&mut self) {
        // The loop holds its own reference to the engine state; end it so
        // that reference is released and the tracked actions cancel their
        // timers as they drop.
        self.inner.abort_refresh_task();
    }
}

impl<C, R, T, D, A> Inner<C, R, T, D, A>
where
    C: CalendarSource + 'static,
    R: TargetResolver + 'static,
    T: Timer + 'static,
    D: Dispatcher + 'static,
    A: AuditSink + 'static,
{
    async fn run(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.config.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            self.refresh_at(time::now()).await;
        }
    }

    #[tracing::instrument(skip(self), fields(pass = %PassId::new()))]
    async fn refresh_at(&self, now: Timestamp) -> RefreshReport {
        let mut state = self.state.lock().await;
        if !state.running {
            tracing::debug!("engine stopped, skipping refresh pass");
            return RefreshReport::default();
        }

        let window = TimeWindow::around(now, self.config.historic, self.config.preload);
        let (fresh, failed_calendars) = self.fetch_all(window).await;

        let mut report = RefreshReport {
            ran: true,
            fetched: fresh.len(),
            failed_calendars,
            ..RefreshReport::default()
        };

        report.untracked = untrack(&mut state.tracked, &fresh);

        for (fingerprint, event) in fresh {
            if state.tracked.contains_key(&fingerprint) {
                continue;
            }
            match self.build(&event).await {
                Ok(mut action) => {
                    if action.activate(now, &self.timer, &self.fire) == 0 {
                        tracing::warn!(
                            fingerprint = fingerprint.short(),
                            label = action.display_label(),
                            "no timer registered, retrying next pass"
                        );
                        report.skipped += 1;
                        continue;
                    }
                    tracing::debug!(
                        fingerprint = fingerprint.short(),
                        label = action.display_label(),
                        "tracking new event"
                    );
                    state.tracked.insert(fingerprint, action);
                    report.tracked += 1;
                }
                Err(SchedulingError::TargetNotResolvable(err)) => {
                    tracing::debug!(%err, fingerprint = fingerprint.short(), "skipping event");
                    report.skipped += 1;
                }
                Err(err) => {
                    tracing::warn!(
                        %err,
                        summary = %event.summary,
                        fingerprint = fingerprint.short(),
                        "skipping event"
                    );
                    report.skipped += 1;
                }
            }
        }

        tracing::debug!(?report, "refresh pass complete");
        report
    }

    /// Fetch every calendar concurrently and merge the results by
    /// fingerprint, in configuration order. A failing calendar contributes
    /// nothing.
    async fn fetch_all(&self, window: TimeWindow) -> (BTreeMap<Fingerprint, CalendarEvent>, usize) {
        let mut fetches = Vec::with_capacity(self.config.calendars.len());
        for calendar in &self.config.calendars {
            fetches.push(self.calendars.fetch_events(calendar, window));
        }
        let results = futures::future::join_all(fetches).await;

        let mut merged = BTreeMap::new();
        let mut failed = 0;
        for (calendar, result) in self.config.calendars.iter().zip(results) {
            match result {
                Ok(events) => {
                    tracing::debug!(%calendar, count = events.len(), "fetched calendar events");
                    for event in events {
                        // Same fingerprint means same content: last write wins.
                        merged.insert(event.fingerprint(), event);
                    }
                }
                Err(err) => {
                    tracing::warn!(%err, %calendar, "calendar fetch failed, ignoring it for this pass");
                    failed += 1;
                }
            }
        }
        (merged, failed)
    }

    async fn build(&self, event: &CalendarEvent) -> Result<ScheduledAction, SchedulingError> {
        let parsed = summary::parse(&event.summary)?;
        let target = self
            .resolver
            .resolve(&parsed.target_reference)
            .await
            .ok_or_else(|| TargetNotResolvable {
                reference: parsed.target_reference.clone(),
            })?;
        let plan = ActionPlan::from_event(&parsed, event)?;
        Ok(ScheduledAction::new(target, plan))
    }
}

/// Deactivate and drop every tracked action whose fingerprint is absent
/// from `fresh`. Returns how many were dropped.
fn untrack(
    tracked: &mut HashMap<Fingerprint, ScheduledAction>,
    fresh: &BTreeMap<Fingerprint, CalendarEvent>,
) -> usize {
    let stale: Vec<Fingerprint> = tracked
        .keys()
        .filter(|fingerprint| !fresh.contains_key(*fingerprint))
        .cloned()
        .collect();

    for fingerprint in &stale {
        if let Some(mut action) = tracked.remove(fingerprint) {
            tracing::debug!(
                fingerprint = fingerprint.short(),
                label = action.display_label(),
                "untracking event"
            );
            action.deactivate();
        }
    }
    stale.len()
}
