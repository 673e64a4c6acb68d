//! In-memory fakes and spies shared by the unit tests of this crate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use calswitch_domain::action::ActionKind;
use calswitch_domain::audit::AuditRecord;
use calswitch_domain::calendar::{CalendarEvent, CalendarId};
use calswitch_domain::target::{Target, TargetId};
use calswitch_domain::time::{TimeWindow, Timestamp};

use crate::ports::{
    AuditSink, CalendarError, CalendarSource, DispatchError, Dispatcher, TargetResolver, Timer,
    TimerCallback, TimerError, TimerHandle,
};

pub fn at(secs: i64) -> Timestamp {
    chrono::DateTime::from_timestamp(secs, 0).unwrap()
}

// ── Calendars ──────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeCalendars {
    calendars: Mutex<HashMap<CalendarId, Option<Vec<CalendarEvent>>>>,
    windows: Mutex<Vec<(CalendarId, TimeWindow)>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeCalendars {
    pub fn set(&self, calendar: &str, events: Vec<CalendarEvent>) {
        self.calendars
            .lock()
            .unwrap()
            .insert(CalendarId::new(calendar), Some(events));
    }

    pub fn fail(&self, calendar: &str) {
        self.calendars
            .lock()
            .unwrap()
            .insert(CalendarId::new(calendar), None);
    }

    pub fn fetch_count(&self) -> usize {
        self.windows.lock().unwrap().len()
    }

    pub fn windows(&self) -> Vec<(CalendarId, TimeWindow)> {
        self.windows.lock().unwrap().clone()
    }

    /// Make every fetch wait until [`FakeCalendars::open`] is called.
    pub fn close(&self) {
        *self.gate.lock().unwrap() = Some(Arc::new(Notify::new()));
    }

    /// Release the fetches waiting on the gate and let later ones through.
    pub fn open(&self) {
        if let Some(gate) = self.gate.lock().unwrap().take() {
            gate.notify_waiters();
        }
    }
}

impl CalendarSource for FakeCalendars {
    async fn fetch_events(
        &self,
        calendar: &CalendarId,
        window: TimeWindow,
    ) -> Result<Vec<CalendarEvent>, CalendarError> {
        self.windows
            .lock()
            .unwrap()
            .push((calendar.clone(), window));
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        match self.calendars.lock().unwrap().get(calendar) {
            Some(Some(events)) => Ok(events.clone()),
            Some(None) => Err(CalendarError::Unavailable {
                calendar: calendar.clone(),
                source: "connection reset".into(),
            }),
            None => Err(CalendarError::NotFound(calendar.clone())),
        }
    }
}

// ── Resolver ───────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeResolver {
    targets: Mutex<HashMap<String, Target>>,
}

impl FakeResolver {
    pub fn with(targets: &[(&str, &str)]) -> Self {
        let resolver = Self::default();
        for (id, label) in targets {
            resolver.add(id, label);
        }
        resolver
    }

    /// Register a target, reachable by its id or its label.
    pub fn add(&self, id: &str, label: &str) {
        let target = Target::new(id, label);
        let mut targets = self.targets.lock().unwrap();
        targets.insert(id.to_lowercase(), target.clone());
        targets.insert(label.to_lowercase(), target);
    }
}

impl TargetResolver for FakeResolver {
    async fn resolve(&self, reference: &str) -> Option<Target> {
        self.targets
            .lock()
            .unwrap()
            .get(&reference.trim().to_lowercase())
            .cloned()
    }
}

// ── Timer ──────────────────────────────────────────────────────────

struct ManualEntry {
    at: Timestamp,
    callback: Option<TimerCallback>,
    cancelled: Arc<AtomicBool>,
}

/// Timer whose callbacks only run when a test calls [`ManualTimer::fire_due`].
#[derive(Default)]
pub struct ManualTimer {
    entries: Mutex<Vec<ManualEntry>>,
    cancellations: Arc<AtomicUsize>,
    reject: AtomicBool,
}

impl ManualTimer {
    pub fn rejecting() -> Self {
        let timer = Self::default();
        timer.reject.store(true, Ordering::SeqCst);
        timer
    }

    /// Accept registrations again after [`ManualTimer::rejecting`].
    pub fn accept(&self) {
        self.reject.store(false, Ordering::SeqCst);
    }

    /// Total registrations accepted so far.
    pub fn scheduled_count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Total cancellations (first `cancel()` per handle) so far.
    pub fn cancelled_count(&self) -> usize {
        self.cancellations.load(Ordering::SeqCst)
    }

    /// Trigger times of registrations that are neither cancelled nor fired.
    pub fn pending(&self) -> Vec<Timestamp> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.callback.is_some() && !e.cancelled.load(Ordering::SeqCst))
            .map(|e| e.at)
            .collect()
    }

    /// Every registered trigger time, in registration order.
    pub fn registered(&self) -> Vec<Timestamp> {
        self.entries.lock().unwrap().iter().map(|e| e.at).collect()
    }

    /// Run every live callback due at or before `now`. Returns how many ran.
    pub fn fire_due(&self, now: Timestamp) -> usize {
        let due: Vec<TimerCallback> = {
            let mut entries = self.entries.lock().unwrap();
            entries
                .iter_mut()
                .filter(|e| e.at <= now && !e.cancelled.load(Ordering::SeqCst))
                .filter_map(|e| e.callback.take())
                .collect()
        };
        let count = due.len();
        for callback in due {
            callback();
        }
        count
    }
}

impl Timer for ManualTimer {
    fn schedule_at(
        &self,
        at: Timestamp,
        callback: TimerCallback,
    ) -> Result<TimerHandle, TimerError> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(TimerError::Rejected { at });
        }

        let cancelled = Arc::new(AtomicBool::new(false));
        self.entries.lock().unwrap().push(ManualEntry {
            at,
            callback: Some(callback),
            cancelled: Arc::clone(&cancelled),
        });

        let cancellations = Arc::clone(&self.cancellations);
        Ok(TimerHandle::new(move || {
            cancelled.store(true, Ordering::SeqCst);
            cancellations.fetch_add(1, Ordering::SeqCst);
        }))
    }
}

// ── Dispatcher & audit spies ───────────────────────────────────────

#[derive(Default)]
pub struct SpyDispatcher {
    pub calls: Mutex<Vec<(TargetId, ActionKind)>>,
    pub fail: AtomicBool,
}

impl Dispatcher for SpyDispatcher {
    async fn invoke(&self, target: &TargetId, action: ActionKind) -> Result<(), DispatchError> {
        self.calls.lock().unwrap().push((target.clone(), action));
        if self.fail.load(Ordering::SeqCst) {
            return Err(DispatchError::UnknownTarget(target.clone()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct SpyAudit {
    pub records: Mutex<Vec<AuditRecord>>,
}

impl AuditSink for SpyAudit {
    fn record(&self, record: AuditRecord) {
        self.records.lock().unwrap().push(record);
    }
}
