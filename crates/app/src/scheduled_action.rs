//! Scheduled action: the live timers realizing one event's [`ActionPlan`].
//!
//! A [`ScheduledAction`] owns the cancellation handles of its timers. The
//! engine is the only caller of [`activate`](ScheduledAction::activate) and
//! [`deactivate`](ScheduledAction::deactivate).

use std::sync::Arc;

use calswitch_domain::action::{ActionKind, ActionPlan, PlannedAction};
use calswitch_domain::audit::AuditRecord;
use calswitch_domain::target::{Target, TargetId};
use calswitch_domain::time::Timestamp;

use crate::ports::{AuditSink, Dispatcher, Timer, TimerCallback, TimerHandle};

/// What a firing timer needs: where to send the command and where to
/// record that it was sent.
pub struct FireContext<D, A> {
    dispatcher: Arc<D>,
    audit: Arc<A>,
}

impl<D, A> Clone for FireContext<D, A> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: Arc::clone(&self.dispatcher),
            audit: Arc::clone(&self.audit),
        }
    }
}

impl<D, A> FireContext<D, A>
where
    D: Dispatcher + 'static,
    A: AuditSink + 'static,
{
    pub fn new(dispatcher: Arc<D>, audit: Arc<A>) -> Self {
        Self { dispatcher, audit }
    }

    /// Build the callback run when the `kind` trigger for `target` fires.
    ///
    /// The audit record is written before the dispatch task is spawned, so
    /// the trail stays accurate when dispatch fails.
    fn callback(&self, target: &Target, kind: ActionKind) -> TimerCallback {
        let dispatcher = Arc::clone(&self.dispatcher);
        let audit = Arc::clone(&self.audit);
        let target = target.clone();

        Box::new(move || {
            tracing::info!(target_id = %target.id, action = %kind, "scheduled action fired");
            audit.record(AuditRecord::new(
                target.id.clone(),
                target.label.clone(),
                kind,
            ));
            tokio::spawn(async move {
                if let Err(err) = dispatcher.invoke(&target.id, kind).await {
                    tracing::warn!(%err, target_id = %target.id, action = %kind, "dispatch failed");
                }
            });
        })
    }
}

struct Subscription {
    action: PlannedAction,
    handle: TimerHandle,
}

/// One event's on/off timers for one resolved target.
pub struct ScheduledAction {
    target: Target,
    plan: ActionPlan,
    subscriptions: Vec<Subscription>,
}

impl ScheduledAction {
    #[must_use]
    pub fn new(target: Target, plan: ActionPlan) -> Self {
        Self {
            target,
            plan,
            subscriptions: Vec::new(),
        }
    }

    #[must_use]
    pub fn target_id(&self) -> &TargetId {
        &self.target.id
    }

    #[must_use]
    pub fn display_label(&self) -> &str {
        &self.target.label
    }

    #[must_use]
    pub fn plan(&self) -> &ActionPlan {
        &self.plan
    }

    /// Triggers that currently hold a timer subscription.
    #[must_use]
    pub fn subscribed(&self) -> Vec<PlannedAction> {
        self.subscriptions.iter().map(|s| s.action).collect()
    }

    /// Register timers for the plan, latest trigger first.
    ///
    /// Scanning stops right after the first trigger at or before `now`:
    /// that trigger fires immediately and supersedes every earlier one.
    /// A trigger whose registration fails is logged and skipped. Calling
    /// this on an action that already holds subscriptions does nothing.
    ///
    /// Returns the number of timers registered.
    pub fn activate<T, D, A>(&mut self, now: Timestamp, timer: &T, fire: &FireContext<D, A>) -> usize
    where
        T: Timer,
        D: Dispatcher + 'static,
        A: AuditSink + 'static,
    {
        if !self.subscriptions.is_empty() {
            tracing::debug!(target_id = %self.target.id, "action already active");
            return 0;
        }

        for planned in self.plan.latest_first() {
            let callback = fire.callback(&self.target, planned.kind);
            match timer.schedule_at(planned.at, callback) {
                Ok(handle) => {
                    tracing::debug!(
                        target_id = %self.target.id,
                        action = %planned.kind,
                        at = %planned.at,
                        "timer registered"
                    );
                    self.subscriptions.push(Subscription {
                        action: planned,
                        handle,
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        %err,
                        target_id = %self.target.id,
                        action = %planned.kind,
                        "failed to register timer, dropping this trigger"
                    );
                }
            }

            if planned.at <= now {
                break;
            }
        }

        self.subscriptions.len()
    }

    /// Cancel every held timer. Idempotent.
    pub fn deactivate(&mut self) {
        for mut subscription in self.subscriptions.drain(..) {
            subscription.handle.cancel();
        }
    }
}

impl Drop for ScheduledAction {
    fn drop(&mut self) {
        self.deactivate();
    }
}

impl std::fmt::Debug for ScheduledAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledAction")
            .field("target", &self.target)
            .field("plan", &self.plan)
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}
