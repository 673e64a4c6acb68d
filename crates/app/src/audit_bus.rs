//! Audit trail fan-out: every fired action is published to whoever listens.
//!
//! The daemon subscribes once and writes each record to the log. A slow
//! subscriber loses the oldest records rather than holding back a firing
//! timer.

use tokio::sync::broadcast;

use calswitch_domain::audit::AuditRecord;

use crate::ports::AuditSink;

/// [`AuditSink`] publishing records on a bounded [`broadcast`] channel.
pub struct InProcessAuditBus {
    sender: broadcast::Sender<AuditRecord>,
}

impl InProcessAuditBus {
    /// `capacity` is how many records a subscriber may fall behind before
    /// it starts missing some.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Receive the records made from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AuditRecord> {
        self.sender.subscribe()
    }
}

impl AuditSink for InProcessAuditBus {
    fn record(&self, record: AuditRecord) {
        tracing::debug!(
            target_id = %record.target_id,
            action = %record.action,
            "{}",
            record.message()
        );
        // Nobody listening is not a failure.
        let _ = self.sender.send(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calswitch_domain::action::ActionKind;
    use calswitch_domain::target::TargetId;
    use tokio::sync::broadcast::error::RecvError;

    fn record(label: &str, action: ActionKind) -> AuditRecord {
        AuditRecord::new(TargetId::new("light.kitchen"), label, action)
    }

    #[tokio::test]
    async fn should_carry_log_book_message_to_subscriber() {
        let bus = InProcessAuditBus::new(16);
        let mut rx = bus.subscribe();

        bus.record(record("Kitchen Light", ActionKind::TurnOff));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.target_id, TargetId::new("light.kitchen"));
        assert_eq!(received.message(), "send command turn_off for Kitchen Light");
    }

    #[test]
    fn should_accept_records_without_subscribers() {
        let bus = InProcessAuditBus::new(16);
        bus.record(record("Kitchen Light", ActionKind::TurnOn));
        assert_eq!(bus.sender.receiver_count(), 0);
    }

    #[tokio::test]
    async fn should_drop_oldest_records_for_lagging_subscriber() {
        let bus = InProcessAuditBus::new(2);
        let mut rx = bus.subscribe();

        bus.record(record("First", ActionKind::TurnOn));
        bus.record(record("Second", ActionKind::TurnOff));
        bus.record(record("Third", ActionKind::TurnOn));

        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(1))));
        assert_eq!(rx.recv().await.unwrap().display_label, "Second");
        assert_eq!(rx.recv().await.unwrap().display_label, "Third");
    }

    #[tokio::test]
    async fn should_keep_firing_order_across_subscribers() {
        let bus = InProcessAuditBus::new(16);
        let mut early = bus.subscribe();
        bus.record(record("Before", ActionKind::TurnOn));
        let mut late = bus.subscribe();
        bus.record(record("After", ActionKind::TurnOff));

        assert_eq!(early.recv().await.unwrap().display_label, "Before");
        assert_eq!(early.recv().await.unwrap().display_label, "After");
        assert_eq!(late.recv().await.unwrap().display_label, "After");
    }
}
