//! Audit port: record every fired action.

use calswitch_domain::audit::AuditRecord;

/// Receives a record each time a scheduled action fires.
///
/// Recording is synchronous and cannot fail from the caller's point of
/// view; delivery problems are the sink's own concern.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: AuditRecord);
}

impl<T: AuditSink> AuditSink for std::sync::Arc<T> {
    fn record(&self, record: AuditRecord) {
        (**self).record(record);
    }
}
