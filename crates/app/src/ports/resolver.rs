//! Resolution port: map a summary's target reference to a concrete target.

use std::future::Future;

use calswitch_domain::target::Target;

/// Looks up targets by the free-text reference found in event summaries.
pub trait TargetResolver: Send + Sync {
    /// Resolve `reference` (an id, a name, or an area followed by a name).
    ///
    /// `None` means "not known yet"; the caller retries on its next pass.
    fn resolve(&self, reference: &str) -> impl Future<Output = Option<Target>> + Send;
}

impl<T: TargetResolver> TargetResolver for std::sync::Arc<T> {
    fn resolve(&self, reference: &str) -> impl Future<Output = Option<Target>> + Send {
        (**self).resolve(reference)
    }
}
