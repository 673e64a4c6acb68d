//! Shared application state for axum handlers.

use std::sync::Arc;

use calswitch_app::ports::TaskIntrospection;

/// Application state shared across all axum handlers.
///
/// `Clone` is implemented manually so the introspection type itself does
/// not need to be `Clone`.
pub struct AppState<Q> {
    /// Source of the scheduled task listing.
    pub introspection: Arc<Q>,
}

impl<Q> Clone for AppState<Q> {
    fn clone(&self) -> Self {
        Self {
            introspection: Arc::clone(&self.introspection),
        }
    }
}

impl<Q> AppState<Q>
where
    Q: TaskIntrospection + 'static,
{
    pub fn new(introspection: Arc<Q>) -> Self {
        Self { introspection }
    }
}
