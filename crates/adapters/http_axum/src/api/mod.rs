//! JSON API handlers, mounted under `/api`.

pub mod scheduler;

use axum::Router;
use axum::routing::get;

use calswitch_app::ports::TaskIntrospection;

use crate::state::AppState;

/// Routes relative to `/api`.
pub fn routes<Q>() -> Router<AppState<Q>>
where
    Q: TaskIntrospection + 'static,
{
    Router::new().route("/scheduler/tasks", get(scheduler::list_tasks::<Q>))
}
