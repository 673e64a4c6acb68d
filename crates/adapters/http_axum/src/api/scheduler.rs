//! JSON handlers for the scheduler.

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};

use calswitch_app::ports::{ScheduledTask, TaskIntrospection};

use crate::state::AppState;

/// Possible responses from the task list endpoint.
pub enum ListTasksResponse {
    Ok(Json<Vec<ScheduledTask>>),
}

impl IntoResponse for ListTasksResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/scheduler/tasks`
pub async fn list_tasks<Q>(State(state): State<AppState<Q>>) -> ListTasksResponse
where
    Q: TaskIntrospection + 'static,
{
    ListTasksResponse::Ok(Json(state.introspection.scheduled_tasks()))
}
