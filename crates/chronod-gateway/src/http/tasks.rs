//! REST translation for task CRUD, manual runs, and log readback. No
//! scheduling logic lives here — every mutation ends with a full engine
//! reload.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chronod_engine::EngineError;
use chronod_store::{NewTask, StoreError, Task};
use serde::Deserialize;

use crate::app::AppState;

type ApiResult<T> = Result<T, (StatusCode, String)>;

/// Partial update payload: absent fields keep their stored value.
#[derive(Debug, Deserialize)]
pub struct TaskUpdate {
    pub name: Option<String>,
    pub schedule: Option<String>,
    pub command: Option<String>,
    pub enabled: Option<bool>,
    pub one_shot: Option<bool>,
}

impl TaskUpdate {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.schedule.is_none()
            && self.command.is_none()
            && self.enabled.is_none()
            && self.one_shot.is_none()
    }

    fn apply(self, task: &mut Task) {
        if let Some(name) = self.name {
            task.name = name;
        }
        if let Some(schedule) = self.schedule {
            task.schedule = schedule;
        }
        if let Some(command) = self.command {
            task.command = command;
        }
        if let Some(enabled) = self.enabled {
            task.enabled = enabled;
        }
        if let Some(one_shot) = self.one_shot {
            task.one_shot = one_shot;
        }
    }
}

pub async fn list_tasks(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Task>>> {
    let tasks = state.store.get_tasks().map_err(store_error)?;
    Ok(Json(tasks))
}

pub async fn create_task(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewTask>,
) -> ApiResult<Json<Task>> {
    let task = state.store.create_task(new).map_err(store_error)?;
    state.engine.reload();
    Ok(Json(task))
}

pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Task>> {
    let task = state.store.get_task_by_id(id).map_err(store_error)?;
    Ok(Json(task))
}

pub async fn update_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(update): Json<TaskUpdate>,
) -> ApiResult<Json<Task>> {
    let mut task = state.store.get_task_by_id(id).map_err(store_error)?;
    if update.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "No fields to update".to_string()));
    }
    update.apply(&mut task);
    state.store.update_task(&task).map_err(store_error)?;
    state.engine.reload();
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.store.delete_task(id).map_err(store_error)?;
    state.engine.reload();
    Ok(StatusCode::NO_CONTENT)
}

pub async fn run_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    match state.engine.run_task_now(id).await {
        Ok(_) => Ok(StatusCode::NO_CONTENT),
        Err(EngineError::TaskNotFound { .. }) => {
            Err((StatusCode::NOT_FOUND, "Task not found".to_string()))
        }
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

pub async fn task_logs(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> Response {
    let logs_dir = chronod_engine::logs::logs_dir(&state.data_dir);
    match chronod_engine::logs::read_task_log(&logs_dir, id) {
        Ok(Some(content)) => content.into_response(),
        Ok(None) => "No logs found for this task.".into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

fn store_error(e: StoreError) -> (StatusCode, String) {
    match e {
        StoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "Task not found".to_string()),
        other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}
