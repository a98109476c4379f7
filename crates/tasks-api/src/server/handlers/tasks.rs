//! Task endpoints, scoped to the authenticated caller.
//!
//! Descriptions are encrypted before they reach the store and decrypted on
//! the way out. Plaintext descriptions are never logged.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use common::{
    protocol::{MessageResponse, TaskRequest, TaskResponse, TasksResponse},
    ServiceError,
};
use tracing::info;

use crate::crypto::FieldCipher;
use crate::server::{
    error::ApiError,
    extract::{ApiJson, ApiPath, AuthUser},
    state::AppState,
};
use crate::store::Task;

/// Longest accepted title, in characters.
pub const MAX_TITLE_CHARS: usize = 120;

/// `POST /tasks`
pub async fn create_task(
    caller: AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<TaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiError> {
    validate_title(&req.title)?;
    let envelope = state.cipher.encrypt(&req.description)?;
    let task = state
        .store
        .create_task(caller.id, &req.title, &envelope)
        .await?;

    info!(task_id = task.id, user_id = caller.id, "task created");
    Ok((
        StatusCode::CREATED,
        Json(TaskResponse {
            id: task.id,
            title: task.title,
            description: Some(req.description),
            user_id: task.user_id,
        }),
    ))
}

/// `GET /tasks`
pub async fn list_tasks(
    caller: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<TasksResponse>, ApiError> {
    let rows = state.store.list_tasks(caller.id).await?;
    let tasks = rows
        .into_iter()
        .map(|t| decrypted(&state.cipher, t))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(TasksResponse { tasks }))
}

/// `GET /tasks/:task_id`
pub async fn get_task(
    caller: AuthUser,
    State(state): State<AppState>,
    ApiPath(task_id): ApiPath<i64>,
) -> Result<Json<TaskResponse>, ApiError> {
    let task = state
        .store
        .find_task(task_id, caller.id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("task {task_id}")))?;
    Ok(Json(decrypted(&state.cipher, task)?))
}

/// `PUT /tasks/:task_id`
pub async fn update_task(
    caller: AuthUser,
    State(state): State<AppState>,
    ApiPath(task_id): ApiPath<i64>,
    ApiJson(req): ApiJson<TaskRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    validate_title(&req.title)?;
    let envelope = state.cipher.encrypt(&req.description)?;
    let updated = state
        .store
        .update_task(task_id, caller.id, &req.title, &envelope)
        .await?;
    if !updated {
        return Err(ServiceError::NotFound(format!("task {task_id}")).into());
    }

    info!(task_id, user_id = caller.id, "task updated");
    Ok(Json(MessageResponse::new("task updated")))
}

/// `DELETE /tasks/:task_id`
pub async fn delete_task(
    caller: AuthUser,
    State(state): State<AppState>,
    ApiPath(task_id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    if !state.store.delete_task(task_id, caller.id).await? {
        return Err(ServiceError::NotFound(format!("task {task_id}")).into());
    }

    info!(task_id, user_id = caller.id, "task deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn validate_title(title: &str) -> Result<(), ServiceError> {
    let len = title.chars().count();
    if len == 0 || len > MAX_TITLE_CHARS {
        return Err(ServiceError::BadRequest(format!(
            "title must be between 1 and {MAX_TITLE_CHARS} characters"
        )));
    }
    Ok(())
}

fn decrypted(cipher: &FieldCipher, task: Task) -> Result<TaskResponse, ApiError> {
    let description = task
        .encrypted_description
        .as_deref()
        .map(|envelope| cipher.decrypt(envelope))
        .transpose()?;
    Ok(TaskResponse {
        id: task.id,
        title: task.title,
        description,
        user_id: task.user_id,
    })
}
