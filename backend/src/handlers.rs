//! HTTP handlers. Task routes sit behind [`authenticate`](crate::auth::authenticate)
//! and read the caller from the [`Identity`] extension.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        OriginalUri, Path, Query, State,
    },
    http::StatusCode,
    response::Json,
    Extension,
};
use chrono::Utc;
use serde_json::{json, Map, Value};
use shared::{DataEnvelope, ListEnvelope, MessageEnvelope, TaskQuery, TaskView};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::identity::Identity;
use crate::query::{build_filter, sort_tasks, SortOptions};
use crate::store::NewTask;
use crate::validation::{validate_create, validate_patch};

type ApiResult<T> = Result<T, ApiError>;

/// A body sent without a JSON content type reads as an empty object.
fn json_body(body: Result<Json<Value>, JsonRejection>) -> ApiResult<Value> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(Value::Object(Map::new())),
        Err(rejection) => Err(rejection.into()),
    }
}

fn parse_task_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::MalformedReference(raw.to_string()))
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Student Task Planner API is healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

pub async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}

pub async fn route_not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    ApiError::NotFound(format!("Route {target} not found"))
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<DataEnvelope<TaskView>>)> {
    let body = json_body(body)?;
    let draft = validate_create(&body, Utc::now()).map_err(ApiError::InvalidInput)?;

    let task = state
        .store
        .create(NewTask {
            owner: identity.owner_id,
            title: draft.title,
            description: draft.description,
            priority: draft.priority,
            due_date: draft.due_date,
            completed: draft.completed,
        })
        .await?;
    tracing::info!(task_id = %task.id, owner = %task.owner, "task created");

    Ok((
        StatusCode::CREATED,
        Json(DataEnvelope::ok(task.view_at(Utc::now()))),
    ))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    query: Result<Query<TaskQuery>, QueryRejection>,
) -> ApiResult<Json<ListEnvelope<TaskView>>> {
    let Query(query) = query?;
    let filter = build_filter(&query, &identity.owner_id);

    let mut tasks = state.store.find(&filter).await?;
    sort_tasks(&mut tasks, SortOptions::from_query(&query));

    let now = Utc::now();
    let views = tasks.into_iter().map(|task| task.view_at(now)).collect();
    Ok(Json(ListEnvelope::ok(views)))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<Json<DataEnvelope<TaskView>>> {
    let id = parse_task_id(&id)?;
    let task = state
        .store
        .find_one(id, &identity.owner_id)
        .await?
        .ok_or_else(ApiError::task_not_found)?;
    Ok(Json(DataEnvelope::ok(task.view_at(Utc::now()))))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<DataEnvelope<TaskView>>> {
    let body = json_body(body)?;
    // Invalid payloads never reach the store.
    let changes = validate_patch(&body).map_err(ApiError::InvalidInput)?;
    let id = parse_task_id(&id)?;

    let task = state
        .store
        .find_one_and_update(id, &identity.owner_id, &changes)
        .await?
        .ok_or_else(ApiError::task_not_found)?;
    tracing::info!(task_id = %task.id, "task updated");
    Ok(Json(DataEnvelope::ok(task.view_at(Utc::now()))))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageEnvelope>> {
    let id = parse_task_id(&id)?;
    state
        .store
        .find_one_and_delete(id, &identity.owner_id)
        .await?
        .ok_or_else(ApiError::task_not_found)?;
    tracing::info!(task_id = %id, "task deleted");
    Ok(Json(MessageEnvelope::ok("Task deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_ids_must_be_uuids() {
        assert!(parse_task_id("6f1c1f5e-2f43-4c3a-9d9a-0b7d2c1f0a11").is_ok());
        assert!(matches!(
            parse_task_id("507f1f77bcf86cd799439011"),
            Err(ApiError::MalformedReference(_))
        ));
    }
}
