// libs/queue-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{
    CallNextRequest, CompleteRequest, QueueQuery, RecallRequest, SkipRequest, WalkInRequest,
};
use crate::services::queue::QueueCoordinator;
use crate::services::wait_time::WaitTimeEstimator;

#[derive(Clone)]
pub struct QueueCellState {
    pub coordinator: Arc<QueueCoordinator>,
    pub wait_times: Arc<WaitTimeEstimator>,
}

#[axum::debug_handler]
pub async fn check_in(
    State(state): State<QueueCellState>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let entry = state.coordinator.check_in(appointment_id).await?;

    Ok(Json(json!({
        "success": true,
        "queue_entry": entry,
        "message": format!("Checked in with queue number {}", entry.queue_number)
    })))
}

#[axum::debug_handler]
pub async fn add_walk_in(
    State(state): State<QueueCellState>,
    Json(request): Json<WalkInRequest>,
) -> Result<Json<Value>, AppError> {
    let entry = state.coordinator.add_walk_in(request).await?;

    Ok(Json(json!({
        "success": true,
        "queue_entry": entry,
        "message": format!("Walk-in added with queue number {}", entry.queue_number)
    })))
}

#[axum::debug_handler]
pub async fn call_next(
    State(state): State<QueueCellState>,
    Path(doctor_id): Path<Uuid>,
    request: Option<Json<CallNextRequest>>,
) -> Result<Json<Value>, AppError> {
    let actor_id = request.map(|Json(r)| r.actor_id).unwrap_or_default();
    let entry = state.coordinator.call_next(doctor_id, actor_id).await?;

    Ok(Json(json!({
        "success": true,
        "queue_entry": entry,
        "message": format!("Now serving queue number {}", entry.queue_number)
    })))
}

#[axum::debug_handler]
pub async fn skip_entry(
    State(state): State<QueueCellState>,
    Path(queue_id): Path<Uuid>,
    Json(request): Json<SkipRequest>,
) -> Result<Json<Value>, AppError> {
    let entry = state
        .coordinator
        .skip(queue_id, request.reason, request.actor_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "queue_entry": entry,
        "message": "Queue entry skipped"
    })))
}

#[axum::debug_handler]
pub async fn recall_entry(
    State(state): State<QueueCellState>,
    Path(queue_id): Path<Uuid>,
    request: Option<Json<RecallRequest>>,
) -> Result<Json<Value>, AppError> {
    let actor_id = request.map(|Json(r)| r.actor_id).unwrap_or_default();
    let entry = state.coordinator.recall(queue_id, actor_id).await?;

    Ok(Json(json!({
        "success": true,
        "queue_entry": entry,
        "message": format!("Queue number {} recalled", entry.queue_number)
    })))
}

#[axum::debug_handler]
pub async fn complete_entry(
    State(state): State<QueueCellState>,
    Path(queue_id): Path<Uuid>,
    request: Option<Json<CompleteRequest>>,
) -> Result<Json<Value>, AppError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let entry = state
        .coordinator
        .complete(queue_id, request.actor_id, request.notes)
        .await?;

    Ok(Json(json!({
        "success": true,
        "queue_entry": entry,
        "message": "Consultation completed"
    })))
}

#[axum::debug_handler]
pub async fn get_queue(
    State(state): State<QueueCellState>,
    Query(query): Query<QueueQuery>,
) -> Result<Json<Value>, AppError> {
    let entries = state.coordinator.get_queue(&query).await;

    Ok(Json(json!({
        "success": true,
        "queue": entries,
        "count": entries.len()
    })))
}

#[axum::debug_handler]
pub async fn get_entry(
    State(state): State<QueueCellState>,
    Path(queue_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let position = state.coordinator.position(queue_id).await?;

    Ok(Json(json!({
        "success": true,
        "queue_entry": position.entry,
        "ahead": position.ahead
    })))
}

#[axum::debug_handler]
pub async fn get_wait_time(
    State(state): State<QueueCellState>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let estimate = state.wait_times.estimate(doctor_id).await;

    Ok(Json(json!({
        "success": true,
        "wait_time": estimate
    })))
}
