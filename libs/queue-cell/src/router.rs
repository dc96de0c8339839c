// libs/queue-cell/src/router.rs
use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{self, QueueCellState};

pub fn queue_routes(state: QueueCellState) -> Router {
    Router::new()
        .route("/", get(handlers::get_queue))
        .route("/check-in/{appointment_id}", post(handlers::check_in))
        .route("/walk-in", post(handlers::add_walk_in))
        .route("/doctors/{doctor_id}/call-next", post(handlers::call_next))
        .route("/doctors/{doctor_id}/wait-time", get(handlers::get_wait_time))
        .route("/{queue_id}", get(handlers::get_entry))
        .route("/{queue_id}/skip", post(handlers::skip_entry))
        .route("/{queue_id}/recall", post(handlers::recall_entry))
        .route("/{queue_id}/complete", post(handlers::complete_entry))
        .with_state(state)
}
