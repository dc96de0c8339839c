use std::sync::Arc;

use axum::{routing::get, Router};

use queue_cell::{queue_routes, QueueCellState};
use scheduling_cell::{appointment_routes, AppointmentBookingService};

pub fn create_router(
    scheduling: Arc<AppointmentBookingService>,
    queue_state: QueueCellState,
) -> Router {
    Router::new()
        .route("/", get(|| async { "VisitFlow API is running!" }))
        .nest("/appointments", appointment_routes(scheduling))
        .nest("/queue", queue_routes(queue_state))
}
