pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use error::QueueError;
pub use handlers::QueueCellState;
pub use models::*;
pub use router::queue_routes;
pub use services::queue::QueueCoordinator;
pub use services::wait_time::WaitTimeEstimator;
