use std::net::SocketAddr;
use std::sync::Arc;

use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use directory_cell::{Directory, HttpDirectory, StaticDirectory};
use notification_cell::{
    spawn_dispatcher, AuditSink, EventBus, HttpNotifier, LogAuditSink, LogNotifier, Notifier,
};
use queue_cell::{QueueCellState, QueueCoordinator, WaitTimeEstimator};
use scheduling_cell::{AppointmentBookingService, ValidationRules};
use shared_config::AppConfig;
use shared_store::{Clock, SystemClock};

#[tokio::main]
async fn main() {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting VisitFlow API server");

    // Load configuration
    let config = AppConfig::from_env();

    // Staff and patient identities come from the hospital directory when
    // one is configured; otherwise an empty in-process directory, which
    // rejects every booking until records are added.
    let directory: Arc<dyn Directory> = if config.is_configured() {
        Arc::new(HttpDirectory::new(&config))
    } else {
        warn!("No directory service configured, using empty in-process directory");
        Arc::new(StaticDirectory::new())
    };

    let notifier: Arc<dyn Notifier> = if config.has_notification_webhook() {
        Arc::new(HttpNotifier::new(&config))
    } else {
        Arc::new(LogNotifier)
    };
    let audit: Arc<dyn AuditSink> = Arc::new(LogAuditSink);

    let (events, rx) = EventBus::new();
    let _dispatcher = spawn_dispatcher(rx, notifier, audit);

    // Wire up the cells
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let scheduling = Arc::new(AppointmentBookingService::new(
        directory.clone(),
        clock.clone(),
        events.clone(),
        ValidationRules::from_config(&config),
    ));
    let coordinator = Arc::new(QueueCoordinator::new(
        scheduling.clone(),
        directory,
        clock,
        events,
    ));
    let wait_times = Arc::new(WaitTimeEstimator::new(
        coordinator.clone(),
        scheduling.clone(),
        config.default_consultation_minutes,
    ));
    let queue_state = QueueCellState {
        coordinator,
        wait_times,
    };

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(scheduling, queue_state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.bind_port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
