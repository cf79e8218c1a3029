use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use velora_api::{app, state::AppState, worker};
use velora_booking::{BookingRepository, EngineLimits, ReservationEngine, ResourceRepository};
use velora_catalog::{AvailabilityIndex, FeeCalculator};
use velora_store::{
    DbClient, MemoryBookingRepository, MemoryResourceRepository, PgBookingRepository,
    PgResourceRepository,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "velora_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = velora_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Velora API on port {}", config.server.port);

    let rules = config.business_rules.clone();
    let availability = Arc::new(AvailabilityIndex::new(chrono::Duration::seconds(
        rules.hold_ttl_seconds as i64,
    )));

    let (bookings, resources): (Arc<dyn BookingRepository>, Arc<dyn ResourceRepository>) =
        if config.database.url.is_empty() {
            tracing::warn!("No database configured, running on in-memory stores");
            (
                Arc::new(MemoryBookingRepository::new()),
                Arc::new(MemoryResourceRepository::new()),
            )
        } else {
            let db = DbClient::new(&config.database.url)
                .await
                .expect("Failed to connect to Postgres");
            db.migrate().await.expect("Failed to run migrations");
            (
                Arc::new(PgBookingRepository::new(db.pool.clone())),
                Arc::new(PgResourceRepository::new(db.pool.clone())),
            )
        };

    let engine = Arc::new(ReservationEngine::new(
        bookings,
        resources.clone(),
        availability.clone(),
        FeeCalculator::from_basis_points(rules.service_fee_bps),
        EngineLimits {
            max_reference_attempts: rules.max_reference_attempts,
            max_update_attempts: rules.max_update_attempts,
        },
    ));

    let restored = engine
        .restore_availability()
        .await
        .expect("Failed to rebuild availability state");
    tracing::info!(restored, "availability ledgers rebuilt from persisted bookings");

    worker::spawn_hold_sweeper(
        availability.clone(),
        std::time::Duration::from_secs(rules.sweep_interval_seconds),
    );

    let app_state = AppState {
        engine,
        availability,
        resources,
        business_rules: rules,
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
