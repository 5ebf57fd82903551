use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use innkeeper::config::AppConfig;
use innkeeper::db;
use innkeeper::handlers;
use innkeeper::services::maintenance::Sweeper;
use innkeeper::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
    });

    let sweeper = Sweeper::start(Arc::clone(&state));

    // Permissive CORS for local development.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        // availability
        .route(
            "/api/hotels/:hotel_id/availability",
            get(handlers::availability::hotel_availability),
        )
        .route(
            "/api/hotels/:hotel_id/room-types/:room_type_id/availability",
            get(handlers::availability::room_type_availability),
        )
        // bookings
        .route(
            "/api/bookings",
            post(handlers::bookings::book_room).get(handlers::bookings::list_bookings),
        )
        .route("/api/bookings/:id", get(handlers::bookings::get_booking))
        .route(
            "/api/bookings/:id/confirm",
            post(handlers::bookings::confirm_booking),
        )
        .route(
            "/api/bookings/:id/check-in",
            post(handlers::bookings::check_in_booking),
        )
        .route(
            "/api/bookings/:id/check-out",
            post(handlers::bookings::check_out_booking),
        )
        .route(
            "/api/bookings/:id/cancel",
            post(handlers::bookings::cancel_booking),
        )
        // promotion offers
        .route(
            "/api/offers",
            post(handlers::offers::create_offer).get(handlers::offers::list_offers),
        )
        .route(
            "/api/offers/:id/cancel",
            post(handlers::offers::cancel_offer),
        )
        .route("/api/offers/:id/book", post(handlers::offers::book_with_offer))
        // catalog
        .route("/api/hotels", post(handlers::catalog::create_hotel))
        .route(
            "/api/hotels/:hotel_id/room-types",
            post(handlers::catalog::create_room_type).get(handlers::catalog::list_room_types),
        )
        .route(
            "/api/room-types/:room_type_id/rooms",
            post(handlers::catalog::create_room),
        )
        .route(
            "/api/rooms/:id/deactivate",
            post(handlers::catalog::deactivate_room),
        )
        // maintenance, for external schedulers; the in-process sweeper covers
        // normal operation
        .route(
            "/api/system/auto-checkout",
            post(handlers::system::auto_checkout),
        )
        .route(
            "/api/system/auto-cancel-pending",
            post(handlers::system::auto_cancel_pending),
        )
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    sweeper.stop();
    Ok(())
}
