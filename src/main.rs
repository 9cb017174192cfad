// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{future::Future, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::booking_service::BookingService;
use crate::application::rental_repository::RentalRepository;
use crate::application::session_service::SessionService;
use crate::application::tracking_service::TrackingService;
use crate::infrastructure::config::load_config;
use crate::infrastructure::http_repository::HttpRentalRepository;
use crate::infrastructure::session_store::SessionStore;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    clear_selection, create_rental, get_session, get_view, health_check, login, logout,
    refresh_directory, select_rental, stream_advisories, stream_view,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_config().context("failed to load configuration")?;

    // Create repository (infrastructure layer)
    let repository: Arc<dyn RentalRepository> = Arc::new(
        HttpRentalRepository::new(&config.backend.base_url, config.fetch_timeout())
            .context("failed to create backend client")?,
    );

    // Create services (application layer)
    let sessions = SessionService::load(repository.clone(), SessionStore::new(&config.session.path))
        .context("failed to restore session")?;
    let tracking = TrackingService::new(repository.clone(), config.tracking_settings());
    let bookings = BookingService::new(repository.clone(), tracking.clone(), config.fetch_timeout());

    // First directory load happens in the background; failures show up as a banner
    let initial = tracking.clone();
    tokio::spawn(async move {
        if let Err(e) = initial.refresh().await {
            tracing::warn!("Initial rental refresh failed: {}", e);
        }
    });

    let state = Arc::new(AppState {
        tracking: tracking.clone(),
        bookings,
        sessions,
    });

    let addr: SocketAddr = config
        .server
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address {}", config.server.bind_addr))?;
    tracing::info!(
        "Starting fleet-tracking console on {} (backend {})",
        addr,
        config.backend.base_url
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(release_on(shutdown_signal(), tracking.clone()))
        .await?;

    // Requests served while draining may have started a poll
    tracking.shutdown();
    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/tracking", get(get_view))
        .route("/tracking/refresh", post(refresh_directory))
        .route("/tracking/select/:rental_id", post(select_rental))
        .route("/tracking/selection", axum::routing::delete(clear_selection))
        .route("/tracking/stream", get(stream_view))
        .route("/tracking/advisories", get(stream_advisories))
        .route("/rentals", post(create_rental))
        .route("/session", get(get_session).delete(logout))
        .route("/session/login", post(login))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Close the tracking view as soon as `signal` fires, so open streams end and
/// the server can finish draining.
async fn release_on<F: Future<Output = ()>>(signal: F, tracking: TrackingService) {
    signal.await;
    tracking.shutdown();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown requested");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::rental_repository::mock::{record, sample, Call, MockRentalRepository};
    use crate::application::tracking_service::TrackingSettings;
    use crate::domain::location::TripSummary;
    use serde_json::Value;
    use std::time::Duration;

    fn app_state(repo: Arc<MockRentalRepository>, tracking: &TrackingService, dir: &tempfile::TempDir) -> Arc<AppState> {
        Arc::new(AppState {
            tracking: tracking.clone(),
            bookings: BookingService::new(repo.clone(), tracking.clone(), Duration::from_secs(10)),
            sessions: SessionService::load(repo, SessionStore::new(dir.path().join("session.json"))).unwrap(),
        })
    }

    async fn serve(repo: Arc<MockRentalRepository>) -> (String, TrackingService, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let tracking = TrackingService::new(repo.clone(), TrackingSettings::default());
        let state = app_state(repo, &tracking, &dir);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        (format!("http://{}", addr), tracking, dir)
    }

    #[tokio::test]
    async fn test_select_completed_rental_over_http() {
        let repo = Arc::new(MockRentalRepository::new());
        repo.push_rentals(Ok(vec![
            record("1", "Completed"),
            record("2", "Ongoing"),
            record("3", "Upcoming"),
        ]));
        repo.set_summary(
            "1",
            Ok(TripSummary {
                total_distance: 120.0,
                total_fuel: 15.0,
            }),
        );
        let (base, tracking, _dir) = serve(repo).await;
        let client = reqwest::Client::new();

        let refreshed: Value = client
            .post(format!("{}/tracking/refresh", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let ids: Vec<&str> = refreshed["directory"]["cards"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["rental_id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["2", "3", "1"]);

        let selected: Value = client
            .post(format!("{}/tracking/select/1", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(selected["effect"]["effect"], "fetch_summary_once");

        tokio::time::sleep(Duration::from_millis(100)).await;
        let view: Value = client
            .get(format!("{}/tracking", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(view["detail"]["state"], "summary");
        assert_eq!(view["detail"]["total_distance"], "120 km");

        tracking.shutdown();
    }

    #[tokio::test]
    async fn test_unknown_rental_is_404() {
        let repo = Arc::new(MockRentalRepository::new());
        let (base, _tracking, _dir) = serve(repo).await;

        let response = reqwest::Client::new()
            .post(format!("{}/tracking/select/404", base))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_booking_is_422() {
        let repo = Arc::new(MockRentalRepository::new());
        let (base, _tracking, _dir) = serve(repo).await;

        let response = reqwest::Client::new()
            .post(format!("{}/rentals", base))
            .json(&serde_json::json!({
                "renter_name": "Ana Cruz",
                "vehicle_descriptor": "Toyota Vios",
                "pickup_date": "2024-11-22",
                "dropoff_date": "2024-11-20"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_graceful_shutdown_with_stream_client_connected() {
        let repo = Arc::new(MockRentalRepository::new());
        repo.push_rentals(Ok(vec![record("2", "Ongoing")]));
        repo.set_location("2", Ok(sample(121.0, 14.6)));
        let dir = tempfile::tempdir().unwrap();
        let settings = TrackingSettings {
            poll_interval: Duration::from_millis(50),
            ..TrackingSettings::default()
        };
        let tracking = TrackingService::new(repo.clone(), settings);
        let state = app_state(repo.clone(), &tracking, &dir);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
        let signal = async move {
            let _ = stopped.await;
        };
        let released = tracking.clone();
        let server = tokio::spawn(async move {
            axum::serve(listener, router(state))
                .with_graceful_shutdown(release_on(signal, released))
                .await
        });

        tracking.refresh().await.unwrap();
        tracking.select("2").unwrap();
        let mut stream = reqwest::Client::new()
            .get(format!("{}/tracking/stream", base))
            .send()
            .await
            .unwrap();
        let first = stream.chunk().await.unwrap();
        assert!(first.is_some_and(|chunk| !chunk.is_empty()));

        stop.send(()).unwrap();
        let finished = tokio::time::timeout(Duration::from_secs(5), server).await;
        assert!(finished.is_ok(), "server did not finish draining");

        let ended = tokio::time::timeout(Duration::from_secs(5), async {
            while let Ok(Some(_)) = stream.chunk().await {}
        })
        .await;
        assert!(ended.is_ok());

        assert!(tracking.snapshot().polling.is_none());
        let polls = repo.count(&Call::RealtimeLocation("2".into()));
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(repo.count(&Call::RealtimeLocation("2".into())), polls);
    }
}
