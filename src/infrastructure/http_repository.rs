// HTTP repository implementation for the fleet backend REST API
use crate::application::rental_repository::RentalRepository;
use crate::domain::error::{TrackingError, TrackingResult};
use crate::domain::location::{LocationSample, TripSummary};
use crate::domain::rental::{NewRental, RentalRecord};
use crate::domain::session::{AdminDetails, AuthUser, Credentials};
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

const LOGIN: &str = "login";
const INVALID_CREDENTIALS: &str = "Invalid credentials.";

#[derive(Debug)]
pub struct HttpRentalRepository {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
    token: RwLock<Option<String>>,
}

impl HttpRentalRepository {
    pub fn new(base_url: &str, timeout: Duration) -> TrackingResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TrackingError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout,
            token: RwLock::new(None),
        })
    }

    fn rental_url(&self, rental_id: &str, suffix: &str) -> String {
        format!(
            "{}/rentals/{}{}",
            self.base_url,
            urlencoding::encode(rental_id),
            suffix
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self.token.read().unwrap_or_else(PoisonError::into_inner);
        match token.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> TrackingResult<T> {
        let response = self
            .authorize(request)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let response = check_status(response, what).await?;

        response
            .json::<T>()
            .await
            .map_err(|e| TrackingError::Decode(format!("{}: {}", what, e)))
    }

    fn transport_error(&self, error: reqwest::Error) -> TrackingError {
        if error.is_timeout() {
            TrackingError::Timeout(self.timeout.as_millis() as u64)
        } else {
            TrackingError::Network(error.to_string())
        }
    }
}

async fn check_status(response: Response, what: &str) -> TrackingResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::debug!("Backend answered {} for {}: {}", status, what, body);

    Err(match status {
        StatusCode::NOT_FOUND => TrackingError::NotFound(what.to_string()),
        StatusCode::UNAUTHORIZED if what == LOGIN => {
            TrackingError::Unauthorized(INVALID_CREDENTIALS.to_string())
        }
        StatusCode::UNAUTHORIZED => TrackingError::Unauthorized(format!("session rejected for {}", what)),
        StatusCode::FORBIDDEN => TrackingError::Unauthorized(format!("access denied to {}", what)),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            TrackingError::Validation(if body.is_empty() { what.to_string() } else { body })
        }
        _ => TrackingError::Network(format!("{} failed with status {}: {}", what, status, body)),
    })
}

#[async_trait]
impl RentalRepository for HttpRentalRepository {
    async fn list_rentals(&self) -> TrackingResult<Vec<RentalRecord>> {
        let url = format!("{}/rentals", self.base_url);
        self.execute(self.client.get(&url), "rental list").await
    }

    async fn realtime_location(&self, rental_id: &str) -> TrackingResult<LocationSample> {
        let url = self.rental_url(rental_id, "/location/realtime");
        self.execute(self.client.get(&url), &format!("realtime location of rental {}", rental_id))
            .await
    }

    async fn trip_summary(&self, rental_id: &str) -> TrackingResult<TripSummary> {
        let url = self.rental_url(rental_id, "/trip-summary");
        self.execute(self.client.get(&url), &format!("trip summary of rental {}", rental_id))
            .await
    }

    async fn create_rental(&self, rental: &NewRental) -> TrackingResult<RentalRecord> {
        let url = format!("{}/rentals", self.base_url);
        self.execute(self.client.post(&url).json(rental), "rental booking")
            .await
    }

    async fn login(&self, credentials: &Credentials) -> TrackingResult<AuthUser> {
        let url = format!("{}/login", self.base_url);
        self.execute(self.client.post(&url).json(credentials), LOGIN)
            .await
    }

    async fn admin_details(&self, user_id: &str) -> TrackingResult<AdminDetails> {
        let url = format!("{}/admins/{}", self.base_url, urlencoding::encode(user_id));
        self.execute(self.client.get(&url), &format!("admin details of user {}", user_id))
            .await
    }

    fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }
}
