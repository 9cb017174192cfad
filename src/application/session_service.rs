// Session service - login/logout against the backend, persisted through the store
use crate::application::rental_repository::RentalRepository;
use crate::domain::error::{TrackingError, TrackingResult};
use crate::domain::session::{Credentials, Session};
use crate::infrastructure::session_store::SessionStore;
use std::sync::{Arc, PoisonError, RwLock};

pub const NO_ACCESS_MESSAGE: &str = "You do not have access to this application.";

#[derive(Clone)]
pub struct SessionService {
    repository: Arc<dyn RentalRepository>,
    store: SessionStore,
    current: Arc<RwLock<Session>>,
}

impl SessionService {
    /// Restore the persisted session and hand its token to the repository.
    pub fn load(repository: Arc<dyn RentalRepository>, store: SessionStore) -> TrackingResult<Self> {
        let session = store.load()?;
        repository.set_token(session.token().map(str::to_string));
        if session.is_authenticated() {
            tracing::info!("Restored session from {}", store.path().display());
        }

        Ok(Self {
            repository,
            store,
            current: Arc::new(RwLock::new(session)),
        })
    }

    pub fn current(&self) -> Session {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub async fn login(&self, credentials: &Credentials) -> TrackingResult<Session> {
        let user = self.repository.login(credentials).await?;
        if user.role != "admin" {
            tracing::warn!("Rejected login for {} with role {}", user.email, user.role);
            return Err(TrackingError::Unauthorized(NO_ACCESS_MESSAGE.to_string()));
        }

        // The console works without the profile, it only drives the greeting
        let admin = match self.repository.admin_details(&user.user_id).await {
            Ok(admin) => Some(admin),
            Err(e) => {
                tracing::warn!("Failed to fetch admin details for {}: {}", user.user_id, e);
                None
            }
        };

        let session = Session {
            user: Some(user),
            admin,
        };
        self.store.save(&session)?;
        self.repository.set_token(session.token().map(str::to_string));
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = session.clone();

        tracing::info!("Signed in as {}", credentials.email);
        Ok(session)
    }

    pub fn logout(&self) -> TrackingResult<()> {
        self.store.clear()?;
        self.repository.set_token(None);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Session::default();
        tracing::info!("Signed out");
        Ok(())
    }
}
