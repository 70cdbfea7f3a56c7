use std::sync::{Arc, Mutex};

use fitness_core::model::{CourseId, User};
use tracing::{info, warn};

use crate::api::{AuthToken, Credentials, FitnessApi};
use crate::error::{ApiError, AuthError};
use crate::lock;

#[derive(Debug, Default)]
struct Session {
    token: Option<AuthToken>,
    user: Option<User>,
}

/// Holds the signed-in user's token and profile.
///
/// Other services read the bearer token from here; where the token is kept
/// between runs is up to the caller (see [`AuthService::with_token`]).
pub struct AuthService {
    api: Arc<dyn FitnessApi>,
    session: Mutex<Session>,
}

impl AuthService {
    #[must_use]
    pub fn new(api: Arc<dyn FitnessApi>) -> Self {
        Self {
            api,
            session: Mutex::new(Session::default()),
        }
    }

    /// Restores a session from a previously issued token.
    #[must_use]
    pub fn with_token(api: Arc<dyn FitnessApi>, token: AuthToken) -> Self {
        let service = Self::new(api);
        service.set_token(token);
        service
    }

    /// Create an account and sign in with it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` with the mapped code if the backend rejects the
    /// registration or the follow-up sign-in.
    pub async fn register(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let credentials = Credentials::new(email, password);
        let issued = self.api.register(&credentials).await.map_err(|err| {
            let err = AuthError::from(err);
            warn!(code = %err.code, "registration failed");
            err
        })?;
        let token = match issued {
            Some(token) => token,
            None => self.api.login(&credentials).await?,
        };
        self.start_session(token).await;
        Ok(())
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` with the mapped code if the backend rejects the
    /// credentials or cannot be reached.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let credentials = Credentials::new(email, password);
        let token = self.api.login(&credentials).await.map_err(|err| {
            let err = AuthError::from(err);
            warn!(code = %err.code, "sign-in failed");
            err
        })?;
        self.start_session(token).await;
        Ok(())
    }

    async fn start_session(&self, token: AuthToken) {
        self.set_token(token);
        self.fetch_user_data().await;
    }

    /// Reloads the profile for the current token.
    ///
    /// Without a token this does nothing. A failed load ends the session,
    /// since the token is most likely no longer valid.
    pub async fn fetch_user_data(&self) -> Option<User> {
        let token = self.token()?;
        match self.api.current_user(&token).await {
            Ok(user) => {
                info!(email = %user.email, "profile loaded");
                lock(&self.session).user = Some(user.clone());
                Some(user)
            }
            Err(err) => {
                warn!(error = %err, "profile load failed, signing out");
                self.logout();
                None
            }
        }
    }

    pub fn set_token(&self, token: AuthToken) {
        lock(&self.session).token = Some(token);
    }

    pub fn logout(&self) {
        *lock(&self.session) = Session::default();
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        lock(&self.session).token.is_some()
    }

    #[must_use]
    pub fn token(&self) -> Option<AuthToken> {
        lock(&self.session).token.clone()
    }

    /// # Errors
    ///
    /// Returns `ApiError::MissingToken` when nobody is signed in.
    pub fn require_token(&self) -> Result<AuthToken, ApiError> {
        self.token().ok_or(ApiError::MissingToken)
    }

    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        lock(&self.session).user.clone()
    }

    /// Course ids the signed-in user has selected, empty when unknown.
    #[must_use]
    pub fn selected_courses(&self) -> Vec<CourseId> {
        lock(&self.session)
            .user
            .as_ref()
            .map(|user| user.selected_courses.clone())
            .unwrap_or_default()
    }

    /// Mirrors a course selection into the cached profile.
    pub fn add_course_locally(&self, course_id: CourseId) {
        if let Some(user) = lock(&self.session).user.as_mut() {
            user.select_course(course_id);
        }
    }

    /// Mirrors a course removal into the cached profile.
    pub fn remove_course_locally(&self, course_id: &CourseId) {
        if let Some(user) = lock(&self.session).user.as_mut() {
            user.deselect_course(course_id);
        }
    }
}
