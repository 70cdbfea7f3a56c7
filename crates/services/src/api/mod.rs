//! Client side of the fitness REST backend.

use std::env;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use fitness_core::model::{Course, CourseId, ProgressRecord, User, Workout, WorkoutId};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

mod http;
mod memory;

pub use http::HttpFitnessApi;
pub use memory::InMemoryApi;

pub const DEFAULT_BASE_URL: &str = "https://wedev-api.sky.pro/api/fitness";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Bearer credential issued by the backend on sign-in.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Connection settings for [`HttpFitnessApi`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ApiConfig {
    /// Reads `FITNESS_API_BASE_URL` and `FITNESS_API_TIMEOUT_SECS`, falling
    /// back to defaults for unset or unparsable values.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let base_url = env::var("FITNESS_API_BASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(defaults.base_url);
        let timeout = env::var("FITNESS_API_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .map_or(defaults.timeout, Duration::from_secs);
        Self { base_url, timeout }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Operations the client needs from the backend.
///
/// Calls that take an [`AuthToken`] are sent with bearer authentication.
#[async_trait]
pub trait FitnessApi: Send + Sync {
    /// Create an account. Some backend versions answer without a token.
    async fn register(&self, credentials: &Credentials) -> Result<Option<AuthToken>, ApiError>;

    async fn login(&self, credentials: &Credentials) -> Result<AuthToken, ApiError>;

    async fn current_user(&self, token: &AuthToken) -> Result<User, ApiError>;

    async fn list_courses(&self) -> Result<Vec<Course>, ApiError>;

    async fn get_course(&self, course_id: &CourseId) -> Result<Course, ApiError>;

    async fn course_workouts(
        &self,
        token: &AuthToken,
        course_id: &CourseId,
    ) -> Result<Vec<Workout>, ApiError>;

    async fn add_user_course(&self, token: &AuthToken, course_id: &CourseId)
    -> Result<(), ApiError>;

    async fn remove_user_course(
        &self,
        token: &AuthToken,
        course_id: &CourseId,
    ) -> Result<(), ApiError>;

    async fn get_workout(&self, token: &AuthToken, workout_id: &WorkoutId)
    -> Result<Workout, ApiError>;

    /// All progress entries the user has for a course. 404 when there are none.
    async fn course_progress(
        &self,
        token: &AuthToken,
        course_id: &CourseId,
    ) -> Result<Vec<ProgressRecord>, ApiError>;

    async fn workout_progress(
        &self,
        token: &AuthToken,
        course_id: &CourseId,
        workout_id: &WorkoutId,
    ) -> Result<ProgressRecord, ApiError>;

    async fn save_progress(
        &self,
        token: &AuthToken,
        course_id: &CourseId,
        workout_id: &WorkoutId,
        progress_data: &[f64],
    ) -> Result<(), ApiError>;

    async fn reset_progress(
        &self,
        token: &AuthToken,
        course_id: &CourseId,
        workout_id: &WorkoutId,
    ) -> Result<(), ApiError>;
}
