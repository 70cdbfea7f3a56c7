use std::sync::Arc;

use crate::Clock;
use crate::api::{ApiConfig, AuthToken, FitnessApi, HttpFitnessApi};
use crate::auth_service::AuthService;
use crate::course_service::CourseService;
use crate::error::ApiError;
use crate::workout_service::WorkoutService;

/// Assembles app-facing services around one backend client.
#[derive(Clone)]
pub struct AppServices {
    auth: Arc<AuthService>,
    courses: Arc<CourseService>,
    workouts: Arc<WorkoutService>,
}

impl AppServices {
    /// Build services against an arbitrary backend.
    #[must_use]
    pub fn new(api: Arc<dyn FitnessApi>, clock: Clock) -> Self {
        Self::assemble(api, clock, None)
    }

    /// Build services backed by the REST API, optionally restoring a session.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the HTTP client cannot be built.
    pub fn http(
        config: &ApiConfig,
        clock: Clock,
        token: Option<AuthToken>,
    ) -> Result<Self, ApiError> {
        let api: Arc<dyn FitnessApi> = Arc::new(HttpFitnessApi::new(config)?);
        Ok(Self::assemble(api, clock, token))
    }

    fn assemble(api: Arc<dyn FitnessApi>, clock: Clock, token: Option<AuthToken>) -> Self {
        let auth = Arc::new(match token {
            Some(token) => AuthService::with_token(Arc::clone(&api), token),
            None => AuthService::new(Arc::clone(&api)),
        });
        let courses = Arc::new(CourseService::new(Arc::clone(&api), Arc::clone(&auth)));
        let workouts = Arc::new(WorkoutService::new(
            clock,
            api,
            Arc::clone(&auth),
            Arc::clone(&courses),
        ));

        Self {
            auth,
            courses,
            workouts,
        }
    }

    #[must_use]
    pub fn auth(&self) -> Arc<AuthService> {
        Arc::clone(&self.auth)
    }

    #[must_use]
    pub fn courses(&self) -> Arc<CourseService> {
        Arc::clone(&self.courses)
    }

    #[must_use]
    pub fn workouts(&self) -> Arc<WorkoutService> {
        Arc::clone(&self.workouts)
    }
}
