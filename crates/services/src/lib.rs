#![forbid(unsafe_code)]

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod api;
pub mod app_services;
pub mod auth_service;
pub mod course_service;
pub mod error;
pub mod workout_service;

pub use fitness_core::Clock;
pub use reqwest::StatusCode;

pub use api::{ApiConfig, AuthToken, Credentials, FitnessApi, HttpFitnessApi, InMemoryApi};
pub use app_services::AppServices;
pub use auth_service::AuthService;
pub use course_service::CourseService;
pub use error::{ApiError, AuthError, AuthErrorCode, MSG_AUTH_REQUIRED, MSG_REQUEST_FAILED};
pub use workout_service::WorkoutService;

/// State guards are never held across an await, so a poisoned lock still
/// holds a consistent value.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
pub(crate) mod test_support;
