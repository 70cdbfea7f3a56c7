use std::future::Future;
use std::str::FromStr;

use fitness_core::model::ParseIdError;
use services::{ApiError, AuthErrorCode, MSG_AUTH_REQUIRED};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("{}", MSG_AUTH_REQUIRED)]
    AuthRequired,
    /// An argument was missing before any request was made.
    #[error("{0}")]
    InvalidInput(&'static str),
    #[error("{0}")]
    Request(String),
    /// Sign-in or sign-up rejected, carrying the stable failure code.
    #[error("{0}")]
    Auth(AuthErrorCode),
}

impl ViewError {
    /// Maps a service failure to the text shown to the user.
    ///
    /// The backend's own message wins; `fallback` names the failed action.
    #[must_use]
    pub fn from_api(err: &ApiError, fallback: &'static str) -> Self {
        if let Some(message) = err.server_message() {
            return Self::Request(message.to_owned());
        }
        if err.is_unauthorized() {
            return Self::AuthRequired;
        }
        Self::Request(fallback.to_owned())
    }

    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// Parses a raw id argument, rejecting blank input with `message`.
pub(crate) fn parse_id<T>(raw: &str, message: &'static str) -> Result<T, ViewError>
where
    T: FromStr<Err = ParseIdError>,
{
    raw.parse().map_err(|_| ViewError::InvalidInput(message))
}

/// Loading flag and last error of a view-model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadState {
    is_loading: bool,
    error: Option<ViewError>,
}

impl LoadState {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    #[must_use]
    pub fn error(&self) -> Option<&ViewError> {
        self.error.as_ref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Records `err` as the last error and returns it.
    pub fn fail<T>(&mut self, err: ViewError) -> Result<T, ViewError> {
        debug!(error = %err, "view-model call rejected");
        self.error = Some(err.clone());
        Err(err)
    }

    /// Runs `task` with the loading flag raised, recording a failure.
    ///
    /// # Errors
    ///
    /// Returns the mapped `ViewError` when `task` fails.
    pub async fn run<T>(
        &mut self,
        fallback: &'static str,
        task: impl Future<Output = Result<T, ApiError>>,
    ) -> Result<T, ViewError> {
        self.is_loading = true;
        self.error = None;
        let result = task.await;
        self.is_loading = false;
        match result {
            Ok(value) => Ok(value),
            Err(err) => self.fail(ViewError::from_api(&err, fallback)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use services::{MSG_REQUEST_FAILED, StatusCode};

    fn status(code: u16, message: Option<&str>) -> ApiError {
        ApiError::status(
            StatusCode::from_u16(code).unwrap(),
            message.map(str::to_owned),
        )
    }

    #[test]
    fn server_text_beats_fallback() {
        let err = ViewError::from_api(&status(400, Some("Курс уже добавлен")), "Ошибка");
        assert_eq!(err.message(), "Курс уже добавлен");
    }

    #[test]
    fn unauthorized_without_text_asks_to_sign_in() {
        assert_eq!(
            ViewError::from_api(&ApiError::MissingToken, "Ошибка"),
            ViewError::AuthRequired
        );
        assert_eq!(ViewError::AuthRequired.message(), MSG_AUTH_REQUIRED);
    }

    #[test]
    fn other_failures_use_fallback() {
        let err = ViewError::from_api(&status(500, None), "Ошибка загрузки курсов");
        assert_eq!(err.message(), "Ошибка загрузки курсов");
        assert_ne!(err.message(), MSG_REQUEST_FAILED);
    }

    #[tokio::test]
    async fn run_records_and_clears_errors() {
        let mut state = LoadState::default();

        let failed: Result<(), _> = state.run("Ошибка", async { Err(status(502, None)) }).await;
        assert!(failed.is_err());
        assert!(!state.is_loading());
        assert_eq!(state.error().map(ViewError::message).as_deref(), Some("Ошибка"));

        let ok = state.run("Ошибка", async { Ok::<_, ApiError>(7) }).await;
        assert_eq!(ok, Ok(7));
        assert!(state.error().is_none());
    }
}
