//! Shared error types for the services crate.

use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

/// Shown when a request needs a signed-in user.
pub const MSG_AUTH_REQUIRED: &str = "Требуется авторизация";
/// Shown when a request failed without a usable server message.
pub const MSG_REQUEST_FAILED: &str = "Произошла ошибка при выполнении запроса";

/// Errors emitted by `FitnessApi` backends.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("no bearer token; sign in first")]
    MissingToken,
    #[error("request failed with status {status}")]
    HttpStatus {
        status: StatusCode,
        message: Option<String>,
    },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    #[must_use]
    pub fn status(status: StatusCode, message: Option<String>) -> Self {
        Self::HttpStatus { status, message }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::HttpStatus { status, .. } if *status == StatusCode::NOT_FOUND)
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::MissingToken => true,
            Self::HttpStatus { status, .. } => *status == StatusCode::UNAUTHORIZED,
            _ => false,
        }
    }

    /// The `message` field of the backend's error body, when it sent one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::HttpStatus {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => Some(message),
            _ => None,
        }
    }

    /// Message suitable for showing to the user.
    ///
    /// Prefers the server's own message, then the sign-in hint for auth
    /// failures, then a generic text.
    #[must_use]
    pub fn user_message(&self) -> String {
        if let Some(message) = self.server_message() {
            return message.to_owned();
        }
        if self.is_unauthorized() {
            return MSG_AUTH_REQUIRED.to_owned();
        }
        MSG_REQUEST_FAILED.to_owned()
    }
}

/// Stable codes for sign-in and sign-up failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum AuthErrorCode {
    InvalidEmail,
    EmailExists,
    PasswordLength,
    PasswordSpecialChars,
    PasswordUppercase,
    UserNotFound,
    WrongPassword,
    Unknown,
}

impl AuthErrorCode {
    /// Maps a backend validation message to its code.
    #[must_use]
    pub fn from_server_message(message: &str) -> Self {
        match message {
            "Введите корректный Email" => Self::InvalidEmail,
            "Пользователь с таким email уже существует" => Self::EmailExists,
            "Пароль должен содержать не менее 6 символов" => Self::PasswordLength,
            "Пароль должен содержать не менее 2 спецсимволов" => Self::PasswordSpecialChars,
            "Пароль должен содержать как минимум одну заглавную букву" => {
                Self::PasswordUppercase
            }
            "Пользователь с таким email не найден" => Self::UserNotFound,
            "Неверный пароль" => Self::WrongPassword,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidEmail => "invalid-email",
            Self::EmailExists => "email-exists",
            Self::PasswordLength => "password-length",
            Self::PasswordSpecialChars => "password-special-chars",
            Self::PasswordUppercase => "password-uppercase",
            Self::UserNotFound => "user-not-found",
            Self::WrongPassword => "wrong-password",
            Self::Unknown => "unknown-error",
        }
    }
}

impl fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors emitted by `AuthService` sign-in and sign-up.
#[derive(Debug, Error)]
#[error("{code}")]
pub struct AuthError {
    pub code: AuthErrorCode,
    #[source]
    pub source: ApiError,
}

impl From<ApiError> for AuthError {
    fn from(source: ApiError) -> Self {
        let code = source
            .server_message()
            .map_or(AuthErrorCode::Unknown, AuthErrorCode::from_server_message);
        Self { code, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_prefers_server_text() {
        let err = ApiError::status(StatusCode::UNAUTHORIZED, Some("Токен истёк".into()));
        assert_eq!(err.user_message(), "Токен истёк");
    }

    #[test]
    fn user_message_for_unauthorized_without_text() {
        assert_eq!(
            ApiError::status(StatusCode::UNAUTHORIZED, None).user_message(),
            MSG_AUTH_REQUIRED
        );
        assert_eq!(ApiError::MissingToken.user_message(), MSG_AUTH_REQUIRED);
    }

    #[test]
    fn user_message_falls_back_to_generic() {
        let err = ApiError::status(StatusCode::INTERNAL_SERVER_ERROR, Some("  ".into()));
        assert_eq!(err.user_message(), MSG_REQUEST_FAILED);
        assert!(!err.is_not_found());
    }

    #[test]
    fn auth_error_maps_known_messages() {
        let err = AuthError::from(ApiError::status(
            StatusCode::BAD_REQUEST,
            Some("Неверный пароль".into()),
        ));
        assert_eq!(err.code, AuthErrorCode::WrongPassword);
        assert_eq!(err.to_string(), "wrong-password");
    }

    #[test]
    fn auth_error_unknown_for_transport_failures() {
        let err = AuthError::from(ApiError::MissingToken);
        assert_eq!(err.code, AuthErrorCode::Unknown);
        assert_eq!(
            AuthError::from(ApiError::status(StatusCode::BAD_REQUEST, Some("???".into()))).code,
            AuthErrorCode::Unknown
        );
    }
}
