use fitness_core::validation::{
    FormField, FormValidation, is_valid_email, is_valid_password, passwords_match,
    validate_login_form, validate_register_form,
};
use services::AuthService;
use tracing::{info, warn};

use crate::state::ViewError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
}

/// Sign-in / sign-up form state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthFormVm {
    mode: AuthMode,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    show_password: bool,
    show_confirm_password: bool,
}

impl AuthFormVm {
    #[must_use]
    pub fn new(mode: AuthMode) -> Self {
        Self {
            mode,
            email: String::new(),
            password: String::new(),
            confirm_password: String::new(),
            show_password: false,
            show_confirm_password: false,
        }
    }

    #[must_use]
    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    /// Switches between sign-in and sign-up, keeping typed values.
    pub fn set_mode(&mut self, mode: AuthMode) {
        self.mode = mode;
    }

    #[must_use]
    pub fn show_password(&self) -> bool {
        self.show_password
    }

    #[must_use]
    pub fn show_confirm_password(&self) -> bool {
        self.show_confirm_password
    }

    pub fn toggle_password_visibility(&mut self) {
        self.show_password = !self.show_password;
    }

    pub fn toggle_confirm_password_visibility(&mut self) {
        self.show_confirm_password = !self.show_confirm_password;
    }

    #[must_use]
    pub fn email_error(&self) -> bool {
        !is_valid_email(&self.email)
    }

    #[must_use]
    pub fn password_error(&self) -> bool {
        !is_valid_password(&self.password)
    }

    /// Only sign-up asks for the password twice.
    #[must_use]
    pub fn confirm_password_error(&self) -> bool {
        self.mode == AuthMode::Register && !passwords_match(&self.password, &self.confirm_password)
    }

    #[must_use]
    pub fn validation(&self) -> FormValidation {
        match self.mode {
            AuthMode::Login => validate_login_form(&self.email, &self.password),
            AuthMode::Register => {
                validate_register_form(&self.email, &self.password, &self.confirm_password)
            }
        }
    }

    #[must_use]
    pub fn is_form_valid(&self) -> bool {
        self.validation().is_valid()
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.mode);
    }

    /// Validates the form and signs in or up; the form is cleared on success.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::InvalidInput` with the first field message when
    /// the form is invalid (no request is made), or `ViewError::Auth` with the
    /// backend's failure code.
    pub async fn submit(&mut self, auth: &AuthService) -> Result<(), ViewError> {
        let validation = self.validation();
        if let Some(message) = first_error(&validation) {
            return Err(ViewError::InvalidInput(message));
        }

        let result = match self.mode {
            AuthMode::Login => auth.login(&self.email, &self.password).await,
            AuthMode::Register => auth.register(&self.email, &self.password).await,
        };
        result.map_err(|err| ViewError::Auth(err.code))?;
        if !auth.is_authenticated() {
            warn!(mode = ?self.mode, "credentials accepted but the profile could not be loaded");
            return Err(ViewError::AuthRequired);
        }

        info!(mode = ?self.mode, "auth form submitted");
        self.reset();
        Ok(())
    }
}

fn first_error(validation: &FormValidation) -> Option<&'static str> {
    [FormField::Email, FormField::Password, FormField::ConfirmPassword]
        .into_iter()
        .find_map(|field| validation.error(field))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use fitness_core::validation::{MSG_INVALID_EMAIL, MSG_PASSWORDS_DIFFER};
    use services::{AuthErrorCode, InMemoryApi, StatusCode};

    fn filled(mode: AuthMode) -> AuthFormVm {
        let mut form = AuthFormVm::new(mode);
        form.email = "user@mail.ru".into();
        form.password = "secret!!".into();
        form
    }

    #[test]
    fn empty_form_flags_every_field() {
        let form = AuthFormVm::new(AuthMode::Register);
        assert!(form.email_error());
        assert!(form.password_error());
        assert!(!form.is_form_valid());
    }

    #[test]
    fn confirm_only_checked_when_registering() {
        let mut form = filled(AuthMode::Login);
        form.confirm_password = "other".into();
        assert!(!form.confirm_password_error());
        assert!(form.is_form_valid());

        form.set_mode(AuthMode::Register);
        assert!(form.confirm_password_error());
        assert_eq!(
            form.validation().error(FormField::ConfirmPassword),
            Some(MSG_PASSWORDS_DIFFER)
        );
    }

    #[test]
    fn reset_clears_values_and_toggles() {
        let mut form = filled(AuthMode::Register);
        form.toggle_password_visibility();
        form.toggle_confirm_password_visibility();

        form.reset();

        assert_eq!(form, AuthFormVm::new(AuthMode::Register));
    }

    #[tokio::test]
    async fn invalid_form_is_not_submitted() {
        let api = InMemoryApi::new();
        let auth = AuthService::new(Arc::new(api.clone()));
        let mut form = filled(AuthMode::Login);
        form.email = "not-an-email".into();

        let err = form.submit(&auth).await.unwrap_err();

        assert_eq!(err, ViewError::InvalidInput(MSG_INVALID_EMAIL));
        assert_eq!(api.request_count(), 0);
    }

    #[tokio::test]
    async fn rejected_sign_in_reports_code() {
        let api = InMemoryApi::new();
        api.add_account("user@mail.ru", "another!!");
        let auth = AuthService::new(Arc::new(api));
        let mut form = filled(AuthMode::Login);

        let err = form.submit(&auth).await.unwrap_err();

        assert_eq!(err, ViewError::Auth(AuthErrorCode::WrongPassword));
        assert_eq!(err.message(), "wrong-password");
        assert_eq!(form.email, "user@mail.ru");
    }

    #[tokio::test]
    async fn successful_registration_clears_form() {
        let auth = AuthService::new(Arc::new(InMemoryApi::new()));
        let mut form = filled(AuthMode::Register);
        form.confirm_password = form.password.clone();

        form.submit(&auth).await.unwrap();

        assert!(auth.is_authenticated());
        assert!(form.email.is_empty());
    }

    #[tokio::test]
    async fn failed_profile_load_after_sign_in_asks_to_sign_in() {
        let api = InMemoryApi::new();
        api.add_account("user@mail.ru", "secret!!");
        api.pass_next();
        api.fail_next(StatusCode::INTERNAL_SERVER_ERROR, None);
        let auth = AuthService::new(Arc::new(api));
        let mut form = filled(AuthMode::Login);

        let err = form.submit(&auth).await.unwrap_err();

        assert_eq!(err, ViewError::AuthRequired);
        assert_eq!(err.message(), "Требуется авторизация");
        assert!(!auth.is_authenticated());
        assert_eq!(form.email, "user@mail.ru");
    }
}
