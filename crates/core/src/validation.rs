//! Sign-in and sign-up form validation.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern is valid"));

pub const MIN_PASSWORD_CHARS: usize = 6;

pub const MSG_INVALID_EMAIL: &str = "Введите корректный Email";
pub const MSG_SHORT_PASSWORD: &str = "Пароль должен содержать минимум 6 символов";
pub const MSG_PASSWORDS_DIFFER: &str = "Пароли не совпадают";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormField {
    Email,
    Password,
    ConfirmPassword,
}

/// Outcome of a form check: one message per failing field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormValidation {
    errors: BTreeMap<FormField, &'static str>,
}

impl FormValidation {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn error(&self, field: FormField) -> Option<&'static str> {
        self.errors.get(&field).copied()
    }

    #[must_use]
    pub fn errors(&self) -> &BTreeMap<FormField, &'static str> {
        &self.errors
    }

    fn check(&mut self, ok: bool, field: FormField, message: &'static str) {
        if !ok {
            self.errors.insert(field, message);
        }
    }
}

#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

#[must_use]
pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_CHARS
}

#[must_use]
pub fn passwords_match(password: &str, confirm_password: &str) -> bool {
    password == confirm_password
}

#[must_use]
pub fn validate_login_form(email: &str, password: &str) -> FormValidation {
    let mut validation = FormValidation::default();
    validation.check(is_valid_email(email), FormField::Email, MSG_INVALID_EMAIL);
    validation.check(
        is_valid_password(password),
        FormField::Password,
        MSG_SHORT_PASSWORD,
    );
    validation
}

#[must_use]
pub fn validate_register_form(
    email: &str,
    password: &str,
    confirm_password: &str,
) -> FormValidation {
    let mut validation = validate_login_form(email, password);
    validation.check(
        passwords_match(password, confirm_password),
        FormField::ConfirmPassword,
        MSG_PASSWORDS_DIFFER,
    );
    validation
}
