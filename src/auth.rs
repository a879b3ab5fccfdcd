use crate::api::{ApiError, Credentials};
use crate::password::{self, Strength};

pub const REQUIRED_MESSAGE: &str = "Email and password are required.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum AuthMode {
    Login,
    Register,
}

impl AuthMode {
    /// Shown when the server gives no detail
    pub fn fallback_message(self) -> &'static str {
        match self {
            AuthMode::Login => "Login failed",
            AuthMode::Register => "Registration failed",
        }
    }

    pub fn other(self) -> Self {
        match self {
            AuthMode::Login => AuthMode::Register,
            AuthMode::Register => AuthMode::Login,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthField {
    #[default]
    Email,
    Password,
}

/// Email/password form shared by the login and register screens
#[derive(Debug, Clone, Default)]
pub struct AuthForm {
    pub email: String,
    pub password: String,
    pub focus: AuthField,
    pub show_password: bool,
    pub error: Option<String>,
    pub pending: bool,
}

impl AuthForm {
    pub fn push(&mut self, c: char) {
        match self.focus {
            AuthField::Email => self.email.push(c),
            AuthField::Password => self.password.push(c),
        }
    }

    pub fn pop(&mut self) {
        match self.focus {
            AuthField::Email => self.email.pop(),
            AuthField::Password => self.password.pop(),
        };
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            AuthField::Email => AuthField::Password,
            AuthField::Password => AuthField::Email,
        };
    }

    pub fn toggle_visibility(&mut self) {
        self.show_password = !self.show_password;
    }

    /// Password as it should appear on screen
    pub fn password_display(&self) -> String {
        if self.show_password {
            self.password.clone()
        } else {
            "•".repeat(self.password.chars().count())
        }
    }

    pub fn strength(&self) -> Strength {
        password::strength(&self.password)
    }

    /// Credentials to send, or None while a request is already out or a field is blank
    pub fn submit(&mut self) -> Option<Credentials> {
        if self.pending {
            return None;
        }
        if self.email.trim().is_empty() || self.password.is_empty() {
            self.error = Some(REQUIRED_MESSAGE.to_string());
            return None;
        }
        self.error = None;
        self.pending = true;
        Some(Credentials {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        })
    }

    pub fn fail(&mut self, mode: AuthMode, err: &ApiError) {
        self.pending = false;
        self.error = Some(err.user_message(mode.fallback_message()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> AuthForm {
        let mut form = AuthForm::default();
        "me@example.com".chars().for_each(|c| form.push(c));
        form.toggle_focus();
        "Secret1!".chars().for_each(|c| form.push(c));
        form
    }

    #[test]
    fn typing_goes_to_focused_field() {
        let mut form = filled();
        assert_eq!(form.email, "me@example.com");
        assert_eq!(form.password, "Secret1!");
        form.pop();
        assert_eq!(form.password, "Secret1");
    }

    #[test]
    fn password_is_masked_until_toggled() {
        let mut form = filled();
        assert_eq!(form.password_display(), "••••••••");
        form.toggle_visibility();
        assert_eq!(form.password_display(), "Secret1!");
    }

    #[test]
    fn blank_fields_are_rejected_locally() {
        let mut form = AuthForm::default();
        assert!(form.submit().is_none());
        assert_eq!(form.error.as_deref(), Some(REQUIRED_MESSAGE));
        assert!(!form.pending);
    }

    #[test]
    fn submit_is_single_flight() {
        let mut form = filled();
        let creds = form.submit().unwrap();
        assert_eq!(creds.email, "me@example.com");
        assert!(form.pending);
        assert!(form.submit().is_none());
    }

    #[test]
    fn failure_prefers_server_detail() {
        let mut form = filled();
        form.submit();
        form.fail(
            AuthMode::Login,
            &ApiError::Unauthorized {
                detail: Some("Invalid credentials".into()),
            },
        );
        assert!(!form.pending);
        assert_eq!(form.error.as_deref(), Some("Invalid credentials"));

        form.fail(AuthMode::Register, &ApiError::Transport("refused".into()));
        assert_eq!(form.error.as_deref(), Some("Registration failed"));
    }

    #[test]
    fn strength_follows_password() {
        assert_eq!(filled().strength().label, "Strong");
    }
}
