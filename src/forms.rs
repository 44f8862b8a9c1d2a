//! Typed form submissions with their validation rules.

use serde::Deserialize;

use crate::validator::{
    EMAIL_RX, Validator, matches, max_chars, min_chars, not_blank, permitted_value,
};

pub const BLANK: &str = "This field cannot be blank";
pub const TITLE_TOO_LONG: &str = "This field cannot be more than 100 characters long";
pub const BAD_EXPIRES: &str = "This field must equal 1, 7 or 365";
pub const BAD_EMAIL: &str = "This field must be a valid email address";
pub const SHORT_PASSWORD: &str = "This field must be at least 8 characters long";
pub const EMAIL_IN_USE: &str = "Email address is already in use";
pub const BAD_CREDENTIALS: &str = "Email or password is incorrect";

/// Retention choices offered on the create page, in days.
pub const EXPIRY_CHOICES: [i32; 3] = [1, 7, 365];
pub const DEFAULT_EXPIRES: i32 = 365;
const MAX_TITLE_CHARS: usize = 100;
const MIN_PASSWORD_CHARS: usize = 8;

#[derive(Debug, Clone, Deserialize)]
pub struct SnippetCreateForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub expires: i32,
    #[serde(skip)]
    pub validator: Validator,
}

impl Default for SnippetCreateForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            expires: DEFAULT_EXPIRES,
            validator: Validator::new(),
        }
    }
}

impl SnippetCreateForm {
    pub fn validate(&mut self) {
        let v = &mut self.validator;
        v.check_field(not_blank(&self.title), "title", BLANK);
        v.check_field(max_chars(&self.title, MAX_TITLE_CHARS), "title", TITLE_TOO_LONG);
        v.check_field(not_blank(&self.content), "content", BLANK);
        v.check_field(
            permitted_value(self.expires, &EXPIRY_CHOICES),
            "expires",
            BAD_EXPIRES,
        );
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserSignupForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(skip)]
    pub validator: Validator,
}

impl UserSignupForm {
    pub fn validate(&mut self) {
        let v = &mut self.validator;
        v.check_field(not_blank(&self.name), "name", BLANK);
        v.check_field(not_blank(&self.email), "email", BLANK);
        v.check_field(matches(&self.email, &EMAIL_RX), "email", BAD_EMAIL);
        v.check_field(not_blank(&self.password), "password", BLANK);
        v.check_field(
            min_chars(&self.password, MIN_PASSWORD_CHARS),
            "password",
            SHORT_PASSWORD,
        );
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserLoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(skip)]
    pub validator: Validator,
}

impl UserLoginForm {
    pub fn validate(&mut self) {
        let v = &mut self.validator;
        v.check_field(not_blank(&self.email), "email", BLANK);
        v.check_field(matches(&self.email, &EMAIL_RX), "email", BAD_EMAIL);
        v.check_field(not_blank(&self.password), "password", BLANK);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snippet(title: &str, content: &str, expires: i32) -> SnippetCreateForm {
        SnippetCreateForm {
            title: title.into(),
            content: content.into(),
            expires,
            validator: Validator::new(),
        }
    }

    #[test]
    fn new_snippet_form_defaults_to_a_year() {
        let form = SnippetCreateForm::default();
        assert_eq!(form.expires, 365);
        assert!(form.validator.valid());
    }

    #[test]
    fn blank_title_reports_blank_only() {
        let mut form = snippet("", "ok", 7);
        form.validate();
        assert_eq!(form.validator.field_error("title"), Some(BLANK));
        assert_eq!(form.validator.field_errors().count(), 1);
    }

    #[test]
    fn title_length_boundary() {
        let mut form = snippet(&"a".repeat(100), "ok", 1);
        form.validate();
        assert!(form.validator.valid());

        let mut form = snippet(&"a".repeat(101), "ok", 1);
        form.validate();
        assert_eq!(form.validator.field_error("title"), Some(TITLE_TOO_LONG));
    }

    #[test]
    fn expires_must_be_a_listed_choice() {
        let mut form = snippet("A", "B", 3);
        form.validate();
        assert_eq!(form.validator.field_error("expires"), Some(BAD_EXPIRES));

        for days in EXPIRY_CHOICES {
            let mut form = snippet("A", "B", days);
            form.validate();
            assert!(form.validator.valid(), "{days} should be accepted");
        }
    }

    #[test]
    fn signup_blank_email_keeps_blank_message() {
        let mut form = UserSignupForm {
            name: "Alice".into(),
            email: "   ".into(),
            password: "correct horse".into(),
            ..Default::default()
        };
        form.validate();
        assert_eq!(form.validator.field_error("email"), Some(BLANK));
        assert_eq!(form.validator.field_errors().count(), 1);
    }

    #[test]
    fn signup_rules() {
        let mut form = UserSignupForm {
            name: "".into(),
            email: "not-an-email".into(),
            password: "short".into(),
            ..Default::default()
        };
        form.validate();
        assert_eq!(form.validator.field_error("name"), Some(BLANK));
        assert_eq!(form.validator.field_error("email"), Some(BAD_EMAIL));
        assert_eq!(form.validator.field_error("password"), Some(SHORT_PASSWORD));

        let mut form = UserSignupForm {
            name: "Alice".into(),
            email: "alice@example.com".into(),
            password: "pa55word".into(),
            ..Default::default()
        };
        form.validate();
        assert!(form.validator.valid());
    }

    #[test]
    fn login_rules() {
        let mut form = UserLoginForm::default();
        form.validate();
        assert_eq!(form.validator.field_error("email"), Some(BLANK));
        assert_eq!(form.validator.field_error("password"), Some(BLANK));

        let mut form = UserLoginForm {
            email: "alice@example.com".into(),
            password: "x".into(),
            ..Default::default()
        };
        form.validate();
        assert!(form.validator.valid());
    }
}
