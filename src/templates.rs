//! Page templates, compiled into the binary.
//!
//! Every page extends `base.html`, which pulls in the nav partial and
//! shows the flash message. Pages are rendered into a `String` before any
//! byte is written, so a render error becomes a clean 500.

use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use chrono::{DateTime, Datelike, Utc};

use crate::error::AppError;
use crate::forms::{SnippetCreateForm, UserLoginForm, UserSignupForm};
use crate::models::Snippet;

/// Dynamic data shared by every page.
#[derive(Debug, Clone, Default)]
pub struct TemplateData {
    pub current_year: i32,
    pub flash: Option<String>,
    pub is_authenticated: bool,
}

impl TemplateData {
    pub fn new(flash: Option<String>, is_authenticated: bool) -> Self {
        Self {
            current_year: Utc::now().year(),
            flash,
            is_authenticated,
        }
    }
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomePage {
    pub data: TemplateData,
    pub snippets: Vec<Snippet>,
}

#[derive(Template)]
#[template(path = "view.html")]
pub struct ViewPage {
    pub data: TemplateData,
    pub snippet: Snippet,
}

#[derive(Template)]
#[template(path = "create.html")]
pub struct CreatePage {
    pub data: TemplateData,
    pub form: SnippetCreateForm,
}

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupPage {
    pub data: TemplateData,
    pub form: UserSignupForm,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub data: TemplateData,
    pub form: UserLoginForm,
}

/// Render `page` and send it with `status`.
pub fn render<T: Template>(status: StatusCode, page: &T) -> Result<Response, AppError> {
    let body = page.render()?;
    Ok((status, Html(body)).into_response())
}

mod filters {
    use std::borrow::Borrow;

    use chrono::{DateTime, Utc};

    pub fn human_date<T: Borrow<DateTime<Utc>>>(t: T) -> askama::Result<String> {
        Ok(super::human_date(t.borrow()))
    }
}

/// `02 Jan 2006 at 15:04`, in UTC.
pub fn human_date(t: &DateTime<Utc>) -> String {
    t.format("%d %b %Y at %H:%M").to_string()
}
