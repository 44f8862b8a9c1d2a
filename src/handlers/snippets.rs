//! Snippet pages: home, view and create.

use axum::Extension;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};

use super::{AppState, IsAuthenticated, template_data};
use crate::decode::PostForm;
use crate::error::AppError;
use crate::forms::SnippetCreateForm;
use crate::session::Session;
use crate::templates::{CreatePage, HomePage, ViewPage, render};

pub const CREATED_FLASH: &str = "Snippet successfully created!";

pub async fn home(
    State(app): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(auth): Extension<IsAuthenticated>,
) -> Result<Response, AppError> {
    let snippets = app.snippets.latest().await?;
    let page = HomePage {
        data: template_data(&session, auth),
        snippets,
    };
    render(StatusCode::OK, &page)
}

pub async fn view(
    State(app): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(auth): Extension<IsAuthenticated>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = match id.parse::<i64>() {
        Ok(id) if id >= 1 => id,
        _ => return Err(AppError::NotFound),
    };
    let snippet = app.snippets.get(id).await?;
    let page = ViewPage {
        data: template_data(&session, auth),
        snippet,
    };
    render(StatusCode::OK, &page)
}

pub async fn create(
    Extension(session): Extension<Session>,
    Extension(auth): Extension<IsAuthenticated>,
) -> Result<Response, AppError> {
    let page = CreatePage {
        data: template_data(&session, auth),
        form: SnippetCreateForm::default(),
    };
    render(StatusCode::OK, &page)
}

pub async fn create_post(
    State(app): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(auth): Extension<IsAuthenticated>,
    PostForm(mut form): PostForm<SnippetCreateForm>,
) -> Result<Response, AppError> {
    form.validate();
    if !form.validator.valid() {
        let page = CreatePage {
            data: template_data(&session, auth),
            form,
        };
        return render(StatusCode::UNPROCESSABLE_ENTITY, &page);
    }

    let id = app
        .snippets
        .insert(&form.title, &form.content, form.expires)
        .await?;
    tracing::info!(id, "snippet created");

    session.put_flash(CREATED_FLASH);
    Ok(Redirect::to(&format!("/snippet/view/{id}")).into_response())
}
