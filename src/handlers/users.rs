//! Signup, login and logout.

use axum::Extension;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};

use super::{AppState, IsAuthenticated, template_data};
use crate::decode::PostForm;
use crate::error::{AppError, ModelError};
use crate::forms::{BAD_CREDENTIALS, EMAIL_IN_USE, UserLoginForm, UserSignupForm};
use crate::session::Session;
use crate::templates::{LoginPage, SignupPage, render};

pub const SIGNUP_FLASH: &str = "Your signup was successful. Please log in.";
pub const LOGOUT_FLASH: &str = "You've been logged out successfully!";

pub async fn signup(
    Extension(session): Extension<Session>,
    Extension(auth): Extension<IsAuthenticated>,
) -> Result<Response, AppError> {
    let page = SignupPage {
        data: template_data(&session, auth),
        form: UserSignupForm::default(),
    };
    render(StatusCode::OK, &page)
}

fn signup_again(
    session: &Session,
    auth: IsAuthenticated,
    mut form: UserSignupForm,
) -> Result<Response, AppError> {
    form.password.clear();
    let page = SignupPage {
        data: template_data(session, auth),
        form,
    };
    render(StatusCode::UNPROCESSABLE_ENTITY, &page)
}

pub async fn signup_post(
    State(app): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(auth): Extension<IsAuthenticated>,
    PostForm(mut form): PostForm<UserSignupForm>,
) -> Result<Response, AppError> {
    form.validate();
    if !form.validator.valid() {
        return signup_again(&session, auth, form);
    }

    match app.users.insert(&form.name, &form.email, &form.password).await {
        Ok(()) => {}
        Err(ModelError::DuplicateEmail) => {
            form.validator.add_field_error("email", EMAIL_IN_USE);
            return signup_again(&session, auth, form);
        }
        Err(e) => return Err(e.into()),
    }
    tracing::info!("user signed up");

    session.put_flash(SIGNUP_FLASH);
    Ok(Redirect::to("/user/login").into_response())
}

pub async fn login(
    Extension(session): Extension<Session>,
    Extension(auth): Extension<IsAuthenticated>,
) -> Result<Response, AppError> {
    let page = LoginPage {
        data: template_data(&session, auth),
        form: UserLoginForm::default(),
    };
    render(StatusCode::OK, &page)
}

fn login_again(
    session: &Session,
    auth: IsAuthenticated,
    mut form: UserLoginForm,
) -> Result<Response, AppError> {
    form.password.clear();
    let page = LoginPage {
        data: template_data(session, auth),
        form,
    };
    render(StatusCode::UNPROCESSABLE_ENTITY, &page)
}

pub async fn login_post(
    State(app): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(auth): Extension<IsAuthenticated>,
    PostForm(mut form): PostForm<UserLoginForm>,
) -> Result<Response, AppError> {
    form.validate();
    if !form.validator.valid() {
        return login_again(&session, auth, form);
    }

    let id = match app.users.authenticate(&form.email, &form.password).await {
        Ok(id) => id,
        Err(ModelError::InvalidCredentials) => {
            tracing::info!("login rejected");
            form.validator.add_non_field_error(BAD_CREDENTIALS);
            return login_again(&session, auth, form);
        }
        Err(e) => return Err(e.into()),
    };

    session.renew_token();
    session.put_authenticated_user_id(id);
    Ok(Redirect::to("/snippet/create").into_response())
}

pub async fn logout_post(Extension(session): Extension<Session>) -> Response {
    session.renew_token();
    session.remove_authenticated_user_id();
    session.put_flash(LOGOUT_FLASH);
    Redirect::to("/").into_response()
}
