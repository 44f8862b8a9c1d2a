//! Router assembly.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::handlers::{AppState, snippets, users};
use crate::middleware::{authenticate, recover_panic, require_authentication, secure_headers};
use crate::session::load_and_save;

/// Options that shape the router but are not request state.
#[derive(Debug, Clone, Default)]
pub struct RouterOptions {
    pub static_dir: String,
    pub max_form_bytes: Option<u64>,
}

async fn not_found() -> AppError {
    AppError::NotFound
}

/// Build the application router.
///
/// Middleware, outermost first: panic recovery, request tracing, secure
/// headers; then for pages session load/save and authentication; then for
/// protected pages the login requirement.
pub fn router(state: AppState, opts: &RouterOptions) -> Router {
    let protected = Router::new()
        .route("/snippet/create", get(snippets::create).post(snippets::create_post))
        .route("/user/logout", post(users::logout_post))
        .route_layer(from_fn(require_authentication));

    let mut pages = Router::new()
        .route("/", get(snippets::home))
        .route("/snippet/view/:id", get(snippets::view))
        .route("/user/signup", get(users::signup).post(users::signup_post))
        .route("/user/login", get(users::login).post(users::login_post))
        .merge(protected)
        .fallback(not_found)
        .layer(from_fn_with_state(state.clone(), authenticate))
        .layer(from_fn_with_state(state.sessions.clone(), load_and_save));

    if let Some(limit) = opts.max_form_bytes {
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        pages = pages.layer(DefaultBodyLimit::max(limit));
    }

    Router::new()
        .nest_service("/static", ServeDir::new(&opts.static_dir))
        .merge(pages)
        .layer(from_fn(secure_headers))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(recover_panic))
        .with_state(state)
}
