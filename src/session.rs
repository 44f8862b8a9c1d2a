//! Cookie-backed session state management
//!
//! Session data lives in an in-process [`SessionStore`]; the client only
//! holds an opaque random token in the `session` cookie. The
//! [`load_and_save`] middleware loads the session before a handler runs
//! and commits it, writing `Set-Cookie`, after the handler returns.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand_core::{OsRng, RngCore};

pub const COOKIE_NAME: &str = "session";

/// Values carried across requests for one client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionData {
    flash: Option<String>,
    authenticated_user_id: Option<i64>,
}

#[derive(Debug)]
struct StoredSession {
    data: SessionData,
    deadline: DateTime<Utc>,
}

/// Shared server-side session storage.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, StoredSession>>,
    lifetime: Duration,
    secure: bool,
}

impl SessionStore {
    pub fn new(lifetime: Duration, secure: bool) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            lifetime,
            secure,
        }
    }

    /// Fetch the data for `token` unless it has expired.
    pub fn find(&self, token: &str) -> Option<SessionData> {
        let entry = self.sessions.get(token)?;
        if entry.deadline <= Utc::now() {
            drop(entry);
            self.sessions.remove(token);
            return None;
        }
        Some(entry.data.clone())
    }

    /// Store `data` under `token`, resetting its deadline.
    pub fn commit(&self, token: &str, data: SessionData) {
        self.sessions.insert(
            token.to_string(),
            StoredSession {
                data,
                deadline: Utc::now() + self.lifetime,
            },
        );
    }

    pub fn delete(&self, token: &str) {
        self.sessions.remove(token);
    }

    /// Drop every expired session and return how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.deadline > now);
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn cookie(&self, token: &str) -> String {
        let mut cookie = format!(
            "{COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.lifetime.num_seconds()
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// 32 random bytes, base64url encoded.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[derive(Debug, Default)]
struct SessionState {
    token: Option<String>,
    data: SessionData,
    modified: bool,
    renew: bool,
}

/// Per-request handle to the client's session.
#[derive(Clone)]
pub struct Session {
    store: SessionStore,
    state: Arc<Mutex<SessionState>>,
}

impl Session {
    /// Load the session named by `token`, or start an empty one.
    pub fn load(store: &SessionStore, token: Option<&str>) -> Self {
        let found = token.and_then(|t| store.find(t).map(|data| (t.to_string(), data)));
        let state = match found {
            Some((token, data)) => SessionState {
                token: Some(token),
                data,
                ..Default::default()
            },
            None => SessionState::default(),
        };
        Self {
            store: store.clone(),
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn put_flash(&self, message: &str) {
        let mut state = self.state();
        state.data.flash = Some(message.to_string());
        state.modified = true;
    }

    /// Take the flash message; it is shown exactly once.
    pub fn pop_flash(&self) -> Option<String> {
        let mut state = self.state();
        let flash = state.data.flash.take();
        if flash.is_some() {
            state.modified = true;
        }
        flash
    }

    pub fn authenticated_user_id(&self) -> Option<i64> {
        self.state().data.authenticated_user_id
    }

    pub fn put_authenticated_user_id(&self, id: i64) {
        let mut state = self.state();
        state.data.authenticated_user_id = Some(id);
        state.modified = true;
    }

    pub fn remove_authenticated_user_id(&self) {
        let mut state = self.state();
        state.data.authenticated_user_id = None;
        state.modified = true;
    }

    /// Issue a new token on commit and discard the old one.
    pub fn renew_token(&self) {
        let mut state = self.state();
        state.renew = true;
        state.modified = true;
    }

    /// Write modified data back to the store.
    /// Returns the `Set-Cookie` value when the client must be told.
    pub fn commit(&self) -> Option<String> {
        let mut state = self.state();
        if !state.modified {
            return None;
        }
        if state.renew {
            if let Some(old) = state.token.take() {
                self.store.delete(&old);
            }
            state.renew = false;
        }
        let token = state.token.get_or_insert_with(generate_token).clone();
        self.store.commit(&token, state.data.clone());
        state.modified = false;
        Some(self.store.cookie(&token))
    }
}

/// Value of the session cookie, if the request carries one.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == COOKIE_NAME)
        .map(|(_, value)| value.to_string())
}

/// Middleware: load the session, run the handler, save the session.
pub async fn load_and_save(
    State(store): State<SessionStore>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = session_token(req.headers());
    let session = Session::load(&store, token.as_deref());
    req.extensions_mut().insert(session.clone());

    let mut response = next.run(req).await;
    if let Some(cookie) = session.commit() {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => tracing::error!("invalid session cookie: {e}"),
        }
    }
    response
}
