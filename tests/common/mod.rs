#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Request, Response};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use tower::ServiceExt;

use snippetbox::error::ModelError;
use snippetbox::handlers::AppState;
use snippetbox::models::{Models, Snippet, SnippetModel, UserModel};
use snippetbox::routes::{RouterOptions, router};
use snippetbox::session::{COOKIE_NAME, SessionStore};

pub const USER_EMAIL: &str = "alice@example.com";
pub const USER_PASSWORD: &str = "pa$$word";

/// Snippet store that hands out ids from 42 upwards.
pub struct MockSnippets {
    snippets: Mutex<Vec<Snippet>>,
    next_id: AtomicI64,
    pub fail: AtomicBool,
}

impl MockSnippets {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            snippets: Mutex::new(vec![Snippet {
                id: 1,
                title: "An old silent pond".into(),
                content: "An old silent pond...".into(),
                created: now,
                expires: now + Duration::days(7),
            }]),
            next_id: AtomicI64::new(42),
            fail: AtomicBool::new(false),
        }
    }

    pub fn latest_len(&self) -> usize {
        self.snippets.lock().unwrap().len()
    }

    fn check(&self) -> Result<(), ModelError> {
        fail_if(&self.fail)
    }
}

#[async_trait]
impl SnippetModel for MockSnippets {
    async fn insert(&self, title: &str, content: &str, expires: i32) -> Result<i64, ModelError> {
        self.check()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        self.snippets.lock().unwrap().push(Snippet {
            id,
            title: title.into(),
            content: content.into(),
            created: now,
            expires: now + Duration::days(i64::from(expires)),
        });
        Ok(id)
    }

    async fn get(&self, id: i64) -> Result<Snippet, ModelError> {
        self.check()?;
        self.snippets
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(ModelError::NoRecord)
    }

    async fn latest(&self) -> Result<Vec<Snippet>, ModelError> {
        self.check()?;
        let mut all = self.snippets.lock().unwrap().clone();
        all.reverse();
        Ok(all)
    }
}

/// User store with plaintext passwords; user 1 is pre-registered.
pub struct MockUsers {
    users: Mutex<Vec<(i64, String, String)>>,
    pub fail: AtomicBool,
}

impl MockUsers {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(vec![(1, USER_EMAIL.into(), USER_PASSWORD.into())]),
            fail: AtomicBool::new(false),
        }
    }
}

fn fail_if(fail: &AtomicBool) -> Result<(), ModelError> {
    if fail.load(Ordering::SeqCst) {
        Err(ModelError::Database(sqlx::Error::PoolClosed))
    } else {
        Ok(())
    }
}

#[async_trait]
impl UserModel for MockUsers {
    async fn insert(&self, _name: &str, email: &str, password: &str) -> Result<(), ModelError> {
        fail_if(&self.fail)?;
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|(_, e, _)| e == email) {
            return Err(ModelError::DuplicateEmail);
        }
        let id = users.len() as i64 + 1;
        users.push((id, email.into(), password.into()));
        Ok(())
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<i64, ModelError> {
        fail_if(&self.fail)?;
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|(_, e, p)| e == email && p == password)
            .map(|(id, _, _)| *id)
            .ok_or(ModelError::InvalidCredentials)
    }

    async fn exists(&self, id: i64) -> Result<bool, ModelError> {
        fail_if(&self.fail)?;
        Ok(self.users.lock().unwrap().iter().any(|(i, _, _)| *i == id))
    }
}

pub struct TestApp {
    pub router: Router,
    pub snippets: Arc<MockSnippets>,
    pub users: Arc<MockUsers>,
    pub sessions: SessionStore,
}

pub fn app() -> TestApp {
    app_with_options(RouterOptions {
        static_dir: "./ui/static".into(),
        max_form_bytes: None,
    })
}

pub fn app_with_options(opts: RouterOptions) -> TestApp {
    let snippets = Arc::new(MockSnippets::new());
    let users = Arc::new(MockUsers::new());
    let sessions = SessionStore::new(Duration::hours(12), false);
    let models = Models {
        snippets: snippets.clone(),
        users: users.clone(),
    };
    let state = AppState::new(models, sessions.clone());
    TestApp {
        router: router(state, &opts),
        snippets,
        users,
        sessions,
    }
}

impl TestApp {
    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut req = Request::get(uri);
        if let Some(c) = cookie {
            req = req.header(COOKIE, c);
        }
        self.router
            .clone()
            .oneshot(req.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    pub async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response<Body> {
        let mut req = Request::post(uri).header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(c) = cookie {
            req = req.header(COOKIE, c);
        }
        self.router
            .clone()
            .oneshot(req.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap()
    }

    pub async fn post_json(&self, uri: &str, body: &str) -> Response<Body> {
        let req = Request::post(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.router.clone().oneshot(req).await.unwrap()
    }

    /// Log in as the pre-registered user and return the `Cookie` header value.
    pub async fn login(&self) -> String {
        let body = format!("email={}&password={}", USER_EMAIL, "pa%24%24word");
        let res = self.post_form("/user/login", &body, None).await;
        assert_eq!(res.status(), 303);
        session_cookie(&res).expect("login sets a session cookie")
    }
}

/// `name=value` for the session cookie set by `res`, if any.
pub fn session_cookie(res: &Response<Body>) -> Option<String> {
    res.headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .find(|pair| pair.starts_with(&format!("{COOKIE_NAME}=")))
        .map(str::to_string)
}

pub fn location(res: &Response<Body>) -> &str {
    res.headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

pub async fn body_text(res: Response<Body>) -> String {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
