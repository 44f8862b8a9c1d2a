//! HTTP request handlers.
//!
//! Handlers are grouped by resource. Each form handler follows the same
//! flow: decode the submission, validate it, re-render with errors (422)
//! when invalid, otherwise call the model and redirect (303).

pub mod snippets;
pub mod users;

use crate::models::{DynSnippets, DynUsers, Models};
use crate::session::{Session, SessionStore};
use crate::templates::TemplateData;

/// Dependencies shared by every handler, injected at startup.
#[derive(Clone)]
pub struct AppState {
    pub snippets: DynSnippets,
    pub users: DynUsers,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(models: Models, sessions: SessionStore) -> Self {
        Self {
            snippets: models.snippets,
            users: models.users,
            sessions,
        }
    }
}

/// Whether the request belongs to a logged-in, still existing user.
/// Set by the `authenticate` middleware.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IsAuthenticated(pub bool);

/// Page data for this request; pops the pending flash message.
pub fn template_data(session: &Session, auth: IsAuthenticated) -> TemplateData {
    TemplateData::new(session.pop_flash(), auth.0)
}
