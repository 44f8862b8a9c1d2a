//! Binding urlencoded form submissions onto typed forms.

use std::collections::HashSet;

use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;

use crate::error::{AppError, DecodeError};

/// Decode an `application/x-www-form-urlencoded` body into `T`.
///
/// Keys may repeat; the first value for each key is used. Keys that `T`
/// does not declare are ignored. Fields without a key, or whose value is
/// empty, keep their default.
pub fn decode_form<T: DeserializeOwned>(body: &[u8]) -> Result<T, DecodeError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)?;
    let mut seen = HashSet::new();
    let first: Vec<(String, String)> = pairs
        .into_iter()
        .filter(|(k, _)| seen.insert(k.clone()))
        .filter(|(_, v)| !v.is_empty())
        .collect();
    let normalized = serde_urlencoded::to_string(&first)?;
    Ok(serde_urlencoded::from_str(&normalized)?)
}

/// Extractor for POSTed forms, decoded with [`decode_form`].
pub struct PostForm<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for PostForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let is_form = content_type
            .split(';')
            .next()
            .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/x-www-form-urlencoded"));
        if !is_form {
            return Err(DecodeError::ContentType(content_type).into());
        }

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| DecodeError::Body(e.body_text()))?;
        Ok(PostForm(decode_form(&body)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::{SnippetCreateForm, UserSignupForm};

    #[test]
    fn decodes_typed_fields() {
        let form: SnippetCreateForm =
            decode_form(b"title=O+snail&content=Climb%0AMount+Fuji&expires=7").unwrap();
        assert_eq!(form.title, "O snail");
        assert_eq!(form.content, "Climb\nMount Fuji");
        assert_eq!(form.expires, 7);
        assert!(form.validator.valid());
    }

    #[test]
    fn first_value_wins_for_repeated_keys() {
        let form: SnippetCreateForm =
            decode_form(b"title=first&title=second&expires=1&expires=365").unwrap();
        assert_eq!(form.title, "first");
        assert_eq!(form.expires, 1);
    }

    #[test]
    fn missing_keys_leave_zero_values() {
        let form: UserSignupForm = decode_form(b"email=a%40b.c").unwrap();
        assert_eq!(form.email, "a@b.c");
        assert_eq!(form.name, "");
        assert_eq!(form.password, "");
    }

    #[test]
    fn skipped_fields_ignore_input() {
        let form: SnippetCreateForm = decode_form(b"title=t&validator=junk").unwrap();
        assert!(form.validator.valid());
    }

    #[test]
    fn empty_values_keep_defaults() {
        let form: SnippetCreateForm = decode_form(b"title=t&content=&expires=").unwrap();
        assert_eq!(form.title, "t");
        assert_eq!(form.content, "");
        assert_eq!(form.expires, 0);

        let form: SnippetCreateForm = decode_form(b"expires=&expires=7").unwrap();
        assert_eq!(form.expires, 0);
    }

    #[test]
    fn non_numeric_integer_field_fails() {
        let err = decode_form::<SnippetCreateForm>(b"title=t&content=c&expires=abc").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }
}
