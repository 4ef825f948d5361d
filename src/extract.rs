//! Request body binding for JSON and urlencoded form submissions.

use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        FromRequest, Request,
    },
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::de::DeserializeOwned;

/// Body extractor that accepts `application/x-www-form-urlencoded` as well
/// as JSON. Any other content type is handed to the JSON extractor, which
/// produces the rejection.
#[derive(Debug, Clone, Default)]
pub struct Bind<T>(pub T);

#[derive(Debug, thiserror::Error)]
pub enum BindError {
    #[error(transparent)]
    Json(#[from] JsonRejection),

    #[error(transparent)]
    Form(#[from] FormRejection),
}

impl BindError {
    /// Client-facing description of why the body was rejected.
    pub fn body_text(&self) -> String {
        match self {
            BindError::Json(rejection) => rejection.body_text(),
            BindError::Form(rejection) => rejection.body_text(),
        }
    }
}

impl IntoResponse for BindError {
    fn into_response(self) -> Response {
        match self {
            BindError::Json(rejection) => rejection.into_response(),
            BindError::Form(rejection) => rejection.into_response(),
        }
    }
}

impl<S, T> FromRequest<S> for Bind<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = BindError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_form(&req) {
            let Form(value) = Form::<T>::from_request(req, state).await?;
            Ok(Bind(value))
        } else {
            let Json(value) = Json::<T>::from_request(req, state).await?;
            Ok(Bind(value))
        }
    }
}

fn is_form(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| {
            mime.trim()
                .eq_ignore_ascii_case("application/x-www-form-urlencoded")
        })
}
