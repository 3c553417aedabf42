//! Request-level errors
//!
//! Every variant ends the request with a plain text response; nothing is retried.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use std::fmt;

use crate::http;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// Route exists but not for this method; `allow` lists what it accepts
    MethodNotAllowed { allow: &'static str },
    BadRequest(&'static str),
    NotFound,
}

impl HandlerError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }

    pub fn into_response(self) -> Response<Full<Bytes>> {
        let allow = match self {
            Self::MethodNotAllowed { allow } => Some(allow),
            _ => None,
        };
        http::build_error_response(self.status(), &self.to_string(), allow)
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MethodNotAllowed { .. } => write!(f, "Method not allowed"),
            Self::BadRequest(reason) => write!(f, "{reason}"),
            Self::NotFound => write!(f, "404 page not found"),
        }
    }
}

impl std::error::Error for HandlerError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            HandlerError::MethodNotAllowed { allow: "GET" }.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            HandlerError::BadRequest("nope").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(HandlerError::NotFound.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_into_response_sets_allow_only_for_405() {
        let resp = HandlerError::MethodNotAllowed { allow: "GET, OPTIONS" }.into_response();
        assert_eq!(resp.headers()["allow"], "GET, OPTIONS");

        let resp = HandlerError::BadRequest("Missing cate parameter").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(resp.headers().get("allow").is_none());
    }
}
