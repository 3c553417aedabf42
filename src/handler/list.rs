//! Message listing handler (`/list`)

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response, StatusCode};

use super::error::HandlerError;
use super::form;
use crate::http;
use crate::model::MessageList;

const ALLOW: &str = "GET, OPTIONS";

/// List messages in a category.
///
/// Nothing is stored, so a valid request always gets an empty list; `cate`
/// is required but never consulted beyond that.
pub fn handle_list<B>(req: &Request<B>) -> Result<Response<Full<Bytes>>, HandlerError> {
    match *req.method() {
        Method::OPTIONS => return Ok(http::build_empty_response(StatusCode::OK)),
        Method::GET => {}
        _ => return Err(HandlerError::MethodNotAllowed { allow: ALLOW }),
    }

    let cate = form::query_value(req.uri().query(), "cate").unwrap_or_default();
    if cate.is_empty() {
        return Err(HandlerError::BadRequest("Missing cate parameter"));
    }

    Ok(http::build_json_response(
        StatusCode::OK,
        &MessageList::default(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::test_support::{body_string, form_request};

    #[tokio::test]
    async fn test_list_is_empty_for_any_category() {
        for uri in ["/list?cate=general", "/list?cate=%E6%96%B0%E9%97%BB", "/list?x=1&cate=a+b"] {
            let req = form_request(Method::GET, uri, "");
            let resp = handle_list(&req).unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
            assert_eq!(resp.headers()["content-type"], "application/json");

            let value: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
            assert_eq!(value, serde_json::json!({ "Msgs": [] }), "{uri}");
        }
    }

    #[test]
    fn test_missing_or_empty_cate() {
        for uri in ["/list", "/list?cate=", "/list?other=x"] {
            let req = form_request(Method::GET, uri, "");
            assert_eq!(
                handle_list(&req).unwrap_err(),
                HandlerError::BadRequest("Missing cate parameter"),
                "{uri}"
            );
        }
    }

    #[test]
    fn test_wrong_methods() {
        for method in [Method::POST, Method::PUT, Method::DELETE] {
            let req = form_request(method, "/list?cate=general", "");
            assert_eq!(
                handle_list(&req).unwrap_err(),
                HandlerError::MethodNotAllowed { allow: ALLOW }
            );
        }
    }

    #[test]
    fn test_options_skips_validation() {
        let req = form_request(Method::OPTIONS, "/list", "");
        let resp = handle_list(&req).unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
