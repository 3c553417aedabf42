//! Message submission handler (`/msg`)

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::HeaderMap;
use hyper::{Method, Request, Response, StatusCode};
use std::net::SocketAddr;

use super::error::HandlerError;
use super::form;
use crate::http;
use crate::logger;
use crate::model::Message;

pub const SUCCESS_BODY: &str = "消息发送成功！";

const ALLOW: &str = "POST, OPTIONS";

/// Validate a submitted message, log it, and acknowledge it
pub async fn handle_submit<B>(
    req: Request<B>,
    peer_addr: SocketAddr,
    max_body_size: u64,
) -> Result<Response<Full<Bytes>>, HandlerError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match *req.method() {
        Method::OPTIONS => return Ok(http::build_empty_response(StatusCode::OK)),
        Method::POST => {}
        _ => return Err(HandlerError::MethodNotAllowed { allow: ALLOW }),
    }

    let (parts, body) = req.into_parts();
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let form = form::parse_form(&parts, body, limit)
        .await
        .map_err(|_| HandlerError::BadRequest("Failed to parse form"))?;

    let (user, msg, cate) = (form.get("user"), form.get("msg"), form.get("cate"));
    if user.is_empty() || msg.is_empty() || cate.is_empty() {
        return Err(HandlerError::BadRequest("Missing required fields"));
    }

    let message = Message::new(
        user.to_string(),
        msg.to_string(),
        cate.to_string(),
        client_ip(&parts.headers, peer_addr),
    );
    logger::log_message(&message);

    Ok(http::build_text_response(StatusCode::OK, SUCCESS_BODY))
}

/// `X-Forwarded-For` verbatim when present, otherwise the socket peer
pub fn client_ip(headers: &HeaderMap, peer_addr: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map_or_else(|| peer_addr.to_string(), ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::test_support::{body_string, form_request, peer};

    #[tokio::test]
    async fn test_valid_submission() {
        let req = form_request(Method::POST, "/msg", "user=alice&msg=hello&cate=general");
        let resp = handle_submit(req, peer(), 1024).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_string(resp).await, SUCCESS_BODY);
    }

    #[tokio::test]
    async fn test_each_field_required() {
        for body in [
            "msg=hello&cate=general",
            "user=alice&cate=general",
            "user=alice&msg=hello",
            "user=&msg=hello&cate=general",
            "",
        ] {
            let req = form_request(Method::POST, "/msg", body);
            let err = handle_submit(req, peer(), 1024).await.unwrap_err();
            assert_eq!(err, HandlerError::BadRequest("Missing required fields"), "{body}");
        }
    }

    #[tokio::test]
    async fn test_unparseable_form() {
        let req = form_request(Method::POST, "/msg", "user=%ZZ&msg=hello&cate=general");
        let err = handle_submit(req, peer(), 1024).await.unwrap_err();
        assert_eq!(err, HandlerError::BadRequest("Failed to parse form"));
    }

    #[tokio::test]
    async fn test_body_too_large_is_bad_request() {
        let req = form_request(Method::POST, "/msg", "user=alice&msg=hello&cate=general");
        let err = handle_submit(req, peer(), 4).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_fields_from_query_string() {
        let req = form_request(Method::POST, "/msg?user=alice&msg=hi&cate=news", "");
        let resp = handle_submit(req, peer(), 1024).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_wrong_methods() {
        for method in [Method::GET, Method::PUT, Method::DELETE, Method::HEAD] {
            let req = form_request(method.clone(), "/msg", "user=a&msg=b&cate=c");
            let err = handle_submit(req, peer(), 1024).await.unwrap_err();
            assert_eq!(err, HandlerError::MethodNotAllowed { allow: ALLOW }, "{method}");
        }
    }

    #[tokio::test]
    async fn test_options_is_empty_ok() {
        let req = form_request(Method::OPTIONS, "/msg", "");
        let resp = handle_submit(req, peer(), 1024).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_string(resp).await.is_empty());
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, peer()), "127.0.0.1:54321");

        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        assert_eq!(client_ip(&headers, peer()), "203.0.113.7, 10.0.0.1");

        headers.insert("x-forwarded-for", "".parse().unwrap());
        assert_eq!(client_ip(&headers, peer()), "127.0.0.1:54321");
    }
}
