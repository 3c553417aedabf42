//! URL-encoded form and query parsing
//!
//! Submission forms are parsed strictly (bad escapes and `;` separators are
//! errors), while the listing query only drops the malformed pairs.

use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderMap, CONTENT_TYPE};
use hyper::http::request::Parts;
use std::fmt;
use url::form_urlencoded;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

#[derive(Debug)]
pub enum FormError {
    /// `%` not followed by two hex digits
    InvalidEscape { offset: usize },
    /// `;` used as a pair separator
    Semicolon,
    TooLarge { limit: usize },
    Body(String),
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEscape { offset } => write!(f, "invalid percent escape at byte {offset}"),
            Self::Semicolon => write!(f, "invalid semicolon separator"),
            Self::TooLarge { limit } => write!(f, "form body larger than {limit} bytes"),
            Self::Body(e) => write!(f, "failed to read body: {e}"),
        }
    }
}

impl std::error::Error for FormError {}

/// Decoded form pairs; body values shadow query values with the same key
#[derive(Debug, Default)]
pub struct FormValues {
    body: Vec<(String, String)>,
    query: Vec<(String, String)>,
}

impl FormValues {
    /// First value for `key`, or `""` when absent
    pub fn get(&self, key: &str) -> &str {
        first_value(&self.body, key)
            .or_else(|| first_value(&self.query, key))
            .unwrap_or("")
    }
}

fn first_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Parse the query string and, for URL-encoded requests, the body
pub async fn parse_form<B>(parts: &Parts, body: B, limit: usize) -> Result<FormValues, FormError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let body = if is_urlencoded(&parts.headers) {
        let bytes = read_body(body, limit).await?;
        parse_urlencoded(&bytes)?
    } else {
        Vec::new()
    };
    let query = parse_urlencoded(parts.uri.query().unwrap_or_default().as_bytes())?;

    Ok(FormValues { body, query })
}

async fn read_body<B>(body: B, limit: usize) -> Result<Bytes, FormError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    Limited::new(body, limit)
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                FormError::TooLarge { limit }
            } else {
                FormError::Body(e.to_string())
            }
        })
}

fn is_urlencoded(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_URLENCODED))
}

/// Strictly decode `application/x-www-form-urlencoded` data
pub fn parse_urlencoded(input: &[u8]) -> Result<Vec<(String, String)>, FormError> {
    validate(input)?;
    Ok(form_urlencoded::parse(input).into_owned().collect())
}

fn validate(input: &[u8]) -> Result<(), FormError> {
    let mut i = 0;
    while i < input.len() {
        match input[i] {
            b';' => return Err(FormError::Semicolon),
            b'%' => {
                let escaped = input
                    .get(i + 1..i + 3)
                    .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
                if !escaped {
                    return Err(FormError::InvalidEscape { offset: i });
                }
                i += 3;
            }
            _ => i += 1,
        }
    }
    Ok(())
}

/// First value of `key` in a query string, skipping malformed pairs
///
/// A pair with a bad escape or a `;` is dropped on its own; the rest of the
/// query still counts.
pub fn query_value(query: Option<&str>, key: &str) -> Option<String> {
    query?
        .split('&')
        .filter(|pair| validate(pair.as_bytes()).is_ok())
        .flat_map(|pair| form_urlencoded::parse(pair.as_bytes()))
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}
