//! HTTP protocol layer module
//!
//! Response builders and the CORS annotator, decoupled from the message handlers.

pub mod cors;
pub mod response;

// Re-export commonly used items
pub use cors::apply_cors_headers;
pub use response::{
    build_empty_response, build_error_response, build_json_response, build_text_response,
};
