//! Request handler module
//!
//! Responsible for request routing dispatch and the two message endpoints.

pub mod error;
pub mod form;
pub mod list;
pub mod message;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
