//! chatrelay Gateway HTTP API Server
//!
//! Streams chat replies over SSE, accepts attachment uploads, and serves the
//! local media store.

pub mod chat_sse;
pub mod error;
pub mod health_api;
pub mod server;
pub mod upload;

pub use error::ApiError;
pub use server::{GatewayState, router, start_server};
