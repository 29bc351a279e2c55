//! PhotoGuard Server - HTTP adapter for the moderation pipeline
//!
//! Exposes one classification endpoint plus a health check:
//!
//! - `POST /` with `{ "photo": "<base64>", "apiKey": "<key>" }`
//! - `GET /health`
//!
//! Business failures are reported in the response body's `status` field; the
//! HTTP status is 200 for every request that reaches the handler.

pub mod request;
pub mod response;
pub mod server;

pub use request::{parse_submission, ClassifyRequest};
pub use response::{ClassifyResponse, ErrorBody, ResponseStatus};
pub use server::{router, ModerationServer, ServerConfig};
