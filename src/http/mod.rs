//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → request.rs (request ID, span, metrics)
//!     → server.rs (timeout, body limit)
//!     → controller routes
//!     → response (x-request-id echoed)
//! ```

pub mod request;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::HttpServer;
