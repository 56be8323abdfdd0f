//! Utility modules

pub mod http;
pub mod logging;

pub use http::HttpClient;
pub use logging::{init_tracing, redact_address, redact_hash, redact_value};
