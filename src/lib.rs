//! Prompt Relay - streams Gemini completions back as plain text
//!
//! A single-endpoint proxy: a client POSTs `{"prompt": "..."}`, the relay
//! calls the Gemini `streamGenerateContent` API and forwards each generated
//! text fragment as soon as it is parsed out of the upstream's streamed JSON
//! array.
//!
//! # Architecture
//!
//! - [`core`]: configuration, errors, logging context, metrics, middleware
//! - [`api`]: HTTP handlers, upstream client helpers and plain-text streaming
//! - [`transformer`]: Gemini wire types and incremental stream decoding
//!
//! # Configuration
//!
//! - `GEMINI_API_KEY`: upstream API key (requests fail with 500 without it)
//!
//! Optional environment variables:
//! - `GEMINI_API_BASE`: upstream base URL (default: https://generativelanguage.googleapis.com)
//! - `GEMINI_MODEL`: model name (default: gemini-1.5-flash)
//! - `HOST`: Server bind address (default: 0.0.0.0)
//! - `PORT`: Server port (default: 18000)
//! - `VERIFY_SSL`: Verify SSL certificates for upstream (default: true)
//! - `REQUEST_TIMEOUT_SECS`: Upstream request timeout in seconds (default: 300)
//! - `CONNECT_TIMEOUT_SECS`: Upstream connect timeout in seconds (default: 10)
//! - `STREAM_EXTRACTION_MODE`: `incremental` (default) or `per_chunk`

pub mod api;
pub mod core;
pub mod transformer;

// Re-export commonly used types for convenience
pub use api::{create_router, AppState};
pub use core::{AppConfig, AppError, Result};
pub use transformer::ExtractionMode;
