//! # Host Bridge Traits
//!
//! Platform abstraction traits that the explore core consumes but does not
//! implement itself.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP requests used by every
//!   external metadata client (MusicBrainz, ListenBrainz, Last.fm)
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ Available |
//! | iOS      | TBD                 | 📋 Planned |
//! | Android  | TBD                 | 📋 Planned |
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform-specific failures into it and keep the message
//! actionable (URL, status, timeout).
//!
//! ## Thread Safety
//!
//! Every trait requires `Send + Sync` so implementations can be shared across
//! the tasks that drive the rate-limited request queues.

pub mod error;
pub mod http;
pub mod logging;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
