//! # Core Runtime Module
//!
//! Foundational infrastructure shared by the explore crates:
//! - Logging and tracing setup with optional host sink forwarding
//! - Configuration (API endpoints, credentials, discovery tuning)
//! - Event bus for explore progress and session notifications
//!
//! ## Overview
//!
//! Nothing in here knows about discovery itself. `core-explore` builds its
//! controller from an [`ExploreConfig`](config::ExploreConfig) and reports
//! through the [`EventBus`](events::EventBus).

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
