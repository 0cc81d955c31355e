//! Workspace façade crate.
//!
//! Re-exports the explore discovery core together with the runtime and bridge
//! crates it is wired through, so host applications can depend on
//! `explore-workspace` alone and toggle the documented features
//! (`desktop-shims` pulls in the reqwest-backed `HttpClient`).

pub use bridge_traits;
pub use core_explore;
pub use core_runtime;
