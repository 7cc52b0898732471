//! Remote fetch policies.
//!
//! Both policies are built once at startup and never change afterwards.

pub mod context;
pub mod fetch;

pub use context::ContextFetchPolicy;
pub use fetch::{AllowPattern, FetchPolicy};
