//! Web server module for the liveness endpoint.
//!
//! The server only answers `/health`; all real work happens in the
//! consumer running alongside it.

pub mod health;

pub use health::{health, router};
