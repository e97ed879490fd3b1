//! Common test utilities: tracing setup for integration tests.
//!
//! # Usage
//!
//! ```rust,ignore
//! mod common;
//!
//! #[test]
//! fn my_test() {
//!     common::init_tracing();
//!     // ... test body
//! }
//! ```
//!
//! Environment variables:
//! - `RUST_LOG`: filter directives (e.g. `smtree=debug`)
//! - `SMTREE_LOG_JSON`: set to `1` to emit JSON instead of compact lines

#![allow(dead_code)]

use std::env;
use std::sync::Once;

use tracing_subscriber::EnvFilter;

/// Ensures tracing is only initialized once across all tests.
static INIT: Once = Once::new();

/// Initialize the tracing subscriber for a test binary.
///
/// Safe to call multiple times - only the first call takes effect.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_thread_ids(true)
            .with_test_writer();

        let result = if env::var("SMTREE_LOG_JSON").is_ok_and(|v| v == "1") {
            builder.json().try_init()
        } else {
            builder.compact().try_init()
        };
        // Another harness may already have installed a subscriber.
        let _ = result;
    });
}
