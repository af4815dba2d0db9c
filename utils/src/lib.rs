//! Shared utilities for the Wellspring services backend.

pub mod logging;

pub use logging::init_tracing;
