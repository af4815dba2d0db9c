//! HTTP API for the Wellspring verification and account flows.

pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use server::{router, ApiServer, AppState};
