//! Core types shared across the Wellspring services backend.

pub mod email;
pub mod params;
pub mod time;

pub use email::{EmailAddress, EmailError};
pub use params::ServiceParams;
pub use time::Timestamp;
