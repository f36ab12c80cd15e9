//! Core types and survey-engine logic for Ideate.
//!
//! This crate is deliberately free of HTTP and database dependencies;
//! every other crate in the workspace depends on it.

pub mod corpus;
pub mod error;
pub mod machine;
pub mod sampler;
pub mod session;
pub mod source;
pub mod store;
pub mod submission;

pub use error::{Error, Result};
