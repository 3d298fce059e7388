//! Foundation module - Shared domain primitives.
//!
//! Contains the error vocabulary shared by every port and adapter.

mod errors;

pub use errors::{DomainError, ErrorCode};
