// shared/src/lib.rs

use std::time::Duration;

/// Workspace-wide error type.
///
/// Clone is required: a single fetch outcome is fanned out to every
/// single-flight waiter for the same key.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid ttl: {0:?}")]
    InvalidTtl(Duration),
    #[error("upstream fetch failed: {0}")]
    Upstream(String),
    #[error("fetch cancelled before completion")]
    Cancelled,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

pub mod config;
