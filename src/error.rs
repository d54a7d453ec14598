//! Error handling for the navigation engine
//!
//! This module defines the error taxonomy and a Result alias for use
//! throughout the crate.
//!
//! - [`NavError::InvalidChannel`] / [`NavError::InvalidIndex`] are contract
//!   violations by an internal collaborator and should be surfaced as-is.
//! - [`NavError::OutOfRange`] is user input outside the loaded capture; the
//!   rejected operation leaves all state unchanged.

use crate::types::SampleRange;
use thiserror::Error;

/// Main error type for navigation operations
#[derive(Error, Debug)]
pub enum NavError {
    /// Annotation channel outside the configured channel domain
    #[error("Invalid channel {channel}, should be between 0 and {max}")]
    InvalidChannel { channel: usize, max: usize },

    /// Cursor index outside `[0, MAX_CURSORS)`
    #[error("Invalid cursor index {index}, should be between 0 and {max}")]
    InvalidIndex { index: usize, max: usize },

    /// Timestamp or sample value outside the valid capture range
    #[error("Value {value} is outside the valid range {range}")]
    OutOfRange { value: i64, range: SampleRange },

    /// Operation requires a loaded capture
    #[error("No capture loaded")]
    NoCapture,

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<NavError>,
    },
}

impl NavError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        NavError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Whether this error is a rejected user value rather than a programming error
    pub fn is_user_error(&self) -> bool {
        match self {
            NavError::OutOfRange { .. } | NavError::NoCapture => true,
            NavError::WithContext { source, .. } => source.is_user_error(),
            _ => false,
        }
    }
}

/// Result type alias for navigation operations
pub type Result<T> = std::result::Result<T, NavError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
