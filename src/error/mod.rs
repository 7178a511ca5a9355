//! The unified error handling system for the application.

use std::fmt::Display;

// 1. Core Types
pub use cache::{CacheError, CacheResult};
pub use types::BackendError;

/// A unified `Result` type for the entire application.
///
/// All functions that can fail should return this type.
pub type Result<T> = std::result::Result<T, BackendError>;

// 2. Module declarations
pub mod cache;
pub mod types;

// 3. Context Trait for adding context to errors.
pub trait Context<T, E> {
    #[track_caller]
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display;

    #[track_caller]
    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display;
}

impl<T, E> Context<T, E> for std::result::Result<T, E>
where
    E: Into<BackendError>,
{
    #[track_caller]
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display,
    {
        self.with_context(|| context)
    }

    #[track_caller]
    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display,
    {
        match self {
            Ok(value) => Ok(value),
            Err(error) => {
                let context_message = context().to_string();
                Err(BackendError::Context {
                    context: context_message,
                    source: Box::new(error.into()),
                })
            }
        }
    }
}

/// Helper to attach context to an error without intermediate boilerplate.
#[track_caller]
pub fn context_error<T>(err: impl Into<BackendError>, context: impl Display) -> Result<T> {
    Err(err.into()).context(context)
}
