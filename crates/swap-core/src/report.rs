//! Shared error-reporting collaborator
//!
//! Read paths that fail-safe to a neutral value still surface the fault
//! out-of-band through an [`ErrorReporter`].

use crate::Error;

pub trait ErrorReporter: Send + Sync {
    /// Report a fault; `context` names the operation that failed
    fn report(&self, context: &str, error: &Error);
}

/// Reports faults as `tracing` errors
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, context: &str, error: &Error) {
        tracing::error!(context, code = error.error_code(), "{}", error);
    }
}
