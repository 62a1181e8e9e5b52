//! Diagnostic output abstraction.
//!
//! Composition operations report non-fatal conditions (such as a mixed-in
//! module shadowing a member that already exists) through a `ConsoleProvider`.
//! Hosts pick where those messages go; the default routes them into `tracing`.

mod std_impl;

pub use std_impl::{StdConsoleProvider, TracingConsoleProvider};

/// Severity of a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    /// Informational messages
    Info,
    /// Debug detail
    Debug,
    /// Recoverable problems, e.g. member conflicts while mixing
    Warn,
    /// Errors
    Error,
}

/// Trait for handling diagnostic output.
pub trait ConsoleProvider {
    /// Write a message at the specified level.
    fn write(&self, level: ConsoleLevel, message: &str);
}

/// A console provider that discards all output.
pub struct NoOpConsoleProvider;

impl ConsoleProvider for NoOpConsoleProvider {
    fn write(&self, _level: ConsoleLevel, _message: &str) {
        // Discard output
    }
}
