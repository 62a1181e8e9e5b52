//! Console providers backed by the standard streams and by `tracing`.

use super::{ConsoleLevel, ConsoleProvider};

/// Console provider using std print macros.
///
/// Writes to stdout for Info/Debug and stderr for Warn/Error.
pub struct StdConsoleProvider;

impl StdConsoleProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StdConsoleProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleProvider for StdConsoleProvider {
    fn write(&self, level: ConsoleLevel, message: &str) {
        match level {
            ConsoleLevel::Info | ConsoleLevel::Debug => {
                println!("{message}");
            }
            ConsoleLevel::Warn | ConsoleLevel::Error => {
                eprintln!("{message}");
            }
        }
    }
}

/// Console provider emitting `tracing` events under the `metahooks::console`
/// target. This is the runtime default.
#[derive(Default)]
pub struct TracingConsoleProvider;

impl ConsoleProvider for TracingConsoleProvider {
    fn write(&self, level: ConsoleLevel, message: &str) {
        match level {
            ConsoleLevel::Info => tracing::info!(target: "metahooks::console", "{message}"),
            ConsoleLevel::Debug => tracing::debug!(target: "metahooks::console", "{message}"),
            ConsoleLevel::Warn => tracing::warn!(target: "metahooks::console", "{message}"),
            ConsoleLevel::Error => tracing::error!(target: "metahooks::console", "{message}"),
        }
    }
}
