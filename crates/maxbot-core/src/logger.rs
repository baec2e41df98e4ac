//! Leveled logging capability.
//!
//! Bot runtimes depend on the [`Logger`] trait only. Which sink is used is
//! decided once, at construction: [`NopLogger`] discards everything and
//! [`TracingLogger`] forwards to `tracing`.
//!
//! ```rust,ignore
//! use maxbot_core::{Logger, TracingLogger};
//!
//! let logger: SharedLogger = Arc::new(TracingLogger);
//! logger.info(format_args!("listening on {addr}"));
//! ```

use std::fmt;
use std::sync::Arc;

/// Minimal leveled logging contract used by bot runtimes.
pub trait Logger: Send + Sync {
    fn debug(&self, args: fmt::Arguments<'_>);
    fn info(&self, args: fmt::Arguments<'_>);
    fn error(&self, args: fmt::Arguments<'_>);
}

/// Shared, type-erased logger.
pub type SharedLogger = Arc<dyn Logger>;

/// Discards all log lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct NopLogger;

impl Logger for NopLogger {
    fn debug(&self, _args: fmt::Arguments<'_>) {}
    fn info(&self, _args: fmt::Arguments<'_>) {}
    fn error(&self, _args: fmt::Arguments<'_>) {}
}

/// Forwards log lines to `tracing` under the `maxbot` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(target: "maxbot", "{args}");
    }

    fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(target: "maxbot", "{args}");
    }

    fn error(&self, args: fmt::Arguments<'_>) {
        tracing::error!(target: "maxbot", "{args}");
    }
}

/// Returns the default logger, which discards everything.
pub fn nop() -> SharedLogger {
    Arc::new(NopLogger)
}
