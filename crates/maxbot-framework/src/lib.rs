//! # maxbot framework
//!
//! Routes incoming updates to user handlers:
//!
//! - [`Router`]: command, text and callback handler registry
//! - [`Handler`] / [`Middleware`]: shared async functions and the wrappers
//!   composed around them
//! - [`Context`]: the update plus the client and cancellation token, with
//!   reply helpers
//! - [`middleware`]: `from_fn` and `throttle`
//! - [`command`]: slash-command extraction and parsing
//!
//! At most one handler runs per update; see [`router`] for the selection
//! rules.

pub mod command;
pub mod context;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod router;

pub use command::{ParsedCommand, extract_command, parse_command};
pub use context::Context;
pub use error::{FrameworkError, FrameworkResult};
pub use handler::{
    Handler, HandlerError, HandlerResult, Middleware, chain, handler_fn, middleware_fn,
};
pub use middleware::{Next, ThrottleOptions, from_fn, throttle, throttle_with};
pub use router::Router;
