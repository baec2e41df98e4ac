//! Handler and middleware types.
//!
//! A [`Handler`] is a shared async function of a [`Context`]. A
//! [`Middleware`] wraps one handler into another, so a chain of middlewares
//! composes like an onion around the terminal handler:
//!
//! ```text
//! [M0, M1, M2] around H  =>  M0(M1(M2(H)))
//! ```

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::context::Context;

/// Error returned by handlers and middlewares.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for handlers.
pub type HandlerResult = Result<(), HandlerError>;

/// A type-erased update handler.
pub type Handler = Arc<dyn Fn(Context) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// A function that wraps a handler with extra behaviour.
pub type Middleware = Arc<dyn Fn(Handler) -> Handler + Send + Sync>;

/// Erases an async function into a [`Handler`].
///
/// ```
/// use maxbot_framework::{Context, handler_fn};
///
/// let handler = handler_fn(|ctx: Context| async move {
///     ctx.reply("pong").await?;
///     Ok(())
/// });
/// # drop(handler);
/// ```
pub fn handler_fn<F, Fut>(f: F) -> Handler
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |ctx| f(ctx).boxed())
}

/// Erases a handler-wrapping function into a [`Middleware`].
pub fn middleware_fn<F>(f: F) -> Middleware
where
    F: Fn(Handler) -> Handler + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A handler that does nothing and succeeds.
pub fn noop() -> Handler {
    handler_fn(|_| async { Ok(()) })
}

/// Wraps `terminal` in `middlewares`, first registered outermost.
///
/// A missing terminal composes to [`noop`] without invoking any middleware.
pub fn chain(middlewares: &[Middleware], terminal: Option<Handler>) -> Handler {
    let Some(terminal) = terminal else {
        return noop();
    };
    middlewares
        .iter()
        .rev()
        .fold(terminal, |next, middleware| middleware(next))
}
