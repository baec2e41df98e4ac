//! Built-in middlewares.
//!
//! - [`from_fn`]: write a middleware as `async |ctx, next| ...`
//! - [`throttle`]: per-chat fixed-window update limiter

mod throttle;

pub use throttle::{ThrottleOptions, throttle, throttle_with};

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::context::Context;
use crate::handler::{Handler, HandlerResult, Middleware};

/// The rest of the chain, handed to a [`from_fn`] middleware.
#[derive(Clone)]
pub struct Next {
    handler: Handler,
}

impl Next {
    /// Runs the remaining middlewares and the handler.
    pub fn run(self, ctx: Context) -> BoxFuture<'static, HandlerResult> {
        (self.handler)(ctx)
    }
}

impl std::fmt::Debug for Next {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next").finish_non_exhaustive()
    }
}

/// Builds a middleware from an async function of the context and the rest
/// of the chain. Not calling [`Next::run`] short-circuits the update.
///
/// ```
/// use maxbot_framework::middleware::from_fn;
///
/// let only_private = from_fn(|ctx, next| async move {
///     if ctx.chat_id().is_empty() {
///         return Ok(());
///     }
///     next.run(ctx).await
/// });
/// # drop(only_private);
/// ```
pub fn from_fn<F, Fut>(f: F) -> Middleware
where
    F: Fn(Context, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    let f = Arc::new(f);
    Arc::new(move |handler: Handler| -> Handler {
        let f = Arc::clone(&f);
        Arc::new(move |ctx: Context| {
            let next = Next {
                handler: Arc::clone(&handler),
            };
            f(ctx, next).boxed()
        })
    })
}
