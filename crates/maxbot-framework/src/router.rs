//! Update routing.
//!
//! The [`Router`] selects at most one handler per update:
//!
//! 1. A message whose command is registered goes to that command handler
//! 2. Any other message goes to the text handler, if one is registered
//! 3. A callback query goes to the callback handler, if one is registered
//!
//! The selected handler runs wrapped in every registered middleware. An
//! update no handler accepts is ignored and dispatch succeeds.
//!
//! ```rust,ignore
//! let mut router = Router::new();
//! router
//!     .middleware(from_fn(|ctx, next| async move {
//!         tracing::info!(chat = %ctx.chat_id(), "update");
//!         next.run(ctx).await
//!     }))
//!     .on_command("start", |ctx| async move {
//!         ctx.reply("welcome").await?;
//!         Ok(())
//!     })
//!     .on_text(|ctx| async move {
//!         ctx.reply(ctx.message_text()).await?;
//!         Ok(())
//!     });
//! ```

use std::collections::HashMap;
use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use maxbot_core::Update;
use maxbot_transport::Client;

use crate::command::{extract_command, normalize_command};
use crate::context::Context;
use crate::handler::{Handler, HandlerResult, Middleware, chain, handler_fn};

/// Command, text and callback handler registry with a middleware chain.
///
/// Configure it before serving updates; dispatch only reads it, so a
/// configured router can be shared behind an `Arc`.
#[derive(Default, Clone)]
pub struct Router {
    commands: HashMap<String, Handler>,
    text: Option<Handler>,
    callback: Option<Handler>,
    middlewares: Vec<Middleware>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware; the first registered runs outermost.
    pub fn middleware(&mut self, middleware: Middleware) -> &mut Self {
        self.middlewares.push(middleware);
        self
    }

    /// Registers a handler for `/name`.
    ///
    /// The name is trimmed, lower-cased and stripped of one leading `/`.
    /// Empty names are ignored; registering a name again replaces the
    /// previous handler.
    pub fn on_command<F, Fut>(&mut self, name: &str, handler: F) -> &mut Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.command_handler(name, handler_fn(handler))
    }

    /// Registers an already erased command handler.
    pub fn command_handler(&mut self, name: &str, handler: Handler) -> &mut Self {
        let name = normalize_command(name);
        if !name.is_empty() {
            self.commands.insert(name, handler);
        }
        self
    }

    /// Sets the handler for messages that are not registered commands.
    pub fn on_text<F, Fut>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.text = Some(handler_fn(handler));
        self
    }

    /// Sets the handler for callback queries.
    pub fn on_callback<F, Fut>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.callback = Some(handler_fn(handler));
        self
    }

    /// Returns `true` if a handler is registered for the command.
    pub fn has_command(&self, name: &str) -> bool {
        self.commands.contains_key(&normalize_command(name))
    }

    /// Routes `update` to at most one handler and returns its result.
    pub async fn dispatch(
        &self,
        update: Update,
        client: &Client,
        cancel: &CancellationToken,
    ) -> HandlerResult {
        let Some((route, handler)) = self.select(&update) else {
            trace!(update_id = update.update_id, "No handler for update");
            return Ok(());
        };
        debug!(update_id = update.update_id, route = %route, "Dispatching update");

        let ctx = Context::new(update, client.clone(), cancel.clone());
        chain(&self.middlewares, Some(handler.clone()))(ctx).await
    }

    fn select(&self, update: &Update) -> Option<(String, &Handler)> {
        if let Some(message) = &update.message {
            let command = extract_command(message.text_or_empty());
            if let Some(handler) = self.commands.get(&command) {
                return Some((format!("/{command}"), handler));
            }
            return self.text.as_ref().map(|h| ("text".to_string(), h));
        }
        if update.callback_query.is_some() {
            return self.callback.as_ref().map(|h| ("callback".to_string(), h));
        }
        None
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut commands: Vec<&String> = self.commands.keys().collect();
        commands.sort();
        f.debug_struct("Router")
            .field("commands", &commands)
            .field("text", &self.text.is_some())
            .field("callback", &self.callback.is_some())
            .field("middleware_count", &self.middlewares.len())
            .finish()
    }
}
