// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt;
use std::panic::Location;
use std::sync::Arc;
use std::sync::OnceLock;

use arc_swap::ArcSwap;

use crate::handler::DiscardHandler;
use crate::handler::Handler;
use crate::kv::ERROR_KEY;
use crate::kv::IntoKeyValues;
use crate::kv::Key;
use crate::kv::Value;
use crate::record::Level;
use crate::record::Record;
use crate::str::Str;

type HandlerCell = ArcSwap<Arc<dyn Handler>>;

/// A logger carries a fixed context and a handler shared with the loggers derived from it.
///
/// The context is copied when deriving a [`child`](Logger::child), so a child never changes its
/// parent. The handler cell is shared: [`set_handler`](Logger::set_handler) on any logger of a
/// family is seen by every other member, including children created earlier.
///
/// # Examples
///
/// ```
/// use ctxlog::Logger;
/// use ctxlog::ctx;
/// use ctxlog::handler::Testing;
///
/// let logger = Logger::new(ctx!("service" => "billing"));
/// logger.set_handler(Testing::default());
///
/// let request = logger.child(ctx!("request_id" => 42));
/// request.info("charged", ctx!("amount" => 9.99, "currency" => "EUR"));
/// ```
#[derive(Clone)]
pub struct Logger {
    context: Arc<[(Key, Value)]>,
    handler: Arc<HandlerCell>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("context", &self.context)
            .field("handler", &self.handler.load())
            .finish()
    }
}

impl Logger {
    /// Create a logger with its own handler cell, initially a [`DiscardHandler`].
    pub fn new(context: impl IntoKeyValues) -> Logger {
        let handler: Arc<dyn Handler> = Arc::new(DiscardHandler::default());
        Logger {
            context: context.into_key_values().into(),
            handler: Arc::new(ArcSwap::from_pointee(handler)),
        }
    }

    /// Derive a logger whose context is this logger's context followed by `context`.
    ///
    /// The child shares this logger's handler.
    pub fn child(&self, context: impl IntoKeyValues) -> Logger {
        let extra = context.into_key_values();
        let mut merged = Vec::with_capacity(self.context.len() + extra.len());
        merged.extend_from_slice(&self.context);
        merged.extend(extra);

        Logger {
            context: merged.into(),
            handler: self.handler.clone(),
        }
    }

    /// Replace the handler of this logger and every logger sharing it.
    pub fn set_handler(&self, handler: impl Into<Box<dyn Handler>>) {
        let handler: Arc<dyn Handler> = Arc::from(handler.into());
        self.handler.store(Arc::new(handler));
    }

    /// The current handler.
    pub fn handler(&self) -> Arc<dyn Handler> {
        Arc::clone(&self.handler.load())
    }

    /// The context carried by this logger.
    pub fn context(&self) -> &[(Key, Value)] {
        &self.context
    }

    /// Flush the current handler, discarding any error.
    pub fn flush(&self) {
        let _ = self.handler.load().flush();
    }

    /// Log a message at `level`.
    ///
    /// The record's context is this logger's context followed by `context`. Lazy values are
    /// resolved before the record reaches the handler; a lazy that fails leaves its pair
    /// unresolved and adds a diagnostic pair under [`ERROR_KEY`].
    ///
    /// Logging is fire-and-forget: the handler runs on the calling thread and its error, if any,
    /// is discarded. Compose handlers such as [`Failover`](crate::handler::Failover) to react to
    /// delivery failures.
    #[track_caller]
    pub fn log(&self, level: Level, message: impl Into<Str>, context: impl IntoKeyValues) {
        let record = self.assemble(
            level,
            message.into(),
            context.into_key_values(),
            Some(Location::caller()),
        );
        self.dispatch(&record);
    }

    /// Log a message at [`Level::Debug`].
    #[track_caller]
    pub fn debug(&self, message: impl Into<Str>, context: impl IntoKeyValues) {
        self.log(Level::Debug, message, context)
    }

    /// Log a message at [`Level::Info`].
    #[track_caller]
    pub fn info(&self, message: impl Into<Str>, context: impl IntoKeyValues) {
        self.log(Level::Info, message, context)
    }

    /// Log a message at [`Level::Warn`].
    #[track_caller]
    pub fn warn(&self, message: impl Into<Str>, context: impl IntoKeyValues) {
        self.log(Level::Warn, message, context)
    }

    /// Log a message at [`Level::Error`].
    #[track_caller]
    pub fn error(&self, message: impl Into<Str>, context: impl IntoKeyValues) {
        self.log(Level::Error, message, context)
    }

    /// Log a message at [`Level::Crit`].
    #[track_caller]
    pub fn crit(&self, message: impl Into<Str>, context: impl IntoKeyValues) {
        self.log(Level::Crit, message, context)
    }

    pub(crate) fn assemble(
        &self,
        level: Level,
        message: Str,
        context: Vec<(Key, Value)>,
        location: Option<&'static Location<'static>>,
    ) -> Record {
        let mut pairs = Vec::with_capacity(self.context.len() + context.len());
        pairs.extend_from_slice(&self.context);
        pairs.extend(context);
        resolve_lazy(&mut pairs);

        Record::builder()
            .level(level)
            .message(message)
            .context(pairs)
            .location(location)
            .build()
    }

    pub(crate) fn dispatch(&self, record: &Record) {
        let _ = self.handler.load().handle(record);
    }
}

fn resolve_lazy(pairs: &mut Vec<(Key, Value)>) {
    let mut errors = Vec::new();
    for (key, value) in pairs.iter_mut() {
        let resolved = match value {
            Value::Lazy(lazy) => lazy.evaluate(),
            _ => continue,
        };
        match resolved {
            Ok(v) => *value = v,
            Err(err) => errors.push(format!("bad lazy {key}: {err}")),
        }
    }

    for err in errors {
        pairs.push((Key::new(ERROR_KEY), Value::from(err)));
    }
}

/// The process-wide root logger.
///
/// It has an empty context and starts with a [`DiscardHandler`]. Install a handler with
/// `root().set_handler(..)`; every logger derived through [`new`] sees it.
pub fn root() -> &'static Logger {
    static ROOT: OnceLock<Logger> = OnceLock::new();
    ROOT.get_or_init(|| Logger::new(()))
}

/// Derive a child of the [`root`] logger.
pub fn new(context: impl IntoKeyValues) -> Logger {
    root().child(context)
}
