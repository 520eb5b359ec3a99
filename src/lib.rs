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

//! ctxlog is a structured logging toolkit built around a composable chain of handlers.
//!
//! # Overview
//!
//! A [`Logger`] carries a fixed context of key-value pairs. Each logging call adds its own pairs,
//! resolves [lazy values](kv::Lazy), and hands one immutable [`Record`] to the logger's
//! [`Handler`]. Handlers are small composable policies: filtering by [level](handler::LevelFilter)
//! or [by key](handler::MatchFilter), [fan-out](handler::Multi), [failover](handler::Failover) and
//! [buffering](handler::Buffered) on a worker thread. At the end of the chain a
//! [`StreamHandler`](handler::StreamHandler) renders records with a [`Format`] and writes them to
//! any byte sink, including a [`TimeRotateWriter`] that rotates its file on a fixed interval.
//!
//! # Examples
//!
//! ```
//! use ctxlog::ctx;
//! use ctxlog::format::LogfmtFormat;
//! use ctxlog::handler::LevelFilter;
//! use ctxlog::handler::StreamHandler;
//! use ctxlog::record::Level;
//!
//! ctxlog::root().set_handler(LevelFilter::new(
//!     Level::Info,
//!     StreamHandler::new(std::io::stderr(), LogfmtFormat::default()),
//! ));
//!
//! let logger = ctxlog::new(ctx!("module" => "app/db"));
//! logger.info("connected", ctx!("host" => "10.0.0.7", "port" => 5432));
//! logger.debug("dropped by the level filter", ());
//! ```
//!
//! Writing to a rotating file:
//!
//! ```no_run
//! use ctxlog::Logger;
//! use ctxlog::TimeRotateWriter;
//! use ctxlog::format::JsonFormat;
//! use ctxlog::handler::StreamHandler;
//!
//! let writer = TimeRotateWriter::new("logs/app.log", 60, 48).unwrap();
//! let logger = Logger::new(());
//! logger.set_handler(StreamHandler::new(writer, JsonFormat::default()));
//! logger.warn("disk almost full", [("used", 97)]);
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod format;
pub mod handler;
pub mod kv;
pub mod record;
pub mod rotate;
pub mod trap;

mod error;
mod logger;
mod str;

#[cfg(feature = "bridge-log")]
mod bridge;

pub use self::error::Error;
pub use self::format::Format;
pub use self::handler::Handler;
pub use self::logger::Logger;
pub use self::logger::new;
pub use self::logger::root;
pub use self::record::Level;
pub use self::record::Record;
pub use self::rotate::TimeRotateWriter;
pub use self::str::Str;
pub use self::trap::Trap;

#[cfg(feature = "bridge-log")]
pub use self::bridge::install_log_bridge;
