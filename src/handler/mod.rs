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

//! Handlers deliver records, and decorate other handlers with delivery policies.
//!
//! Every policy is a small type wrapping one or more inner handlers. Policies compose at
//! construction time:
//!
//! ```
//! use ctxlog::Logger;
//! use ctxlog::format::LogfmtFormat;
//! use ctxlog::handler::Failover;
//! use ctxlog::handler::LevelFilter;
//! use ctxlog::handler::StreamHandler;
//! use ctxlog::record::Level;
//!
//! let primary = StreamHandler::new(std::io::stdout(), LogfmtFormat::default());
//! let fallback = StreamHandler::new(std::io::stderr(), LogfmtFormat::default());
//!
//! let logger = Logger::new(());
//! logger.set_handler(LevelFilter::new(
//!     Level::Info,
//!     Failover::new(primary).fallback(fallback),
//! ));
//! ```

use std::fmt;
use std::sync::Arc;

use crate::Error;
use crate::record::Record;

mod buffered;
mod custom;
mod discard;
mod failover;
mod level;
mod matching;
mod multi;
mod stream;
mod testing;

pub use self::buffered::Buffered;
pub use self::buffered::BufferedBuilder;
pub use self::buffered::BufferedGuard;
pub use self::buffered::Overflow;
pub use self::custom::FilterHandler;
pub use self::discard::DiscardHandler;
pub use self::failover::Failover;
pub use self::level::LevelFilter;
pub use self::matching::Criterion;
pub use self::matching::MatchFilter;
pub use self::multi::Multi;
pub use self::stream::StreamHandler;
pub use self::testing::Testing;

/// A handler that can process log records.
pub trait Handler: fmt::Debug + Send + Sync + 'static {
    /// Process a log record.
    ///
    /// The record is borrowed and must not be altered; a handler that needs to add context
    /// works on a copy.
    fn handle(&self, record: &Record) -> Result<(), Error>;

    /// Flush any buffered records.
    ///
    /// Default to a no-op.
    fn flush(&self) -> Result<(), Error> {
        Ok(())
    }
}

impl<T: Handler> From<T> for Box<dyn Handler> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

impl<T: Handler + ?Sized> Handler for Arc<T> {
    fn handle(&self, record: &Record) -> Result<(), Error> {
        (**self).handle(record)
    }

    fn flush(&self) -> Result<(), Error> {
        (**self).flush()
    }
}
