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

use crate::Error;
use crate::handler::Handler;
use crate::record::Record;

type Predicate = dyn Fn(&Record) -> bool + Send + Sync + 'static;

/// A handler that you can pass a custom predicate.
///
/// The record is delivered to the inner handler only when the predicate returns `true`.
///
/// ```rust
/// use ctxlog::handler::DiscardHandler;
/// use ctxlog::handler::FilterHandler;
///
/// let handler = FilterHandler::new(
///     |record| record.message().starts_with("audit:"),
///     DiscardHandler,
/// );
/// ```
pub struct FilterHandler {
    predicate: Box<Predicate>,
    inner: Box<dyn Handler>,
}

impl fmt::Debug for FilterHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterHandler")
            .field("predicate", &"<fn>")
            .field("inner", &self.inner)
            .finish()
    }
}

impl FilterHandler {
    /// Create a new filter in front of `inner`.
    pub fn new(
        predicate: impl Fn(&Record) -> bool + Send + Sync + 'static,
        inner: impl Into<Box<dyn Handler>>,
    ) -> Self {
        FilterHandler {
            predicate: Box::new(predicate),
            inner: inner.into(),
        }
    }
}

impl Handler for FilterHandler {
    fn handle(&self, record: &Record) -> Result<(), Error> {
        if (self.predicate)(record) {
            self.inner.handle(record)
        } else {
            Ok(())
        }
    }

    fn flush(&self) -> Result<(), Error> {
        self.inner.flush()
    }
}
