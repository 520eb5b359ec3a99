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

use crate::Error;
use crate::handler::Handler;
use crate::kv::Key;
use crate::kv::Value;
use crate::record::Record;

/// What a [`MatchFilter`] looks for in the value of its key.
#[derive(Debug, Clone)]
pub enum Criterion {
    /// Any non-nil value matches.
    Any,
    /// Only a value equal to this one matches.
    Value(Value),
}

/// A handler that discards records carrying a matching key-value pair.
///
/// Only the first pair with the key is inspected. A record whose key is absent, or bound to
/// [`Value::Nil`], is always delivered. This suits suppressing records that already carry a
/// tagged error:
///
/// ```
/// use ctxlog::handler::DiscardHandler;
/// use ctxlog::handler::MatchFilter;
///
/// // drop every record that has a non-nil `err`
/// let filter = MatchFilter::any("err", DiscardHandler);
/// ```
#[derive(Debug)]
pub struct MatchFilter {
    key: Key,
    criterion: Criterion,
    inner: Box<dyn Handler>,
}

impl MatchFilter {
    /// Create a new match filter in front of `inner`.
    pub fn new(
        key: impl Into<Key>,
        criterion: Criterion,
        inner: impl Into<Box<dyn Handler>>,
    ) -> Self {
        Self {
            key: key.into(),
            criterion,
            inner: inner.into(),
        }
    }

    /// Discard records where `key` has any non-nil value.
    pub fn any(key: impl Into<Key>, inner: impl Into<Box<dyn Handler>>) -> Self {
        Self::new(key, Criterion::Any, inner)
    }

    /// Discard records where `key` equals `value`.
    pub fn value(
        key: impl Into<Key>,
        value: impl Into<Value>,
        inner: impl Into<Box<dyn Handler>>,
    ) -> Self {
        Self::new(key, Criterion::Value(value.into()), inner)
    }

    fn matches(&self, record: &Record) -> bool {
        match record.get(self.key.as_str()) {
            None | Some(Value::Nil) => false,
            Some(value) => match &self.criterion {
                Criterion::Any => true,
                Criterion::Value(expected) => value == expected,
            },
        }
    }
}

impl Handler for MatchFilter {
    fn handle(&self, record: &Record) -> Result<(), Error> {
        if self.matches(record) {
            return Ok(());
        }
        self.inner.handle(record)
    }

    fn flush(&self) -> Result<(), Error> {
        self.inner.flush()
    }
}
