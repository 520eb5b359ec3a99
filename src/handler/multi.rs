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
use crate::record::Record;

/// A handler that fans every record out to several handlers.
///
/// Handlers are called in the order they were added, on the calling thread. A failing handler
/// does not stop delivery to the ones after it; the first error is returned once all of them
/// have been called.
#[derive(Debug)]
pub struct Multi {
    handlers: Vec<Box<dyn Handler>>,
}

impl Multi {
    /// Create a fan-out with one target.
    pub fn new(handler: impl Into<Box<dyn Handler>>) -> Self {
        Self {
            handlers: vec![handler.into()],
        }
    }

    /// Add one more target.
    pub fn chain(mut self, handler: impl Into<Box<dyn Handler>>) -> Self {
        self.handlers.push(handler.into());
        self
    }
}

impl FromIterator<Box<dyn Handler>> for Multi {
    fn from_iter<I: IntoIterator<Item = Box<dyn Handler>>>(iter: I) -> Self {
        Self {
            handlers: iter.into_iter().collect(),
        }
    }
}

impl Handler for Multi {
    fn handle(&self, record: &Record) -> Result<(), Error> {
        let mut first_error = None;
        for handler in &self.handlers {
            if let Err(err) = handler.handle(record) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn flush(&self) -> Result<(), Error> {
        let mut first_error = None;
        for handler in &self.handlers {
            if let Err(err) = handler.flush() {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
