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
use crate::record::Level;
use crate::record::Record;

/// A handler that passes records at or above a minimum level to its inner handler.
///
/// From least to most severe, the levels are:
///
/// - `Debug`
/// - `Info`
/// - `Warn`
/// - `Error`
/// - `Crit`
///
/// If the minimum is `Warn`, it will deliver `Warn`, `Error`, and `Crit` records, and silently
/// drop the others.
#[derive(Debug)]
pub struct LevelFilter {
    min: Level,
    inner: Box<dyn Handler>,
}

impl LevelFilter {
    /// Create a new level filter in front of `inner`.
    pub fn new(min: Level, inner: impl Into<Box<dyn Handler>>) -> Self {
        Self {
            min,
            inner: inner.into(),
        }
    }
}

impl Handler for LevelFilter {
    fn handle(&self, record: &Record) -> Result<(), Error> {
        if record.level() >= self.min {
            self.inner.handle(record)
        } else {
            Ok(())
        }
    }

    fn flush(&self) -> Result<(), Error> {
        self.inner.flush()
    }
}
