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

//! Log record and level.

use std::fmt;
use std::panic::Location;
use std::str::FromStr;
use std::time::SystemTime;

use crate::Error;
use crate::kv::Key;
use crate::kv::Value;
use crate::str::Str;

/// One log event.
///
/// A record is immutable once built. Handlers receive it by reference; a decorator that needs to
/// add context clones it through [`Record::to_builder`].
#[derive(Clone, Debug)]
pub struct Record {
    // the observed time
    now: SystemTime,
    level: Level,
    message: Str,

    // structural logging; logger context first, then call-site context
    context: Vec<(Key, Value)>,

    location: Option<&'static Location<'static>>,
}

impl Record {
    /// The observed time.
    pub fn time(&self) -> SystemTime {
        self.now
    }

    /// The severity of the event.
    pub fn level(&self) -> Level {
        self.level
    }

    /// The message body.
    pub fn message(&self) -> &str {
        self.message.get()
    }

    /// The key-value pairs, in order.
    pub fn context(&self) -> &[(Key, Value)] {
        &self.context
    }

    /// The value of the first pair with the given key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.context
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v)
    }

    /// Where the logging call was made, if known.
    pub fn location(&self) -> Option<&'static Location<'static>> {
        self.location
    }

    /// Create a builder initialized with the current record's values.
    pub fn to_builder(&self) -> RecordBuilder {
        RecordBuilder {
            record: self.clone(),
        }
    }

    /// Returns a new builder.
    pub fn builder() -> RecordBuilder {
        RecordBuilder::default()
    }
}

/// Builder for [`Record`].
#[derive(Debug)]
pub struct RecordBuilder {
    record: Record,
}

impl Default for RecordBuilder {
    fn default() -> Self {
        RecordBuilder {
            record: Record {
                now: SystemTime::now(),
                level: Level::Info,
                message: Str::default(),
                context: Vec::new(),
                location: None,
            },
        }
    }
}

impl RecordBuilder {
    /// Set [`time`](Record::time).
    pub fn time(mut self, now: SystemTime) -> Self {
        self.record.now = now;
        self
    }

    /// Set [`level`](Record::level).
    pub fn level(mut self, level: Level) -> Self {
        self.record.level = level;
        self
    }

    /// Set [`message`](Record::message).
    pub fn message(mut self, message: impl Into<Str>) -> Self {
        self.record.message = message.into();
        self
    }

    /// Replace [`context`](Record::context).
    pub fn context(mut self, context: Vec<(Key, Value)>) -> Self {
        self.record.context = context;
        self
    }

    /// Append one pair to [`context`](Record::context).
    pub fn push(mut self, key: impl Into<Key>, value: impl Into<Value>) -> Self {
        self.record.context.push((key.into(), value.into()));
        self
    }

    /// Set [`location`](Record::location).
    pub fn location(mut self, location: Option<&'static Location<'static>>) -> Self {
        self.record.location = location;
        self
    }

    /// Invoke the builder and return a `Record`.
    pub fn build(self) -> Record {
        self.record
    }
}

/// An enum representing the available severity levels.
///
/// Levels are ordered from least to most severe: `Debug < Info < Warn < Error < Crit`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Designates lower priority information.
    Debug,
    /// Designates useful information.
    Info,
    /// Designates hazardous situations.
    Warn,
    /// Designates very serious errors.
    Error,
    /// Designates critical errors.
    Crit,
}

impl Level {
    /// Return the short code used on the wire: `dbug`, `info`, `warn`, `eror` or `crit`.
    ///
    /// This returns the same string as the `fmt::Display` implementation.
    pub fn code(&self) -> &'static str {
        match self {
            Level::Debug => "dbug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "eror",
            Level::Crit => "crit",
        }
    }

    /// Return the full lowercase name of the level.
    pub fn name(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Crit => "crit",
        }
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.code())
    }
}

impl FromStr for Level {
    type Err = Error;

    /// Accepts both the short codes and the full names, case-insensitively.
    fn from_str(s: &str) -> Result<Level, Self::Err> {
        for (name, level) in [
            ("dbug", Level::Debug),
            ("debug", Level::Debug),
            ("info", Level::Info),
            ("warn", Level::Warn),
            ("eror", Level::Error),
            ("error", Level::Error),
            ("crit", Level::Crit),
        ] {
            if s.eq_ignore_ascii_case(name) {
                return Ok(level);
            }
        }

        Err(Error::new(format!("malformed level: {s:?}")))
    }
}
