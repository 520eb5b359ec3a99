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

//! Formats that turn a [`Record`] into bytes.

use std::fmt;

use jiff::Timestamp;
use jiff::tz::TimeZone;

use crate::Error;
use crate::record::Record;

#[cfg(feature = "format-json")]
mod json;
mod logfmt;

#[cfg(feature = "format-json")]
pub use self::json::JsonFormat;
pub use self::logfmt::LogfmtFormat;

/// A format renders a record into a sequence of bytes.
///
/// Implementations are pure: the same record always produces the same bytes.
pub trait Format: fmt::Debug + Send + Sync + 'static {
    /// Format a record.
    fn format(&self, record: &Record) -> Result<Vec<u8>, Error>;
}

impl<T: Format> From<T> for Box<dyn Format> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

/// Convert the record time into the given time zone, defaulting to the system one.
fn zoned(record: &Record, tz: Option<&TimeZone>) -> Result<jiff::Zoned, Error> {
    let ts = Timestamp::try_from(record.time())
        .map_err(|err| Error::new("record time is out of range").with_source(err))?;
    let tz = tz.cloned().unwrap_or_else(TimeZone::system);
    Ok(ts.to_zoned(tz))
}
