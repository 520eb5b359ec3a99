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

use std::panic::Location;

use crate::Error;
use crate::format::Format;
use crate::format::LogfmtFormat;
use crate::handler::Handler;
use crate::record::Record;

/// A handler for unit tests: each record goes to `eprint!`, so the test harness captures
/// it and shows it only for failing tests or under `--nocapture`.
///
/// Lines are prefixed with the `file:line` of the logging call when the record carries one.
///
/// # Examples
///
/// ```
/// use ctxlog::handler::Testing;
///
/// let handler = Testing::default();
/// ```
#[derive(Debug)]
pub struct Testing {
    format: Box<dyn Format>,
}

impl Default for Testing {
    fn default() -> Self {
        Self {
            format: Box::new(LogfmtFormat::default()),
        }
    }
}

impl Testing {
    /// Replace the record format. Logfmt by default.
    pub fn format(mut self, format: impl Into<Box<dyn Format>>) -> Self {
        self.format = format.into();
        self
    }

    fn render(&self, record: &Record) -> Result<String, Error> {
        let bytes = self.format.format(record)?;
        let line = String::from_utf8_lossy(&bytes);
        Ok(match record.location() {
            Some(loc) => prefixed(loc, &line),
            None => line.into_owned(),
        })
    }
}

fn prefixed(loc: &Location<'_>, line: &str) -> String {
    format!("{}:{}: {line}", loc.file(), loc.line())
}

impl Handler for Testing {
    fn handle(&self, record: &Record) -> Result<(), Error> {
        let line = self.render(record)?;
        eprint!("{line}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use jiff::tz::TimeZone;

    use super::*;

    #[test]
    fn test_testing_prefixes_call_site() {
        let handler = Testing::default().format(LogfmtFormat::default().timezone(TimeZone::UTC));
        let here = Location::caller();
        let record = Record::builder()
            .message("hello")
            .location(Some(here))
            .build();
        let line = handler.render(&record).unwrap();
        let prefix = format!("{}:{}: t=", here.file(), here.line());
        assert!(line.starts_with(&prefix), "{line}");
        assert!(line.ends_with("msg=hello\n"), "{line}");

        let record = Record::builder().message("hello").build();
        let line = handler.render(&record).unwrap();
        assert!(line.starts_with("t="), "{line}");
        assert!(handler.handle(&record).is_ok());
    }

    #[test]
    fn test_testing_reports_format_errors() {
        let record = Record::builder().message("m").push("bad key", 1).build();
        assert!(Testing::default().handle(&record).is_err());
    }
}
