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

use std::fmt::Write;

use jiff::tz::TimeZone;

use crate::Error;
use crate::format::Format;
use crate::format::zoned;
use crate::record::Record;

/// A logfmt format.
///
/// Output format:
///
/// ```text
/// t=2024-08-10T09:12:30+0800 lvl=info msg="listening on port" port=8080
/// t=2024-08-10T09:12:31+0800 lvl=eror msg="some message" x=1 y=3.200 equals="=" quote="\""
/// ```
///
/// Values are double-quoted when empty or when they contain a space, `=`, `"` or a control
/// character. Keys that would need quoting are rejected.
///
/// # Examples
///
/// ```
/// use jiff::tz::TimeZone;
/// use ctxlog::format::LogfmtFormat;
///
/// let format = LogfmtFormat::default().timezone(TimeZone::UTC);
/// ```
#[derive(Default, Debug, Clone)]
pub struct LogfmtFormat {
    tz: Option<TimeZone>,
}

impl LogfmtFormat {
    /// Set the timezone for timestamps.
    ///
    /// Default to the system time zone.
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.tz = Some(tz);
        self
    }
}

// a space, `=`, `"` or any control character would break the `key=value` framing
fn is_special(c: char) -> bool {
    c <= ' ' || c == '=' || c == '"' || c.is_control()
}

fn needs_quoting(value: &str) -> bool {
    value.is_empty() || value.chars().any(is_special)
}

fn write_pair(text: &mut String, key: &str, value: &str) -> Result<(), Error> {
    if key.is_empty() || key.chars().any(is_special) {
        return Err(Error::new("key contains special chars").with_context("key", key));
    }

    text.push(' ');
    text.push_str(key);
    text.push('=');

    if !needs_quoting(value) {
        text.push_str(value);
        return Ok(());
    }

    text.push('"');
    for c in value.chars() {
        match c {
            '\\' => text.push_str("\\\\"),
            '"' => text.push_str("\\\""),
            '\n' => text.push_str("\\n"),
            '\r' => text.push_str("\\r"),
            '\t' => text.push_str("\\t"),
            c => text.push(c),
        }
    }
    text.push('"');
    Ok(())
}

impl Format for LogfmtFormat {
    fn format(&self, record: &Record) -> Result<Vec<u8>, Error> {
        let time = zoned(record, self.tz.as_ref())?;

        let mut text = String::with_capacity(128);
        write!(&mut text, "t={}", time.strftime("%Y-%m-%dT%H:%M:%S%z"))
            .map_err(Error::from_fmt_error)?;
        write_pair(&mut text, "lvl", record.level().code())?;
        write_pair(&mut text, "msg", record.message())?;

        for (key, value) in record.context() {
            write_pair(&mut text, key.as_str(), &value.to_string())?;
        }

        text.push('\n');
        Ok(text.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Level;

    fn format(record: &Record) -> String {
        let bytes = LogfmtFormat::default()
            .timezone(TimeZone::UTC)
            .format(record)
            .unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_logfmt_line() {
        let record = Record::builder()
            .level(Level::Error)
            .message("some message")
            .push("x", 1)
            .push("y", 3.2)
            .push("equals", "=")
            .push("quote", "\"")
            .build();

        let line = format(&record);
        assert_eq!(
            &line[27..],
            "lvl=eror msg=\"some message\" x=1 y=3.200 equals=\"=\" quote=\"\\\"\"\n"
        );
        assert!(line.starts_with("t="), "{line}");
        assert!(line[2..26].ends_with("+0000"), "{line}");
    }

    #[test]
    fn test_logfmt_quoting() {
        let record = Record::builder()
            .message("ok")
            .push("empty", "")
            .push("multi", "a\nb\tc")
            .push("path", "C:\\tmp dir")
            .push("missing", None::<i32>)
            .build();

        let line = format(&record);
        assert_eq!(
            &line[27..],
            "lvl=info msg=ok empty=\"\" multi=\"a\\nb\\tc\" path=\"C:\\\\tmp dir\" missing=nil\n"
        );
    }

    #[test]
    fn test_logfmt_rejects_bad_keys() {
        let record = Record::builder().push("bad key", 1).build();
        let err = LogfmtFormat::default().format(&record).unwrap_err();
        assert!(err.to_string().contains("bad key"), "{err}");

        for key in ["a\nb", "a\tb", "a\rb", "a=b", "a\"b", "a\u{7f}b", ""] {
            let record = Record::builder().push(key, 1).build();
            assert!(
                LogfmtFormat::default().format(&record).is_err(),
                "{key:?} should be rejected"
            );
        }

        let record = Record::builder().push("request_id", 1).build();
        assert!(LogfmtFormat::default().format(&record).is_ok());
    }
}
