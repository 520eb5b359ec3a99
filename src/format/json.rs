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

use jiff::tz::TimeZone;
use serde::Serialize;
use serde::Serializer;
use serde_json::Map;

use crate::Error;
use crate::format::Format;
use crate::format::zoned;
use crate::kv::Value;
use crate::record::Record;

/// A JSON format, one object per line.
///
/// Output format:
///
/// ```json
/// {"lvl":"info","msg":"listening on port","port":8080,"t":"2024-08-10T09:12:30.172051+08:00"}
/// {"err":"bad fd","lvl":"eror","msg":"read failed","t":"2024-08-10T09:12:31.000250+08:00"}
/// ```
///
/// Keys are emitted in sorted order. The `t`, `lvl` and `msg` fields are written first and the
/// context after them, so when a key repeats the last value wins.
///
/// # Examples
///
/// ```
/// use jiff::tz::TimeZone;
/// use ctxlog::format::JsonFormat;
///
/// let format = JsonFormat::default().timezone(TimeZone::UTC).pretty(true);
/// ```
#[derive(Default, Debug, Clone)]
pub struct JsonFormat {
    tz: Option<TimeZone>,
    pretty: bool,
}

impl JsonFormat {
    /// Set the timezone for timestamps.
    ///
    /// Default to the system time zone.
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.tz = Some(tz);
        self
    }

    /// Whether to emit indented multi-line objects.
    ///
    /// Default to `false`.
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Nil => serializer.serialize_unit(),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::I64(v) => serializer.serialize_i64(*v),
            Value::U64(v) => serializer.serialize_u64(*v),
            Value::F64(v) => serializer.serialize_f64(*v),
            Value::Str(v) => serializer.serialize_str(v.get()),
            Value::Error(err) => serializer.collect_str(err),
            Value::Lazy(_) => serializer.serialize_str("<lazy>"),
        }
    }
}

impl Format for JsonFormat {
    fn format(&self, record: &Record) -> Result<Vec<u8>, Error> {
        let time = zoned(record, self.tz.as_ref())?;
        let time = time.timestamp().display_with_offset(time.offset());

        let mut object = Map::new();
        object.insert("t".to_string(), format!("{time:.6}").into());
        object.insert("lvl".to_string(), record.level().code().into());
        object.insert("msg".to_string(), record.message().into());
        for (key, value) in record.context() {
            let value = match serde_json::to_value(value) {
                Ok(value) => value,
                Err(_) => value.to_string().into(),
            };
            object.insert(key.to_string(), value);
        }

        let mut bytes = if self.pretty {
            serde_json::to_vec_pretty(&object)
        } else {
            serde_json::to_vec(&object)
        }
        .map_err(|err| Error::new("failed to serialize record").with_source(err))?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Level;

    fn parse(format: &JsonFormat, record: &Record) -> serde_json::Value {
        let bytes = format.format(record).unwrap();
        assert_eq!(bytes.last(), Some(&b'\n'));
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_json_fields() {
        let record = Record::builder()
            .level(Level::Warn)
            .message("disk almost full")
            .push("used", 97)
            .push("ratio", 0.97)
            .push("mount", "/var")
            .push("owner", None::<&'static str>)
            .push("cause", Value::from_error(std::io::Error::other("bad fd")))
            .build();

        let format = JsonFormat::default().timezone(TimeZone::UTC);
        let value = parse(&format, &record);
        assert_eq!(value["lvl"], "warn");
        assert_eq!(value["msg"], "disk almost full");
        assert_eq!(value["used"], 97);
        assert_eq!(value["ratio"], 0.97);
        assert_eq!(value["mount"], "/var");
        assert!(value["owner"].is_null());
        assert_eq!(value["cause"], "bad fd");

        let t = value["t"].as_str().unwrap();
        assert!(t.ends_with("+00:00"), "{t}");
        assert!(t.parse::<jiff::Timestamp>().is_ok(), "{t}");
    }

    #[test]
    fn test_json_duplicate_keys_last_wins() {
        let record = Record::builder()
            .push("id", 1)
            .push("id", 2)
            .push("msg", "from context")
            .message("from record")
            .build();

        let value = parse(&JsonFormat::default(), &record);
        assert_eq!(value["id"], 2);
        assert_eq!(value["msg"], "from context");
    }

    #[test]
    fn test_json_sorted_and_pretty() {
        let record = Record::builder().push("zeta", 1).push("alpha", 2).build();

        let line = String::from_utf8(JsonFormat::default().format(&record).unwrap()).unwrap();
        assert_eq!(line.lines().count(), 1);
        let alpha = line.find("\"alpha\"").unwrap();
        let zeta = line.find("\"zeta\"").unwrap();
        assert!(alpha < zeta, "{line}");

        let pretty = JsonFormat::default().pretty(true).format(&record).unwrap();
        let pretty = String::from_utf8(pretty).unwrap();
        assert!(pretty.lines().count() > 1, "{pretty}");
    }
}
