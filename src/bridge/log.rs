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

use crate::Logger;
use crate::kv::Key;
use crate::kv::Value;
use crate::record::Level;
use crate::str::Str;

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warn,
            log::Level::Info => Self::Info,
            log::Level::Debug => Self::Debug,
            log::Level::Trace => Self::Debug,
        }
    }
}

fn convert_value(value: &log::kv::Value<'_>) -> Value {
    if let Some(v) = value.to_i64() {
        Value::I64(v)
    } else if let Some(v) = value.to_u64() {
        Value::U64(v)
    } else if let Some(v) = value.to_f64() {
        Value::F64(v)
    } else if let Some(v) = value.to_bool() {
        Value::Bool(v)
    } else if let Some(v) = value.to_borrowed_str() {
        Value::from(v.to_string())
    } else {
        Value::from_display(value)
    }
}

impl log::Log for Logger {
    fn enabled(&self, _: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        struct KeyValueVisitor {
            kvs: Vec<(Key, Value)>,
        }

        impl<'kvs> log::kv::VisitSource<'kvs> for KeyValueVisitor {
            fn visit_pair(
                &mut self,
                key: log::kv::Key<'kvs>,
                value: log::kv::Value<'kvs>,
            ) -> Result<(), log::kv::Error> {
                self.kvs
                    .push((Key::from(key.as_str().to_string()), convert_value(&value)));
                Ok(())
            }
        }

        let mut visitor = KeyValueVisitor { kvs: Vec::new() };
        // the visitor never fails; pairs collected before a failing source are kept
        let _ = record.key_values().visit(&mut visitor);

        let message = match record.args().as_str() {
            Some(message) => Str::new(message),
            None => Str::from(record.args().to_string()),
        };

        let record = self.assemble(record.level().into(), message, visitor.kvs, None);
        self.dispatch(&record);
    }

    fn flush(&self) {
        Logger::flush(self);
    }
}

/// Install `logger` as the global logger of the [`log`] crate.
///
/// Records from `log::info!` and friends go through `logger` exactly like direct calls: its
/// context comes first, lazy values are resolved and the current handler receives the record.
/// `log`'s key-values keep their kind when they are integers, floats, booleans or strings, and
/// are rendered to strings otherwise. `Trace` maps to [`Level::Debug`].
///
/// # Errors
///
/// Return an error if the log crate global logger has already been set.
///
/// # Examples
///
/// ```
/// use ctxlog::handler::Testing;
///
/// ctxlog::root().set_handler(Testing::default());
/// if let Err(err) = ctxlog::install_log_bridge(ctxlog::new(()), log::LevelFilter::Info) {
///     eprintln!("failed to setup log crate: {err}");
/// }
/// log::info!(user = "alice"; "signed in");
/// ```
pub fn install_log_bridge(
    logger: Logger,
    max_level: log::LevelFilter,
) -> Result<(), log::SetLoggerError> {
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(max_level);
    Ok(())
}
