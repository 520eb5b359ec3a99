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

/// A handler that tries a chain of handlers until one accepts the record.
///
/// When the handler at position `N` fails, the record handed to the next one carries an extra
/// pair `failover_err_N` holding the error text. The annotations accumulate along the chain and
/// never touch the caller's record.
///
/// The last error is returned if every handler fails.
///
/// # Examples
///
/// ```
/// use ctxlog::format::JsonFormat;
/// use ctxlog::handler::Failover;
/// use ctxlog::handler::StreamHandler;
///
/// let handler = Failover::new(StreamHandler::new(std::io::stdout(), JsonFormat::default()))
///     .fallback(StreamHandler::new(std::io::stderr(), JsonFormat::default()));
/// ```
#[derive(Debug)]
pub struct Failover {
    handlers: Vec<Box<dyn Handler>>,
}

impl Failover {
    /// Create a failover chain starting with `primary`.
    pub fn new(primary: impl Into<Box<dyn Handler>>) -> Self {
        Self {
            handlers: vec![primary.into()],
        }
    }

    /// Append a fallback, tried after every handler before it has failed.
    pub fn fallback(mut self, handler: impl Into<Box<dyn Handler>>) -> Self {
        self.handlers.push(handler.into());
        self
    }
}

impl Handler for Failover {
    fn handle(&self, record: &Record) -> Result<(), Error> {
        let mut annotated: Option<Record> = None;
        let mut last_error = None;

        for (i, handler) in self.handlers.iter().enumerate() {
            let current = annotated.as_ref().unwrap_or(record);
            match handler.handle(current) {
                Ok(()) => return Ok(()),
                Err(err) => {
                    let next = current
                        .to_builder()
                        .push(format!("failover_err_{i}"), err.to_string())
                        .build();
                    annotated = Some(next);
                    last_error = Some(err);
                }
            }
        }

        last_error.map_or(Ok(()), Err)
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
