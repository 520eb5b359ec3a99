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

use std::fmt;
use std::io::Write;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::Error;
use crate::format::Format;
use crate::handler::Handler;
use crate::record::Record;

/// A handler that formats records and writes them to a byte sink.
///
/// Each record is written with a single `write_all` call while holding the sink's lock, so
/// lines from concurrent callers never interleave. A newline is appended when the format did not
/// end the line itself.
///
/// Any [`Write`] implementation works as the sink, including a
/// [`TimeRotateWriter`](crate::rotate::TimeRotateWriter).
///
/// # Examples
///
/// ```
/// use ctxlog::format::LogfmtFormat;
/// use ctxlog::handler::StreamHandler;
///
/// let handler = StreamHandler::new(std::io::stderr(), LogfmtFormat::default());
/// ```
pub struct StreamHandler<W: Write + Send + 'static> {
    writer: Mutex<W>,
    format: Box<dyn Format>,
}

impl<W: Write + Send + 'static> fmt::Debug for StreamHandler<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamHandler")
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

impl<W: Write + Send + 'static> StreamHandler<W> {
    /// Create a new stream handler.
    pub fn new(writer: W, format: impl Into<Box<dyn Format>>) -> Self {
        Self {
            writer: Mutex::new(writer),
            format: format.into(),
        }
    }

    fn writer(&self) -> MutexGuard<'_, W> {
        self.writer.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<W: Write + Send + 'static> Handler for StreamHandler<W> {
    fn handle(&self, record: &Record) -> Result<(), Error> {
        let mut bytes = self.format.format(record)?;
        if bytes.last() != Some(&b'\n') {
            bytes.push(b'\n');
        }
        let mut writer = self.writer();
        writer.write_all(&bytes).map_err(Error::from_io_error)?;
        Ok(())
    }

    fn flush(&self) -> Result<(), Error> {
        let mut writer = self.writer();
        writer.flush().map_err(Error::from_io_error)?;
        Ok(())
    }
}

impl<W: Write + Send + 'static> Drop for StreamHandler<W> {
    fn drop(&mut self) {
        let writer = self.writer.get_mut().unwrap_or_else(|e| e.into_inner());
        let _ = writer.flush();
    }
}
