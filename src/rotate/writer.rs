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

use std::ffi::OsString;
use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::MutexGuard;

use jiff::Timestamp;
use jiff::civil::DateTime;
use jiff::tz::TimeZone;

use crate::Error;
use crate::rotate::clock::Clock;
use crate::trap::DefaultTrap;
use crate::trap::Trap;

const ARCHIVE_DATE_FORMAT: &str = "%Y%m%d%H%M";
const ARCHIVE_DATE_LEN: usize = 12;

/// A writer that renames its file at every interval boundary and starts a new one.
///
/// All state lives behind one mutex held for the whole of a [`write`](Self::write), so a
/// writer can be shared between threads, for example through
/// [`StreamHandler`](crate::handler::StreamHandler) or by writing through `&TimeRotateWriter`.
///
/// Archives are named `<filename>.<YYYYMMDDHHMM>` after the start of the interval they cover.
/// With `max_backups > 0`, only the newest `max_backups` archives are kept.
///
/// # Examples
///
/// ```no_run
/// use ctxlog::Logger;
/// use ctxlog::format::LogfmtFormat;
/// use ctxlog::handler::StreamHandler;
/// use ctxlog::rotate::TimeRotateWriter;
///
/// let writer = TimeRotateWriter::new("logs/app.log", 60, 24).unwrap();
/// let logger = Logger::new(());
/// logger.set_handler(StreamHandler::new(writer, LogfmtFormat::default()));
/// ```
#[derive(Debug)]
pub struct TimeRotateWriter {
    state: Mutex<State>,
}

impl TimeRotateWriter {
    /// Create a writer rotating every `interval_minutes` and keeping `max_backups` archives.
    ///
    /// A `max_backups` of `0` keeps every archive. The file is opened, and created if missing,
    /// before this returns.
    pub fn new(
        filename: impl Into<PathBuf>,
        interval_minutes: u32,
        max_backups: usize,
    ) -> Result<Self, Error> {
        TimeRotateWriter::builder(filename)
            .interval_minutes(interval_minutes)
            .max_backups(max_backups)
            .build()
    }

    /// Create a builder for a writer on `filename`.
    pub fn builder(filename: impl Into<PathBuf>) -> TimeRotateWriterBuilder {
        TimeRotateWriterBuilder::new(filename)
    }

    /// Write `buf` to the active file, rotating first if the current interval has ended.
    ///
    /// A closed writer reopens its file here. A failed rotation leaves the writer closed and is
    /// retried by the next write.
    pub fn write(&self, buf: &[u8]) -> io::Result<usize> {
        self.state().write(buf)
    }

    /// Flush the active file, if open.
    pub fn flush(&self) -> io::Result<()> {
        self.state().flush()
    }

    /// Flush and close the active file. Closing a closed writer is a no-op.
    pub fn close(&self) -> Result<(), Error> {
        self.state().close()
    }

    /// The path of the active file.
    pub fn path(&self) -> PathBuf {
        self.state().filename.clone()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Write for TimeRotateWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.state().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.state().flush()
    }
}

impl Write for &TimeRotateWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.state().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.state().flush()
    }
}

impl Drop for TimeRotateWriter {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(|e| e.into_inner());
        if let Err(err) = state.close() {
            let err = Error::new("failed to close rotating file on dropped").with_source(err);
            state.trap.trap(&err);
        }
    }
}

/// A builder for configuring [`TimeRotateWriter`].
#[derive(Debug)]
pub struct TimeRotateWriterBuilder {
    // required
    filename: PathBuf,

    // has default
    interval_minutes: u32,
    max_backups: usize,
    tz: Option<TimeZone>,
    clock: Clock,
    trap: Box<dyn Trap>,
}

impl TimeRotateWriterBuilder {
    fn new(filename: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            interval_minutes: 60,
            max_backups: 0,
            tz: None,
            clock: Clock::system(),
            trap: Box::new(DefaultTrap::default()),
        }
    }

    /// Set the rotation interval in minutes.
    ///
    /// Default to `60`. Must be positive.
    #[must_use]
    pub fn interval_minutes(mut self, minutes: u32) -> Self {
        self.interval_minutes = minutes;
        self
    }

    /// Set the number of archives to keep; `0` keeps every archive.
    ///
    /// Default to `0`.
    #[must_use]
    pub fn max_backups(mut self, n: usize) -> Self {
        self.max_backups = n;
        self
    }

    /// Set the time zone used to stamp archive names.
    ///
    /// Default to the system time zone.
    #[must_use]
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.tz = Some(tz);
        self
    }

    /// Set the trap receiving errors that cannot be returned to a writer, such as a failure to
    /// delete an old archive.
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.trap = trap.into();
        self
    }

    #[cfg(test)]
    fn clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Builds the [`TimeRotateWriter`] and opens its file.
    pub fn build(self) -> Result<TimeRotateWriter, Error> {
        let Self {
            filename,
            interval_minutes,
            max_backups,
            tz,
            clock,
            trap,
        } = self;

        if filename.as_os_str().is_empty() {
            return Err(Error::new("filename must not be empty"));
        }
        if interval_minutes == 0 {
            return Err(Error::new("rotation interval must be positive"));
        }

        let interval = i64::from(interval_minutes) * 60;
        let now = clock.epoch_seconds();
        let mut state = State {
            filename,
            interval,
            max_backups,
            tz: tz.unwrap_or_else(TimeZone::system),
            clock,
            trap,
            file: None,
            rotate_at: next_rotate_at(now, interval),
        };
        state.open()?;

        Ok(TimeRotateWriter {
            state: Mutex::new(state),
        })
    }
}

fn next_rotate_at(now: i64, interval: i64) -> i64 {
    now - now.rem_euclid(60) + interval
}

#[derive(Debug)]
struct State {
    filename: PathBuf,
    // seconds
    interval: i64,
    max_backups: usize,
    tz: TimeZone,
    clock: Clock,
    trap: Box<dyn Trap>,
    file: Option<File>,
    // epoch seconds
    rotate_at: i64,
}

impl State {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.file.is_none() {
            self.open()?;
        }

        let now = self.clock.epoch_seconds();
        if now >= self.rotate_at {
            self.rotate(now)?;
        }

        match self.file.as_mut() {
            Some(file) => file.write(buf),
            None => Err(io::Error::other("rotating file is not open")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }

    fn open(&mut self) -> Result<(), Error> {
        if let Some(dir) = self.filename.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|err| {
                Error::new("failed to create log directory")
                    .with_context("path", dir.display())
                    .with_source(err)
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.filename)
            .map_err(|err| {
                Error::new("failed to open log file")
                    .with_context("path", self.filename.display())
                    .with_source(err)
            })?;
        self.file = Some(file);
        Ok(())
    }

    fn close(&mut self) -> Result<(), Error> {
        let Some(mut file) = self.file.take() else {
            return Ok(());
        };

        file.flush().map_err(|err| {
            Error::new("failed to flush log file")
                .with_context("path", self.filename.display())
                .with_source(err)
        })
    }

    fn rotate(&mut self, now: i64) -> Result<(), Error> {
        self.close()?;

        let archive = self.archive_path(self.rotate_at - self.interval)?;
        match fs::remove_file(&archive) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(Error::new("failed to remove existing archive")
                    .with_context("path", archive.display())
                    .with_source(err));
            }
        }

        fs::rename(&self.filename, &archive).map_err(|err| {
            Error::new("failed to archive log file")
                .with_context("from", self.filename.display())
                .with_context("to", archive.display())
                .with_source(err)
        })?;

        // the archive is already in place; a failed cleanup must not hold back the new file
        if self.max_backups > 0 {
            if let Err(err) = self.delete_oldest_archives() {
                let err = Error::new("failed to delete oldest archives").with_source(err);
                self.trap.trap(&err);
            }
        }

        self.rotate_at = next_rotate_at(now, self.interval);
        self.open()
    }

    fn archive_path(&self, covered_from: i64) -> Result<PathBuf, Error> {
        let ts = Timestamp::from_second(covered_from)
            .map_err(|err| Error::new("rotation time is out of range").with_source(err))?;
        let stamp = ts.to_zoned(self.tz.clone()).strftime(ARCHIVE_DATE_FORMAT);

        let mut name = OsString::from(self.filename.as_os_str());
        name.push(".");
        name.push(stamp.to_string());
        Ok(PathBuf::from(name))
    }

    fn log_dir(&self) -> &Path {
        match self.filename.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    // newest first
    fn list_archives(&self) -> Result<Vec<(String, PathBuf)>, Error> {
        let base = self
            .filename
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::new("log filename is not valid UTF-8"))?;
        let prefix = format!("{base}.");

        let dir = self.log_dir();
        let read_dir = fs::read_dir(dir).map_err(|err| {
            Error::new("failed to read log dir")
                .with_context("path", dir.display())
                .with_source(err)
        })?;

        let mut archives = read_dir
            .filter_map(|entry| {
                let entry = entry.ok()?;
                let filename = entry.file_name();
                // if the filename is not a UTF-8 string, skip it.
                let filename = filename.to_str()?;
                let stamp = filename.strip_prefix(&prefix)?;
                if !is_archive_stamp(stamp) {
                    return None;
                }

                let metadata = entry.metadata().ok()?;
                if !metadata.is_file() {
                    return None;
                }

                Some((stamp.to_string(), entry.path()))
            })
            .collect::<Vec<_>>();

        // fixed width digits sort like the times they encode
        archives.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(archives)
    }

    fn delete_oldest_archives(&self) -> Result<(), Error> {
        let archives = self.list_archives()?;
        for (_, filepath) in archives.iter().skip(self.max_backups) {
            fs::remove_file(filepath).map_err(|err| {
                Error::new("failed to remove old archive")
                    .with_context("path", filepath.display())
                    .with_source(err)
            })?;
        }
        Ok(())
    }
}

fn is_archive_stamp(stamp: &str) -> bool {
    if stamp.len() != ARCHIVE_DATE_LEN || !stamp.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let field = |range: std::ops::Range<usize>| stamp[range].parse::<i16>().ok();
    let (Some(year), Some(month), Some(day), Some(hour), Some(minute)) = (
        field(0..4),
        field(4..6),
        field(6..8),
        field(8..10),
        field(10..12),
    ) else {
        return false;
    };

    DateTime::new(
        year,
        month as i8,
        day as i8,
        hour as i8,
        minute as i8,
        0,
        0,
    )
    .is_ok()
}
