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

//! A handler that decouples producers from a slow inner handler.

use std::sync::Arc;
use std::thread::JoinHandle;

use arc_swap::ArcSwapOption;
use crossbeam_channel::Sender;
use crossbeam_channel::TrySendError;

use crate::Error;
use crate::handler::Handler;
use crate::record::Record;
use crate::trap::DefaultTrap;
use crate::trap::Trap;

use self::worker::Worker;

mod worker;

pub(crate) enum Message {
    Record(Record),
    Flush,
}

// Taken out by the guard on shutdown. The worker stops once every sender is gone, which happens
// only after the last in-flight send has completed, so nothing accepted is left in the queue.
type SharedSender = Arc<ArcSwapOption<Sender<Message>>>;

/// What [`Buffered::handle`] does when the queue is full.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[non_exhaustive]
pub enum Overflow {
    /// Blocks the caller until the worker makes room.
    Block,
    /// Drops the incoming record and returns `Ok`.
    DropIncoming,
}

/// A handler that queues records for a dedicated worker thread.
///
/// [`handle`](Handler::handle) enqueues a copy of the record and returns. The worker hands
/// records to the inner handler one at a time, strictly in enqueue order. With a capacity of `0`
/// the queue is a rendezvous: every enqueue waits until the worker takes the record.
///
/// The worker runs until the [`BufferedGuard`] returned alongside the handler is shut down or
/// dropped. Leaking the guard leaks the worker thread. Errors returned by the inner handler on
/// the worker are sent to the configured [`Trap`].
///
/// # Examples
///
/// ```
/// use ctxlog::Logger;
/// use ctxlog::handler::Buffered;
/// use ctxlog::handler::Testing;
///
/// let (buffered, guard) = Buffered::new(1024, Testing::default()).unwrap();
/// let logger = Logger::new(());
/// logger.set_handler(buffered);
/// logger.info("queued", ());
///
/// // drain the queue and stop the worker
/// guard.shutdown().unwrap();
/// ```
#[derive(Debug)]
pub struct Buffered {
    sender: SharedSender,
    overflow: Overflow,
}

impl Buffered {
    /// Create a buffered handler with a queue of `capacity` records, blocking when full.
    pub fn new(
        capacity: usize,
        inner: impl Into<Box<dyn Handler>>,
    ) -> Result<(Buffered, BufferedGuard), Error> {
        BufferedBuilder::new("ctxlog-buffered")
            .capacity(capacity)
            .build(inner)
    }

    fn send(&self, message: Message) -> Result<(), Error> {
        // the loaded guard keeps the sender, and so the channel, alive until this send is done
        let sender = self.sender.load();
        let Some(sender) = &*sender else {
            return Err(Error::new("buffered handler worker has stopped"));
        };

        match self.overflow {
            Overflow::Block => sender
                .send(message)
                .map_err(|_| Error::new("buffered handler worker has stopped")),
            Overflow::DropIncoming => match sender.try_send(message) {
                Ok(()) | Err(TrySendError::Full(_)) => Ok(()),
                Err(TrySendError::Disconnected(_)) => {
                    Err(Error::new("buffered handler worker has stopped"))
                }
            },
        }
    }
}

impl Handler for Buffered {
    fn handle(&self, record: &Record) -> Result<(), Error> {
        self.send(Message::Record(record.clone()))
    }

    fn flush(&self) -> Result<(), Error> {
        self.send(Message::Flush)
    }
}

/// Owns the worker thread of a [`Buffered`] handler.
///
/// Shutting the guard down, explicitly or by dropping it, closes the queue to new records, lets
/// the worker deliver every record already accepted, flushes the inner handler and joins the
/// thread.
#[derive(Debug)]
pub struct BufferedGuard {
    sender: SharedSender,
    handle: Option<JoinHandle<()>>,
}

impl BufferedGuard {
    /// Drain the queue and stop the worker.
    pub fn shutdown(mut self) -> Result<(), Error> {
        self.stop()
    }

    fn stop(&mut self) -> Result<(), Error> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        // senders still held by in-flight calls keep the worker draining until they finish
        drop(self.sender.swap(None));
        handle
            .join()
            .map_err(|_| Error::new("buffered handler worker panicked"))
    }
}

impl Drop for BufferedGuard {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            DefaultTrap::default().trap(&err);
        }
    }
}

/// A builder for configuring a [`Buffered`] handler.
#[derive(Debug)]
pub struct BufferedBuilder {
    thread_name: String,
    capacity: usize,
    overflow: Overflow,
    trap: Box<dyn Trap>,
}

impl BufferedBuilder {
    /// Create a new builder; the worker thread will carry `thread_name`.
    pub fn new(thread_name: impl Into<String>) -> Self {
        Self {
            thread_name: thread_name.into(),
            capacity: 0,
            overflow: Overflow::Block,
            trap: Box::new(DefaultTrap::default()),
        }
    }

    /// Set the number of records the queue holds.
    ///
    /// Default to `0`, a synchronous hand-off.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Block the caller when the queue is full. This is the default.
    pub fn overflow_block(mut self) -> Self {
        self.overflow = Overflow::Block;
        self
    }

    /// Drop incoming records when the queue is full.
    pub fn overflow_drop_incoming(mut self) -> Self {
        self.overflow = Overflow::DropIncoming;
        self
    }

    /// Set the trap receiving errors of the inner handler.
    ///
    /// Default to [`DefaultTrap`].
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.trap = trap.into();
        self
    }

    /// Spawn the worker and build the handler.
    pub fn build(
        self,
        inner: impl Into<Box<dyn Handler>>,
    ) -> Result<(Buffered, BufferedGuard), Error> {
        let Self {
            thread_name,
            capacity,
            overflow,
            trap,
        } = self;

        let (sender, receiver) = crossbeam_channel::bounded(capacity);
        let sender: SharedSender = Arc::new(ArcSwapOption::from_pointee(sender));
        let worker = Worker::new(inner.into(), receiver, trap);
        let handle = std::thread::Builder::new()
            .name(thread_name)
            .spawn(move || worker.run())
            .map_err(|err| Error::new("failed to spawn buffered handler worker").with_source(err))?;

        let buffered = Buffered {
            sender: Arc::clone(&sender),
            overflow,
        };
        let guard = BufferedGuard {
            sender,
            handle: Some(handle),
        };
        Ok((buffered, guard))
    }
}
