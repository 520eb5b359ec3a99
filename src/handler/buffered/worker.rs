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

use crossbeam_channel::Receiver;

use crate::Error;
use crate::handler::Handler;
use crate::handler::buffered::Message;
use crate::trap::Trap;

pub(super) struct Worker {
    inner: Box<dyn Handler>,
    receiver: Receiver<Message>,
    trap: Box<dyn Trap>,
}

impl Worker {
    pub(super) fn new(
        inner: Box<dyn Handler>,
        receiver: Receiver<Message>,
        trap: Box<dyn Trap>,
    ) -> Self {
        Self {
            inner,
            receiver,
            trap,
        }
    }

    pub(super) fn run(self) {
        let Self {
            inner,
            receiver,
            trap,
        } = self;

        while let Ok(message) = receiver.recv() {
            match message {
                Message::Record(record) => {
                    if let Err(err) = inner.handle(&record) {
                        let err = Error::new("failed to handle buffered record").with_source(err);
                        trap.trap(&err);
                    }
                }
                Message::Flush => {
                    if let Err(err) = inner.flush() {
                        let err = Error::new("failed to flush").with_source(err);
                        trap.trap(&err);
                    }
                }
            }
        }

        if let Err(err) = inner.flush() {
            let err = Error::new("failed to flush on shutdown").with_source(err);
            trap.trap(&err);
        }
    }
}
