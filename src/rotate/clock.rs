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

use jiff::Timestamp;

/// The time source of a rotating writer, read in whole epoch seconds.
///
/// Tests pin it to a fixed instant and move it explicitly to cross rotation boundaries.
#[derive(Debug, Default)]
pub(super) struct Clock {
    #[cfg(test)]
    pinned: Option<Timestamp>,
}

impl Clock {
    pub(super) fn system() -> Self {
        Clock::default()
    }

    pub(super) fn epoch_seconds(&self) -> i64 {
        self.now().as_second()
    }

    fn now(&self) -> Timestamp {
        #[cfg(test)]
        if let Some(now) = self.pinned {
            return now;
        }
        Timestamp::now()
    }

    #[cfg(test)]
    pub(super) fn pinned(now: Timestamp) -> Self {
        Clock { pinned: Some(now) }
    }

    #[cfg(test)]
    pub(super) fn set_now(&mut self, now: Timestamp) {
        self.pinned = Some(now);
    }
}
