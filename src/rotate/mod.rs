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

//! A file writer that rotates on a fixed time interval.
//!
//! The active file keeps its configured name. At every interval boundary it is renamed to
//! `<filename>.<YYYYMMDDHHMM>`, stamped with the start of the interval it covers, and a fresh
//! file is opened in its place.

mod clock;
mod writer;

pub use self::writer::TimeRotateWriter;
pub use self::writer::TimeRotateWriterBuilder;
