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

//! The [`Str`] type.
//!
//! A [`Str`] holds either a `'static` string or a shared, reference counted one, so records and
//! contexts can be cloned across handlers and threads without copying string data.

use std::borrow::Borrow;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::Arc;

/// A cheaply clonable string.
#[derive(Clone)]
pub enum Str {
    /// A string borrowed for `'static`.
    Static(&'static str),
    /// A string shared through an `Arc`.
    Shared(Arc<str>),
}

impl Str {
    /// Create a new string from a value borrowed for `'static`.
    pub const fn new(s: &'static str) -> Self {
        Str::Static(s)
    }

    /// Create a string from a shared value.
    pub fn new_shared(s: impl Into<Arc<str>>) -> Self {
        Str::Shared(s.into())
    }

    /// Get a reference to the underlying string.
    pub fn get(&self) -> &str {
        match self {
            Str::Static(s) => s,
            Str::Shared(s) => s,
        }
    }
}

impl Default for Str {
    fn default() -> Self {
        Str::new("")
    }
}

impl fmt::Debug for Str {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.get(), f)
    }
}

impl fmt::Display for Str {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.get(), f)
    }
}

impl PartialEq for Str {
    fn eq(&self, other: &Self) -> bool {
        PartialEq::eq(self.get(), other.get())
    }
}

impl Eq for Str {}

impl PartialEq<str> for Str {
    fn eq(&self, other: &str) -> bool {
        self.get() == other
    }
}

impl PartialEq<&str> for Str {
    fn eq(&self, other: &&str) -> bool {
        self.get() == *other
    }
}

impl PartialOrd for Str {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Str {
    fn cmp(&self, other: &Self) -> Ordering {
        Ord::cmp(self.get(), other.get())
    }
}

impl Hash for Str {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Hash::hash(self.get(), state)
    }
}

impl Borrow<str> for Str {
    fn borrow(&self) -> &str {
        self.get()
    }
}

impl AsRef<str> for Str {
    fn as_ref(&self) -> &str {
        self.get()
    }
}

impl From<&'static str> for Str {
    fn from(s: &'static str) -> Self {
        Str::new(s)
    }
}

impl From<String> for Str {
    fn from(s: String) -> Self {
        Str::new_shared(s)
    }
}

impl From<Arc<str>> for Str {
    fn from(s: Arc<str>) -> Self {
        Str::Shared(s)
    }
}

impl From<Cow<'static, str>> for Str {
    fn from(s: Cow<'static, str>) -> Self {
        match s {
            Cow::Borrowed(s) => Str::new(s),
            Cow::Owned(s) => Str::new_shared(s),
        }
    }
}
