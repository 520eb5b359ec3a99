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

//! Key-value pairs carried in a logger's and a record's context.
//!
//! A context is an ordered sequence of `(Key, Value)` pairs. It is not a map: duplicate keys are
//! legal and every occurrence is kept in insertion order.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt;
use std::panic;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::Error;
use crate::str::Str;

/// The reserved key under which the logging pipeline reports its own problems, e.g. a lazy
/// value that failed to resolve.
pub const ERROR_KEY: &str = "LOG_ERROR";

/// Represents a key in a key-value pair.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key(Str);

impl Key {
    /// Create a key from a `'static` str.
    pub const fn new(key: &'static str) -> Self {
        Key(Str::new(key))
    }

    /// Gets the key string.
    pub fn as_str(&self) -> &str {
        self.0.get()
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq<str> for Key {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Key {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl From<&'static str> for Key {
    fn from(key: &'static str) -> Self {
        Key::new(key)
    }
}

impl From<String> for Key {
    fn from(key: String) -> Self {
        Key(Str::new_shared(key))
    }
}

impl From<Str> for Key {
    fn from(key: Str) -> Self {
        Key(key)
    }
}

/// Represents a value in a key-value pair.
#[derive(Clone, Debug)]
pub enum Value {
    /// The absent value.
    Nil,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    I64(i64),
    /// An unsigned integer.
    U64(u64),
    /// A floating point number.
    F64(f64),
    /// A string.
    Str(Str),
    /// An error, rendered through its `Display` implementation.
    Error(Arc<dyn std::error::Error + Send + Sync>),
    /// A deferred computation, resolved when the record is assembled.
    Lazy(Lazy),
}

impl Value {
    /// Capture an error as a value.
    pub fn from_error(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Value::Error(Arc::new(err))
    }

    /// Render anything that implements `Display` into a string value.
    pub fn from_display(value: &dyn fmt::Display) -> Self {
        Value::Str(Str::new_shared(value.to_string()))
    }

    /// Whether this is [`Value::Nil`].
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Whether this is an unresolved [`Value::Lazy`].
    pub fn is_lazy(&self) -> bool {
        matches!(self, Value::Lazy(_))
    }

    /// The string content, if this is a [`Value::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.get()),
            _ => None,
        }
    }

    /// The value as `i64`, if it is an integer that fits.
    pub fn to_i64(&self) -> Option<i64> {
        match *self {
            Value::I64(v) => Some(v),
            Value::U64(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }
}

/// Floats are rendered with three fixed decimals; this is the logfmt wire contract.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v:.3}"),
            Value::Str(v) => f.write_str(v.get()),
            Value::Error(err) => write!(f, "{err}"),
            Value::Lazy(_) => f.write_str("<lazy>"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::I64(a), Value::U64(b)) | (Value::U64(b), Value::I64(a)) => {
                u64::try_from(*a).is_ok_and(|a| a == *b)
            }
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a.to_string() == b.to_string(),
            (Value::Lazy(a), Value::Lazy(b)) => Arc::ptr_eq(&a.0, &b.0),
            _ => false,
        }
    }
}

macro_rules! impl_from_int {
    ($variant:ident: $($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v as _)
                }
            }
        )*
    };
}

impl_from_int!(I64: i8, i16, i32, i64, isize);
impl_from_int!(U64: u8, u16, u32, u64, usize);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::F64(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&'static str> for Value {
    fn from(v: &'static str) -> Self {
        Value::Str(Str::new(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(Str::new_shared(v))
    }
}

impl From<Str> for Value {
    fn from(v: Str) -> Self {
        Value::Str(v)
    }
}

impl From<Lazy> for Value {
    fn from(v: Lazy) -> Self {
        Value::Lazy(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Nil, Into::into)
    }
}

type LazyFn = dyn Fn() -> Result<Value, Error> + Send + Sync;

/// A deferred value.
///
/// The computation runs every time a record carrying it is assembled, so a lazy value always
/// reflects the state at the time of the logging call. Nothing is cached between calls.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::AtomicUsize;
/// use std::sync::atomic::Ordering;
///
/// use ctxlog::kv::Lazy;
///
/// let hits = Arc::new(AtomicUsize::new(0));
/// let lazy = {
///     let hits = hits.clone();
///     Lazy::new(move || hits.load(Ordering::Relaxed))
/// };
/// ```
#[derive(Clone)]
pub struct Lazy(Arc<LazyFn>);

impl fmt::Debug for Lazy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Lazy")
    }
}

impl Lazy {
    /// Create a lazy value from an infallible computation.
    ///
    /// A panic inside `f` is contained and reported under [`ERROR_KEY`], but the process panic
    /// hook still runs first, so the default hook prints a panic report to stderr on every
    /// logging call that hits it. Computations that can fail should use [`Lazy::fallible`].
    pub fn new<F, V>(f: F) -> Self
    where
        F: Fn() -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        Lazy(Arc::new(move || Ok(f().into())))
    }

    /// Create a lazy value from a computation that may fail.
    ///
    /// A failure does not fail the logging call; it is reported under [`ERROR_KEY`] instead.
    pub fn fallible<F, V, E>(f: F) -> Self
    where
        F: Fn() -> Result<V, E> + Send + Sync + 'static,
        V: Into<Value>,
        E: Into<anyhow::Error>,
    {
        Lazy(Arc::new(move || {
            f().map(Into::into)
                .map_err(|err| Error::new("lazy computation failed").with_source(err))
        }))
    }

    /// Run the computation.
    ///
    /// Fails if the computation fails, panics, or yields another lazy value. A panic is caught
    /// after the panic hook has run.
    pub fn evaluate(&self) -> Result<Value, Error> {
        let f = &self.0;
        match panic::catch_unwind(AssertUnwindSafe(|| f())) {
            Ok(Ok(Value::Lazy(_))) => Err(Error::new("lazy value resolved to another lazy value")),
            Ok(result) => result,
            Err(payload) => {
                let reason = if let Some(s) = payload.downcast_ref::<&str>() {
                    (*s).to_string()
                } else if let Some(s) = payload.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "unknown panic".to_string()
                };
                Err(Error::new("lazy computation panicked").with_context("panic", reason))
            }
        }
    }
}

/// Conversion into an ordered list of key-value pairs.
///
/// Implemented for `()`, arrays and vectors of pairs, and the map types. Map iteration order is
/// whatever the map yields: sorted for `BTreeMap`, unspecified for `HashMap`. Callers that care
/// about output order should pass pairs instead of a `HashMap`.
pub trait IntoKeyValues {
    /// Performs the conversion.
    fn into_key_values(self) -> Vec<(Key, Value)>;
}

impl IntoKeyValues for () {
    fn into_key_values(self) -> Vec<(Key, Value)> {
        Vec::new()
    }
}

impl<K: Into<Key>, V: Into<Value>> IntoKeyValues for Vec<(K, V)> {
    fn into_key_values(self) -> Vec<(Key, Value)> {
        self.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
    }
}

impl<K: Into<Key>, V: Into<Value>, const N: usize> IntoKeyValues for [(K, V); N] {
    fn into_key_values(self) -> Vec<(Key, Value)> {
        self.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
    }
}

impl<K: Into<Key>, V: Into<Value>, S> IntoKeyValues for HashMap<K, V, S> {
    fn into_key_values(self) -> Vec<(Key, Value)> {
        self.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
    }
}

impl<K: Into<Key>, V: Into<Value>> IntoKeyValues for BTreeMap<K, V> {
    fn into_key_values(self) -> Vec<(Key, Value)> {
        self.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
    }
}

/// Build a list of key-value pairs with mixed value types.
///
/// # Examples
///
/// ```
/// use ctxlog::ctx;
///
/// let pairs = ctx!("x" => 1, "y" => 3.2, "name" => "alice");
/// assert_eq!(pairs.len(), 3);
/// ```
#[macro_export]
macro_rules! ctx {
    () => {
        ::std::vec::Vec::<($crate::kv::Key, $crate::kv::Value)>::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        ::std::vec![$(($crate::kv::Key::from($key), $crate::kv::Value::from($value))),+]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lazy_is_evaluated_each_time() {
        let counter = Arc::new(std::sync::atomic::AtomicI64::new(0));
        let lazy = {
            let counter = counter.clone();
            Lazy::new(move || counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1)
        };
        assert_eq!(lazy.evaluate().unwrap(), Value::I64(1));
        assert_eq!(lazy.evaluate().unwrap(), Value::I64(2));
    }

    #[test]
    fn test_lazy_failures() {
        let failing = Lazy::fallible(|| -> Result<i32, std::io::Error> {
            Err(std::io::Error::other("disk gone"))
        });
        let err = failing.evaluate().unwrap_err();
        assert!(err.to_string().contains("disk gone"), "{err}");

        let nested = Lazy::new(|| Lazy::new(|| 1));
        assert!(nested.evaluate().is_err());

        let panicking = Lazy::new(|| -> i32 { panic!("lazy exploded") });
        let err = panicking.evaluate().unwrap_err();
        assert!(err.to_string().contains("lazy exploded"), "{err}");
    }

    #[test]
    fn test_value_equality_across_integer_kinds() {
        assert_eq!(Value::from(7i32), Value::from(7u8));
        assert_ne!(Value::from(-1i64), Value::from(u64::MAX));
        assert_ne!(Value::Nil, Value::from("nil"));
        assert_eq!(Value::from(None::<i32>), Value::Nil);
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::from(3.2).to_string(), "3.200");
        assert_eq!(Value::from(1).to_string(), "1");
        assert_eq!(Value::Nil.to_string(), "nil");
        assert_eq!(
            Value::from_error(std::io::Error::other("bad fd")).to_string(),
            "bad fd"
        );
    }

    #[test]
    fn test_ctx_macro_keeps_order_and_duplicates() {
        let pairs = ctx!("a" => 1, "b" => "two", "a" => 3.0);
        let keys = pairs.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, ["a", "b", "a"]);
    }
}
