//! Capture values: plain JSON, reactive signals, and async resources.
//!
//! Signals and resources are polymorphic host values with distinct
//! identification rules. They are modelled as tagged variants with explicit
//! predicates; the order of the predicates matters, because a resource also
//! exposes a current sample and therefore structurally satisfies the signal
//! shape. Resolution always tests for resources first.

use crate::TaskError;
use futures_util::future::{self, BoxFuture, FutureExt};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, RwLock};

/// A reactive value whose current sample is read through [`Signal::value`].
/// The runtime reads signals but never mutates them; `set` exists for the
/// framework side.
#[derive(Clone, Default)]
pub struct Signal {
    inner: Arc<RwLock<Value>>,
}

impl Signal {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(value.into())),
        }
    }

    /// The current sample.
    pub fn value(&self) -> Value {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn set(&self, value: impl Into<Value>) {
        *self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = value.into();
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signal").field(&self.value()).finish()
    }
}

/// Lifecycle of a resource's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    Pending,
    Resolved,
    Rejected,
}

/// A reactive asynchronous value: a state, an optional settled payload, and
/// a future of the payload. When the state is `Resolved` the payload is
/// authoritative; in every other state the future must be awaited before
/// serialisation.
pub struct Resource {
    state: ResourceState,
    value: Option<Value>,
    promise: Option<BoxFuture<'static, Result<Value, TaskError>>>,
}

impl Resource {
    /// A resource that already settled with `value`.
    pub fn resolved(value: impl Into<Value>) -> Self {
        Self {
            state: ResourceState::Resolved,
            value: Some(value.into()),
            promise: None,
        }
    }

    /// A resource still loading; `future` yields the payload.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<Value, TaskError>> + Send + 'static,
    {
        Self {
            state: ResourceState::Pending,
            value: None,
            promise: Some(future.boxed()),
        }
    }

    /// A resource that failed to load. Awaiting it reproduces the failure.
    pub fn rejected(message: impl Into<String>) -> Self {
        let error = TaskError::Resource(message.into());
        Self {
            state: ResourceState::Rejected,
            value: None,
            promise: Some(future::ready(Err(error)).boxed()),
        }
    }

    pub fn state(&self) -> ResourceState {
        self.state
    }

    /// The current sample, when one has settled. This is what makes a
    /// resource look like a signal to a structural test.
    pub fn sample(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Consume the resource into either an immediate payload or the future
    /// that must be awaited.
    pub(crate) fn into_resolution(self) -> Resolution {
        match self.state {
            ResourceState::Resolved => {
                Resolution::Ready(self.value.unwrap_or(Value::Null))
            }
            ResourceState::Pending | ResourceState::Rejected => {
                let promise = self.promise.unwrap_or_else(|| {
                    future::ready(Err(TaskError::Resource(
                        "resource has no promise to await".to_string(),
                    )))
                    .boxed()
                });
                Resolution::Await(promise)
            }
        }
    }
}

pub(crate) enum Resolution {
    Ready(Value),
    Await(BoxFuture<'static, Result<Value, TaskError>>),
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("state", &self.state)
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

/// One captured value as handed to [`crate::use_inline_task`].
#[derive(Debug)]
pub enum ScopeValue {
    /// Explicitly absent; the key vanishes from the serialised object the
    /// way `undefined` vanishes under JSON
    Undefined,
    /// Any directly serialisable value
    Plain(Value),
    Signal(Signal),
    Resource(Resource),
}

impl ScopeValue {
    /// Resource detection strictly precedes signal detection.
    pub fn is_resource(&self) -> bool {
        matches!(self, Self::Resource(_))
    }

    /// Structural signal test: anything with a current sample. Resources
    /// pass it too, which is why [`Self::is_resource`] must be asked first.
    pub fn is_signal(&self) -> bool {
        matches!(self, Self::Signal(_) | Self::Resource(_))
    }
}

impl From<Value> for ScopeValue {
    fn from(value: Value) -> Self {
        Self::Plain(value)
    }
}

impl From<Signal> for ScopeValue {
    fn from(signal: Signal) -> Self {
        Self::Signal(signal)
    }
}

impl From<Resource> for ScopeValue {
    fn from(resource: Resource) -> Self {
        Self::Resource(resource)
    }
}

impl From<&str> for ScopeValue {
    fn from(value: &str) -> Self {
        Self::Plain(Value::from(value))
    }
}

impl From<String> for ScopeValue {
    fn from(value: String) -> Self {
        Self::Plain(Value::from(value))
    }
}

impl From<bool> for ScopeValue {
    fn from(value: bool) -> Self {
        Self::Plain(Value::from(value))
    }
}

impl From<i32> for ScopeValue {
    fn from(value: i32) -> Self {
        Self::Plain(Value::from(value))
    }
}

impl From<i64> for ScopeValue {
    fn from(value: i64) -> Self {
        Self::Plain(Value::from(value))
    }
}

impl From<u64> for ScopeValue {
    fn from(value: u64) -> Self {
        Self::Plain(Value::from(value))
    }
}

impl From<f64> for ScopeValue {
    /// NaN and the infinities are not representable in JSON and collapse
    /// to null, matching the serialiser's documented lossy behaviour.
    fn from(value: f64) -> Self {
        Self::Plain(serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number))
    }
}

/// Ordered capture mapping. Iteration order is insertion order, and the
/// serialised object reproduces it.
#[derive(Debug, Default)]
pub struct Captures {
    entries: Vec<(String, ScopeValue)>,
}

impl Captures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a capture, replacing any existing entry with the same name in
    /// place so order is stable.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ScopeValue>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.entries.push((name, value));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScopeValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub(crate) fn into_entries(self) -> Vec<(String, ScopeValue)> {
        self.entries
    }
}

/// Build a [`Captures`] mapping from `name: value` pairs:
///
/// ```
/// use sprig_runtime::{captures, Signal};
///
/// let caps = captures! { count: 41, label: "items", live: Signal::new(true) };
/// assert_eq!(caps.len(), 3);
/// ```
#[macro_export]
macro_rules! captures {
    () => { $crate::Captures::new() };
    ($($name:ident : $value:expr),+ $(,)?) => {{
        let mut captures = $crate::Captures::new();
        $(captures.insert(stringify!($name), $value);)+
        captures
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_sample_and_set() {
        let signal = Signal::new(1);
        assert_eq!(signal.value(), Value::from(1));
        signal.set("updated");
        assert_eq!(signal.value(), Value::from("updated"));
    }

    #[test]
    fn test_resource_detection_precedes_signal() {
        let resource = ScopeValue::from(Resource::resolved(42));
        // A resolved resource carries a sample, so the structural signal
        // test passes; the resource test must win.
        assert!(resource.is_signal());
        assert!(resource.is_resource());

        let signal = ScopeValue::from(Signal::new(42));
        assert!(signal.is_signal());
        assert!(!signal.is_resource());
    }

    #[test]
    fn test_non_finite_floats_collapse_to_null() {
        assert!(matches!(
            ScopeValue::from(f64::NAN),
            ScopeValue::Plain(Value::Null)
        ));
        assert!(matches!(
            ScopeValue::from(f64::INFINITY),
            ScopeValue::Plain(Value::Null)
        ));
    }

    #[test]
    fn test_captures_insert_keeps_order() {
        let mut caps = Captures::new();
        caps.insert("b", 2).insert("a", 1).insert("b", 3);

        let names: Vec<&str> = caps.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
