//! The render-time inline-task entry point.
//!
//! [`use_inline_task`] receives the serialised callback source and the
//! captures the build-time rewrite attached to the call. It resolves each
//! capture (resources first, then signals, then plain values), serialises
//! the resolved mapping to JSON in capture order, escapes the assembled
//! self-invoking source against script-tag breakout, and produces the
//! `<script>` element.
//!
//! The synchronous path never suspends. When at least one resource has not
//! resolved yet, the call returns a pending task instead; it suspends at
//! exactly one point, the join across all pending resource futures, and the
//! element it eventually produces is byte-identical to what the synchronous
//! path would have emitted had the resources been settled up front.

use crate::element::ScriptElement;
use crate::escape::escape_script;
use crate::value::{Captures, Resolution, ScopeValue};
use crate::TaskError;
use futures_util::future::{join_all, BoxFuture};
use futures_util::FutureExt;
use serde_json::Value;
use std::fmt;

/// A produced script element, or the promise of one.
pub enum InlineTask {
    /// No capture required awaiting; the element is ready.
    Ready(ScriptElement),
    /// At least one resource was unresolved; await to get the element.
    Pending(BoxFuture<'static, Result<ScriptElement, TaskError>>),
}

impl InlineTask {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// The element, when the synchronous path produced one.
    pub fn ready(self) -> Option<ScriptElement> {
        match self {
            Self::Ready(element) => Some(element),
            Self::Pending(_) => None,
        }
    }

    /// Drive the task to completion. The ready path resolves immediately.
    pub async fn resolve(self) -> Result<ScriptElement, TaskError> {
        match self {
            Self::Ready(element) => Ok(element),
            Self::Pending(future) => future.await,
        }
    }
}

impl fmt::Debug for InlineTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(element) => f.debug_tuple("Ready").field(element).finish(),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// Produce a `<script>` element applying `callable` to its captures.
///
/// Without captures the script body is `(<callable>)()`. With captures,
/// each entry resolves as follows:
///
/// - a resource in the `resolved` state contributes its payload;
/// - a resource in any other state is awaited through its promise;
/// - a signal contributes its current sample;
/// - anything else is taken as-is, and an explicit undefined vanishes.
pub fn use_inline_task(callable: impl Into<String>, captures: Option<Captures>) -> InlineTask {
    let callable = callable.into();

    let captures = match captures {
        Some(captures) if !captures.is_empty() => captures,
        _ => return InlineTask::Ready(emit(&callable, None)),
    };

    // Slots keep capture order; pending resources fill theirs later.
    let mut slots: Vec<(String, Option<Value>)> = Vec::new();
    let mut pending: Vec<(usize, BoxFuture<'static, Result<Value, TaskError>>)> = Vec::new();

    for (name, value) in captures.into_entries() {
        match value {
            // `undefined` vanishes under JSON serialisation.
            ScopeValue::Undefined => {}
            // Resources are tested before signals; a resolved resource's
            // payload is authoritative even though it also has a sample.
            ScopeValue::Resource(resource) => match resource.into_resolution() {
                Resolution::Ready(value) => slots.push((name, Some(value))),
                Resolution::Await(future) => {
                    slots.push((name, None));
                    pending.push((slots.len() - 1, future));
                }
            },
            ScopeValue::Signal(signal) => slots.push((name, Some(signal.value()))),
            ScopeValue::Plain(value) => slots.push((name, Some(value))),
        }
    }

    if pending.is_empty() {
        return match serialize_slots(&slots) {
            Ok(json) => InlineTask::Ready(emit(&callable, Some(&json))),
            Err(error) => InlineTask::Pending(futures_util::future::ready(Err(error)).boxed()),
        };
    }

    log::debug!(
        "inline task awaiting {} pending resource(s) of {} capture(s)",
        pending.len(),
        slots.len()
    );

    InlineTask::Pending(
        async move {
            let (indices, futures): (Vec<usize>, Vec<_>) = pending.into_iter().unzip();
            // The single suspension point: all pending resources settle
            // together. A rejection fails the whole render.
            let results = join_all(futures).await;
            for (index, result) in indices.into_iter().zip(results) {
                slots[index].1 = Some(result?);
            }
            let json = serialize_slots(&slots)?;
            Ok(emit(&callable, Some(&json)))
        }
        .boxed(),
    )
}

/// Serialise the resolved mapping, preserving slot order.
fn serialize_slots(slots: &[(String, Option<Value>)]) -> Result<String, TaskError> {
    let mut out = String::from("{");
    let mut first = true;

    for (name, value) in slots {
        let Some(value) = value else { continue };
        if !first {
            out.push(',');
        }
        first = false;

        out.push_str(&serde_json::to_string(name).map_err(|source| TaskError::Serialize {
            name: name.clone(),
            source,
        })?);
        out.push(':');
        out.push_str(&serde_json::to_string(value).map_err(|source| TaskError::Serialize {
            name: name.clone(),
            source,
        })?);
    }

    out.push('}');
    Ok(out)
}

fn emit(callable: &str, json: Option<&str>) -> ScriptElement {
    let script = match json {
        Some(json) => format!("({})({})", callable, json),
        None => format!("({})()", callable),
    };
    ScriptElement::new(escape_script(&script))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Resource, Signal};
    use crate::{captures, TaskError};
    use serde_json::Value;

    #[test]
    fn test_no_captures_is_bare_invocation() {
        let task = use_inline_task("() => { console.log('hi'); }", None);
        let element = task.ready().expect("synchronous");
        assert_eq!(
            element.inner_html(),
            "(() => { console.log('hi'); })()"
        );
    }

    #[test]
    fn test_plain_captures_serialise_in_order() {
        let task = use_inline_task(
            "(__scope) => { use(__scope.b, __scope.a); }",
            Some(captures! { b: 2, a: 1 }),
        );
        let element = task.ready().expect("synchronous");
        assert!(element.inner_html().ends_with(r#"({"b":2,"a":1})"#));
    }

    #[test]
    fn test_signal_contributes_current_sample() {
        let signal = Signal::new("first");
        signal.set("second");
        let task = use_inline_task("(s) => s.label", Some(captures! { label: signal }));
        let element = task.ready().expect("synchronous");
        assert!(element.inner_html().contains(r#""label":"second""#));
    }

    #[test]
    fn test_resolved_resource_is_synchronous() {
        let task = use_inline_task(
            "(s) => s.d",
            Some(captures! { d: Resource::resolved(42) }),
        );
        let element = task.ready().expect("synchronous");
        assert!(element.inner_html().contains(r#""d":42"#));
    }

    #[test]
    fn test_undefined_capture_vanishes() {
        let mut caps = Captures::new();
        caps.insert("gone", ScopeValue::Undefined);
        caps.insert("kept", 1);

        let element = use_inline_task("(s) => s", Some(caps)).ready().unwrap();
        assert!(element.inner_html().ends_with(r#"({"kept":1})"#));
    }

    #[test]
    fn test_empty_captures_behave_like_none() {
        let element = use_inline_task("() => {}", Some(Captures::new()))
            .ready()
            .unwrap();
        assert_eq!(element.inner_html(), "(() => {})()");
    }

    #[test]
    fn test_script_breakout_is_escaped() {
        let task = use_inline_task(
            "(s) => { el.innerHTML = s.s; }",
            Some(captures! { s: "</script><script>alert(1)</script>" }),
        );
        let element = task.ready().expect("synchronous");

        let lower = element.inner_html().to_ascii_lowercase();
        assert!(!lower.contains("</script"));
        assert!(!element.inner_html().contains("<!--"));
        assert!(element.inner_html().contains(r"<\/script>"));
    }

    #[tokio::test]
    async fn test_pending_resource_returns_promise() {
        let resource = Resource::pending(async { Ok(Value::from(42)) });
        let task = use_inline_task("(s) => s.d", Some(captures! { d: resource }));

        assert!(!task.is_ready());
        let element = task.resolve().await.expect("resource settles");
        assert!(element.inner_html().contains(r#""d":42"#));
    }

    #[tokio::test]
    async fn test_async_output_matches_synchronous_path() {
        let sync_element = use_inline_task(
            "(s) => s.d",
            Some(captures! { d: Resource::resolved(42), tag: "x" }),
        )
        .ready()
        .unwrap();

        let pending = Resource::pending(async { Ok(Value::from(42)) });
        let async_element = use_inline_task(
            "(s) => s.d",
            Some(captures! { d: pending, tag: "x" }),
        )
        .resolve()
        .await
        .unwrap();

        assert_eq!(sync_element, async_element);
    }

    #[tokio::test]
    async fn test_rejected_resource_fails_the_render() {
        let task = use_inline_task(
            "(s) => s.d",
            Some(captures! { d: Resource::rejected("fetch failed") }),
        );

        assert!(!task.is_ready());
        let error = task.resolve().await.expect_err("rejection propagates");
        assert!(matches!(error, TaskError::Resource(message) if message.contains("fetch failed")));
    }

    #[tokio::test]
    async fn test_mixed_captures_fill_in_order() {
        let task = use_inline_task(
            "(s) => s",
            Some(captures! {
                first: 1,
                second: Resource::pending(async { Ok(Value::from("late")) }),
                third: Signal::new(3),
            }),
        );

        let element = task.resolve().await.unwrap();
        assert!(element
            .inner_html()
            .ends_with(r#"({"first":1,"second":"late","third":3})"#));
    }
}
