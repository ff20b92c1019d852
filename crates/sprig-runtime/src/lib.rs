//! Render-time runtime for inline-script tasks.
//!
//! The build-time transformer rewrites `useInlineTask` calls so every outer
//! reference travels through an explicit capture object; this crate is the
//! other half of that contract. Given the serialised callback source and the
//! captures, it:
//!
//! - resolves each capture: resources first (awaiting unresolved ones),
//!   then signals (sampling `value`), then plain values;
//! - serialises the resolved mapping to JSON in capture order;
//! - escapes the assembled self-invoking source against script-tag
//!   breakout (`</` and `<!--`);
//! - returns a [`ScriptElement`], synchronously when nothing was pending and
//!   as a future otherwise.
//!
//! ```
//! use sprig_runtime::{captures, use_inline_task, Signal};
//!
//! let task = use_inline_task(
//!     "(__scope) => { console.log(__scope.count); }",
//!     Some(captures! { count: Signal::new(3) }),
//! );
//! let element = task.ready().expect("no pending resources");
//! assert_eq!(
//!     element.to_html(),
//!     "<script>((__scope) => { console.log(__scope.count); })({\"count\":3})</script>",
//! );
//! ```
//!
//! The runtime never executes the user callback server-side; it only
//! serialises it. Values JSON cannot represent are lossy by contract:
//! `undefined` disappears, NaN and the infinities become null.

mod element;
mod escape;
mod task;
mod value;

pub use element::ScriptElement;
pub use escape::escape_script;
pub use task::{use_inline_task, InlineTask};
pub use value::{Captures, Resource, ResourceState, ScopeValue, Signal};

use thiserror::Error;

/// Failures the runtime can produce at render time.
#[derive(Debug, Error)]
pub enum TaskError {
    /// A capture could not be serialised to JSON.
    #[error("capture `{name}` cannot be serialised: {source}")]
    Serialize {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// A resource rejected; the render fails with it.
    #[error("resource rejected: {0}")]
    Resource(String),
}
