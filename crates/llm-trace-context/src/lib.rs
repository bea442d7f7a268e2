//! Execution context propagation for prediction requests.
//!
//! Instrumentation needs to know which request, and therefore which trace,
//! the code it observes belongs to. Instead of threading that through every
//! call, the serving layer binds an [`ExecutionContext`] for the duration of
//! the request and instrumentation reads it back with [`current_context`].
//!
//! Bindings are local to the logical execution: a thread for synchronous
//! code, a future for async code. Concurrent requests never observe each
//! other's context, and nested scopes restore the outer binding on exit.
//!
//! # Example
//!
//! ```rust
//! use llm_trace_context::{current_context, enter_scope, update_current_context, ExecutionContext};
//!
//! let ctx = ExecutionContext::new().with_request_id("req-1");
//! {
//!     let _scope = enter_scope(Some(ctx));
//!     update_current_context([("model_id", serde_json::json!("m-1"))]).unwrap();
//!     assert_eq!(current_context().unwrap().model_id.as_deref(), Some("m-1"));
//! }
//! assert!(current_context().is_none());
//! ```

pub mod context;
pub mod error;
pub mod scope;

pub use context::{ContextField, ExecutionContext};
pub use error::{ContextError, Result};
pub use scope::{
    current_context, enter_scope, enter_scope_value, inherit, scoped, update_current_context,
    with_context, with_current_context, ContextFutureExt, ContextScope, Scoped,
};
