//! Binding an execution context to the current logical execution.
//!
//! Synchronous code binds a context to the calling thread with
//! [`enter_scope`]; the returned [`ContextScope`] restores the previous
//! binding when dropped, whichever way the block is left. Scopes nest as a
//! stack.
//!
//! Async code wraps a future with [`scoped`] (or [`ContextFutureExt`]). The
//! wrapped future installs its context only while it is being polled, so
//! tasks sharing a worker thread never see each other's binding.
//!
//! A child future created with [`inherit`] receives a copy of the caller's
//! context. Updates made by the child stay in the child.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};

use serde_json::Value;

use crate::context::ExecutionContext;
use crate::error::{ContextError, Result};

/// Binding saved by one active scope.
#[derive(Debug)]
struct SavedBinding {
    scope_id: u64,
    previous: Option<ExecutionContext>,
}

thread_local! {
    static CURRENT: RefCell<Option<ExecutionContext>> = const { RefCell::new(None) };
    static SAVED: RefCell<Vec<SavedBinding>> = const { RefCell::new(Vec::new()) };
    static NEXT_SCOPE_ID: Cell<u64> = const { Cell::new(0) };
}

/// Guard for one binding. Dropping it restores the binding that was current
/// when the scope was entered.
///
/// Exiting a scope also exits every scope entered after it. A guard whose
/// scope was already exited that way does nothing when dropped. The guard is
/// tied to the thread that created it and cannot be sent to another thread.
#[must_use = "the context is unbound as soon as the scope is dropped"]
#[derive(Debug)]
pub struct ContextScope {
    scope_id: u64,
    index: usize,
    _not_send: PhantomData<*const ()>,
}

impl ContextScope {
    /// Leave the scope now and return the context it had bound, including
    /// any updates made while it was active.
    pub fn exit(self) -> Option<ExecutionContext> {
        self.restore()
    }

    fn restore(&self) -> Option<ExecutionContext> {
        let previous = SAVED
            .try_with(|saved| {
                let mut saved = saved.borrow_mut();
                match saved.get(self.index) {
                    Some(entry) if entry.scope_id == self.scope_id => {}
                    _ => return None,
                }
                if saved.len() > self.index + 1 {
                    tracing::warn!(
                        depth = self.index + 1,
                        inner = saved.len() - self.index - 1,
                        "Execution context scope exited before its inner scopes"
                    );
                }
                saved.truncate(self.index + 1);
                saved.pop().map(|entry| entry.previous)
            })
            .ok()
            .flatten()?;

        let bound = CURRENT
            .try_with(|slot| slot.replace(previous))
            .ok()
            .flatten();
        tracing::trace!(
            request_id = ?bound.as_ref().and_then(|c| c.request_id.as_deref()),
            depth = self.index + 1,
            "Exited execution context scope"
        );
        bound
    }
}

impl Drop for ContextScope {
    fn drop(&mut self) {
        self.restore();
    }
}

/// Bind `context` to the calling thread until the returned guard is dropped.
///
/// Passing `None` masks any outer binding for the lifetime of the guard.
pub fn enter_scope(context: Option<ExecutionContext>) -> ContextScope {
    tracing::trace!(
        request_id = ?context.as_ref().and_then(|c| c.request_id.as_deref()),
        "Entering execution context scope"
    );
    let previous = CURRENT.with(|slot| slot.replace(context));
    let scope_id = NEXT_SCOPE_ID.with(|next| {
        let id = next.get();
        next.set(id.wrapping_add(1));
        id
    });
    let index = SAVED.with(|saved| {
        let mut saved = saved.borrow_mut();
        saved.push(SavedBinding { scope_id, previous });
        saved.len() - 1
    });

    ContextScope {
        scope_id,
        index,
        _not_send: PhantomData,
    }
}

/// Bind a context given as loosely typed input.
///
/// Fails with `TypeMismatch` before binding anything if `value` is neither
/// `null` nor a context object.
pub fn enter_scope_value(value: &Value) -> Result<ContextScope> {
    let context = ExecutionContext::from_value(value)?;
    Ok(enter_scope(context))
}

/// Run `f` with `context` bound.
pub fn with_context<R>(context: Option<ExecutionContext>, f: impl FnOnce() -> R) -> R {
    let _scope = enter_scope(context);
    f()
}

/// Snapshot of the innermost context bound on this thread.
pub fn current_context() -> Option<ExecutionContext> {
    CURRENT.with(|slot| slot.borrow().clone())
}

/// Run `f` with a reference to a snapshot of the current context.
pub fn with_current_context<R>(f: impl FnOnce(Option<&ExecutionContext>) -> R) -> R {
    let snapshot = current_context();
    f(snapshot.as_ref())
}

/// Update fields of the bound context in place.
///
/// Same validation as [`ExecutionContext::update`]. Fails with
/// `InvalidArgument` when nothing is bound.
pub fn update_current_context<K, I>(fields: I) -> Result<()>
where
    K: AsRef<str>,
    I: IntoIterator<Item = (K, Value)>,
{
    CURRENT.with(|slot| match slot.borrow_mut().as_mut() {
        Some(context) => context.update(fields),
        None => Err(ContextError::invalid_argument(
            "No execution context is bound to the current execution",
        )),
    })
}

/// Future that runs with its own execution context bound.
#[must_use = "futures do nothing unless polled"]
#[derive(Debug)]
pub struct Scoped<F> {
    context: Option<ExecutionContext>,
    future: Pin<Box<F>>,
}

impl<F> Scoped<F> {
    /// The context this future carries between polls.
    pub fn context(&self) -> Option<&ExecutionContext> {
        self.context.as_ref()
    }
}

impl<F: Future> Future for Scoped<F> {
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let scope = enter_scope(this.context.take());
        let result = this.future.as_mut().poll(cx);
        this.context = scope.exit();
        result
    }
}

/// Bind `context` for every poll of `future`.
pub fn scoped<F: Future>(context: Option<ExecutionContext>, future: F) -> Scoped<F> {
    Scoped {
        context,
        future: Box::pin(future),
    }
}

/// Give `future` a copy of the caller's current context.
pub fn inherit<F: Future>(future: F) -> Scoped<F> {
    scoped(current_context(), future)
}

/// Attach execution contexts to futures.
pub trait ContextFutureExt: Future + Sized {
    /// Run this future with `context` bound.
    fn with_execution_context(self, context: Option<ExecutionContext>) -> Scoped<Self> {
        scoped(context, self)
    }

    /// Run this future with a copy of the caller's current context.
    fn in_current_context(self) -> Scoped<Self> {
        inherit(self)
    }
}

impl<F: Future> ContextFutureExt for F {}
