//! Shared heap handle for engine values.
//!
//! Containers can nest arbitrarily deep (`x = [x]` in a loop), and freeing
//! such a chain through plain drop glue recurses once per level. The last
//! handle to a payload therefore moves the payload's child values out
//! through [`Reclaim`] and frees them from a per-thread worklist, so a drop
//! never goes deeper than one level.

use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{BoundMethod, BuiltinFunction, DictValue, FunctionValue, ModuleValue, SetValue, Value};
use crate::errors::PyException;

/// Reference-counted handle to heap-allocated value data.
///
/// All heap values go through this wrapper so identity (`is`) can be
/// checked by pointer and allocation stays behind one constructor.
#[repr(transparent)]
pub struct Heap<T: ?Sized + Reclaim>(Arc<T>);

/// Payloads that may own other values.
pub trait Reclaim {
    /// Move the values this payload owns into `out`. Called once, on the
    /// last handle, just before the payload is freed.
    fn reclaim(&mut self, _out: &mut Vec<Value>) {}
}

impl<T: Reclaim> Heap<T> {
    #[inline]
    pub(crate) fn new(value: T) -> Self {
        Heap(Arc::new(value))
    }
}

impl<T: ?Sized + Reclaim> Heap<T> {
    /// Whether two handles point at the same allocation.
    #[inline]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.0, &other.0)
    }

    /// Allocation address, used for identity hashing and `repr`.
    #[inline]
    pub fn addr(this: &Self) -> usize {
        Arc::as_ptr(&this.0).cast::<u8>() as usize
    }

    /// Number of live handles to this allocation.
    #[inline]
    pub fn strong_count(this: &Self) -> usize {
        Arc::strong_count(&this.0)
    }
}

impl<T: ?Sized + Reclaim> Clone for Heap<T> {
    #[inline]
    fn clone(&self) -> Self {
        Heap(Arc::clone(&self.0))
    }
}

impl<T: ?Sized + Reclaim> Deref for Heap<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized + Reclaim + fmt::Debug> fmt::Debug for Heap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<T: ?Sized + Reclaim + fmt::Display> fmt::Display for Heap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<T: ?Sized + Reclaim> Drop for Heap<T> {
    fn drop(&mut self) {
        let Some(payload) = Arc::get_mut(&mut self.0) else {
            return;
        };
        let mut children = Vec::new();
        payload.reclaim(&mut children);
        if !children.is_empty() {
            release(children);
        }
    }
}

thread_local! {
    /// Values waiting to be freed by the outermost drop on this thread.
    static PENDING: RefCell<Option<Vec<Value>>> = const { RefCell::new(None) };
}

/// Free `children`, iteratively.
///
/// Inside a running release the values are queued for it; otherwise this
/// call becomes the release loop until the queue is empty.
fn release(children: Vec<Value>) {
    let queued = PENDING.try_with(|pending| match pending.borrow_mut().as_mut() {
        Some(queue) => {
            queue.extend(children);
            None
        }
        None => Some(children),
    });
    // Either queued for the running release, or thread-local storage is
    // already torn down and the values were freed directly.
    let Ok(Some(mut batch)) = queued else {
        return;
    };
    if PENDING
        .try_with(|pending| *pending.borrow_mut() = Some(Vec::new()))
        .is_err()
    {
        return;
    }
    loop {
        while let Some(value) = batch.pop() {
            drop(value);
        }
        let next = PENDING
            .try_with(|pending| pending.borrow_mut().as_mut().map(std::mem::take))
            .ok()
            .flatten();
        match next {
            Some(more) if !more.is_empty() => batch = more,
            _ => break,
        }
    }
    let _ = PENDING.try_with(|pending| pending.borrow_mut().take());
}

impl Reclaim for str {}
impl Reclaim for BuiltinFunction {}
impl Reclaim for ModuleValue {}
impl Reclaim for PyException {}

impl Reclaim for Vec<Value> {
    fn reclaim(&mut self, out: &mut Vec<Value>) {
        out.append(self);
    }
}

impl Reclaim for RwLock<Vec<Value>> {
    fn reclaim(&mut self, out: &mut Vec<Value>) {
        out.append(self.get_mut());
    }
}

impl Reclaim for RwLock<DictValue> {
    fn reclaim(&mut self, out: &mut Vec<Value>) {
        self.get_mut().drain_into(out);
    }
}

impl Reclaim for RwLock<SetValue> {
    fn reclaim(&mut self, out: &mut Vec<Value>) {
        self.get_mut().drain_into(out);
    }
}

impl Reclaim for BoundMethod {
    fn reclaim(&mut self, out: &mut Vec<Value>) {
        out.push(std::mem::replace(&mut self.receiver, Value::None));
    }
}

impl Reclaim for FunctionValue {
    fn reclaim(&mut self, out: &mut Vec<Value>) {
        out.append(&mut self.defaults);
        if let Some(scope) = &mut self.closure {
            scope.reclaim_unshared(out);
        }
    }
}

impl From<String> for Heap<str> {
    fn from(s: String) -> Self {
        Heap(Arc::from(s))
    }
}

impl From<&str> for Heap<str> {
    fn from(s: &str) -> Self {
        Heap(Arc::from(s))
    }
}
