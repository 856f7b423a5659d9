//! Single-threaded promise-like handle for asynchronously loaded assets.
//!
//! A `Resource<T>` starts pending and settles exactly once, either ready
//! (`Arc<T>`) or failed (`ResourceLoadError`). Continuations attached before
//! settlement run when it settles; continuations attached afterwards run
//! immediately. Handles are cheap clones of the same slot.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::ResourceLoadError;

type ReadyFn<T> = Box<dyn FnOnce(Arc<T>)>;
type ErrorFn = Box<dyn FnOnce(&ResourceLoadError)>;
type ProgressFn = Box<dyn FnMut(LoadProgress)>;

/// Bytes (or units) loaded so far, reported by loaders that stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadProgress {
    pub loaded: u64,
    pub total: Option<u64>,
}

/// Observable state of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    Pending,
    Ready,
    Failed,
}

enum Settled<T> {
    Pending,
    Ready(Arc<T>),
    Failed(ResourceLoadError),
}

struct Slot<T> {
    settled: Settled<T>,
    on_ready: Vec<ReadyFn<T>>,
    on_error: Vec<ErrorFn>,
    on_progress: Vec<ProgressFn>,
}

/// Shared handle to an asset that may not have loaded yet.
pub struct Resource<T> {
    slot: Rc<RefCell<Slot<T>>>,
}

impl<T> Clone for Resource<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<T: 'static> fmt::Debug for Resource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("state", &self.state())
            .finish()
    }
}

impl<T: 'static> Resource<T> {
    /// A pending resource plus the resolver that settles it.
    pub fn pending() -> (Self, Resolver<T>) {
        let resource = Self::with(Settled::Pending);
        let resolver = Resolver {
            resource: resource.clone(),
        };
        (resource, resolver)
    }

    /// An already-loaded resource.
    pub fn ready(value: T) -> Self {
        Self::with(Settled::Ready(Arc::new(value)))
    }

    /// An already-failed resource.
    pub fn failed(error: ResourceLoadError) -> Self {
        Self::with(Settled::Failed(error))
    }

    /// Settle immediately from a synchronous load result.
    pub fn from_result(result: Result<T, ResourceLoadError>) -> Self {
        match result {
            Ok(value) => Self::ready(value),
            Err(e) => Self::failed(e),
        }
    }

    fn with(settled: Settled<T>) -> Self {
        Self {
            slot: Rc::new(RefCell::new(Slot {
                settled,
                on_ready: Vec::new(),
                on_error: Vec::new(),
                on_progress: Vec::new(),
            })),
        }
    }

    pub fn state(&self) -> ResourceState {
        match self.slot.borrow().settled {
            Settled::Pending => ResourceState::Pending,
            Settled::Ready(_) => ResourceState::Ready,
            Settled::Failed(_) => ResourceState::Failed,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state() == ResourceState::Ready
    }

    pub fn is_pending(&self) -> bool {
        self.state() == ResourceState::Pending
    }

    /// The loaded value, if any.
    pub fn get(&self) -> Option<Arc<T>> {
        match &self.slot.borrow().settled {
            Settled::Ready(value) => Some(Arc::clone(value)),
            _ => None,
        }
    }

    /// The load error, if the resource failed.
    pub fn error(&self) -> Option<ResourceLoadError> {
        match &self.slot.borrow().settled {
            Settled::Failed(e) => Some(e.clone()),
            _ => None,
        }
    }

    /// Run `f` with the value once the resource is ready.
    pub fn on_ready(&self, f: impl FnOnce(Arc<T>) + 'static) {
        let value = {
            let mut slot = self.slot.borrow_mut();
            match &slot.settled {
                Settled::Pending => {
                    slot.on_ready.push(Box::new(f));
                    return;
                }
                Settled::Ready(value) => Arc::clone(value),
                Settled::Failed(_) => return,
            }
        };
        f(value);
    }

    /// Run `f` with the error if the resource fails.
    pub fn on_error(&self, f: impl FnOnce(&ResourceLoadError) + 'static) {
        let error = {
            let mut slot = self.slot.borrow_mut();
            match &slot.settled {
                Settled::Pending => {
                    slot.on_error.push(Box::new(f));
                    return;
                }
                Settled::Failed(e) => e.clone(),
                Settled::Ready(_) => return,
            }
        };
        f(&error);
    }

    /// Observe progress reports while pending.
    pub fn on_progress(&self, f: impl FnMut(LoadProgress) + 'static) {
        let mut slot = self.slot.borrow_mut();
        if matches!(slot.settled, Settled::Pending) {
            slot.on_progress.push(Box::new(f));
        }
    }

    fn settle(&self, settled: Settled<T>) {
        // Callbacks run after the borrow is released so they may attach
        // further continuations or inspect this resource.
        let (ready, errors) = {
            let mut slot = self.slot.borrow_mut();
            if !matches!(slot.settled, Settled::Pending) {
                tracing::warn!("resource settled twice; ignoring");
                return;
            }
            slot.settled = settled;
            slot.on_progress.clear();
            (
                std::mem::take(&mut slot.on_ready),
                std::mem::take(&mut slot.on_error),
            )
        };

        if let Some(value) = self.get() {
            for f in ready {
                f(Arc::clone(&value));
            }
        } else if let Some(error) = self.error() {
            for f in errors {
                f(&error);
            }
        }
    }

    fn report(&self, progress: LoadProgress) {
        let mut callbacks = std::mem::take(&mut self.slot.borrow_mut().on_progress);
        for f in callbacks.iter_mut() {
            f(progress);
        }
        let mut slot = self.slot.borrow_mut();
        callbacks.append(&mut slot.on_progress);
        slot.on_progress = callbacks;
    }
}

/// Write side of a pending resource. Consumed on settlement.
pub struct Resolver<T> {
    resource: Resource<T>,
}

impl<T: 'static> Resolver<T> {
    pub fn resolve(self, value: T) {
        self.resource.settle(Settled::Ready(Arc::new(value)));
    }

    pub fn reject(self, error: ResourceLoadError) {
        self.resource.settle(Settled::Failed(error));
    }

    pub fn settle(self, result: Result<T, ResourceLoadError>) {
        match result {
            Ok(value) => self.resolve(value),
            Err(e) => self.reject(e),
        }
    }

    pub fn progress(&self, loaded: u64, total: Option<u64>) {
        self.resource.report(LoadProgress { loaded, total });
    }
}
