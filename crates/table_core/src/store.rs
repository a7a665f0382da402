//! Single-writer owner of the current [`Model`].
//!
//! `dispatch` runs the reducer under an exclusive lock, swaps the held
//! `Arc<Model>` only when the result differs structurally, notifies
//! subscribers in subscription order, and hands the emitted commands to the
//! effect sink after the lock is released.

use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak,
    },
    thread::{self, ThreadId},
};

use crate::{
    error::StoreError,
    message::{Command, Message},
    model::Model,
    reducer::Reducer,
};

/// Receives the commands produced by a dispatch. Called outside the store's
/// exclusive region, so implementations may dispatch again.
pub trait EffectSink: Send + Sync {
    fn execute(&self, commands: Vec<Command>);
}

/// Drops every command. Useful for headless snapshots and reducer-only tests.
pub struct NoEffects;

impl EffectSink for NoEffects {
    fn execute(&self, commands: Vec<Command>) {
        tracing::trace!(count = commands.len(), "discarding commands");
    }
}

type Callback = Arc<dyn Fn(&Arc<Model>) + Send + Sync>;

struct Subscriber {
    id: u64,
    callback: Callback,
}

struct Shared {
    reducer: Reducer,
    effects: Arc<dyn EffectSink>,
    current: RwLock<Arc<Model>>,
    exclusive: Mutex<()>,
    owner: Mutex<Option<ThreadId>>,
    subscribers: Mutex<Vec<Subscriber>>,
    next_subscriber: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub changed: bool,
    pub commands: usize,
}

#[derive(Clone)]
pub struct Store {
    shared: Arc<Shared>,
}

impl Store {
    pub fn new(reducer: Reducer, effects: Arc<dyn EffectSink>) -> Self {
        Self::with_model(Model::default(), reducer, effects)
    }

    pub fn with_model(model: Model, reducer: Reducer, effects: Arc<dyn EffectSink>) -> Self {
        Self {
            shared: Arc::new(Shared {
                reducer,
                effects,
                current: RwLock::new(Arc::new(model)),
                exclusive: Mutex::new(()),
                owner: Mutex::new(None),
                subscribers: Mutex::new(Vec::new()),
                next_subscriber: AtomicU64::new(1),
            }),
        }
    }

    pub fn current_model(&self) -> Arc<Model> {
        Arc::clone(&self.shared.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn dispatch(&self, message: Message) -> Result<DispatchOutcome, StoreError> {
        if let Err(err) = message.validate() {
            tracing::error!(kind = message.name(), "rejecting malformed message: {err}");
            return Err(err.into());
        }

        let (changed, commands) = {
            let _exclusive = self.enter()?;

            let current = self.current_model();
            let (next, commands) = self.shared.reducer.update(&current, &message);
            let changed = !Arc::ptr_eq(&current, &next) && *next != *current;
            if changed {
                *self
                    .shared
                    .current
                    .write()
                    .unwrap_or_else(PoisonError::into_inner) = Arc::clone(&next);
                self.notify(&next);
            }

            (changed, commands)
        };

        tracing::debug!(
            kind = message.name(),
            changed,
            commands = commands.len(),
            "dispatched"
        );

        let outcome = DispatchOutcome {
            changed,
            commands: commands.len(),
        };
        if !commands.is_empty() {
            self.shared.effects.execute(commands);
        }
        Ok(outcome)
    }

    /// Registers `callback` for every accepted change. The returned handle
    /// unsubscribes when dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Arc<Model>) + Send + Sync + 'static,
    {
        let id = self.shared.next_subscriber.fetch_add(1, Ordering::Relaxed);
        self.subscribers().push(Subscriber {
            id,
            callback: Arc::new(callback),
        });
        Subscription {
            id,
            shared: Arc::downgrade(&self.shared),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers().len()
    }

    /// Takes the exclusive region and records the calling thread as its
    /// owner. A subscriber calling back into dispatch on the notifying thread
    /// would otherwise deadlock.
    fn enter(&self) -> Result<Exclusive<'_>, StoreError> {
        let me = thread::current().id();
        if *lock(&self.shared.owner) == Some(me) {
            return Err(StoreError::Reentrant);
        }

        let held = lock(&self.shared.exclusive);
        *lock(&self.shared.owner) = Some(me);
        Ok(Exclusive {
            _held: held,
            owner: &self.shared.owner,
        })
    }

    fn subscribers(&self) -> MutexGuard<'_, Vec<Subscriber>> {
        lock(&self.shared.subscribers)
    }

    fn notify(&self, model: &Arc<Model>) {
        let snapshot: Vec<(u64, Callback)> = self
            .subscribers()
            .iter()
            .map(|subscriber| (subscriber.id, Arc::clone(&subscriber.callback)))
            .collect();

        for (id, callback) in snapshot {
            if catch_unwind(AssertUnwindSafe(|| callback(model))).is_err() {
                tracing::error!(
                    subscriber = id,
                    generation = model.generation,
                    "subscriber panicked during notification"
                );
            }
        }
    }
}

struct Exclusive<'a> {
    _held: MutexGuard<'a, ()>,
    owner: &'a Mutex<Option<ThreadId>>,
}

impl Drop for Exclusive<'_> {
    fn drop(&mut self) {
        *lock(self.owner) = None;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Subscription {
    id: u64,
    shared: Weak<Shared>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            lock(&shared.subscribers).retain(|subscriber| subscriber.id != self.id);
        }
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
