//! Owner thread and message queue.
//!
//! Every execution context other than the owner thread (input handlers,
//! effect completions, timers) dispatches by enqueueing on a bounded channel.
//! The owner applies messages to the [`Store`] in the order they were accepted.

use std::{
    io,
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam_channel::{bounded, select, Receiver, Sender, TrySendError};
use tokio::{runtime::Handle, sync::broadcast};

use crate::{
    config::RuntimeSettings,
    effects::{AnimationSink, EffectFailure, EffectRunner, SoundSink},
    error::DispatchError,
    message::Message,
    reducer::Reducer,
    store::Store,
};

const DELIVER_BACKOFF_MIN: Duration = Duration::from_millis(1);
const DELIVER_BACKOFF_MAX: Duration = Duration::from_millis(50);

#[derive(Clone)]
pub struct Dispatcher {
    tx: Sender<Message>,
}

impl Dispatcher {
    /// Enqueues without blocking. Used by input handlers, which must never
    /// stall the UI thread.
    pub fn send(&self, message: Message) -> Result<(), DispatchError> {
        let kind = message.name();
        match self.tx.try_send(message) {
            Ok(()) => {
                tracing::trace!(kind, "queued table message");
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                tracing::warn!(kind, "table message queue is full");
                Err(DispatchError::QueueFull)
            }
            Err(TrySendError::Disconnected(_)) => Err(DispatchError::Disconnected),
        }
    }

    /// Enqueues, waiting for room if the queue is full. Effect completions go
    /// through here since losing one would leave an animation in flight.
    /// Waits with async sleeps so a full queue never parks a runtime thread.
    pub async fn deliver(&self, mut message: Message) -> Result<(), DispatchError> {
        let mut backoff = DELIVER_BACKOFF_MIN;
        loop {
            match self.tx.try_send(message) {
                Ok(()) => return Ok(()),
                Err(TrySendError::Full(returned)) => {
                    tracing::debug!(
                        kind = returned.name(),
                        backoff_ms = backoff.as_millis() as u64,
                        "table message queue is full, retrying completion"
                    );
                    message = returned;
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(DELIVER_BACKOFF_MAX);
                }
                Err(TrySendError::Disconnected(_)) => return Err(DispatchError::Disconnected),
            }
        }
    }
}

pub fn message_queue(capacity: usize) -> (Dispatcher, Receiver<Message>) {
    let (tx, rx) = bounded(capacity.max(1));
    (Dispatcher { tx }, rx)
}

/// Applies every message already queued and returns how many were taken.
/// For hosts that drive the store from their own frame loop.
pub fn pump(store: &Store, messages: &Receiver<Message>) -> usize {
    let mut taken = 0;
    while let Ok(message) = messages.try_recv() {
        apply(store, message);
        taken += 1;
    }
    taken
}

fn apply(store: &Store, message: Message) {
    let kind = message.name();
    if let Err(err) = store.dispatch(message) {
        tracing::error!(kind, "table message rejected: {err}");
    }
}

fn run_owner(store: Store, messages: Receiver<Message>, stop: Receiver<()>) {
    tracing::debug!("table owner loop started");
    loop {
        select! {
            recv(messages) -> message => match message {
                Ok(message) => apply(&store, message),
                Err(_) => break,
            },
            recv(stop) -> _ => break,
        }
    }
    tracing::debug!("table owner loop stopped");
}

/// Store, effect runner and owner thread wired together.
pub struct TableRuntime {
    store: Store,
    dispatcher: Dispatcher,
    failures: broadcast::Sender<EffectFailure>,
    stop: Option<Sender<()>>,
    owner: Option<JoinHandle<()>>,
}

impl TableRuntime {
    pub fn start(
        settings: &RuntimeSettings,
        handle: Handle,
        sound: Arc<dyn SoundSink>,
        animation: Arc<dyn AnimationSink>,
    ) -> io::Result<Self> {
        let (dispatcher, messages) = message_queue(settings.queue_capacity);
        let runner = Arc::new(EffectRunner::new(
            handle,
            dispatcher.clone(),
            sound,
            animation,
            settings.failure_capacity,
        ));
        let failures = runner.failure_sender();
        let store = Store::new(Reducer::new(settings.timings), runner);

        let (stop_tx, stop_rx) = bounded(1);
        let owner_store = store.clone();
        let owner = thread::Builder::new()
            .name("table-owner".into())
            .spawn(move || run_owner(owner_store, messages, stop_rx))?;

        Ok(Self {
            store,
            dispatcher,
            failures,
            stop: Some(stop_tx),
            owner: Some(owner),
        })
    }

    pub fn dispatcher(&self) -> Dispatcher {
        self.dispatcher.clone()
    }

    /// Read access and subscription. Mutations should go through
    /// [`TableRuntime::dispatcher`] so they are applied on the owner thread.
    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn subscribe_failures(&self) -> broadcast::Receiver<EffectFailure> {
        self.failures.subscribe()
    }

    pub fn shutdown(mut self) {
        self.stop_owner();
    }

    fn stop_owner(&mut self) {
        drop(self.stop.take());
        if let Some(owner) = self.owner.take() {
            if owner.join().is_err() {
                tracing::error!("table owner thread panicked");
            }
        }
    }
}

impl Drop for TableRuntime {
    fn drop(&mut self) {
        self.stop_owner();
    }
}

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod tests;
