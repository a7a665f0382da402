//! Executes reducer commands on a tokio runtime and feeds completions back
//! through the owner queue, tagged with the generation they were issued in.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use shared::domain::AnimationId;
use tokio::{runtime::Handle, sync::broadcast};
use tracing::{debug, warn};

use crate::{
    error::EffectError,
    message::{AnimationSpec, Command, Message, SoundCue},
    runtime::Dispatcher,
    store::EffectSink,
};

#[async_trait]
pub trait SoundSink: Send + Sync {
    async fn play(&self, cue: SoundCue) -> Result<()>;
}

/// Resolves once the animation has visually completed.
#[async_trait]
pub trait AnimationSink: Send + Sync {
    async fn run(&self, id: AnimationId, spec: &AnimationSpec) -> Result<()>;
}

pub struct SilentSound;

#[async_trait]
impl SoundSink for SilentSound {
    async fn play(&self, cue: SoundCue) -> Result<()> {
        debug!(?cue, "sound muted");
        Ok(())
    }
}

/// Waits out each animation's duration without drawing anything.
pub struct TimedAnimations;

#[async_trait]
impl AnimationSink for TimedAnimations {
    async fn run(&self, _id: AnimationId, spec: &AnimationSpec) -> Result<()> {
        tokio::time::sleep(spec.duration).await;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectFailure {
    pub generation: u64,
    pub error: EffectError,
}

pub struct EffectRunner {
    handle: Handle,
    dispatcher: Dispatcher,
    sound: Arc<dyn SoundSink>,
    animation: Arc<dyn AnimationSink>,
    failures: broadcast::Sender<EffectFailure>,
}

impl EffectRunner {
    pub fn new(
        handle: Handle,
        dispatcher: Dispatcher,
        sound: Arc<dyn SoundSink>,
        animation: Arc<dyn AnimationSink>,
        failure_capacity: usize,
    ) -> Self {
        let (failures, _) = broadcast::channel(failure_capacity.max(1));
        Self {
            handle,
            dispatcher,
            sound,
            animation,
            failures,
        }
    }

    pub fn subscribe_failures(&self) -> broadcast::Receiver<EffectFailure> {
        self.failures.subscribe()
    }

    pub(crate) fn failure_sender(&self) -> broadcast::Sender<EffectFailure> {
        self.failures.clone()
    }

    fn spawn(&self, command: Command) {
        debug!(
            command = command.name(),
            generation = command.generation(),
            "running effect"
        );
        let failures = self.failures.clone();

        match command {
            Command::PlaySound { sound, generation } => {
                let sink = Arc::clone(&self.sound);
                self.handle.spawn(async move {
                    if let Err(err) = sink.play(sound).await {
                        report(
                            &failures,
                            generation,
                            EffectError::Sound {
                                cue: format!("{sound:?}"),
                                reason: format!("{err:#}"),
                            },
                        );
                    }
                });
            }
            Command::StartAnimation {
                id,
                spec,
                generation,
            } => {
                let sink = Arc::clone(&self.animation);
                let dispatcher = self.dispatcher.clone();
                self.handle.spawn(async move {
                    if let Err(err) = sink.run(id, &spec).await {
                        report(
                            &failures,
                            generation,
                            EffectError::Animation {
                                id: id.0,
                                reason: format!("{err:#}"),
                            },
                        );
                    }
                    // A failed animation still completes so a parked replay
                    // step is released.
                    complete(&dispatcher, Message::AnimationFinished { id, generation }).await;
                });
            }
            Command::ScheduleTimer {
                id,
                delay,
                generation,
            } => {
                let dispatcher = self.dispatcher.clone();
                self.handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    complete(&dispatcher, Message::TimerFired { id, generation }).await;
                });
            }
        }
    }
}

impl EffectSink for EffectRunner {
    fn execute(&self, commands: Vec<Command>) {
        for command in commands {
            self.spawn(command);
        }
    }
}

fn report(failures: &broadcast::Sender<EffectFailure>, generation: u64, error: EffectError) {
    warn!(generation, "effect failed: {error}");
    // No receivers is fine; the failure is already logged.
    let _ = failures.send(EffectFailure { generation, error });
}

async fn complete(dispatcher: &Dispatcher, message: Message) {
    let kind = message.name();
    if let Err(err) = dispatcher.deliver(message).await {
        debug!(kind, "dropping effect completion: {err}");
    }
}

#[cfg(test)]
#[path = "tests/effects_tests.rs"]
mod tests;
