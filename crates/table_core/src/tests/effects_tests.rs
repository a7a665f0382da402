use super::*;

use std::{
    thread,
    time::{Duration, Instant},
};

use anyhow::anyhow;
use crossbeam_channel::Receiver;
use shared::domain::{Chips, SeatIndex, TimerId};

use crate::{message::AnimationKind, runtime::message_queue};

struct BrokenSpeaker;

#[async_trait]
impl SoundSink for BrokenSpeaker {
    async fn play(&self, _cue: SoundCue) -> Result<()> {
        Err(anyhow!("audio device busy"))
    }
}

struct BrokenAnimator;

#[async_trait]
impl AnimationSink for BrokenAnimator {
    async fn run(&self, _id: AnimationId, _spec: &AnimationSpec) -> Result<()> {
        Err(anyhow!("surface lost"))
    }
}

fn runner(
    sound: Arc<dyn SoundSink>,
    animation: Arc<dyn AnimationSink>,
) -> (EffectRunner, Receiver<Message>) {
    let (dispatcher, messages) = message_queue(16);
    let runner = EffectRunner::new(Handle::current(), dispatcher, sound, animation, 8);
    (runner, messages)
}

fn chips_animation(id: u64, generation: u64) -> Command {
    Command::StartAnimation {
        id: AnimationId(id),
        spec: AnimationSpec {
            kind: AnimationKind::ChipsToPot {
                seat: SeatIndex(2),
                amount: Chips(50),
            },
            duration: Duration::from_millis(2),
        },
        generation,
    }
}

async fn next_message(messages: &Receiver<Message>) -> Message {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if let Ok(message) = messages.try_recv() {
                return message;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("completion within timeout")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn animation_completion_carries_emission_generation() {
    let (runner, messages) = runner(Arc::new(SilentSound), Arc::new(TimedAnimations));

    runner.execute(vec![chips_animation(3, 7)]);

    assert_eq!(
        next_message(&messages).await,
        Message::AnimationFinished {
            id: AnimationId(3),
            generation: 7,
        }
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn timer_fires_after_its_delay() {
    let (runner, messages) = runner(Arc::new(SilentSound), Arc::new(TimedAnimations));

    runner.execute(vec![Command::ScheduleTimer {
        id: TimerId(1),
        delay: Duration::from_millis(5),
        generation: 4,
    }]);

    assert_eq!(
        next_message(&messages).await,
        Message::TimerFired {
            id: TimerId(1),
            generation: 4,
        }
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_animation_is_reported_and_still_completes() {
    let (runner, messages) = runner(Arc::new(SilentSound), Arc::new(BrokenAnimator));
    let mut failures = runner.subscribe_failures();

    runner.execute(vec![chips_animation(5, 2)]);

    let failure = failures.recv().await.expect("failure published");
    assert_eq!(failure.generation, 2);
    assert!(matches!(
        failure.error,
        EffectError::Animation { id: 5, ref reason } if reason.contains("surface lost")
    ));
    assert_eq!(
        next_message(&messages).await,
        Message::AnimationFinished {
            id: AnimationId(5),
            generation: 2,
        }
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_sound_is_reported_without_completion() {
    let (runner, messages) = runner(Arc::new(BrokenSpeaker), Arc::new(TimedAnimations));
    let mut failures = runner.subscribe_failures();

    runner.execute(vec![Command::PlaySound {
        sound: SoundCue::Win,
        generation: 3,
    }]);

    let failure = failures.recv().await.expect("failure published");
    assert_eq!(
        failure,
        EffectFailure {
            generation: 3,
            error: EffectError::Sound {
                cue: "Win".into(),
                reason: "audio device busy".into(),
            },
        }
    );

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(messages.try_recv().is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn completions_after_shutdown_are_dropped() {
    let (runner, messages) = runner(Arc::new(SilentSound), Arc::new(TimedAnimations));
    let mut failures = runner.subscribe_failures();
    drop(messages);

    runner.execute(vec![chips_animation(1, 1)]);
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(failures.try_recv().is_err());
}

#[tokio::test]
async fn full_queue_does_not_stall_a_current_thread_runtime() {
    let (dispatcher, messages) = message_queue(1);
    dispatcher.send(Message::ReplayAdvance).expect("prefill");
    let runner = EffectRunner::new(
        Handle::current(),
        dispatcher,
        Arc::new(SilentSound),
        Arc::new(TimedAnimations),
        8,
    );
    let drain = messages.clone();
    let drainer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(300));
        drain.recv()
    });

    runner.execute(vec![chips_animation(9, 1)]);
    let started = Instant::now();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(
        started.elapsed() < Duration::from_millis(250),
        "runtime thread was blocked for {:?}",
        started.elapsed()
    );

    while !drainer.is_finished() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(drainer.join().expect("drainer"), Ok(Message::ReplayAdvance));
    assert_eq!(
        next_message(&messages).await,
        Message::AnimationFinished {
            id: AnimationId(9),
            generation: 1,
        }
    );
}
