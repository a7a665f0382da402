use anyhow::Result;
use async_trait::async_trait;
use shared::domain::AnimationId;
use table_core::{AnimationSink, AnimationSpec, SoundCue, SoundSink};
use tracing::info;

/// Terminal stand-in for an audio device.
pub struct LoggedSound;

#[async_trait]
impl SoundSink for LoggedSound {
    async fn play(&self, cue: SoundCue) -> Result<()> {
        info!(?cue, "sound");
        Ok(())
    }
}

pub struct LoggedAnimations;

#[async_trait]
impl AnimationSink for LoggedAnimations {
    async fn run(&self, id: AnimationId, spec: &AnimationSpec) -> Result<()> {
        info!(%id, kind = ?spec.kind, duration_ms = spec.duration.as_millis() as u64, "animation");
        tokio::time::sleep(spec.duration).await;
        Ok(())
    }
}
