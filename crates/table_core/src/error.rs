use shared::error::MalformedMessage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("malformed message: {0}")]
    Malformed(#[from] MalformedMessage),
    #[error("dispatch re-entered from a subscriber; enqueue through the dispatcher instead")]
    Reentrant,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("table message queue is full")]
    QueueFull,
    #[error("table owner loop has stopped")]
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EffectError {
    #[error("sound '{cue}' failed to play: {reason}")]
    Sound { cue: String, reason: String },
    #[error("animation {id} failed to start: {reason}")]
    Animation { id: u64, reason: String },
}
