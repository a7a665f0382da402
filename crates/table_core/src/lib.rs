//! Reactive runtime for a poker table view: an immutable [`Model`], a pure
//! [`Reducer`], a serializing [`Store`], an [`EffectRunner`] for sounds,
//! animations and timers, and a memoized [`Projector`] for drawing.

pub mod config;
pub mod effects;
pub mod error;
pub mod message;
pub mod model;
pub mod projector;
pub mod reducer;
pub mod runtime;
pub mod store;

pub use config::{load_settings, load_settings_from, RuntimeSettings, Timings};
pub use effects::{
    AnimationSink, EffectFailure, EffectRunner, SilentSound, SoundSink, TimedAnimations,
};
pub use error::{DispatchError, EffectError, StoreError};
pub use message::{AnimationKind, AnimationSpec, Command, Message, SoundCue};
pub use model::Model;
pub use projector::{attach_renderer, project, Projector, Props, Renderer, SeatProps};
pub use reducer::Reducer;
pub use runtime::{message_queue, pump, Dispatcher, TableRuntime};
pub use store::{DispatchOutcome, EffectSink, NoEffects, Store, Subscription};
