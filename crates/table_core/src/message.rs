//! Inbound messages and outbound effect descriptions.

use std::time::Duration;

use shared::{
    domain::{ActionKind, AnimationId, Card, Chips, SeatIndex, TimerId},
    error::MalformedMessage,
    protocol::{validate_amount, HandData},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    LoadHand(HandData),
    UserIntent {
        seat: SeatIndex,
        action: ActionKind,
        amount: Chips,
    },
    AnimationFinished {
        id: AnimationId,
        generation: u64,
    },
    TimerFired {
        id: TimerId,
        generation: u64,
    },
    ReplayAdvance,
}

impl Message {
    pub fn name(&self) -> &'static str {
        match self {
            Message::LoadHand(_) => "load_hand",
            Message::UserIntent { .. } => "user_intent",
            Message::AnimationFinished { .. } => "animation_finished",
            Message::TimerFired { .. } => "timer_fired",
            Message::ReplayAdvance => "replay_advance",
        }
    }

    /// Shape check independent of the current table state.
    pub fn validate(&self) -> Result<(), MalformedMessage> {
        match self {
            Message::LoadHand(hand) => hand.validate(),
            Message::UserIntent { action, amount, .. } => validate_amount(*action, *amount),
            Message::AnimationFinished { .. } | Message::TimerFired { .. } => Ok(()),
            Message::ReplayAdvance => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    Shuffle,
    Fold,
    Check,
    Chips,
    CardFlip,
    Win,
}

impl SoundCue {
    pub fn for_action(action: ActionKind) -> Self {
        match action {
            ActionKind::Fold => SoundCue::Fold,
            ActionKind::Check => SoundCue::Check,
            ActionKind::Call | ActionKind::Bet | ActionKind::Raise => SoundCue::Chips,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnimationKind {
    ChipsToPot { seat: SeatIndex, amount: Chips },
    PotToSeat { seat: SeatIndex, amount: Chips },
    DealStreet { cards: Vec<Card> },
    SeatAction { seat: SeatIndex, action: ActionKind },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationSpec {
    pub kind: AnimationKind,
    pub duration: Duration,
}

/// Effect request tagged with the generation that was current when the
/// reducer emitted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    PlaySound {
        sound: SoundCue,
        generation: u64,
    },
    StartAnimation {
        id: AnimationId,
        spec: AnimationSpec,
        generation: u64,
    },
    ScheduleTimer {
        id: TimerId,
        delay: Duration,
        generation: u64,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::PlaySound { .. } => "play_sound",
            Command::StartAnimation { .. } => "start_animation",
            Command::ScheduleTimer { .. } => "schedule_timer",
        }
    }

    pub fn generation(&self) -> u64 {
        match self {
            Command::PlaySound { generation, .. }
            | Command::StartAnimation { generation, .. }
            | Command::ScheduleTimer { generation, .. } => *generation,
        }
    }
}
