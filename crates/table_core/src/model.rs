//! Immutable table snapshot.
//!
//! A [`Model`] is only ever built by the reducer and handed around as
//! `Arc<Model>`. Every container is ordered so that derived `PartialEq` is a
//! canonical structural comparison.

use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use shared::{
    domain::{ActionKind, AnimationId, Card, Chips, SeatIndex, SeatStatus, TimerId},
    protocol::{HandData, ReplayStep},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatState {
    pub stack: Chips,
    pub bet: Chips,
    pub cards_visible: bool,
    pub status: SeatStatus,
}

impl SeatState {
    pub fn in_hand(&self) -> bool {
        self.status != SeatStatus::Folded
    }

    pub fn can_act(&self) -> bool {
        self.status == SeatStatus::Active
    }
}

/// Transient announcement retired by the timer it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub text: String,
    pub duration: Duration,
    pub timer: TimerId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnimationState {
    pub generation: u64,
    pub in_flight: BTreeSet<AnimationId>,
}

/// A replay step whose visible effect waits on an animation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingStep {
    pub animation: AnimationId,
    pub step: ReplayStep,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayState {
    pub steps: Vec<ReplayStep>,
    pub cursor: usize,
    pub pending: Option<PendingStep>,
}

impl ReplayState {
    pub fn is_finished(&self) -> bool {
        self.pending.is_none() && self.cursor >= self.steps.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Model {
    pub generation: u64,
    pub seats: BTreeMap<SeatIndex, SeatState>,
    pub board: Vec<Card>,
    pub pot: Chips,
    pub to_act_seat: Option<SeatIndex>,
    pub legal_actions: BTreeSet<ActionKind>,
    pub banners: Vec<Banner>,
    pub animation_state: AnimationState,
    pub pending_timers: BTreeSet<TimerId>,
    pub effect_seq: u64,
    pub replay: ReplayState,
}

impl Model {
    /// Fresh table state for `hand` at `generation`. Assumes `hand` validated.
    pub(crate) fn from_hand(hand: &HandData, generation: u64) -> Self {
        let seats = hand
            .seats
            .iter()
            .map(|seat| {
                (
                    seat.seat,
                    SeatState {
                        stack: seat.stack,
                        bet: seat.bet,
                        cards_visible: seat.cards_visible,
                        status: seat.status,
                    },
                )
            })
            .collect();

        Self {
            generation,
            seats,
            board: hand.board.clone(),
            pot: hand.pot,
            to_act_seat: hand.to_act,
            legal_actions: hand.legal_actions.iter().copied().collect(),
            banners: Vec::new(),
            animation_state: AnimationState {
                generation,
                in_flight: BTreeSet::new(),
            },
            pending_timers: BTreeSet::new(),
            effect_seq: 0,
            replay: ReplayState {
                steps: hand.replay.clone(),
                cursor: 0,
                pending: None,
            },
        }
    }

    pub fn seat(&self, index: SeatIndex) -> Option<&SeatState> {
        self.seats.get(&index)
    }

    /// Highest bet currently in front of any seat.
    pub fn max_bet(&self) -> Chips {
        self.seats
            .values()
            .map(|seat| seat.bet)
            .max()
            .unwrap_or(Chips::ZERO)
    }

    pub fn seats_in_hand(&self) -> usize {
        self.seats.values().filter(|seat| seat.in_hand()).count()
    }

    pub fn is_animating(&self) -> bool {
        !self.animation_state.in_flight.is_empty()
    }

    pub(crate) fn next_animation_id(&mut self) -> AnimationId {
        self.effect_seq += 1;
        AnimationId(self.effect_seq)
    }

    pub(crate) fn next_timer_id(&mut self) -> TimerId {
        self.effect_seq += 1;
        TimerId(self.effect_seq)
    }
}
