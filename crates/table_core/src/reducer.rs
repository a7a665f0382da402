//! Pure state transitions: `(Model, Message) -> (Model, Commands)`.
//!
//! An inapplicable message yields the same `Arc<Model>` and no commands. The
//! store relies on that to skip notification.

use std::{
    collections::BTreeSet,
    ops::Bound::{Excluded, Unbounded},
    sync::Arc,
};

use shared::{
    domain::{ActionKind, AnimationId, Chips, SeatIndex, SeatStatus, TimerId},
    protocol::{is_street_length, validate_amount, HandData, ReplayStep},
};

use crate::{
    config::Timings,
    message::{AnimationKind, AnimationSpec, Command, Message, SoundCue},
    model::{Banner, Model, PendingStep},
};

pub type Update = (Arc<Model>, Vec<Command>);

#[derive(Debug, Clone, Default)]
pub struct Reducer {
    timings: Timings,
}

impl Reducer {
    pub fn new(timings: Timings) -> Self {
        Self { timings }
    }

    pub fn timings(&self) -> Timings {
        self.timings
    }

    pub fn update(&self, model: &Arc<Model>, message: &Message) -> Update {
        match message {
            Message::LoadHand(hand) => self.load_hand(model, hand),
            Message::UserIntent {
                seat,
                action,
                amount,
            } => self.user_intent(model, *seat, *action, *amount),
            Message::AnimationFinished { id, generation } => {
                self.animation_finished(model, *id, *generation)
            }
            Message::TimerFired { id, generation } => timer_fired(model, *id, *generation),
            Message::ReplayAdvance => self.replay_advance(model),
        }
    }

    fn load_hand(&self, model: &Arc<Model>, hand: &HandData) -> Update {
        if let Err(err) = hand.validate() {
            return ignore(model, "load_hand", &err.to_string());
        }

        // Reloading the hand that is already on the table, untouched, must not
        // bump the generation or the model would flip between two values.
        // Generation 0 is the empty table, never a loaded hand.
        if model.generation > 0 && Model::from_hand(hand, model.generation) == **model {
            return ignore(model, "load_hand", "duplicate load");
        }

        let generation = model.generation + 1;
        let next = Model::from_hand(hand, generation);
        tracing::info!(
            generation,
            seats = next.seats.len(),
            replay_steps = next.replay.steps.len(),
            "hand loaded"
        );
        let commands = vec![Command::PlaySound {
            sound: SoundCue::Shuffle,
            generation,
        }];
        (Arc::new(next), commands)
    }

    fn user_intent(
        &self,
        model: &Arc<Model>,
        seat: SeatIndex,
        action: ActionKind,
        amount: Chips,
    ) -> Update {
        if model.to_act_seat != Some(seat) {
            return ignore(model, "user_intent", "seat is not to act");
        }
        if !model.legal_actions.contains(&action) {
            return ignore(model, "user_intent", "action is not legal");
        }
        if validate_amount(action, amount).is_err() {
            return ignore(model, "user_intent", "amount does not fit action");
        }
        let Some(state) = model.seat(seat).filter(|state| state.can_act()) else {
            return ignore(model, "user_intent", "seat cannot act");
        };

        let max_bet = model.max_bet();
        let owed = max_bet - state.bet;
        let put = match action {
            ActionKind::Fold => Chips::ZERO,
            ActionKind::Check if owed.is_zero() => Chips::ZERO,
            ActionKind::Check => return ignore(model, "user_intent", "check while facing a bet"),
            ActionKind::Call if owed.is_zero() => {
                return ignore(model, "user_intent", "nothing to call")
            }
            ActionKind::Call => owed.min(state.stack),
            ActionKind::Bet | ActionKind::Raise if amount > state.stack => {
                return ignore(model, "user_intent", "amount exceeds stack")
            }
            ActionKind::Raise if state.bet + amount <= max_bet => {
                return ignore(model, "user_intent", "raise does not exceed current bet")
            }
            ActionKind::Bet | ActionKind::Raise => amount,
        };

        let mut next = (**model).clone();
        let generation = next.generation;
        let mut commands = vec![Command::PlaySound {
            sound: SoundCue::for_action(action),
            generation,
        }];

        if action == ActionKind::Fold {
            set_status(&mut next, seat, SeatStatus::Folded);
        }
        if !put.is_zero() {
            move_chips_to_pot(&mut next, seat, put);
            let id = start_animation(&mut next);
            commands.push(Command::StartAnimation {
                id,
                spec: AnimationSpec {
                    kind: AnimationKind::ChipsToPot { seat, amount: put },
                    duration: self.timings.chip_animation,
                },
                generation,
            });
        }

        tracing::debug!(generation, %seat, action = action.label(), put = put.0, "intent applied");

        if let Some(winner) = last_seat_standing(&next) {
            let pot = next.pot;
            let id = start_animation(&mut next);
            commands.push(Command::StartAnimation {
                id,
                spec: AnimationSpec {
                    kind: AnimationKind::PotToSeat {
                        seat: winner,
                        amount: pot,
                    },
                    duration: self.timings.pot_animation,
                },
                generation,
            });
            commands.push(Command::PlaySound {
                sound: SoundCue::Win,
                generation,
            });
            commands.push(self.award(&mut next, winner, pot));
        } else {
            advance_actor(&mut next, seat);
        }

        (Arc::new(next), commands)
    }

    fn animation_finished(&self, model: &Arc<Model>, id: AnimationId, generation: u64) -> Update {
        if generation != model.generation {
            return ignore(model, "animation_finished", "stale generation");
        }
        if !model.animation_state.in_flight.contains(&id) {
            return ignore(model, "animation_finished", "animation not in flight");
        }

        let mut next = (**model).clone();
        next.animation_state.in_flight.remove(&id);

        let mut commands = Vec::new();
        let parked = next
            .replay
            .pending
            .as_ref()
            .is_some_and(|pending| pending.animation == id);
        if parked {
            if let Some(pending) = next.replay.pending.take() {
                commands.extend(self.apply_replay_step(&mut next, pending.step));
            }
        }

        (Arc::new(next), commands)
    }

    fn replay_advance(&self, model: &Arc<Model>) -> Update {
        if model.replay.pending.is_some() {
            return ignore(model, "replay_advance", "previous step still animating");
        }
        let Some(step) = model.replay.steps.get(model.replay.cursor).cloned() else {
            return ignore(model, "replay_advance", "replay exhausted");
        };

        let mut next = (**model).clone();
        let generation = next.generation;
        let id = start_animation(&mut next);
        next.replay.cursor += 1;

        let (kind, duration, sound) = match &step {
            ReplayStep::Action { seat, action, amount } => {
                let put = chips_for(&next, *seat, *action, *amount);
                if put.is_zero() {
                    (
                        AnimationKind::SeatAction {
                            seat: *seat,
                            action: *action,
                        },
                        self.timings.chip_animation,
                        SoundCue::for_action(*action),
                    )
                } else {
                    (
                        AnimationKind::ChipsToPot {
                            seat: *seat,
                            amount: put,
                        },
                        self.timings.chip_animation,
                        SoundCue::for_action(*action),
                    )
                }
            }
            ReplayStep::Street { cards } => (
                AnimationKind::DealStreet {
                    cards: cards.clone(),
                },
                self.timings.street_animation,
                SoundCue::CardFlip,
            ),
            ReplayStep::Award { seat, amount } => (
                AnimationKind::PotToSeat {
                    seat: *seat,
                    amount: (*amount).min(next.pot),
                },
                self.timings.pot_animation,
                SoundCue::Win,
            ),
        };

        next.replay.pending = Some(PendingStep { animation: id, step });
        tracing::debug!(generation, cursor = next.replay.cursor, "replay step started");

        let commands = vec![
            Command::StartAnimation {
                id,
                spec: AnimationSpec { kind, duration },
                generation,
            },
            Command::PlaySound { sound, generation },
        ];
        (Arc::new(next), commands)
    }

    /// Makes a replay step visible once its animation has finished.
    fn apply_replay_step(&self, next: &mut Model, step: ReplayStep) -> Vec<Command> {
        match step {
            ReplayStep::Action {
                seat,
                action,
                amount,
            } => {
                if next.seat(seat).is_none() {
                    return Vec::new();
                }
                let put = chips_for(next, seat, action, amount);
                if action == ActionKind::Fold {
                    set_status(next, seat, SeatStatus::Folded);
                }
                move_chips_to_pot(next, seat, put);
                advance_actor(next, seat);
                Vec::new()
            }
            ReplayStep::Street { cards } => {
                if cards.is_empty() || !is_street_length(next.board.len() + cards.len()) {
                    return Vec::new();
                }
                for seat in next.seats.values_mut() {
                    seat.bet = Chips::ZERO;
                }
                next.board.extend(cards);
                refresh_legal_actions(next);
                Vec::new()
            }
            ReplayStep::Award { seat, amount } => {
                if next.seat(seat).is_none() {
                    return Vec::new();
                }
                let amount = amount.min(next.pot);
                vec![self.award(next, seat, amount)]
            }
        }
    }

    /// Pays `amount` from the pot to `seat`, closes the action and raises a
    /// winner banner. Returns the timer that retires the banner.
    fn award(&self, next: &mut Model, seat: SeatIndex, amount: Chips) -> Command {
        next.pot -= amount;
        for state in next.seats.values_mut() {
            state.bet = Chips::ZERO;
        }
        if let Some(state) = next.seats.get_mut(&seat) {
            state.stack += amount;
            state.cards_visible = true;
        }
        next.to_act_seat = None;
        next.legal_actions.clear();

        let timer = next.next_timer_id();
        next.pending_timers.insert(timer);
        next.banners.push(Banner {
            text: format!("Seat {seat} wins {amount}"),
            duration: self.timings.winner_banner,
            timer,
        });

        Command::ScheduleTimer {
            id: timer,
            delay: self.timings.winner_banner,
            generation: next.generation,
        }
    }
}

fn timer_fired(model: &Arc<Model>, id: TimerId, generation: u64) -> Update {
    if generation != model.generation {
        return ignore(model, "timer_fired", "stale generation");
    }
    if !model.pending_timers.contains(&id) {
        return ignore(model, "timer_fired", "timer not pending");
    }

    let mut next = (**model).clone();
    next.pending_timers.remove(&id);
    next.banners.retain(|banner| banner.timer != id);
    (Arc::new(next), Vec::new())
}

fn ignore(model: &Arc<Model>, kind: &'static str, reason: &str) -> Update {
    tracing::debug!(generation = model.generation, kind, reason, "message ignored");
    (Arc::clone(model), Vec::new())
}

fn start_animation(next: &mut Model) -> AnimationId {
    let id = next.next_animation_id();
    next.animation_state.generation = next.generation;
    next.animation_state.in_flight.insert(id);
    id
}

fn set_status(next: &mut Model, seat: SeatIndex, status: SeatStatus) {
    if let Some(state) = next.seats.get_mut(&seat) {
        state.status = status;
    }
}

/// Chips `seat` commits with `action`, capped by its stack.
fn chips_for(model: &Model, seat: SeatIndex, action: ActionKind, amount: Chips) -> Chips {
    let Some(state) = model.seat(seat) else {
        return Chips::ZERO;
    };
    match action {
        ActionKind::Fold | ActionKind::Check => Chips::ZERO,
        ActionKind::Call => (model.max_bet() - state.bet).min(state.stack),
        ActionKind::Bet | ActionKind::Raise => amount.min(state.stack),
    }
}

fn move_chips_to_pot(next: &mut Model, seat: SeatIndex, put: Chips) {
    if put.is_zero() {
        return;
    }
    let Some(state) = next.seats.get_mut(&seat) else {
        return;
    };
    state.stack -= put;
    state.bet += put;
    if state.stack.is_zero() {
        state.status = SeatStatus::AllIn;
    }
    next.pot += put;
}

fn last_seat_standing(model: &Model) -> Option<SeatIndex> {
    let mut in_hand = model
        .seats
        .iter()
        .filter(|(_, state)| state.in_hand())
        .map(|(index, _)| *index);
    match (in_hand.next(), in_hand.next()) {
        (Some(only), None) if model.seats.len() > 1 => Some(only),
        _ => None,
    }
}

/// Passes the action to the next seat after `from`, in ascending cyclic
/// order, that can still act. Closes the action when nobody else can, or when
/// the only seat left to act owes nothing and has no one to bet against.
fn advance_actor(next: &mut Model, from: SeatIndex) {
    let candidate = if next.seats_in_hand() < 2 {
        None
    } else {
        next.seats
            .range((Excluded(from), Unbounded))
            .chain(next.seats.range(..from))
            .find(|(_, state)| state.can_act())
            .map(|(index, _)| *index)
    };

    let max_bet = next.max_bet();
    let actor = candidate.filter(|candidate| {
        let opponents_can_act = next
            .seats
            .iter()
            .any(|(index, state)| index != candidate && state.can_act());
        let owes = next
            .seat(*candidate)
            .is_some_and(|state| state.bet < max_bet);
        opponents_can_act || owes
    });

    next.to_act_seat = actor;
    refresh_legal_actions(next);
}

fn refresh_legal_actions(next: &mut Model) {
    next.legal_actions = match next.to_act_seat {
        Some(seat) => legal_actions_for(next, seat),
        None => BTreeSet::new(),
    };
    if next.legal_actions.is_empty() {
        next.to_act_seat = None;
    }
}

fn legal_actions_for(model: &Model, seat: SeatIndex) -> BTreeSet<ActionKind> {
    let mut legal = BTreeSet::new();
    let Some(state) = model.seat(seat).filter(|state| state.can_act()) else {
        return legal;
    };

    let max_bet = model.max_bet();
    let owed = max_bet - state.bet;
    legal.insert(ActionKind::Fold);
    if owed.is_zero() {
        legal.insert(ActionKind::Check);
        if !state.stack.is_zero() {
            legal.insert(if max_bet.is_zero() {
                ActionKind::Bet
            } else {
                ActionKind::Raise
            });
        }
    } else {
        legal.insert(ActionKind::Call);
        if state.stack > owed {
            legal.insert(ActionKind::Raise);
        }
    }
    legal
}

#[cfg(test)]
#[path = "tests/reducer_tests.rs"]
mod tests;
