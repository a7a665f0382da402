use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    domain::{ActionKind, Card, Chips, SeatIndex, SeatStatus},
    error::MalformedMessage,
};

/// Board sizes that correspond to a street: preflop, flop, turn, river.
pub const STREET_LENGTHS: [usize; 4] = [0, 3, 4, 5];

pub fn is_street_length(len: usize) -> bool {
    STREET_LENGTHS.contains(&len)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatData {
    pub seat: SeatIndex,
    pub stack: Chips,
    #[serde(default)]
    pub bet: Chips,
    #[serde(default)]
    pub cards_visible: bool,
    #[serde(default)]
    pub status: SeatStatus,
}

/// One recorded transition of a hand-history review script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayStep {
    Action {
        seat: SeatIndex,
        action: ActionKind,
        #[serde(default)]
        amount: Chips,
    },
    Street {
        cards: Vec<Card>,
    },
    Award {
        seat: SeatIndex,
        amount: Chips,
    },
}

/// Table snapshot supplied by a game engine or a persisted hand-history record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandData {
    pub seats: Vec<SeatData>,
    #[serde(default)]
    pub board: Vec<Card>,
    #[serde(default)]
    pub pot: Chips,
    #[serde(default)]
    pub to_act: Option<SeatIndex>,
    #[serde(default)]
    pub legal_actions: Vec<ActionKind>,
    #[serde(default)]
    pub replay: Vec<ReplayStep>,
}

impl HandData {
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn validate(&self) -> Result<(), MalformedMessage> {
        let mut seated = BTreeSet::new();
        for seat in &self.seats {
            if !seated.insert(seat.seat) {
                return Err(MalformedMessage::DuplicateSeat(seat.seat));
            }
        }

        if !is_street_length(self.board.len()) {
            return Err(MalformedMessage::InvalidBoardLength(self.board.len()));
        }

        match self.to_act {
            Some(seat) if !seated.contains(&seat) => {
                return Err(MalformedMessage::ActingSeatMissing(seat));
            }
            Some(seat) if self.legal_actions.is_empty() => {
                return Err(MalformedMessage::ActorWithoutLegalActions(seat));
            }
            None if !self.legal_actions.is_empty() => {
                return Err(MalformedMessage::LegalActionsWithoutActor);
            }
            _ => {}
        }

        let mut board_len = self.board.len();
        for (step, entry) in self.replay.iter().enumerate() {
            match entry {
                ReplayStep::Action {
                    seat,
                    action,
                    amount,
                } => {
                    if !seated.contains(seat) {
                        return Err(MalformedMessage::ReplaySeatMissing { step, seat: *seat });
                    }
                    validate_amount(*action, *amount)?;
                }
                ReplayStep::Street { cards } => {
                    if cards.is_empty() {
                        return Err(MalformedMessage::EmptyStreet { step });
                    }
                    board_len += cards.len();
                    if !is_street_length(board_len) {
                        return Err(MalformedMessage::ReplayBoardLength {
                            step,
                            length: board_len,
                        });
                    }
                }
                ReplayStep::Award { seat, .. } => {
                    if !seated.contains(seat) {
                        return Err(MalformedMessage::ReplaySeatMissing { step, seat: *seat });
                    }
                }
            }
        }

        Ok(())
    }
}

/// Bet and raise must name a positive amount; other actions must not name one.
pub fn validate_amount(action: ActionKind, amount: Chips) -> Result<(), MalformedMessage> {
    match (action.takes_amount(), amount.is_zero()) {
        (true, true) => Err(MalformedMessage::MissingAmount(action)),
        (false, false) => Err(MalformedMessage::UnexpectedAmount(action)),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_seats() -> HandData {
        HandData {
            seats: vec![
                SeatData {
                    seat: SeatIndex(0),
                    stack: Chips(1_000),
                    bet: Chips::ZERO,
                    cards_visible: true,
                    status: SeatStatus::Active,
                },
                SeatData {
                    seat: SeatIndex(1),
                    stack: Chips(1_000),
                    bet: Chips::ZERO,
                    cards_visible: false,
                    status: SeatStatus::Active,
                },
            ],
            board: Vec::new(),
            pot: Chips::ZERO,
            to_act: Some(SeatIndex(0)),
            legal_actions: vec![ActionKind::Check, ActionKind::Bet],
            replay: Vec::new(),
        }
    }

    #[test]
    fn accepts_well_formed_hand() {
        assert_eq!(two_seats().validate(), Ok(()));
    }

    #[test]
    fn rejects_actor_missing_from_table() {
        let mut hand = two_seats();
        hand.to_act = Some(SeatIndex(7));
        assert_eq!(
            hand.validate(),
            Err(MalformedMessage::ActingSeatMissing(SeatIndex(7)))
        );
    }

    #[test]
    fn rejects_legal_actions_without_actor() {
        let mut hand = two_seats();
        hand.to_act = None;
        assert_eq!(
            hand.validate(),
            Err(MalformedMessage::LegalActionsWithoutActor)
        );
    }

    #[test]
    fn rejects_partial_street() {
        let mut hand = two_seats();
        hand.board = vec!["Ah".parse().expect("card"), "Kd".parse().expect("card")];
        assert_eq!(hand.validate(), Err(MalformedMessage::InvalidBoardLength(2)));
    }

    #[test]
    fn rejects_replay_that_overfills_board() {
        let mut hand = two_seats();
        hand.replay = vec![ReplayStep::Street {
            cards: ["2c", "3c", "4c", "5c", "6c", "7c"]
                .iter()
                .map(|c| c.parse().expect("card"))
                .collect(),
        }];
        assert_eq!(
            hand.validate(),
            Err(MalformedMessage::ReplayBoardLength { step: 0, length: 6 })
        );
    }

    #[test]
    fn parses_hand_json_with_defaults() {
        let raw = r#"{
            "seats": [{"seat": 0, "stack": 500}, {"seat": 3, "stack": 800, "bet": 20}],
            "to_act": 0,
            "legal_actions": ["fold", "call", "raise"],
            "replay": [
                {"type": "action", "seat": 0, "action": "call"},
                {"type": "street", "cards": ["Ah", "Kd", "7c"]},
                {"type": "award", "seat": 3, "amount": 40}
            ]
        }"#;
        let hand = HandData::from_json(raw).expect("hand json");
        assert_eq!(hand.seats.len(), 2);
        assert_eq!(hand.seats[1].bet, Chips(20));
        assert_eq!(hand.replay.len(), 3);
        assert_eq!(hand.validate(), Ok(()));
    }
}
