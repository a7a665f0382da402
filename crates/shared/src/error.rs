use thiserror::Error;

use crate::domain::{ActionKind, SeatIndex};

/// Structurally invalid input. These are caller defects and are rejected before
/// any state transition is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedMessage {
    #[error("seat {0} appears more than once in hand data")]
    DuplicateSeat(SeatIndex),
    #[error("board has {0} cards; a street has 0, 3, 4 or 5")]
    InvalidBoardLength(usize),
    #[error("acting seat {0} is not seated at the table")]
    ActingSeatMissing(SeatIndex),
    #[error("seat {0} is to act but no legal actions were supplied")]
    ActorWithoutLegalActions(SeatIndex),
    #[error("legal actions supplied without an acting seat")]
    LegalActionsWithoutActor,
    #[error("{} requires a non-zero amount", .0.label())]
    MissingAmount(ActionKind),
    #[error("{} does not take an amount", .0.label())]
    UnexpectedAmount(ActionKind),
    #[error("replay step {step} references empty seat {seat}")]
    ReplaySeatMissing { step: usize, seat: SeatIndex },
    #[error("replay step {step} deals no cards")]
    EmptyStreet { step: usize },
    #[error("replay step {step} would leave {length} cards on the board")]
    ReplayBoardLength { step: usize, length: usize },
}
