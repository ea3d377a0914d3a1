use match_wire::{BuildError, DecodeError};
use thiserror::Error;

use crate::event::EventType;
use crate::geometry::Vec2;
use crate::tags::{Action, TargetShape};

/// Failure while writing a record: either builder misuse or a producer-side
/// invariant the format itself cannot express.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("map corners are inverted: min {min:?} is not below max {max:?}")]
    InvertedCorners { min: Vec2, max: Vec2 },
    #[error("{action} takes {expected} targets, got {found}")]
    TargetCount {
        action: Action,
        expected: TargetShape,
        found: usize,
    },
    #[error("round {round_id} moves {ids} bodies but carries {locs} locations")]
    MovementLength { round_id: i32, ids: usize, locs: usize },
}

/// Failure while writing or walking a match stream.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("match stream must open with a MatchHeader, found {found}")]
    MissingHeader { found: EventType },
    #[error("duplicate MatchHeader at event {index}")]
    DuplicateHeader { index: usize },
    #[error("event {index} follows the MatchFooter")]
    AfterFooter { index: usize },
    #[error("event {index} has type {found}, which a match stream never carries")]
    UnexpectedEventType { index: usize, found: EventType },
    #[error("match stream ended without a MatchFooter")]
    MissingFooter,
}

impl From<BuildError> for StreamError {
    fn from(err: BuildError) -> Self {
        StreamError::Encode(EncodeError::Build(err))
    }
}
