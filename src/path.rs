use std::fmt::{Display, Formatter};

use itertools::Itertools;
use thiserror::Error;

use crate::direction::Direction;
use crate::location::Location;

/// One entry in a path's move sequence.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PathStep {
    /// A step in one of the four orthogonal directions.
    Move(Direction),
    /// Marks arrival at the end coordinate and is always the final entry.
    ///
    /// Its presence keeps a path of zero moves between coincident endpoints
    /// distinguishable from the absence of any path, and it never appears in
    /// the external text encoding.
    Arrived,
}

/// Failure to decode a textual move sequence.
#[derive(Debug, Error)]
pub enum PathParseError {
    /// A token was not one of `^`, `v`, `<`, `>`.
    #[error("unrecognized direction token {0:?}")]
    BadToken(String),
}

/// A simple path connecting one pair's endpoints, stored as the move sequence
/// replayed from `start`.
///
/// Invariants upheld by the enumerator: the replayed cell sequence visits no
/// cell twice, its first cell is `start`, its last is `end`, and the final
/// entry of `steps` is [`PathStep::Arrived`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Path {
    pub(crate) label: String,
    pub(crate) start: Location,
    pub(crate) end: Location,
    pub(crate) steps: Vec<PathStep>,
}

impl Path {
    /// The label whose endpoints this path connects.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The cell this path starts on.
    pub fn start(&self) -> Location {
        self.start
    }

    /// The cell this path ends on.
    pub fn end(&self) -> Location {
        self.end
    }

    /// The move sequence, arrival marker included.
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Every cell this path occupies, start through end inclusive, in visit
    /// order.
    pub fn cells(&self) -> Vec<Location> {
        let mut cells = Vec::with_capacity(self.steps.len());
        let mut at = self.start;
        for step in &self.steps {
            cells.push(at);
            if let PathStep::Move(direction) = step {
                at = direction.attempt_from(at);
            }
        }
        cells
    }

    /// Decode a comma-separated `^ v < >` move sequence, as accepted for
    /// hardcoded path overrides, appending the arrival marker.
    pub fn parse_steps(encoded: &str) -> Result<Vec<PathStep>, PathParseError> {
        let mut steps = Vec::new();
        for token in encoded.split(',') {
            let token = token.trim();
            let mut chars = token.chars();
            match (chars.next().and_then(Direction::from_char), chars.next()) {
                (Some(direction), None) => steps.push(PathStep::Move(direction)),
                _ => return Err(PathParseError::BadToken(token.to_owned())),
            }
        }
        steps.push(PathStep::Arrived);
        Ok(steps)
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            self.steps
                .iter()
                .filter_map(|step| match step {
                    PathStep::Move(direction) => Some(direction.as_char()),
                    PathStep::Arrived => None,
                })
                .join(",")
        )
    }
}
