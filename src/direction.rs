use strum::VariantArray;

use crate::location::Location;

/// One orthogonal move on a grid.
///
/// The variant order here is load-bearing: the path enumerator tries moves in
/// `VARIANTS` order (up, down, left, right), which fixes the order in which
/// paths are produced.
#[derive(Copy, Clone, VariantArray, Eq, PartialEq, Hash, Debug, Ord, PartialOrd)]
pub enum Direction {
    /// Toward smaller `y`.
    Up,
    /// Toward larger `y`.
    Down,
    /// Toward smaller `x`.
    Left,
    /// Toward larger `x`.
    Right,
}

impl Direction {
    /// Attempt the step from `location` in the direction specified by `self`
    /// and return the resultant [`Location`].
    ///
    /// Steps off the top or left edge wrap to huge coordinates, which the
    /// grid's bounds check then rejects.
    pub(crate) fn attempt_from(&self, location: Location) -> Location {
        match self {
            Self::Up => location.offset_by((0, -1)),
            Self::Down => location.offset_by((0, 1)),
            Self::Left => location.offset_by((-1, 0)),
            Self::Right => location.offset_by((1, 0)),
        }
    }

    /// The single-character external encoding of this direction.
    pub fn as_char(&self) -> char {
        match self {
            Self::Up => '^',
            Self::Down => 'v',
            Self::Left => '<',
            Self::Right => '>',
        }
    }

    pub(crate) fn from_char(c: char) -> Option<Self> {
        match c {
            '^' => Some(Self::Up),
            'v' => Some(Self::Down),
            '<' => Some(Self::Left),
            '>' => Some(Self::Right),
            _ => None,
        }
    }
}
