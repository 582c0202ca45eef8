//! Perimeter classification.
//!
//! A cell is "on the perimeter" if it lies on the outer border of the grid,
//! or if it touches (8-directionally) a blocked cell whose blocked region is
//! 4-connected to the border. Perimeter-restricted enumeration uses this to
//! keep paths hugging the outside of the puzzle.

use std::collections::HashSet;

use strum::VariantArray;

use crate::cell::Cell;
use crate::direction::Direction;
use crate::grid::{Grid, Pair};
use crate::location::Location;

// the four orthogonal offsets first, then the diagonals
const NEIGHBORS_8: [(isize, isize); 8] = [
    (0, -1),
    (0, 1),
    (-1, 0),
    (1, 0),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

impl Grid {
    /// Whether `location` is on the perimeter.
    ///
    /// `excluded`, when given, has its endpoints treated as blocked for the
    /// duration of the check, so the pair currently being routed is
    /// classified like any other wall instead of as an obstacle in its own
    /// way; the endpoints are restored before returning.
    pub(crate) fn is_perimeter(&mut self, location: Location, excluded: Option<&Pair>) -> bool {
        match excluded {
            Some(pair) => {
                let pair = pair.clone();
                self.with_pair_state(&pair, Cell::Blocked, |grid| grid.classify(location))
            }
            None => self.classify(location),
        }
    }

    pub(crate) fn on_border(&self, location: Location) -> bool {
        location.0 == 0
            || location.1 == 0
            || location.0 == self.width() - 1
            || location.1 == self.height() - 1
    }

    fn classify(&self, location: Location) -> bool {
        if self.on_border(location) {
            return true;
        }

        NEIGHBORS_8.iter().any(|offset| {
            let neighbor = location.offset_by(*offset);
            self.cell(neighbor) == Some(Cell::Blocked) && self.connected_to_border(neighbor)
        })
    }

    /// Flood fill from `from` through blocked cells only, looking for the
    /// border. Worklist traversal with a visited set; terminates on reaching
    /// any border cell or exhausting the blocked region.
    fn connected_to_border(&self, from: Location) -> bool {
        let mut visited = HashSet::new();
        let mut worklist = vec![from];

        while let Some(current) = worklist.pop() {
            if !visited.insert(current) {
                continue;
            }
            if self.on_border(current) {
                return true;
            }
            for direction in Direction::VARIANTS {
                let neighbor = direction.attempt_from(current);
                if self.cell(neighbor) == Some(Cell::Blocked) && !visited.contains(&neighbor) {
                    worklist.push(neighbor);
                }
            }
        }

        false
    }
}
