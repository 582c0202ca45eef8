use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use itertools::repeat_n;
use ndarray::Array2;
use thiserror::Error;

use crate::cell::{Cell, EndpointRole};
use crate::location::Location;
use crate::path::Path;

/// A label's two endpoints: the first occurrence in the grid text is the
/// start, the second the end.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Pair {
    pub(crate) label: String,
    pub(crate) display: char,
    pub(crate) start: Location,
    pub(crate) end: Location,
}

impl Pair {
    /// This pair's label token.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The start endpoint.
    pub fn start(&self) -> Location {
        self.start
    }

    /// The end endpoint.
    pub fn end(&self) -> Location {
        self.end
    }
}

/// Reasons a grid specification cannot be turned into a [`Grid`].
#[derive(Debug, Error)]
pub enum GridParseError {
    /// The specification contained no cells at all.
    #[error("grid specification contains no cells")]
    Empty,
    /// A label token did not appear exactly twice.
    #[error("label {label:?} must appear exactly twice, found it at {positions:?}")]
    LabelCardinality {
        /// The offending label.
        label: String,
        /// Everywhere the label appeared.
        positions: Vec<Location>,
    },
}

// One undo record: the cells an activation overwrote, plus the coverage
// target in force before it.
struct Frame {
    saved: Vec<(Location, Cell)>,
    prev_total: usize,
}

/// The in-memory grid: a rectangular cell array, the pair table, and a
/// last-in-first-out stack of reversible mutations.
///
/// Activation calls (`activate_pair`, `activate_path`) overwrite cells and
/// push an undo frame; `restore` pops exactly one frame. Callers must keep
/// activations strictly nested, which [`Grid::with_pair_state`] makes
/// structural.
pub struct Grid {
    cells: Array2<Cell>,
    pairs: Vec<Pair>,
    total_traversable: usize,
    undo_stack: Vec<Frame>,
}

impl FromStr for Grid {
    type Err = GridParseError;

    /// Parse the grid mini-language.
    ///
    /// Rows are separated by `.` (or `;`); backslashes are stripped so shell
    /// escaping survives. Within a row, comma-separated tokens are either a
    /// signed integer — positive for that many traversable cells, negative
    /// for that many blocked cells, zero for a single blocked cell — or a
    /// label token occupying one cell. Rows are right-padded with blocked
    /// cells to the widest row. Every label must appear exactly twice.
    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let cleaned = spec.replace('\\', "").replace(';', ".");

        let mut rows: Vec<Vec<Cell>> = Vec::new();
        let mut labels: Vec<(String, Vec<Location>)> = Vec::new();

        for row_spec in cleaned.split('.') {
            if row_spec.trim().is_empty() {
                continue;
            }

            let y = rows.len();
            let mut row = Vec::new();
            for token in row_spec.split(',') {
                let token = token.trim();
                if token.is_empty() {
                    continue;
                }

                match token.parse::<i64>() {
                    Ok(run) if run > 0 => row.extend(repeat_n(Cell::Traversable, run as usize)),
                    Ok(run) if run < 0 => row.extend(repeat_n(Cell::Blocked, run.unsigned_abs() as usize)),
                    Ok(_) => row.push(Cell::Blocked),
                    Err(_) => {
                        let location = Location(row.len(), y);
                        let pair = match labels.iter().position(|(label, _)| label.as_str() == token) {
                            Some(index) => index,
                            None => {
                                labels.push((token.to_owned(), Vec::new()));
                                labels.len() - 1
                            }
                        };
                        labels[pair].1.push(location);
                        let role = match labels[pair].1.len() {
                            1 => EndpointRole::Start,
                            _ => EndpointRole::End,
                        };
                        row.push(Cell::Endpoint { pair, role });
                    }
                }
            }
            rows.push(row);
        }

        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        if width == 0 {
            return Err(GridParseError::Empty);
        }

        let cells = Array2::from_shape_fn((rows.len(), width), |(y, x)| {
            rows[y].get(x).copied().unwrap_or_default()
        });

        let mut pairs = Vec::with_capacity(labels.len());
        for (label, positions) in labels {
            if positions.len() != 2 {
                return Err(GridParseError::LabelCardinality { label, positions });
            }
            let display = label.chars().next().unwrap_or('?');
            pairs.push(Pair {
                label,
                display,
                start: positions[0],
                end: positions[1],
            });
        }

        let mut grid = Self {
            cells,
            pairs,
            total_traversable: 0,
            undo_stack: Vec::new(),
        };
        grid.total_traversable = grid.count_traversable() + 2 * grid.pairs.len();
        Ok(grid)
    }
}

impl Grid {
    /// Number of columns.
    pub fn width(&self) -> usize {
        self.cells.ncols()
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.cells.nrows()
    }

    /// The pair table, in order of first appearance in the grid text.
    pub fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    /// The number of cells a full solution must cover: traversable cells
    /// plus two endpoints for every pair still being solved. Recomputed by
    /// every path activation.
    pub fn total_traversable(&self) -> usize {
        self.total_traversable
    }

    /// The pair owning `location` and its role there, if `location` is an
    /// endpoint cell in the grid's current state.
    ///
    /// Activated endpoints are plain traversable or blocked cells and report
    /// `None` until restored.
    pub fn endpoint_at(&self, location: Location) -> Option<(&Pair, EndpointRole)> {
        match self.cell(location)? {
            Cell::Endpoint { pair, role } => Some((&self.pairs[pair], role)),
            _ => None,
        }
    }

    pub(crate) fn pair_named(&self, label: &str) -> Option<&Pair> {
        self.pairs.iter().find(|pair| pair.label == label)
    }

    pub(crate) fn cell(&self, location: Location) -> Option<Cell> {
        self.cells.get(location.as_index()).copied()
    }

    pub(crate) fn in_bounds(&self, location: Location) -> bool {
        location.0 < self.width() && location.1 < self.height()
    }

    /// True iff `location` is in bounds, currently traversable (which
    /// includes activated endpoints), and not already visited.
    pub(crate) fn is_valid_move(&self, location: Location, visited: &HashSet<Location>) -> bool {
        self.cell(location) == Some(Cell::Traversable) && !visited.contains(&location)
    }

    fn count_traversable(&self) -> usize {
        self.cells.iter().filter(|cell| **cell == Cell::Traversable).count()
    }

    /// Overwrite both of `pair`'s endpoints with `state`, snapshotting the
    /// prior cells onto the undo stack. Does not touch the coverage target:
    /// an active pair's endpoints are already accounted for in it.
    pub(crate) fn activate_pair(&mut self, pair: &Pair, state: Cell) {
        let mut frame = Frame {
            saved: Vec::with_capacity(2),
            prev_total: self.total_traversable,
        };
        for location in [pair.start, pair.end] {
            frame.saved.push((location, self.cells[location.as_index()]));
            self.cells[location.as_index()] = state;
        }
        self.undo_stack.push(frame);
    }

    /// Overwrite every cell on `path` (start through end inclusive) with
    /// `state`, snapshotting the prior cells, then recompute the coverage
    /// target counting `active_pairs` pairs as still unsolved.
    ///
    /// All path cells must be in bounds; the solver validates hardcoded
    /// overrides before ever activating them.
    pub(crate) fn activate_path(&mut self, path: &Path, state: Cell, active_pairs: usize) {
        let mut frame = Frame {
            saved: Vec::new(),
            prev_total: self.total_traversable,
        };
        for location in path.cells() {
            frame.saved.push((location, self.cells[location.as_index()]));
            self.cells[location.as_index()] = state;
        }
        self.undo_stack.push(frame);
        self.total_traversable = self.count_traversable() + 2 * active_pairs;
    }

    /// Pop the top undo frame, writing the saved cells back in reverse order
    /// and reinstating the coverage target recorded when it was pushed.
    pub(crate) fn restore(&mut self) {
        let frame = self
            .undo_stack
            .pop()
            .expect("restore called with no outstanding activation");
        for (location, cell) in frame.saved.into_iter().rev() {
            self.cells[location.as_index()] = cell;
        }
        self.total_traversable = frame.prev_total;
    }

    /// Run `f` with `pair`'s endpoints set to `state`, restoring them on the
    /// way out regardless of how `f` returns.
    pub(crate) fn with_pair_state<T>(
        &mut self,
        pair: &Pair,
        state: Cell,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        self.activate_pair(pair, state);
        let result = f(self);
        self.restore();
        result
    }

    /// Render the grid with `paths` drawn over it: path cells in the
    /// lowercase label character, endpoints uppercase, unused traversable
    /// cells as `.`, blocked cells as `#`.
    pub fn render_paths(&self, paths: &[Path]) -> String {
        let mut chars = Array2::from_shape_fn(self.cells.raw_dim(), |index| {
            self.cell_char(self.cells[index])
        });

        for path in paths {
            let display = path.label.chars().next().unwrap_or('?');
            for location in path.cells() {
                chars[location.as_index()] = display.to_ascii_lowercase();
            }
            chars[path.start.as_index()] = display.to_ascii_uppercase();
            chars[path.end.as_index()] = display.to_ascii_uppercase();
        }

        let mut out = String::with_capacity(chars.nrows() * (chars.ncols() + 1));
        for row in chars.rows() {
            out.extend(row);
            out.push('\n');
        }
        out
    }

    fn cell_char(&self, cell: Cell) -> char {
        match cell {
            Cell::Traversable => '.',
            Cell::Blocked => '#',
            Cell::Endpoint { pair, .. } => self.pairs[pair].display.to_ascii_uppercase(),
        }
    }
}

impl Display for Grid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render_paths(&[]))
    }
}
