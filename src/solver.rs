//! Path enumeration and the exact-cover assignment search.

use std::collections::HashSet;

use itertools::Itertools;
use log::{debug, info, trace};
use strum::VariantArray;
use thiserror::Error;

use crate::cell::Cell;
use crate::direction::Direction;
use crate::grid::{Grid, Pair};
use crate::location::Location;
use crate::path::{Path, PathParseError, PathStep};

/// Upper bound on the number of paths a single enumeration may produce.
///
/// The cap is the primary defense against time and memory blowup on
/// permissive grids, not a tuning knob: an uncapped enumeration of a large
/// open grid can produce astronomically many paths.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PathCap {
    /// Never stop early. The only mode guaranteed to return a complete list.
    Unlimited,
    /// Abort an enumeration once this many paths have been found.
    AtMost(usize),
}

impl PathCap {
    fn reached(self, count: usize) -> bool {
        match self {
            Self::Unlimited => false,
            Self::AtMost(limit) => count >= limit,
        }
    }
}

impl Default for PathCap {
    fn default() -> Self {
        Self::AtMost(50_000)
    }
}

/// Outcome of a single path enumeration.
///
/// `CapReached` is a capacity signal, not an error: at least the configured
/// cap many paths exist and the exact count is unknown. It is deliberately
/// distinct from `Found` of an empty list, which means no path exists at
/// all, and every call site branches on the difference.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Enumeration {
    /// The complete path list, in deterministic move order.
    Found(Vec<Path>),
    /// Enumeration aborted because the cap was reached.
    CapReached,
}

/// Reasons a solve cannot run, or cannot report faithfully.
#[derive(Debug, Error)]
pub enum SolveError {
    /// A hardcoded path or probe referenced a label missing from the grid.
    #[error("no pair labeled {0:?} on this grid")]
    UnknownLabel(String),
    /// A hardcoded move sequence could not be decoded.
    #[error("hardcoded path for {label:?} is malformed")]
    BadOverride {
        /// The label the override was supplied for.
        label: String,
        /// The decoding failure.
        #[source]
        source: PathParseError,
    },
    /// A hardcoded path stepped outside the grid.
    #[error("hardcoded path for {label:?} leaves the grid at {location}")]
    OverrideOutOfBounds {
        /// The label the override was supplied for.
        label: String,
        /// The first out-of-bounds cell the replay reached.
        location: Location,
    },
    /// The assignment search hit the path cap while enumerating candidates;
    /// continuing would silently search a truncated list, so it refuses.
    #[error("at least {cap} paths exist for {label:?}; raise or lift the cap")]
    CapExceeded {
        /// The label whose enumeration was truncated.
        label: String,
        /// The cap in force.
        cap: usize,
    },
}

/// One complete assignment of a path to every pair: hardcoded overrides,
/// perimeter-fixed paths, and interior search results spliced together.
#[derive(Clone, Debug)]
pub struct Solution {
    paths: Vec<Path>,
}

impl Solution {
    /// The chosen paths, one per pair.
    pub fn paths(&self) -> &[Path] {
        &self.paths
    }
}

// Cap, cancellation flags, and search mode, threaded by reference through
// the recursion instead of living in process globals.
struct SearchContext {
    cap: PathCap,
    fast_mode: bool,
    solution_found: bool,
}

/// Enumerate every simple path between `pair`'s endpoints by depth-first
/// search, honoring the shared `visited` set (cells already claimed by other
/// paths are off limits) and leaving it unchanged on return.
///
/// In perimeter mode each destination cell must additionally classify as
/// perimeter, except the pair's own end, which is always permitted.
pub(crate) fn find_paths(
    grid: &mut Grid,
    pair: &Pair,
    visited: &mut HashSet<Location>,
    perimeter_only: bool,
    cap: PathCap,
) -> Enumeration {
    let mut paths = Vec::new();
    let mut counter = 0;
    let mut moves = Vec::new();

    dfs(
        grid,
        pair,
        pair.start,
        &mut moves,
        visited,
        perimeter_only,
        cap,
        &mut paths,
        &mut counter,
    );

    if cap.reached(counter) {
        Enumeration::CapReached
    } else {
        Enumeration::Found(paths)
    }
}

#[allow(clippy::too_many_arguments)]
fn dfs(
    grid: &mut Grid,
    pair: &Pair,
    current: Location,
    moves: &mut Vec<PathStep>,
    visited: &mut HashSet<Location>,
    perimeter_only: bool,
    cap: PathCap,
    paths: &mut Vec<Path>,
    counter: &mut usize,
) {
    if cap.reached(*counter) {
        return;
    }

    if current == pair.end {
        moves.push(PathStep::Arrived);
        paths.push(Path {
            label: pair.label.clone(),
            start: pair.start,
            end: pair.end,
            steps: moves.clone(),
        });
        moves.pop();
        *counter += 1;
        if *counter % 512 == 0 {
            trace!(
                "pair {} ({} -> {}): {} paths so far",
                pair.label,
                pair.start,
                pair.end,
                counter
            );
        }
        return;
    }

    visited.insert(current);

    for direction in Direction::VARIANTS {
        let next = direction.attempt_from(current);
        if !grid.is_valid_move(next, visited) {
            continue;
        }
        if perimeter_only && next != pair.end && !grid.is_perimeter(next, Some(pair)) {
            continue;
        }
        moves.push(PathStep::Move(*direction));
        dfs(grid, pair, next, moves, visited, perimeter_only, cap, paths, counter);
        moves.pop();
    }

    visited.remove(&current);
}

/// Drives path enumeration and the exact-cover assignment search over one
/// [`Grid`].
///
/// Configure with the builder-style setters, then call [`Solver::solve`].
/// The grid is borrowed mutably for the solver's lifetime and is returned to
/// its pre-solve state on every exit path.
pub struct Solver<'a> {
    grid: &'a mut Grid,
    cap: PathCap,
    fast_mode: bool,
    perimeter_prepass: bool,
    overrides: Vec<(String, String)>,
}

impl<'a> Solver<'a> {
    /// Construct a solver over `grid` with the default cap, exhaustive
    /// search, no perimeter pre-pass, and no overrides.
    pub fn new(grid: &'a mut Grid) -> Self {
        Self {
            grid,
            cap: PathCap::default(),
            fast_mode: false,
            perimeter_prepass: false,
            overrides: Vec::new(),
        }
    }

    /// Set the enumeration cap.
    pub fn cap(&mut self, cap: PathCap) -> &mut Self {
        self.cap = cap;
        self
    }

    /// Stop after the first full solution instead of enumerating all of
    /// them.
    pub fn fast_mode(&mut self, enabled: bool) -> &mut Self {
        self.fast_mode = enabled;
        self
    }

    /// Fix perimeter-routable pairs ahead of the interior search. Every
    /// combination of their perimeter paths is tried as a prefix, which
    /// prunes the harder interior problem.
    pub fn perimeter_prepass(&mut self, enabled: bool) -> &mut Self {
        self.perimeter_prepass = enabled;
        self
    }

    /// Supply a literal `^ v < >` move sequence for `label`. The path is
    /// validated when `solve` runs, fixed in place before any other pair is
    /// probed, and spliced unchanged into every reported solution.
    pub fn hardcode(&mut self, label: &str, moves: &str) -> &mut Self {
        self.overrides.push((label.to_owned(), moves.to_owned()));
        self
    }

    /// Enumerate the perimeter-only paths for `label`, leaving the grid
    /// unchanged.
    pub fn probe_perimeter_paths(&mut self, label: &str) -> Result<Enumeration, SolveError> {
        let pair = self
            .grid
            .pair_named(label)
            .cloned()
            .ok_or_else(|| SolveError::UnknownLabel(label.to_owned()))?;
        let cap = self.cap;
        Ok(self.grid.with_pair_state(&pair, Cell::Traversable, |grid| {
            find_paths(grid, &pair, &mut HashSet::new(), true, cap)
        }))
    }

    /// Find every assignment of one path per pair such that the paths are
    /// pairwise disjoint and cover all traversable cells exactly once.
    ///
    /// An empty result means the exact-cover search was exhausted without a
    /// solution, which is an ordinary outcome, not an error.
    pub fn solve(&mut self) -> Result<Vec<Solution>, SolveError> {
        let hardcoded = self.resolve_overrides()?;
        let solving = self
            .grid
            .pairs()
            .iter()
            .filter(|pair| !hardcoded.iter().any(|path| path.label == pair.label))
            .cloned()
            .collect_vec();

        // Mask hardcoded paths off the grid before anything probes it.
        for path in &hardcoded {
            self.grid.activate_path(path, Cell::Blocked, solving.len());
        }

        let result = self.solve_inner(&solving, &hardcoded);

        for _ in &hardcoded {
            self.grid.restore();
        }

        result
    }

    // Decode and bounds-check the hardcoded overrides, in the order they
    // were supplied.
    fn resolve_overrides(&self) -> Result<Vec<Path>, SolveError> {
        let mut resolved = Vec::with_capacity(self.overrides.len());
        for (label, moves) in &self.overrides {
            let pair = self
                .grid
                .pair_named(label)
                .ok_or_else(|| SolveError::UnknownLabel(label.clone()))?;
            let steps = Path::parse_steps(moves).map_err(|source| SolveError::BadOverride {
                label: label.clone(),
                source,
            })?;

            let mut at = pair.start;
            for step in &steps {
                if let PathStep::Move(direction) = step {
                    at = direction.attempt_from(at);
                    if !self.grid.in_bounds(at) {
                        return Err(SolveError::OverrideOutOfBounds {
                            label: label.clone(),
                            location: at,
                        });
                    }
                }
            }

            resolved.push(Path {
                label: label.clone(),
                start: pair.start,
                end: at,
                steps,
            });
        }
        Ok(resolved)
    }

    fn solve_inner(
        &mut self,
        solving: &[Pair],
        hardcoded: &[Path],
    ) -> Result<Vec<Solution>, SolveError> {
        let mut ctx = SearchContext {
            cap: self.cap,
            fast_mode: self.fast_mode,
            solution_found: false,
        };

        // Split the pairs: those with at least one perimeter path get fixed
        // ahead of the interior search, the rest are solved by backtracking.
        let mut perimeter_sets: Vec<Vec<Path>> = Vec::new();
        let mut interior: Vec<Pair> = Vec::new();
        if self.perimeter_prepass {
            for pair in solving {
                let cap = ctx.cap;
                let enumeration = self.grid.with_pair_state(pair, Cell::Traversable, |grid| {
                    find_paths(grid, pair, &mut HashSet::new(), true, cap)
                });
                match enumeration {
                    Enumeration::Found(paths) if !paths.is_empty() => {
                        debug!("pair {}: {} perimeter paths", pair.label, paths.len());
                        perimeter_sets.push(paths);
                    }
                    Enumeration::Found(_) => interior.push(pair.clone()),
                    // Fixing a pair from a knowingly incomplete path list
                    // could drop solutions; solve it interior-style instead.
                    Enumeration::CapReached => interior.push(pair.clone()),
                }
            }
            perimeter_sets.sort_by_key(Vec::len);
        } else {
            interior = solving.to_vec();
        }

        // One combination per choice of perimeter path for each perimeter
        // pair; with no perimeter pairs, a single empty combination.
        let combinations: Vec<Vec<&Path>> = if perimeter_sets.is_empty() {
            vec![Vec::new()]
        } else {
            perimeter_sets
                .iter()
                .map(|paths| paths.iter())
                .multi_cartesian_product()
                .collect()
        };

        let mut solutions = Vec::new();

        for (index, combination) in combinations.iter().enumerate() {
            if !combination.is_empty() {
                debug!("perimeter combination {}/{}", index + 1, combinations.len());
            }

            // Colliding perimeter paths can never be part of an exact cover.
            let mut claimed = HashSet::new();
            if combination
                .iter()
                .flat_map(|path| path.cells())
                .any(|cell| !claimed.insert(cell))
            {
                continue;
            }

            for path in combination {
                self.grid.activate_path(path, Cell::Blocked, interior.len());
            }

            let outcome = self.solve_interior(&interior, &mut ctx);

            for _ in combination {
                self.grid.restore();
            }

            for assignment in outcome? {
                let mut paths =
                    Vec::with_capacity(hardcoded.len() + combination.len() + assignment.len());
                paths.extend(hardcoded.iter().cloned());
                paths.extend(combination.iter().map(|path| (*path).clone()));
                paths.extend(assignment);
                solutions.push(Solution { paths });
            }

            if ctx.fast_mode && ctx.solution_found {
                break;
            }
        }

        info!("search finished: {} solutions", solutions.len());
        Ok(solutions)
    }

    fn solve_interior(
        &mut self,
        interior: &[Pair],
        ctx: &mut SearchContext,
    ) -> Result<Vec<Vec<Path>>, SolveError> {
        // Fewest-options-first: probe each pair's path count and solve the
        // most constrained pairs before the permissive ones.
        let mut counts = Vec::with_capacity(interior.len());
        for pair in interior {
            let cap = ctx.cap;
            let enumeration = self.grid.with_pair_state(pair, Cell::Traversable, |grid| {
                find_paths(grid, pair, &mut HashSet::new(), false, cap)
            });
            let count = match enumeration {
                Enumeration::Found(paths) => paths.len(),
                // At least `cap` paths exist; the exact count only matters
                // for ordering, where this sorts the pair last.
                Enumeration::CapReached => match ctx.cap {
                    PathCap::AtMost(limit) => limit,
                    PathCap::Unlimited => unreachable!("cap sentinel from an uncapped enumeration"),
                },
            };
            debug!("pair {}: {} candidate paths", pair.label, count);
            counts.push((count, pair.clone()));
        }
        counts.sort_by(|a, b| (a.0, &a.1.label).cmp(&(b.0, &b.1.label)));
        let ordered = counts.into_iter().map(|(_, pair)| pair).collect_vec();

        let mut found = Vec::new();
        let mut chosen = Vec::new();
        let mut visited = HashSet::new();
        self.assign(&ordered, 0, &mut chosen, &mut visited, ctx, &mut found)?;
        Ok(found)
    }

    // The exact-cover backtracking step: pick a path for `ordered[index]`
    // that avoids every already-claimed cell, recurse, undo.
    fn assign(
        &mut self,
        ordered: &[Pair],
        index: usize,
        chosen: &mut Vec<Path>,
        visited: &mut HashSet<Location>,
        ctx: &mut SearchContext,
        found: &mut Vec<Vec<Path>>,
    ) -> Result<(), SolveError> {
        if ctx.fast_mode && ctx.solution_found {
            return Ok(());
        }

        if index == ordered.len() {
            // Exact cover, not mere disjointness: every traversable cell
            // must have been claimed.
            if visited.len() == self.grid.total_traversable() {
                found.push(chosen.clone());
                ctx.solution_found = true;
            }
            return Ok(());
        }

        let pair = ordered[index].clone();
        let cap = ctx.cap;
        let enumeration = self.grid.with_pair_state(&pair, Cell::Traversable, |grid| {
            find_paths(grid, &pair, visited, false, cap)
        });
        let paths = match enumeration {
            Enumeration::Found(paths) => paths,
            Enumeration::CapReached => {
                let PathCap::AtMost(cap) = ctx.cap else {
                    unreachable!("cap sentinel from an uncapped enumeration")
                };
                return Err(SolveError::CapExceeded {
                    label: pair.label.clone(),
                    cap,
                });
            }
        };

        for path in paths {
            let cells = path.cells();
            if cells.iter().any(|cell| visited.contains(cell)) {
                continue;
            }

            for cell in &cells {
                visited.insert(*cell);
            }
            chosen.push(path);

            self.assign(ordered, index + 1, chosen, visited, ctx, found)?;

            chosen.pop();
            for cell in &cells {
                visited.remove(cell);
            }
        }

        Ok(())
    }
}
