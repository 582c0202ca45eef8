#![warn(missing_docs)]

//! # `gridflow`
//!
//! A solver for connector-grid puzzles: a rectangular grid of traversable and
//! blocked cells plus a set of labeled endpoint pairs, where every pair must
//! be joined by a simple orthogonal path, no two paths may share a cell, and
//! together the paths must cover every traversable cell exactly once.
//! Begin by parsing a [`Grid`] from the grid mini-language (see
//! [`Grid`]), then drive a [`Solver`] over it.
//!
//! # Internals
//! This crate is driven by exhaustive depth-first path enumeration combined
//! with an exact-cover backtracking search.
//! For each pair, every simple path between its endpoints is enumerated in a
//! fixed move order (up, down, left, right), optionally restricted to cells
//! on the grid's perimeter as decided by a flood-fill classifier over blocked
//! regions.
//! The assignment search then solves pairs in fewest-paths-first order,
//! accumulating a shared visited set and accepting only assignments whose
//! union covers every traversable cell.
//!
//! Enumeration is bounded by a [`PathCap`]; a capped enumeration reports the
//! [`Enumeration::CapReached`] sentinel rather than a silently truncated
//! list, so "at least this many paths exist" never masquerades as an exact
//! count.
//!
//! The grid is the only shared mutable state. Every temporary mutation
//! (activating a pair's endpoints, masking a fixed path) is pushed onto an
//! undo stack and unwound in strict last-in-first-out order, so the grid is
//! bit-identical to its parsed state after any solve, including ones
//! abandoned early by the cap or by fast mode.

pub use cell::EndpointRole;
pub use direction::Direction;
pub use grid::{Grid, GridParseError, Pair};
pub use location::Location;
pub use path::{Path, PathParseError, PathStep};
pub use solver::{Enumeration, PathCap, Solution, SolveError, Solver};

pub(crate) mod cell;
pub(crate) mod direction;
pub(crate) mod grid;
pub(crate) mod location;
pub(crate) mod path;
pub(crate) mod perimeter;
pub(crate) mod solver;
mod tests;
