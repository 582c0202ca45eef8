/// Index of a pair in its grid's pair table.
pub(crate) type PairId = usize;

/// Whether an endpoint cell is the first or second occurrence of its label.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum EndpointRole {
    /// The label's first occurrence in reading order.
    Start,
    /// The label's second occurrence.
    End,
}

/// The state of one grid cell.
///
/// Endpoint cells behave as blocked until a pair is activated, at which point
/// both of its endpoints are overwritten with [`Cell::Traversable`] (or
/// [`Cell::Blocked`], to exclude the pair from a sub-problem) and the prior
/// states are pushed onto the grid's undo stack.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) enum Cell {
    Traversable,
    Endpoint { pair: PairId, role: EndpointRole },
    // rows are right-padded with blocked cells, hence the default
    #[default]
    Blocked,
}
