//! Traversal direction as a zero-sized type parameter, so the dominator
//! engine (C4) and the CFG view (C2) share one generic implementation for
//! both dominance and post-dominance instead of duplicating the algorithm.

/// Sealed: only `Forwards`/`Backwards` implement this.
pub trait Direction: 'static + Copy + Clone + private::Sealed {
    /// `true` for the post-dominance direction, where a virtual exit node
    /// may need to be synthesized for multi-return functions.
    const IS_BACKWARDS: bool;
}

mod private {
    pub trait Sealed {}
    impl Sealed for super::Forwards {}
    impl Sealed for super::Backwards {}
}

/// Dominance: entry block is the root, edges follow successors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Forwards;

impl Direction for Forwards {
    const IS_BACKWARDS: bool = false;
}

/// Post-dominance: (virtual) exit block is the root, edges follow
/// predecessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backwards;

impl Direction for Backwards {
    const IS_BACKWARDS: bool = true;
}
