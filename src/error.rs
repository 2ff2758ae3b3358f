//! Hand-rolled error types. No external error-handling crate appears
//! anywhere in this codebase's lineage, so errors here are plain enums with
//! a manual `Display` impl, matching `transform::fixed_point::TransformError`.

use core::fmt;

/// Failures from C3 (alloca classification).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocaError {
    /// A dynamically-sized allocation (`ArraySize = -1`) was requested
    /// outside `Shared` address space, or with a runtime-determined size
    /// this analysis has no way to bound.
    DynamicAllocationNotSupported,
}

impl fmt::Display for AllocaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocaError::DynamicAllocationNotSupported => {
                write!(f, "dynamic allocation is not supported outside shared memory")
            }
        }
    }
}

/// Failures from C4 (dominance/post-dominance).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DominatorError {
    /// `common_dominator`/`GetImmediateCommonDominator` called with no
    /// blocks to intersect.
    EmptyBlockSet,
}

impl fmt::Display for DominatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DominatorError::EmptyBlockSet => {
                write!(f, "cannot compute a common dominator of an empty block set")
            }
        }
    }
}
