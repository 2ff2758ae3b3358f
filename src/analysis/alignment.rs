//! C9: the alloca-alignment walker. Propagates alignment information
//! transitively through an allocation's uses, reusing one visited-set/stack
//! pair across calls (spec.md §4.8, §9 "Reusable walker").
//!
//! Grounded on the explicit-stack DFS idiom already used by
//! `analysis::cfg::reverse_post_order`, generalized here to walk the use-def
//! graph instead of the CFG, with the visited set and stack kept as fields
//! on the walker (rather than locals) so a caller can reuse one instance
//! across many allocas without reallocating.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use crate::entity::Value;
use crate::function::Function;
use crate::types::TypeNode;
use crate::value::{MemoryOp, ValueKind, ViewOp};

/// A reusable DFS walker over one function's use-def graph.
#[derive(Debug, Default)]
pub struct AlignmentWalker {
    visited: BTreeSet<Value>,
    stack: Vec<Value>,
}

impl AlignmentWalker {
    pub fn new() -> Self {
        AlignmentWalker { visited: BTreeSet::new(), stack: Vec::new() }
    }

    /// `GetInitialAlignment`: `max(type.Alignment, type.Size)` when the size
    /// is a power of two, else just `type.Alignment`.
    pub fn initial_alignment(ty: &TypeNode) -> u32 {
        if ty.size_is_power_of_two() {
            core::cmp::max(ty.alignment(), ty.size())
        } else {
            ty.alignment()
        }
    }

    /// The alignment a foldable use contributes, or `None` if `value` is not
    /// one of the kinds the walker tracks (spec.md §4.8: "else skip this
    /// use" — such a use's own uses are also not traversed, since alignment
    /// information does not flow through a kind the walker does not
    /// recognise as pointer/view-manipulating).
    fn fold(func: &Function, value: Value) -> Option<u32> {
        match func.value_kind(value) {
            ValueKind::View(ViewOp::AlignViewTo { alignment, .. }) => Some(*alignment),
            ValueKind::View(_) | ValueKind::Phi(_) => func.value_data(value).ty().map(Self::initial_alignment),
            _ => None,
        }
    }

    /// Computes the propagated alignment for `alloca`, an `Alloca` value.
    /// Clears and reuses the walker's internal stack/visited set.
    pub fn compute(&mut self, func: &Function, alloca: Value) -> u32 {
        self.visited.clear();
        self.stack.clear();

        let element_type = func
            .value_kind(alloca)
            .as_memory_op()
            .and_then(|op| match op {
                MemoryOp::Alloca(data) => Some(&data.element_type),
                _ => None,
            })
            .expect("compute called on a non-Alloca value");
        let mut alignment = Self::initial_alignment(element_type);

        self.stack.extend(func.value_uses(alloca).iter().copied());

        while let Some(value) = self.stack.pop() {
            if !self.visited.insert(value) {
                continue;
            }
            if let Some(folded) = Self::fold(func, value) {
                alignment = core::cmp::max(alignment, folded);
                self.stack.extend(func.value_uses(value).iter().copied());
            }
        }

        self.visited.clear();
        self.stack.clear();
        alignment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MemoryAddressSpace;
    use crate::value::{AllocaArrayLen, AllocaData, GenericOp, SideEffectOp, TerminatorOp};

    fn alloca_of(func: &mut Function, size: u32, alignment: u32) -> Value {
        func.add_value(
            func.entry_block().unwrap_or_else(|| func.add_block()),
            ValueKind::SideEffect(SideEffectOp::Memory(MemoryOp::Alloca(AllocaData {
                address_space: MemoryAddressSpace::Local,
                array_len: AllocaArrayLen::Scalar,
                element_type: TypeNode::scalar(size, alignment),
            }))),
            Some(TypeNode::pointer(MemoryAddressSpace::Local, TypeNode::scalar(size, alignment))),
        )
    }

    #[test]
    fn initial_alignment_is_returned_with_no_uses() {
        let mut func = Function::new("f", 0);
        func.add_block();
        let a = alloca_of(&mut func, 4, 4);
        let mut walker = AlignmentWalker::new();
        assert_eq!(walker.compute(&func, a), 4);
    }

    #[test]
    fn power_of_two_size_boosts_initial_alignment() {
        let mut func = Function::new("f", 0);
        func.add_block();
        // size 16 is a power of two and larger than the declared alignment 4.
        let a = alloca_of(&mut func, 16, 4);
        let mut walker = AlignmentWalker::new();
        assert_eq!(walker.compute(&func, a), 16);
    }

    #[test]
    fn align_view_to_folds_its_explicit_constant() {
        let mut func = Function::new("f", 0);
        let entry = func.add_block();
        let a = alloca_of(&mut func, 4, 4);
        func.add_value(entry, ValueKind::View(ViewOp::AlignViewTo { operand: a, alignment: 64 }), None);
        let mut walker = AlignmentWalker::new();
        assert_eq!(walker.compute(&func, a), 64);
    }

    #[test]
    fn alignment_propagates_through_a_pointer_cast_chain() {
        let mut func = Function::new("f", 0);
        let entry = func.add_block();
        let a = alloca_of(&mut func, 4, 4);
        let cast = func.add_value(
            entry,
            ValueKind::View(ViewOp::PointerCast { operand: a }),
            Some(TypeNode::pointer(MemoryAddressSpace::Local, TypeNode::scalar(32, 8))),
        );
        func.add_value(entry, ValueKind::View(ViewOp::AlignViewTo { operand: cast, alignment: 128 }), None);
        let mut walker = AlignmentWalker::new();
        assert_eq!(walker.compute(&func, a), 128);
    }

    #[test]
    fn a_non_pointer_consumer_stops_propagation() {
        let mut func = Function::new("f", 0);
        let entry = func.add_block();
        let a = alloca_of(&mut func, 4, 4);
        // A Load reads through the alloca but is not itself a tracked kind;
        // its own uses (here an AlignViewTo, nonsensically chained just to
        // prove the point) must not be visited.
        let load = func.add_value(entry, ValueKind::SideEffect(SideEffectOp::Memory(MemoryOp::Load { source: a })), None);
        func.add_value(entry, ValueKind::View(ViewOp::AlignViewTo { operand: load, alignment: 256 }), None);
        let mut walker = AlignmentWalker::new();
        assert_eq!(walker.compute(&func, a), 4);
    }

    #[test]
    fn walker_is_reusable_across_calls() {
        let mut func = Function::new("f", 0);
        func.add_block();
        let a1 = alloca_of(&mut func, 4, 4);
        let a2 = alloca_of(&mut func, 8, 8);
        let mut walker = AlignmentWalker::new();
        assert_eq!(walker.compute(&func, a1), 4);
        assert_eq!(walker.compute(&func, a2), 8);
    }

    #[test]
    fn result_is_never_below_the_initial_alignment() {
        let mut func = Function::new("f", 0);
        let entry = func.add_block();
        let a = alloca_of(&mut func, 4, 4);
        let cond = func.add_value(entry, ValueKind::Generic(GenericOp { operands: Vec::new() }), None);
        func.add_value(
            entry,
            ValueKind::Terminator(TerminatorOp::ConditionalBranch { condition: cond, true_target: entry, false_target: entry }),
            None,
        );
        let mut walker = AlignmentWalker::new();
        assert!(walker.compute(&func, a) >= AlignmentWalker::initial_alignment(&TypeNode::scalar(4, 4)));
    }
}
