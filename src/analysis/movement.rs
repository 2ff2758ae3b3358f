//! C8: the value-movement legality oracle. Decides whether hoisting or
//! sinking a value into a target block would change program semantics.
//!
//! The RPO-indexed movement precomputation is new to this crate (spec.md
//! §3/§4.7/§9 "Movement precomputation" have no teacher analogue — `lpc-lpir`
//! never needs to reason about memory-operation reordering), built directly
//! against the spec text; the one-pass-over-blocks-in-RPO construction style
//! and the `BTreeMap`-keyed scratch maps are grounded on
//! `lpc-lpir::analysis::cfg::ControlFlowGraph::from_function`.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::analysis::cfg::CfgView;
use crate::analysis::dominance::Dominators;
use crate::direction::{Backwards, Forwards};
use crate::entity::Block;
use crate::entity::Value;
use crate::function::Function;
use crate::types::MemoryAddressSpace;
use crate::value::MemoryOp;

/// The caller-injected `IMovementScope` of spec.md §6: lets a host pass
/// locate the first non-`Load` memory value in a target block by whatever
/// richer bookkeeping it already maintains, overriding the generic
/// `blockRanges` probe-start rule.
pub trait MovementScope {
    fn first_non_load_memory_value(&self, func: &Function, index: &MovementIndex, block: Block) -> Option<usize>;
}

/// The default scope: always defers to `blockRanges`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMovementScope;

impl MovementScope for NullMovementScope {
    fn first_non_load_memory_value(&self, _func: &Function, _index: &MovementIndex, _block: Block) -> Option<usize> {
        None
    }
}

/// The precomputed RPO-ordered view of memory values (spec.md §3 "Movement
/// index"), built once and treated as read-only.
#[derive(Debug, Clone)]
pub struct MovementIndex {
    value_blocks: BTreeMap<Value, Block>,
    values: Vec<Value>,
    value_indices: BTreeMap<Value, usize>,
    block_ranges: BTreeMap<Block, Option<usize>>,
}

impl MovementIndex {
    /// One pass over `cfg`'s blocks in RPO: every `SideEffectValue` is
    /// recorded in `valueBlocks`; every `MemoryValue` additionally gets a
    /// dense position in `values`. `blockRanges[B]` is the last such
    /// position whose value lives in `B`, or carried forward from the
    /// nearest preceding block in RPO order when `B` has none of its own
    /// (spec.md §9's documented edge case).
    pub fn build(func: &Function, cfg: &CfgView<Forwards>) -> Self {
        let mut value_blocks = BTreeMap::new();
        let mut values = Vec::new();
        let mut value_indices = BTreeMap::new();
        let mut block_ranges = BTreeMap::new();
        let mut last_index: Option<usize> = None;

        for block in cfg.blocks_in_rpo() {
            let mut block_last = None;
            for &value in func.block_values(block) {
                if func.value_kind(value).is_side_effect() {
                    value_blocks.insert(value, block);
                }
                if func.value_kind(value).as_memory_op().is_some() {
                    let position = values.len();
                    values.push(value);
                    value_indices.insert(value, position);
                    block_last = Some(position);
                }
            }
            if let Some(position) = block_last {
                last_index = Some(position);
            }
            block_ranges.insert(block, last_index);
        }

        MovementIndex { value_blocks, values, value_indices, block_ranges }
    }

    pub fn value_index(&self, value: Value) -> Option<usize> {
        self.value_indices.get(&value).copied()
    }

    pub fn memory_value_at(&self, index: usize) -> Option<Value> {
        self.values.get(index).copied()
    }

    pub fn block_range(&self, block: Block) -> Option<usize> {
        self.block_ranges.get(&block).copied().flatten()
    }

    pub fn block_of(&self, value: Value) -> Option<Block> {
        self.value_blocks.get(&value).copied()
    }
}

fn address_space_of_operand(func: &Function, operand: Value) -> Option<MemoryAddressSpace> {
    func.value_data(operand).ty().and_then(|t| t.address_space_type()).map(|(space, _)| space)
}

/// `spaceOf(I)` of spec.md §4.7.
fn space_of(func: &Function, memory_value: Value) -> Option<MemoryAddressSpace> {
    match func.value_kind(memory_value).as_memory_op()? {
        MemoryOp::Alloca(_) => None,
        MemoryOp::Load { source } => address_space_of_operand(func, *source),
        MemoryOp::Store { target, .. } => address_space_of_operand(func, *target),
        MemoryOp::Atomic { target } => address_space_of_operand(func, *target),
    }
}

/// `CanSkipAddressSpace`: Generic aliases everything, so only two distinct
/// concrete spaces can be proven disjoint.
fn can_skip_address_space(current: MemoryAddressSpace, other: MemoryAddressSpace) -> bool {
    current != MemoryAddressSpace::Generic && current != other
}

/// `CanSkip(M, I)`: may `M` be reordered past the intermediate memory value
/// `I` without changing observable behaviour?
pub fn can_skip(func: &Function, m: Value, i: Value) -> bool {
    let Some(m_op) = func.value_kind(m).as_memory_op() else { return false };
    let Some(i_op) = func.value_kind(i).as_memory_op() else { return false };

    if matches!(i_op, MemoryOp::Alloca(_)) {
        return true;
    }
    let Some(i_space) = space_of(func, i) else { return false };

    match m_op {
        MemoryOp::Alloca(_) => true,
        MemoryOp::Load { .. } => {
            if matches!(i_op, MemoryOp::Load { .. }) {
                return true;
            }
            match space_of(func, m) {
                Some(m_space) => can_skip_address_space(m_space, i_space),
                None => false,
            }
        }
        MemoryOp::Store { target, .. } => match address_space_of_operand(func, *target) {
            Some(m_space) => can_skip_address_space(m_space, i_space),
            None => false,
        },
        MemoryOp::Atomic { target } => match address_space_of_operand(func, *target) {
            Some(m_space) => can_skip_address_space(m_space, i_space),
            None => false,
        },
    }
}

/// `CanMoveTo(value, targetBlock)` (spec.md §4.7). `doms`/`pdoms` must have
/// been built over the same `func`; `index` must have been built over the
/// same `func` and the `Forwards` view backing `doms`.
///
/// Open-question resolution (spec.md §9): "scan from `startIndex + step`
/// toward `valueIndex`" leaves the scan's endpoints ambiguous. This
/// implementation scans *inclusive* of `startIndex` and *exclusive* of
/// `valueIndex` (M is never checked against itself) — the interpretation
/// consistent with scenario S5, where moving a Store at index 5 past a
/// target anchored at index 7 must check both intermediate Loads at 6 and 7.
pub fn can_move_to(
    func: &Function,
    doms: &Dominators<Forwards>,
    pdoms: &Dominators<Backwards>,
    index: &MovementIndex,
    scope: &impl MovementScope,
    value: Value,
    target: Block,
) -> bool {
    let kind = func.value_kind(value);
    if kind.is_parameter() || kind.is_phi() || kind.is_terminator() {
        return false;
    }
    if !kind.is_side_effect() {
        return true;
    }

    let source = func.value_block(value);
    if source == target {
        return true;
    }
    if !doms.dominates_block(source, target) || !pdoms.dominates_block(source, target) {
        return false;
    }

    if kind.as_memory_op().is_none() {
        return true;
    }

    let Some(value_index) = index.value_index(value) else {
        return true;
    };
    let Some(start_index) = scope
        .first_non_load_memory_value(func, index, target)
        .or_else(|| index.block_range(target))
    else {
        return true;
    };

    if start_index == value_index {
        return true;
    }

    let step: isize = if start_index > value_index { -1 } else { 1 };
    let target_index = value_index as isize;
    let mut cursor = start_index as isize;
    while cursor != target_index {
        if let Some(intermediate) = index.memory_value_at(cursor as usize) {
            if !can_skip(func, value, intermediate) {
                return false;
            }
        }
        cursor += step;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Block as BlockId;
    use crate::function::Function;
    use crate::types::TypeNode;
    use crate::value::{AllocaArrayLen, AllocaData, GenericOp, MemoryOp as MOp, SideEffectOp, TerminatorOp, ValueKind};

    /// S5: a straight-line chain of ten memory operations, one per block:
    /// indices 0-4 are unrelated Local allocas, 5 is a Store to a Shared
    /// pointer, 6 and 7 are Loads from a Global pointer, 8 is a Load from a
    /// Shared pointer, 9 is the exit.
    fn s5_chain() -> (Function, Vec<BlockId>, Value, MovementIndex, Dominators<Forwards>, Dominators<Backwards>) {
        let mut func = Function::new("f", 0);
        let blocks: Vec<BlockId> = (0..10).map(|_| func.add_block()).collect();

        let shared_ptr = func.add_value(
            blocks[0],
            ValueKind::Generic(GenericOp { operands: Vec::new() }),
            Some(TypeNode::pointer(MemoryAddressSpace::Shared, TypeNode::scalar(4, 4))),
        );
        let global_ptr = func.add_value(
            blocks[0],
            ValueKind::Generic(GenericOp { operands: Vec::new() }),
            Some(TypeNode::pointer(MemoryAddressSpace::Global, TypeNode::scalar(4, 4))),
        );

        for &block in &blocks[0..5] {
            func.add_value(
                block,
                ValueKind::SideEffect(SideEffectOp::Memory(MOp::Alloca(AllocaData {
                    address_space: MemoryAddressSpace::Local,
                    array_len: AllocaArrayLen::Scalar,
                    element_type: TypeNode::scalar(4, 4),
                }))),
                None,
            );
        }
        let store = func.add_value(
            blocks[5],
            ValueKind::SideEffect(SideEffectOp::Memory(MOp::Store { target: shared_ptr, value: shared_ptr })),
            None,
        );
        func.add_value(
            blocks[6],
            ValueKind::SideEffect(SideEffectOp::Memory(MOp::Load { source: global_ptr })),
            Some(TypeNode::scalar(4, 4)),
        );
        func.add_value(
            blocks[7],
            ValueKind::SideEffect(SideEffectOp::Memory(MOp::Load { source: global_ptr })),
            Some(TypeNode::scalar(4, 4)),
        );
        func.add_value(
            blocks[8],
            ValueKind::SideEffect(SideEffectOp::Memory(MOp::Load { source: shared_ptr })),
            Some(TypeNode::scalar(4, 4)),
        );

        for window in blocks.windows(2) {
            func.add_value(window[0], ValueKind::Terminator(TerminatorOp::Jump { target: window[1] }), None);
        }
        func.add_value(blocks[9], ValueKind::Terminator(TerminatorOp::Return { values: Vec::new() }), None);

        let cfg = CfgView::<Forwards>::build(&func);
        let index = MovementIndex::build(&func, &cfg);
        let doms = Dominators::build(CfgView::<Forwards>::build(&func));
        let pdoms = Dominators::build(CfgView::<Backwards>::build(&func));
        (func, blocks, store, index, doms, pdoms)
    }

    #[test]
    fn s5_moving_past_two_global_loads_succeeds() {
        let (func, blocks, store, index, doms, pdoms) = s5_chain();
        assert!(can_move_to(&func, &doms, &pdoms, &index, &NullMovementScope, store, blocks[7]));
    }

    #[test]
    fn s5_moving_past_a_same_space_load_fails() {
        let (func, blocks, store, index, doms, pdoms) = s5_chain();
        assert!(!can_move_to(&func, &doms, &pdoms, &index, &NullMovementScope, store, blocks[8]));
    }

    #[test]
    fn reflexivity_holds_for_a_memory_value() {
        let (func, blocks, store, index, doms, pdoms) = s5_chain();
        assert!(can_move_to(&func, &doms, &pdoms, &index, &NullMovementScope, store, blocks[5]));
    }

    #[test]
    fn parameters_and_phis_and_terminators_are_never_moveable() {
        let mut func = Function::new("f", 1);
        let entry = func.add_block();
        let param = func.add_value(entry, ValueKind::Parameter(0), Some(TypeNode::scalar(4, 4)));
        let ret = func.add_value(entry, ValueKind::Terminator(TerminatorOp::Return { values: Vec::new() }), None);

        let cfg = CfgView::<Forwards>::build(&func);
        let index = MovementIndex::build(&func, &cfg);
        let doms = Dominators::build(CfgView::<Forwards>::build(&func));
        let pdoms = Dominators::build(CfgView::<Backwards>::build(&func));

        assert!(!can_move_to(&func, &doms, &pdoms, &index, &NullMovementScope, param, entry));
        assert!(!can_move_to(&func, &doms, &pdoms, &index, &NullMovementScope, ret, entry));
    }

    #[test]
    fn an_alloca_can_always_be_skipped() {
        let mut func = Function::new("f", 0);
        let entry = func.add_block();
        let alloca = func.add_value(
            entry,
            ValueKind::SideEffect(SideEffectOp::Memory(MOp::Alloca(AllocaData {
                address_space: MemoryAddressSpace::Local,
                array_len: AllocaArrayLen::Scalar,
                element_type: TypeNode::scalar(4, 4),
            }))),
            None,
        );
        let ptr = func.add_value(
            entry,
            ValueKind::Generic(GenericOp { operands: Vec::new() }),
            Some(TypeNode::pointer(MemoryAddressSpace::Local, TypeNode::scalar(4, 4))),
        );
        let load = func.add_value(entry, ValueKind::SideEffect(SideEffectOp::Memory(MOp::Load { source: ptr })), None);
        assert!(can_skip(&func, load, alloca));
    }
}
