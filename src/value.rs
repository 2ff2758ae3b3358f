//! The `Value` hierarchy: the closed sum type every analysis pattern-matches
//! on in place of the source model's class hierarchy (see spec §3, §9).

use alloc::vec::Vec;

use crate::entity::{Block, FunctionRef, Value};
use crate::types::{MemoryAddressSpace, TypeNode};

/// How many elements an `Alloca` reserves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocaArrayLen {
    /// A single scalar allocation (ArraySize = 1).
    Scalar,
    /// A statically sized array of `len` elements (ArraySize = N).
    Array(u32),
    /// A runtime-sized array (ArraySize = -1). Only legal in `Shared` space.
    Dynamic,
}

/// Payload of an `Alloca` value.
#[derive(Debug, Clone)]
pub struct AllocaData {
    pub address_space: MemoryAddressSpace,
    pub array_len: AllocaArrayLen,
    pub element_type: TypeNode,
}

/// A memory-effecting value: the `MemoryValue` variants of spec §3.
#[derive(Debug, Clone)]
pub enum MemoryOp {
    Alloca(AllocaData),
    /// Loads from `source`, which must carry an address-space type.
    Load { source: Value },
    /// Stores `value` to `target`, which must carry an address-space type.
    Store { target: Value, value: Value },
    /// Atomic read-modify-write on `target`.
    Atomic { target: Value },
}

/// Side-effecting values that are not memory operations.
#[derive(Debug, Clone)]
pub enum SideEffectOp {
    Memory(MemoryOp),
    /// A synchronization barrier (no operands of analysis interest).
    Barrier,
    /// A call to another function.
    Call { callee: Option<FunctionRef>, args: Vec<Value> },
}

/// Pointer/view-manipulating values. These are not side-effecting (they are
/// pure pointer arithmetic) but are tracked specially by the alignment
/// walker (C9) and feed the address-space lattice (C7) as ordinary values.
#[derive(Debug, Clone)]
pub enum ViewOp {
    PointerCast { operand: Value },
    AddressSpaceCast { operand: Value },
    NewView { operand: Value },
    ViewCast { operand: Value },
    SubViewValue { operand: Value },
    LoadElementAddress { operand: Value },
    /// Forces an explicit minimum alignment onto the pointer it operates on.
    AlignViewTo { operand: Value, alignment: u32 },
}

impl ViewOp {
    pub fn operand(&self) -> Value {
        match self {
            ViewOp::PointerCast { operand }
            | ViewOp::AddressSpaceCast { operand }
            | ViewOp::NewView { operand }
            | ViewOp::ViewCast { operand }
            | ViewOp::SubViewValue { operand }
            | ViewOp::LoadElementAddress { operand }
            | ViewOp::AlignViewTo { operand, .. } => *operand,
        }
    }
}

/// A terminator's control-flow shape.
#[derive(Debug, Clone)]
pub enum TerminatorOp {
    Jump { target: Block },
    /// `Condition` branches to `true_target` or `false_target`.
    ConditionalBranch { condition: Value, true_target: Block, false_target: Block },
    Return { values: Vec<Value> },
    Unreachable,
}

impl TerminatorOp {
    /// The blocks this terminator may transfer control to, in source order
    /// (true branch before false branch — this order matters for C5's
    /// `IsSimpleIf` check).
    pub fn successors(&self) -> Vec<Block> {
        match self {
            TerminatorOp::Jump { target } => alloc::vec![*target],
            TerminatorOp::ConditionalBranch { true_target, false_target, .. } => {
                alloc::vec![*true_target, *false_target]
            }
            TerminatorOp::Return { .. } | TerminatorOp::Unreachable => Vec::new(),
        }
    }
}

/// A phi value: merges one incoming value per predecessor block.
#[derive(Debug, Clone)]
pub struct PhiData {
    /// `(predecessor block, incoming value)` pairs, in predecessor order.
    pub incoming: Vec<(Block, Value)>,
}

impl PhiData {
    pub fn incoming_values(&self) -> impl Iterator<Item = Value> + '_ {
        self.incoming.iter().map(|(_, v)| *v)
    }

    /// C4.4/C5 frequently need "exactly two incoming edges".
    pub fn is_binary(&self) -> bool {
        self.incoming.len() == 2
    }
}

/// An ordinary, non-side-effecting computation (arithmetic, comparison,
/// a constant, a bitcast that doesn't touch pointers, ...). The analyses in
/// this crate never need to distinguish between these, so they carry no
/// further payload beyond their operands.
#[derive(Debug, Clone)]
pub struct GenericOp {
    pub operands: Vec<Value>,
}

/// The tagged variant every `Value` carries (see spec §3, §9 "tagged
/// variants over inheritance").
#[derive(Debug, Clone)]
pub enum ValueKind {
    /// A function parameter; index into the function's parameter list.
    Parameter(usize),
    Phi(PhiData),
    Terminator(TerminatorOp),
    SideEffect(SideEffectOp),
    View(ViewOp),
    Generic(GenericOp),
    /// The context's canonical "undefined value" (spec §3, `IRContext`);
    /// exactly one exists per function and seeds fix-point analyses.
    Undefined,
}

impl ValueKind {
    pub fn is_phi(&self) -> bool {
        matches!(self, ValueKind::Phi(_))
    }

    pub fn is_terminator(&self) -> bool {
        matches!(self, ValueKind::Terminator(_))
    }

    pub fn is_parameter(&self) -> bool {
        matches!(self, ValueKind::Parameter(_))
    }

    pub fn is_side_effect(&self) -> bool {
        matches!(self, ValueKind::SideEffect(_))
    }

    pub fn as_memory_op(&self) -> Option<&MemoryOp> {
        match self {
            ValueKind::SideEffect(SideEffectOp::Memory(m)) => Some(m),
            _ => None,
        }
    }

    pub fn as_terminator(&self) -> Option<&TerminatorOp> {
        match self {
            ValueKind::Terminator(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_phi(&self) -> Option<&PhiData> {
        match self {
            ValueKind::Phi(p) => Some(p),
            _ => None,
        }
    }

    /// Operands this value reads, in a stable order. Used to wire up
    /// `Uses` when a value is inserted into a function, and by the
    /// alignment walker (C9) to push a use's own uses onto its stack.
    pub fn operands(&self) -> Vec<Value> {
        match self {
            ValueKind::Parameter(_) | ValueKind::Undefined => Vec::new(),
            ValueKind::Phi(phi) => phi.incoming_values().collect(),
            ValueKind::Terminator(TerminatorOp::ConditionalBranch { condition, .. }) => {
                alloc::vec![*condition]
            }
            ValueKind::Terminator(TerminatorOp::Return { values }) => values.clone(),
            ValueKind::Terminator(TerminatorOp::Jump { .. })
            | ValueKind::Terminator(TerminatorOp::Unreachable) => Vec::new(),
            ValueKind::SideEffect(SideEffectOp::Memory(MemoryOp::Alloca(_))) => Vec::new(),
            ValueKind::SideEffect(SideEffectOp::Memory(MemoryOp::Load { source })) => {
                alloc::vec![*source]
            }
            ValueKind::SideEffect(SideEffectOp::Memory(MemoryOp::Store { target, value })) => {
                alloc::vec![*target, *value]
            }
            ValueKind::SideEffect(SideEffectOp::Memory(MemoryOp::Atomic { target })) => {
                alloc::vec![*target]
            }
            ValueKind::SideEffect(SideEffectOp::Barrier) => Vec::new(),
            ValueKind::SideEffect(SideEffectOp::Call { args, .. }) => args.clone(),
            ValueKind::View(op) => alloc::vec![op.operand()],
            ValueKind::Generic(g) => g.operands.clone(),
        }
    }
}
