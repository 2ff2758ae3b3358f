//! Control-flow and dataflow analysis core for a GPU-oriented compiler IR.
//!
//! Consumes an already-built [`Function`] (one compilation unit: blocks,
//! values with use-def chains, one terminator per block) and derives the
//! analyses later optimization and code-generation passes consume:
//! allocation inventories, dominator/post-dominator tables, structural "if"
//! recognition, a generic fix-point engine (block-level, value-level, and
//! whole-program inter-procedural), a value-movement legality oracle, and
//! conservative pointer-address-space inference. IR construction, codegen,
//! and diagnostics packaging are out of scope — this crate only reads.

#![no_std]

extern crate alloc;

mod analysis;
mod block;
mod direction;
mod entity;
mod entity_map;
mod error;
mod function;
mod program;
mod types;
mod value;

pub use analysis::{
    can_move_to, can_skip, find_ifs, infer_address_spaces, resolve_variable_info, run_block_fixpoint,
    run_global_fixpoint, run_value_fixpoint, AddressSpaceAnalysis, AddressSpaceInfo, AddressSpaceResult,
    AlignmentWalker, Allocas, AllocaInformation, AllocaKindInformation, BlockTransfer, CfgView, Dominators,
    FixpointStore, GlobalAnalysisEntry, GlobalResults, GlobalTransfer, IfInfo, IfVariableInfo, MovementIndex,
    MovementScope, Node, NullMovementScope, Variable, ValueTransfer,
};
pub use block::BlockData;
pub use direction::{Backwards, Direction, Forwards};
pub use entity::{Block, EntityRef, FunctionRef, Value};
pub use entity_map::PrimaryMap;
pub use error::{AllocaError, DominatorError};
pub use function::{Function, ValueData};
pub use program::Program;
pub use types::{MemoryAddressSpace, TypeNode};
pub use value::{
    AllocaArrayLen, AllocaData, GenericOp, MemoryOp, PhiData, SideEffectOp, TerminatorOp, ValueKind, ViewOp,
};
