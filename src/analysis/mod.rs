//! The nine analysis components (C2-C9) this crate exists to provide, plus
//! the CFG view (C2) every other analysis is built over.

pub mod alignment;
pub mod alloca;
pub mod cfg;
pub mod dominance;
pub mod fixpoint;
pub mod if_recognizer;
pub mod movement;
pub mod pointer_space;

pub use alignment::AlignmentWalker;
pub use alloca::{AllocaInformation, AllocaKindInformation, Allocas};
pub use cfg::{CfgView, Node};
pub use dominance::Dominators;
pub use fixpoint::{
    run_block_fixpoint, run_global_fixpoint, run_value_fixpoint, BlockTransfer, FixpointStore, GlobalAnalysisEntry,
    GlobalResults, GlobalTransfer, ValueTransfer,
};
pub use if_recognizer::{find_ifs, resolve_variable_info, IfInfo, IfVariableInfo, Variable};
pub use movement::{can_move_to, can_skip, MovementIndex, MovementScope, NullMovementScope};
pub use pointer_space::{infer_address_spaces, AddressSpaceAnalysis, AddressSpaceInfo, AddressSpaceResult};
