//! C7: address-space inference. A concrete `GlobalTransfer` instance (C6)
//! that unifies per-value pointer/view address-space flags across the call
//! graph rooted at a caller-chosen entry function.
//!
//! Grounded on `lpc-lpir::analysis::cfg::ControlFlowGraph`'s `BTreeSet`-based
//! set algebra (here a `u8` bitset keyed by `MemoryAddressSpace`'s fixed
//! discriminants, since the lattice never exceeds 3 concrete bits); the
//! per-(function, value) result map is new to this crate, built directly
//! against spec.md §4.6 since `lpc-lpir` has no address-space concept.

use alloc::collections::BTreeMap;
use core::fmt;

use crate::analysis::fixpoint::{run_global_fixpoint, FixpointStore, GlobalResults, GlobalTransfer};
use crate::entity::{FunctionRef, Value};
use crate::function::Function;
use crate::program::Program;
use crate::types::MemoryAddressSpace;

/// A bitset over `MemoryAddressSpace` (spec.md §3 `AddressSpaceInfo`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AddressSpaceInfo(u8);

impl AddressSpaceInfo {
    pub const EMPTY: AddressSpaceInfo = AddressSpaceInfo(0);

    pub fn singleton(space: MemoryAddressSpace) -> Self {
        AddressSpaceInfo(space.bit())
    }

    pub fn insert(&mut self, space: MemoryAddressSpace) {
        self.0 |= space.bit();
    }

    pub fn union(self, other: Self) -> Self {
        AddressSpaceInfo(self.0 | other.0)
    }

    pub fn contains(&self, space: MemoryAddressSpace) -> bool {
        self.0 & space.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// `Generic` if empty or more than one bit is set; otherwise the single
    /// set space, checked in priority order Global, Shared, Local.
    pub fn unified_space(&self) -> MemoryAddressSpace {
        let mut found = None;
        for space in MemoryAddressSpace::ALL {
            if self.contains(space) {
                if found.is_some() {
                    return MemoryAddressSpace::Generic;
                }
                found = Some(space);
            }
        }
        found.unwrap_or(MemoryAddressSpace::Generic)
    }

    /// `true` iff every bit set in `self` is also set in `other` — the
    /// relation spec.md §8 invariant 7 (monotonicity) requires across two
    /// runs with a strictly larger initial flag set.
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.0 & other.0 == self.0
    }
}

impl fmt::Display for AddressSpaceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        let mut first = true;
        for space in MemoryAddressSpace::ALL {
            if self.contains(space) {
                if !first {
                    write!(f, ", ")?;
                }
                write!(f, "{space}")?;
                first = false;
            }
        }
        write!(f, "}}")
    }
}

fn initial_address_space(func: &Function, value: Value) -> AddressSpaceInfo {
    match func.value_data(value).ty().and_then(|t| t.address_space_type()) {
        Some((space, _)) => AddressSpaceInfo::singleton(space),
        None => AddressSpaceInfo::EMPTY,
    }
}

/// The C6-global instance of spec.md §4.6: unions a value's type-derived
/// initial space with every operand's current lattice element, so a phi
/// merging differently-typed pointers converges to the union of both.
#[derive(Debug, Default)]
pub struct AddressSpaceAnalysis;

impl GlobalTransfer for AddressSpaceAnalysis {
    type Lattice = AddressSpaceInfo;
    /// C7 has no method-level summary beyond the per-value results already
    /// captured in each function's `FixpointStore`, so its method data is
    /// the unit type.
    type MethodData = ();

    fn create_method_data(&mut self, _function: FunctionRef, _func: &Function) {}

    fn create_value_data(&mut self, _function: FunctionRef, value: Value, func: &Function) -> AddressSpaceInfo {
        initial_address_space(func, value)
    }

    fn update_value(
        &mut self,
        _function: FunctionRef,
        value: Value,
        func: &Function,
        store: &mut FixpointStore<Value, AddressSpaceInfo>,
    ) -> bool {
        if func.value_kind(value).is_parameter() {
            // Seeded once from the caller's argument abstraction
            // (`run_global_fixpoint`'s parameter-seeding pass); a
            // parameter's space is an input, not something re-derived from
            // its own (often Generic) declared type.
            return false;
        }
        let mut merged = initial_address_space(func, value);
        for operand in func.value_kind(value).operands() {
            if let Some(info) = store.get(operand) {
                merged = merged.union(*info);
            }
        }
        let changed = store.get(value).copied() != Some(merged);
        store.insert(value, merged);
        changed
    }

    fn update_method(
        &mut self,
        _function: FunctionRef,
        _arguments: &[AddressSpaceInfo],
        _func: &Function,
        _store: &FixpointStore<Value, AddressSpaceInfo>,
        _method_data: &mut (),
    ) {
        // Summaries are read directly off the per-function `FixpointStore`
        // returned by `run_global_fixpoint`; nothing further to record here.
    }
}

/// The queryable result of an address-space inference run (spec.md §4.6:
/// "Query after analysis: lookup by (method, value)").
#[derive(Debug, Default)]
pub struct AddressSpaceResult {
    per_function: BTreeMap<FunctionRef, FixpointStore<Value, AddressSpaceInfo>>,
}

impl AddressSpaceResult {
    pub fn from_results(results: GlobalResults<AddressSpaceInfo>) -> Self {
        AddressSpaceResult { per_function: results }
    }

    /// A value absent from the result (e.g. never reached from `entry`, or
    /// simply not a pointer/view) returns the safe-default empty set.
    pub fn get(&self, function: FunctionRef, value: Value) -> AddressSpaceInfo {
        self.per_function
            .get(&function)
            .and_then(|store| store.get(value))
            .copied()
            .unwrap_or_default()
    }
}

/// Runs C7 over `program` starting at `entry`, seeding every one of its
/// parameters with `global_address_space` (spec.md §4.6: "typically
/// {Global}").
pub fn infer_address_spaces(
    program: &Program,
    entry: FunctionRef,
    global_address_space: MemoryAddressSpace,
) -> AddressSpaceResult {
    let entry_func = program.get(entry);
    let seed = AddressSpaceInfo::singleton(global_address_space);
    let entry_arguments = alloc::vec![seed; entry_func.param_count()];
    let mut analysis = AddressSpaceAnalysis;
    let results = run_global_fixpoint(program, entry, entry_arguments, &mut analysis);
    AddressSpaceResult::from_results(results)
}
