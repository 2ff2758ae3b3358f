//! C6: the generic monotone fix-point engine — block-level, value-level,
//! and the inter-procedural ("global") variant that re-analyses a callee
//! once per distinct argument abstraction.
//!
//! The worklist shape (an explicit stack plus an "on-stack" set, seeded by
//! one initial sweep over the whole node sequence) is grounded on
//! `lpc-lpir::analysis::cfg::ControlFlowGraph::is_reachable`'s
//! stack-plus-visited-set BFS/DFS idiom; nothing in this crate's lineage
//! has a generic dataflow-fixpoint framework (`lpc-lpir` only ever computes
//! dominance directly), so the `BlockTransfer`/`ValueTransfer`/
//! `GlobalTransfer` trait split is new, built to the letter of spec.md §4.5.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use crate::analysis::cfg::CfgView;
use crate::direction::Forwards;
use crate::entity::{Block, EntityRef, FunctionRef, Value};
use crate::entity_map::PrimaryMap;
use crate::function::Function;
use crate::program::Program;

/// A generic per-entity lattice store keyed by any `EntityRef` — the
/// "context" spec.md §4.5 threads through `CreateData`/`Update`.
#[derive(Debug, Clone)]
pub struct FixpointStore<K: EntityRef, V> {
    map: PrimaryMap<K, Option<V>>,
}

impl<K: EntityRef, V: Clone> FixpointStore<K, V> {
    pub fn new() -> Self {
        FixpointStore { map: PrimaryMap::new() }
    }

    pub fn get(&self, key: K) -> Option<&V> {
        self.map.get(key).and_then(|slot| slot.as_ref())
    }

    pub fn insert(&mut self, key: K, value: V) {
        while self.map.len() <= key.index() {
            self.map.push(None);
        }
        *self.map.get_mut(key).expect("grown to accommodate key") = Some(value);
    }
}

impl<K: EntityRef, V: Clone> Default for FixpointStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// C6's block-level contract: a monotone element per block.
pub trait BlockTransfer {
    type Value: Clone + PartialEq;

    fn create_data(&mut self, block: Block) -> Self::Value;

    /// Recomputes `block`'s element from `store` (which holds every other
    /// block's current element) and returns `true` iff it changed.
    fn update(&mut self, block: Block, store: &mut FixpointStore<Block, Self::Value>) -> bool;
}

/// Drives `BlockTransfer` to a fixed point over `cfg`'s reachable blocks.
/// Worklist-order-agnostic by construction (spec.md §5): any order reaches
/// the same fixed point on a finite monotone lattice, this just reaches it
/// with fewer iterations by following RPO first.
pub fn run_block_fixpoint<T: BlockTransfer>(
    cfg: &CfgView<Forwards>,
    transfer: &mut T,
) -> FixpointStore<Block, T::Value> {
    let blocks = cfg.blocks_in_rpo();
    let mut store = FixpointStore::new();
    for &block in &blocks {
        let initial = transfer.create_data(block);
        store.insert(block, initial);
    }

    let mut stack: Vec<Block> = Vec::new();
    let mut on_stack: BTreeSet<Block> = BTreeSet::new();

    let mut schedule_successors = |block: Block, stack: &mut Vec<Block>, on_stack: &mut BTreeSet<Block>| {
        for succ in cfg.successor_blocks(block) {
            if on_stack.insert(succ) {
                stack.push(succ);
            }
        }
    };

    for &block in &blocks {
        if transfer.update(block, &mut store) {
            schedule_successors(block, &mut stack, &mut on_stack);
        }
    }
    while let Some(block) = stack.pop() {
        on_stack.remove(&block);
        if transfer.update(block, &mut store) {
            schedule_successors(block, &mut stack, &mut on_stack);
        }
    }

    store
}

/// C6's value-level contract: the same shape as `BlockTransfer`, but
/// `Update` runs per value; a block is rescheduled iff any of its values
/// changed.
pub trait ValueTransfer {
    type Value: Clone + PartialEq;

    fn create_data(&mut self, value: Value) -> Self::Value;

    fn update(&mut self, value: Value, func: &Function, store: &mut FixpointStore<Value, Self::Value>) -> bool;
}

fn update_block_values<T: ValueTransfer>(
    block: Block,
    func: &Function,
    transfer: &mut T,
    store: &mut FixpointStore<Value, T::Value>,
) -> bool {
    let mut changed = false;
    for &value in func.block_values(block) {
        if transfer.update(value, func, store) {
            changed = true;
        }
    }
    changed
}

/// Drives `ValueTransfer` to a fixed point. The function's `UndefinedValue`
/// is seeded with `CreateData` before the main loop, as spec.md §4.5
/// requires (fix-point analyses that read an unresolved operand must see a
/// defined bottom element for it).
pub fn run_value_fixpoint<T: ValueTransfer>(
    func: &Function,
    cfg: &CfgView<Forwards>,
    transfer: &mut T,
) -> FixpointStore<Value, T::Value> {
    let mut store = FixpointStore::new();
    let undefined = func.undefined_value();
    let initial = transfer.create_data(undefined);
    store.insert(undefined, initial);

    let blocks = cfg.blocks_in_rpo();
    for &block in &blocks {
        for &value in func.block_values(block) {
            let initial = transfer.create_data(value);
            store.insert(value, initial);
        }
    }

    let mut stack: Vec<Block> = Vec::new();
    let mut on_stack: BTreeSet<Block> = BTreeSet::new();

    let mut schedule_successors = |block: Block, stack: &mut Vec<Block>, on_stack: &mut BTreeSet<Block>| {
        for succ in cfg.successor_blocks(block) {
            if on_stack.insert(succ) {
                stack.push(succ);
            }
        }
    };

    for &block in &blocks {
        if update_block_values(block, func, transfer, &mut store) {
            schedule_successors(block, &mut stack, &mut on_stack);
        }
    }
    while let Some(block) = stack.pop() {
        on_stack.remove(&block);
        if update_block_values(block, func, transfer, &mut store) {
            schedule_successors(block, &mut stack, &mut on_stack);
        }
    }

    store
}

/// The outer worklist's de-duplication key: a callee plus the argument
/// abstraction it was (or would be) analysed with. Equality is method
/// identity plus **element-wise** equality of the argument vector — the
/// spec-mandated fix (spec.md §9) for the source's likely
/// `Arguments.Equals(other.Arguments)` bug, under which comparing the whole
/// vector against each element would make argument position irrelevant.
#[derive(Debug, Clone)]
pub struct GlobalAnalysisEntry<L: Clone + PartialEq> {
    pub function: FunctionRef,
    pub arguments: Vec<L>,
}

impl<L: Clone + PartialEq> PartialEq for GlobalAnalysisEntry<L> {
    fn eq(&self, other: &Self) -> bool {
        self.function == other.function
            && self.arguments.len() == other.arguments.len()
            && self.arguments.iter().zip(other.arguments.iter()).all(|(a, b)| a == b)
    }
}

impl<L: Clone + PartialEq> Eq for GlobalAnalysisEntry<L> {}

/// C6-global's contract: a whole-program monotone value-lattice analysis
/// that can summarise a method's effect on its argument abstraction.
pub trait GlobalTransfer {
    type Lattice: Clone + PartialEq + Default;

    /// Per-method data, created once per function on its first encounter in
    /// the outer worklist and persisted across every `(function, arguments)`
    /// entry revisiting that function (spec.md §4.5 step 1, "Ensure
    /// per-method data exists (CreateMethodData on first encounter)").
    type MethodData: Clone;

    /// `CreateMethodData`: the method-level data seeded the first time
    /// `function` is popped off the global worklist, independent of which
    /// argument abstraction triggered it.
    fn create_method_data(&mut self, function: FunctionRef, func: &Function) -> Self::MethodData;

    fn create_value_data(&mut self, function: FunctionRef, value: Value, func: &Function) -> Self::Lattice;

    fn update_value(
        &mut self,
        function: FunctionRef,
        value: Value,
        func: &Function,
        store: &mut FixpointStore<Value, Self::Lattice>,
    ) -> bool;

    /// Called once per fully-converged (function, arguments) entry, with
    /// mutable access to that function's persistent method data, so the
    /// analysis can record a summary (e.g. C7's per-value address spaces).
    fn update_method(
        &mut self,
        function: FunctionRef,
        arguments: &[Self::Lattice],
        func: &Function,
        store: &FixpointStore<Value, Self::Lattice>,
        method_data: &mut Self::MethodData,
    );
}

/// Per-function value stores accumulated across every `(function,
/// arguments)` entry the global worklist visited. A function analysed under
/// two distinct argument abstractions keeps only the last store written —
/// callers needing per-entry results should do so from `update_method`.
pub type GlobalResults<L> = alloc::collections::BTreeMap<FunctionRef, FixpointStore<Value, L>>;

/// Drives `GlobalTransfer` to a fixed point over the whole call graph
/// reachable from `(entry, entry_arguments)` (spec.md §4.5 C6-global).
pub fn run_global_fixpoint<T: GlobalTransfer>(
    program: &Program,
    entry: FunctionRef,
    entry_arguments: Vec<T::Lattice>,
    transfer: &mut T,
) -> GlobalResults<T::Lattice> {
    let mut visited: Vec<GlobalAnalysisEntry<T::Lattice>> = Vec::new();
    let mut worklist: Vec<GlobalAnalysisEntry<T::Lattice>> =
        alloc::vec![GlobalAnalysisEntry { function: entry, arguments: entry_arguments }];
    let mut results: GlobalResults<T::Lattice> = GlobalResults::new();
    // The `(method -> methodData)` mapping of spec.md §9's design notes,
    // separate from both the per-(function, arguments) visited set and the
    // per-value `FixpointStore` below: it is seeded once per function, the
    // first time that function is popped off the worklist, and persists
    // across every subsequent argument abstraction that revisits it.
    let mut method_data: FixpointStore<FunctionRef, T::MethodData> = FixpointStore::new();

    while let Some(current) = worklist.pop() {
        if visited.contains(&current) {
            continue;
        }
        visited.push(current.clone());

        let func = program.get(current.function);
        let cfg = CfgView::<Forwards>::build(func);

        if method_data.get(current.function).is_none() {
            let created = transfer.create_method_data(current.function, func);
            method_data.insert(current.function, created);
        }

        struct Adapter<'a, T: GlobalTransfer> {
            function: FunctionRef,
            transfer: &'a mut T,
        }
        impl<'a, T: GlobalTransfer> ValueTransfer for Adapter<'a, T> {
            type Value = T::Lattice;
            fn create_data(&mut self, value: Value) -> Self::Value {
                // `func` isn't available here; real creation happens below
                // via `create_value_data`, this path only seeds values that
                // the value-level driver discovers via block iteration,
                // which already passes `func` to `update`.
                let _ = value;
                T::Lattice::default()
            }
            fn update(&mut self, value: Value, func: &Function, store: &mut FixpointStore<Value, Self::Value>) -> bool {
                self.transfer.update_value(self.function, value, func, store)
            }
        }

        let mut adapter = Adapter { function: current.function, transfer };
        let mut store = FixpointStore::new();
        let undefined = func.undefined_value();
        store.insert(undefined, adapter.transfer.create_value_data(current.function, undefined, func));
        for &block in &cfg.blocks_in_rpo() {
            for &value in func.block_values(block) {
                let initial = adapter.transfer.create_value_data(current.function, value, func);
                store.insert(value, initial);
            }
        }
        for (index, param_value) in func.parameters().into_iter().enumerate() {
            if let Some(value) = param_value {
                if let Some(arg) = current.arguments.get(index) {
                    store.insert(value, arg.clone());
                }
            }
        }

        let blocks = cfg.blocks_in_rpo();
        let mut stack: Vec<Block> = Vec::new();
        let mut on_stack: BTreeSet<Block> = BTreeSet::new();
        let mut schedule = |block: Block, stack: &mut Vec<Block>, on_stack: &mut BTreeSet<Block>| {
            for succ in cfg.successor_blocks(block) {
                if on_stack.insert(succ) {
                    stack.push(succ);
                }
            }
        };
        for &block in &blocks {
            if update_block_values(block, func, &mut adapter, &mut store) {
                schedule(block, &mut stack, &mut on_stack);
            }
        }
        while let Some(block) = stack.pop() {
            on_stack.remove(&block);
            if update_block_values(block, func, &mut adapter, &mut store) {
                schedule(block, &mut stack, &mut on_stack);
            }
        }

        let mut data = method_data
            .get(current.function)
            .cloned()
            .expect("method data seeded for every function on first encounter, above");
        adapter.transfer.update_method(current.function, &current.arguments, func, &store, &mut data);
        method_data.insert(current.function, data);

        for &value in func.values().collect::<Vec<_>>().iter() {
            if let crate::value::ValueKind::SideEffect(crate::value::SideEffectOp::Call { callee: Some(target), args }) =
                func.value_kind(value)
            {
                if program.contains(*target) {
                    let call_args: Vec<T::Lattice> =
                        args.iter().map(|a| store.get(*a).cloned().unwrap_or_default()).collect();
                    let candidate = GlobalAnalysisEntry { function: *target, arguments: call_args };
                    if !visited.contains(&candidate) && !worklist.contains(&candidate) {
                        worklist.push(candidate);
                    }
                }
            }
        }

        results.insert(current.function, store);
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Block;
    use crate::value::{GenericOp, TerminatorOp, ValueKind};

    /// A trivial reachability analysis: `true` for the entry block and any
    /// block reachable from a `true` predecessor — exercises the worklist
    /// driver's termination and correctness without any real lattice.
    struct Reachable {
        entry: Block,
    }
    impl BlockTransfer for Reachable {
        type Value = bool;
        fn create_data(&mut self, _block: Block) -> bool {
            false
        }
        fn update(&mut self, block: Block, store: &mut FixpointStore<Block, bool>) -> bool {
            let new_value = block == self.entry || store.get(block).copied().unwrap_or(false);
            let changed = store.get(block).copied() != Some(new_value);
            store.insert(block, new_value);
            changed
        }
    }

    #[test]
    fn block_fixpoint_reaches_all_blocks_in_a_loop() {
        let mut func = Function::new("f", 0);
        let a = func.add_block();
        let b = func.add_block();
        let c = func.add_block();
        func.add_value(a, ValueKind::Terminator(TerminatorOp::Jump { target: b }), None);
        let cond = func.add_value(b, ValueKind::Generic(GenericOp { operands: Vec::new() }), None);
        func.add_value(
            b,
            ValueKind::Terminator(TerminatorOp::ConditionalBranch {
                condition: cond,
                true_target: b,
                false_target: c,
            }),
            None,
        );
        func.add_value(c, ValueKind::Terminator(TerminatorOp::Return { values: Vec::new() }), None);

        let cfg = CfgView::<Forwards>::build(&func);
        let mut transfer = Reachable { entry: a };
        let store = run_block_fixpoint(&cfg, &mut transfer);
        assert_eq!(store.get(a).copied(), Some(true));
        assert_eq!(store.get(b).copied(), Some(true));
        assert_eq!(store.get(c).copied(), Some(true));
    }

    #[test]
    fn global_analysis_entry_equality_is_element_wise() {
        let f = FunctionRef::from_index(0);
        let a = GlobalAnalysisEntry { function: f, arguments: alloc::vec![1, 2] };
        let b = GlobalAnalysisEntry { function: f, arguments: alloc::vec![2, 1] };
        let c = GlobalAnalysisEntry { function: f, arguments: alloc::vec![1, 2] };
        assert_ne!(a, b, "argument position must matter for parameter seeding");
        assert_eq!(a, c);
    }
}
