//! C5: "if"/"if-else" shape recognition over an unstructured CFG, and the
//! branch-merged phi-variable resolution that rides along with it.
//!
//! Grounded on the dominance-query idiom of
//! `lpc-lpir::verifier::dominance::verify_dominance` (walk blocks, consult
//! the dominator tree per candidate) — this crate has no teacher analogue
//! for structural if-recognition itself (`lpc-lpir` is SSA-only, it never
//! re-derives source-level control structures), so the shape-matching logic
//! here is a direct transliteration of spec.md §4.4.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::analysis::cfg::{CfgView, Node};
use crate::analysis::dominance::Dominators;
use crate::direction::Forwards;
use crate::entity::{Block, Value};
use crate::function::Function;
use crate::value::TerminatorOp;

/// A recognised if/if-else diamond (spec.md §3 `IfInfo`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfInfo {
    pub condition: Value,
    pub entry_block: Block,
    pub if_block: Block,
    pub else_block: Option<Block>,
    pub exit_block: Block,
}

impl IfInfo {
    /// `entry` branches directly to `{if_block, else_block}` in that order,
    /// and each branch block has exactly one successor: `exit_block`.
    pub fn is_simple_if(&self, func: &Function, cfg: &CfgView<Forwards>) -> bool {
        let Some(else_block) = self.else_block else { return false };
        let entry_successors = cfg.successor_blocks(self.entry_block);
        if entry_successors != [self.if_block, else_block] {
            return false;
        }
        for branch in [self.if_block, else_block] {
            let successors = cfg.successor_blocks(branch);
            if successors != [self.exit_block] {
                return false;
            }
        }
        let _ = func;
        true
    }
}

/// For each candidate merge block with exactly two predecessors, checks
/// whether their common dominator is a two-way conditional branch (spec.md
/// §4.4). Non-matching shapes are silently skipped, as the spec requires —
/// this is a best-effort structural recognizer, not a verifier.
pub fn find_ifs(func: &Function, cfg: &CfgView<Forwards>, doms: &Dominators<Forwards>) -> Vec<IfInfo> {
    let mut results = Vec::new();
    for &exit_block in func.layout() {
        let preds = cfg.predecessors(Node::Block(exit_block));
        if preds.len() != 2 {
            continue;
        }
        let t = preds[0].as_block().expect("forward CFG predecessors are always real blocks");
        let f = preds[1].as_block().expect("forward CFG predecessors are always real blocks");

        let Ok(entry) = doms.common_dominator_of_blocks(&[t, f]) else { continue };
        let entry_successors = cfg.successor_blocks(entry);
        if entry_successors.len() != 2 {
            continue;
        }
        let Some(term) = func.block_terminator(entry) else { continue };
        let Some(TerminatorOp::ConditionalBranch { condition, true_target, false_target }) =
            func.value_kind(term).as_terminator()
        else {
            continue;
        };

        results.push(IfInfo {
            condition: *condition,
            entry_block: entry,
            if_block: *true_target,
            else_block: Some(*false_target),
            exit_block,
        });
    }
    results
}

/// One ternary-style merge: the value that flowed in from the "if" branch
/// and (once both branches have been walked) the value from the "else"
/// branch (spec.md §3 `IfVariableInfo`/`Variable`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub true_value: Value,
    pub false_value: Option<Value>,
}

/// Maps each two-incoming-edge phi merged at the if's exit block to its
/// resolved `Variable` (spec.md §3/§4.4).
#[derive(Debug, Clone, Default)]
pub struct IfVariableInfo {
    entries: BTreeMap<Value, Variable>,
}

impl IfVariableInfo {
    pub fn get(&self, phi: Value) -> Option<&Variable> {
        self.entries.get(&phi)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Value, &Variable)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Walks `if_info.if_block` recording a `TrueValue` candidate for every
/// binary phi one of its values feeds, then walks `else_block` attaching
/// the matching `FalseValue`. Attaching a second `FalseValue` to the same
/// phi is a caller/IR-builder bug (spec.md §4.4, §7).
pub fn resolve_variable_info(func: &Function, if_info: &IfInfo) -> IfVariableInfo {
    let mut entries: BTreeMap<Value, Variable> = BTreeMap::new();

    for &value in func.block_values(if_info.if_block) {
        for &user in func.value_uses(value) {
            if let Some(phi) = func.value_kind(user).as_phi() {
                if phi.is_binary() {
                    entries.entry(user).or_insert(Variable { true_value: value, false_value: None });
                }
            }
        }
    }

    if let Some(else_block) = if_info.else_block {
        for &value in func.block_values(else_block) {
            for &user in func.value_uses(value) {
                if func.value_kind(user).as_phi().map(|p| p.is_binary()).unwrap_or(false) {
                    if let Some(entry) = entries.get_mut(&user) {
                        debug_assert!(
                            entry.false_value.is_none(),
                            "second FalseValue attached to if-variable for phi {user:?}"
                        );
                        entry.false_value = Some(value);
                    }
                }
            }
        }
    }

    IfVariableInfo { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{GenericOp, PhiData, TerminatorOp, ValueKind};

    /// S3: diamond of S1 with a phi merging the two branch values at D.
    fn simple_if() -> (Function, IfInfo) {
        let mut func = Function::new("f", 0);
        let a = func.add_block();
        let b = func.add_block();
        let c = func.add_block();
        let d = func.add_block();
        let cond = func.add_value(a, ValueKind::Generic(GenericOp { operands: Vec::new() }), None);
        func.add_value(
            a,
            ValueKind::Terminator(TerminatorOp::ConditionalBranch {
                condition: cond,
                true_target: b,
                false_target: c,
            }),
            None,
        );
        let v_b = func.add_value(b, ValueKind::Generic(GenericOp { operands: Vec::new() }), None);
        func.add_value(b, ValueKind::Terminator(TerminatorOp::Jump { target: d }), None);
        let v_c = func.add_value(c, ValueKind::Generic(GenericOp { operands: Vec::new() }), None);
        func.add_value(c, ValueKind::Terminator(TerminatorOp::Jump { target: d }), None);
        let _phi = func.add_value(
            d,
            ValueKind::Phi(PhiData { incoming: alloc::vec![(b, v_b), (c, v_c)] }),
            None,
        );
        func.add_value(d, ValueKind::Terminator(TerminatorOp::Return { values: Vec::new() }), None);

        let cfg = CfgView::<Forwards>::build(&func);
        let doms = Dominators::build(cfg);
        let ifs = find_ifs(&func, doms.cfg(), &doms);
        assert_eq!(ifs.len(), 1);
        (func, ifs[0].clone())
    }

    #[test]
    fn s3_recognises_one_simple_if() {
        let (func, if_info) = simple_if();
        let cfg = CfgView::<Forwards>::build(&func);
        assert!(if_info.is_simple_if(&func, &cfg));
    }

    #[test]
    fn s3_resolves_one_if_variable() {
        let (func, if_info) = simple_if();
        let variables = resolve_variable_info(&func, &if_info);
        assert_eq!(variables.len(), 1);
        let (_, variable) = variables.iter().next().unwrap();
        assert!(variable.false_value.is_some());
    }

    #[test]
    fn linear_chain_has_no_ifs() {
        let mut func = Function::new("f", 0);
        let a = func.add_block();
        let b = func.add_block();
        func.add_value(a, ValueKind::Terminator(TerminatorOp::Jump { target: b }), None);
        func.add_value(b, ValueKind::Terminator(TerminatorOp::Return { values: Vec::new() }), None);

        let cfg = CfgView::<Forwards>::build(&func);
        let doms = Dominators::build(cfg);
        assert!(find_ifs(&func, doms.cfg(), &doms).is_empty());
    }
}
