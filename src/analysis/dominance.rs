//! C4: Cooper-Harvey-Kennedy iterative dominators, parametric on direction.
//! Post-dominators are exactly this algorithm instantiated with `Backwards`
//! over a `CfgView<Backwards>` (which already synthesizes a virtual exit for
//! multi-return functions — see `cfg.rs`).
//!
//! Grounded on `lpc-lpir::analysis::dominance::DominatorTree`, generalized
//! from a single `Forwards`-only implementation to the direction-parametric
//! one spec.md §4.3/§9 calls for, and restated in terms of the literal
//! `Intersect` procedure from spec.md rather than the teacher's informal
//! "common_dominator" walk (same algorithm, closer to the source text).

use alloc::vec;
use alloc::vec::Vec;

use crate::analysis::cfg::{CfgView, Node};
use crate::direction::Direction;
use crate::entity::Block;
use crate::error::DominatorError;

const UNDEFINED: usize = usize::MAX;

/// Dominator table for one direction: `idoms_in_rpo[i]` is the RPO index of
/// block `i`'s immediate dominator, with `idoms_in_rpo[0] == 0` by the
/// root-is-its-own-idom convention of spec.md §3.
#[derive(Debug, Clone)]
pub struct Dominators<D: Direction> {
    idoms_in_rpo: Vec<usize>,
    cfg: CfgView<D>,
}

impl<D: Direction> Dominators<D> {
    pub fn build(cfg: CfgView<D>) -> Self {
        let n = cfg.len();
        if n == 0 {
            return Dominators { idoms_in_rpo: Vec::new(), cfg };
        }
        let mut idoms = vec![UNDEFINED; n];
        idoms[0] = 0;

        let mut changed = true;
        while changed {
            changed = false;
            for i in 1..n {
                let node = cfg.node_at(i);
                let mut candidate: Option<usize> = None;
                for &pred in cfg.predecessors(node) {
                    let Some(pred_index) = cfg.traversal_index(pred) else { continue };
                    if idoms[pred_index] == UNDEFINED && pred_index != 0 {
                        continue;
                    }
                    candidate = Some(match candidate {
                        None => pred_index,
                        Some(current) => Self::intersect(current, pred_index, &idoms),
                    });
                }
                if let Some(new_idom) = candidate {
                    if idoms[i] != new_idom {
                        idoms[i] = new_idom;
                        changed = true;
                    }
                }
            }
        }

        Dominators { idoms_in_rpo: idoms, cfg }
    }

    /// The literal Cooper-Harvey-Kennedy `Intersect`: walk the larger RPO
    /// index up its idom chain until both fingers meet at the nearest common
    /// ancestor.
    fn intersect(mut l: usize, mut r: usize, idoms: &[usize]) -> usize {
        while l != r {
            while l < r {
                r = idoms[r];
            }
            while r < l {
                l = idoms[l];
            }
        }
        l
    }

    pub fn cfg(&self) -> &CfgView<D> {
        &self.cfg
    }

    /// `Dominates(d, b)`: every path from the root through `b` passes `d`.
    /// Self-dominance holds even for nodes absent from the view (an
    /// unreachable block dominates only itself).
    pub fn dominates(&self, d: Node, b: Node) -> bool {
        if d == b {
            return true;
        }
        let (Some(d_index), Some(b_index)) = (self.cfg.traversal_index(d), self.cfg.traversal_index(b))
        else {
            return false;
        };
        Self::intersect(b_index, d_index, &self.idoms_in_rpo) == d_index
    }

    pub fn dominates_block(&self, d: Block, b: Block) -> bool {
        self.dominates(Node::Block(d), Node::Block(b))
    }

    /// `None` for the root (by convention it has no dominator other than
    /// itself) and for nodes outside the view.
    pub fn immediate_dominator(&self, node: Node) -> Option<Node> {
        let index = self.cfg.traversal_index(node)?;
        if index == 0 {
            return None;
        }
        Some(self.cfg.node_at(self.idoms_in_rpo[index]))
    }

    /// `GetImmediateCommonDominator`: folds `Intersect` across every block's
    /// RPO index. Empty input is an argument error per spec.md §7.
    ///
    /// Callers are expected to pass only reachable nodes (§7's "invalid
    /// inputs to dominator queries" is a debug assertion, not a guaranteed
    /// panic); an unreachable/foreign node is skipped rather than hard-failing
    /// in release, mirroring the teacher's `common_dominator`, which "handles
    /// unreachable blocks gracefully by returning early when encountering
    /// None in the dominator tree".
    pub fn common_dominator(&self, nodes: &[Node]) -> Result<Node, DominatorError> {
        let mut iter = nodes.iter();
        let first = iter.next().ok_or(DominatorError::EmptyBlockSet)?;
        let mut acc = self.cfg.traversal_index(*first);
        debug_assert!(acc.is_some(), "common_dominator called with an unreachable node: {first:?}");
        for &node in iter {
            let index = self.cfg.traversal_index(node);
            debug_assert!(index.is_some(), "common_dominator called with an unreachable node: {node:?}");
            acc = match (acc, index) {
                (Some(a), Some(b)) => Some(Self::intersect(a, b, &self.idoms_in_rpo)),
                (Some(a), None) => Some(a),
                (None, Some(b)) => Some(b),
                (None, None) => None,
            };
        }
        // Entirely-unreachable input: fall back to the root, which dominates
        // everything reachable (the teacher's "return entry if both are
        // unreachable" fallback).
        Ok(self.cfg.node_at(acc.unwrap_or(0)))
    }

    pub fn common_dominator_of_blocks(&self, blocks: &[Block]) -> Result<Block, DominatorError> {
        let nodes: Vec<Node> = blocks.iter().copied().map(Node::Block).collect();
        self.common_dominator(&nodes).map(|n| n.as_block().expect("block input yields block output"))
    }
}
