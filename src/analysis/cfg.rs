//! C2: traversal orders & the direction-parametric CFG view.
//!
//! `CfgView<D>` resolves predecessors/successors for direction `D` once,
//! assigns dense reverse-post-order traversal indices over the *reachable*
//! node set, and is the substrate both C4 (dominators) and C6's block-level
//! driver walk. Grounded on `lpc-lpir::analysis::cfg::ControlFlowGraph`
//! (predecessor/successor `BTreeSet`s, DFS-postorder-then-reverse RPO), with
//! the `Backwards` direction generalizing it per spec.md §4.1/§4.3: a
//! multi-exit function gets a synthesized `Node::VirtualExit` root so
//! post-dominance always has a unique exit.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;
use core::marker::PhantomData;

use crate::direction::{Backwards, Direction, Forwards};
use crate::entity::Block;
use crate::function::Function;

/// A node in a direction-resolved CFG: either a real block, or the
/// synthesized exit node `Backwards` views use when a function has more
/// than one (or zero) real exit blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Node {
    Block(Block),
    VirtualExit,
}

impl Node {
    pub fn as_block(self) -> Option<Block> {
        match self {
            Node::Block(b) => Some(b),
            Node::VirtualExit => None,
        }
    }
}

/// The CFG resolved for one traversal direction, with RPO indices assigned.
#[derive(Debug, Clone)]
pub struct CfgView<D: Direction> {
    nodes_in_rpo: Vec<Node>,
    index_of: BTreeMap<Node, usize>,
    successors: BTreeMap<Node, Vec<Node>>,
    predecessors: BTreeMap<Node, Vec<Node>>,
    _direction: PhantomData<D>,
}

fn forward_adjacency(func: &Function) -> (BTreeMap<Block, Vec<Block>>, BTreeMap<Block, Vec<Block>>) {
    let mut succs: BTreeMap<Block, Vec<Block>> = BTreeMap::new();
    let mut preds: BTreeMap<Block, Vec<Block>> = BTreeMap::new();
    for &block in func.layout() {
        succs.entry(block).or_default();
        preds.entry(block).or_default();
    }
    for &block in func.layout() {
        if let Some(term) = func.block_terminator(block) {
            if let Some(op) = func.value_kind(term).as_terminator() {
                for target in op.successors() {
                    succs.entry(block).or_default().push(target);
                    preds.entry(target).or_default().push(block);
                }
            }
        }
    }
    (succs, preds)
}

fn reverse_post_order(
    root: Node,
    successors: &BTreeMap<Node, Vec<Node>>,
) -> Vec<Node> {
    let mut visited = BTreeSet::new();
    let mut post_order = Vec::new();
    let mut stack: Vec<(Node, usize)> = alloc::vec![(root, 0)];
    visited.insert(root);

    while let Some((node, next_child)) = stack.pop() {
        let children = successors.get(&node).map(|v| v.as_slice()).unwrap_or(&[]);
        if next_child < children.len() {
            let child = children[next_child];
            stack.push((node, next_child + 1));
            if visited.insert(child) {
                stack.push((child, 0));
            }
        } else {
            post_order.push(node);
        }
    }
    post_order.reverse();
    post_order
}

impl<D: Direction> CfgView<D> {
    pub fn len(&self) -> usize {
        self.nodes_in_rpo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes_in_rpo.is_empty()
    }

    pub fn nodes_in_rpo(&self) -> &[Node] {
        &self.nodes_in_rpo
    }

    pub fn node_at(&self, index: usize) -> Node {
        self.nodes_in_rpo[index]
    }

    pub fn traversal_index(&self, node: Node) -> Option<usize> {
        self.index_of.get(&node).copied()
    }

    pub fn block_index(&self, block: Block) -> Option<usize> {
        self.traversal_index(Node::Block(block))
    }

    pub fn root(&self) -> Node {
        self.nodes_in_rpo[0]
    }

    pub fn successors(&self, node: Node) -> &[Node] {
        self.successors.get(&node).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn predecessors(&self, node: Node) -> &[Node] {
        self.predecessors.get(&node).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Real blocks only, in RPO order — the view every block/value-level
    /// fix-point driver (C6) and the movement index (C8) iterate.
    pub fn blocks_in_rpo(&self) -> Vec<Block> {
        self.nodes_in_rpo.iter().filter_map(|n| n.as_block()).collect()
    }

    /// `successors(Node::Block(block))`, restricted to real blocks. The
    /// `VirtualExit` node never appears as a successor in the `Forwards`
    /// direction, and is irrelevant to C6/C8, which only ever walk forwards.
    pub fn successor_blocks(&self, block: Block) -> Vec<Block> {
        self.successors(Node::Block(block))
            .iter()
            .filter_map(|n| n.as_block())
            .collect()
    }
}

impl CfgView<Forwards> {
    pub fn build(func: &Function) -> Self {
        let (succs, preds) = forward_adjacency(func);
        let mut successors = BTreeMap::new();
        let mut predecessors = BTreeMap::new();
        for (block, targets) in &succs {
            successors.insert(Node::Block(*block), targets.iter().copied().map(Node::Block).collect());
        }
        for (block, sources) in &preds {
            predecessors.insert(Node::Block(*block), sources.iter().copied().map(Node::Block).collect());
        }
        let root = match func.entry_block() {
            Some(b) => Node::Block(b),
            None => {
                return CfgView {
                    nodes_in_rpo: Vec::new(),
                    index_of: BTreeMap::new(),
                    successors,
                    predecessors,
                    _direction: PhantomData,
                }
            }
        };
        let nodes_in_rpo = reverse_post_order(root, &successors);
        let index_of = nodes_in_rpo.iter().enumerate().map(|(i, n)| (*n, i)).collect();
        CfgView { nodes_in_rpo, index_of, successors, predecessors, _direction: PhantomData }
    }
}

impl CfgView<Backwards> {
    pub fn build(func: &Function) -> Self {
        let (forward_succs, forward_preds) = forward_adjacency(func);
        let exits: Vec<Block> = forward_succs
            .iter()
            .filter(|(_, succs)| succs.is_empty())
            .map(|(b, _)| *b)
            .collect();

        let use_virtual_exit = exits.len() != 1;
        let root = if use_virtual_exit { Node::VirtualExit } else { Node::Block(exits[0]) };

        // Backward successors = forward predecessors; backward predecessors
        // = forward successors, plus an edge from every real exit into the
        // virtual exit when one was synthesized.
        let mut successors: BTreeMap<Node, Vec<Node>> = BTreeMap::new();
        let mut predecessors: BTreeMap<Node, Vec<Node>> = BTreeMap::new();

        for (&block, preds) in &forward_preds {
            successors.insert(Node::Block(block), preds.iter().copied().map(Node::Block).collect());
        }
        for (&block, succs) in &forward_succs {
            let mut backward_preds: Vec<Node> = succs.iter().copied().map(Node::Block).collect();
            if use_virtual_exit && succs.is_empty() {
                backward_preds.push(Node::VirtualExit);
            }
            predecessors.insert(Node::Block(block), backward_preds);
        }
        if use_virtual_exit {
            successors.insert(Node::VirtualExit, exits.iter().copied().map(Node::Block).collect());
            predecessors.insert(Node::VirtualExit, Vec::new());
        }

        let nodes_in_rpo = reverse_post_order(root, &successors);
        let index_of = nodes_in_rpo.iter().enumerate().map(|(i, n)| (*n, i)).collect();
        CfgView { nodes_in_rpo, index_of, successors, predecessors, _direction: PhantomData }
    }
}
