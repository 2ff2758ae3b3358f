//! The `Function`: the arena that owns every block and value in one
//! compilation unit, and the builder API analyses are constructed against.

use alloc::vec::Vec;

use crate::block::BlockData;
use crate::entity::{Block, EntityRef, Value};
use crate::entity_map::PrimaryMap;
use crate::types::TypeNode;
use crate::value::ValueKind;

/// Everything stored per `Value`: its kind, its (optional) type, the block
/// that owns it, and the reverse-edge list of values that read it.
#[derive(Debug, Clone)]
pub struct ValueData {
    kind: ValueKind,
    ty: Option<TypeNode>,
    block: Block,
    uses: Vec<Value>,
}

impl ValueData {
    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    pub fn ty(&self) -> Option<&TypeNode> {
        self.ty.as_ref()
    }

    pub fn block(&self) -> Block {
        self.block
    }

    /// Every value that reads this one as an operand, in insertion order.
    pub fn uses(&self) -> &[Value] {
        &self.uses
    }
}

/// A single compilation unit under analysis (spec.md's "Method").
#[derive(Debug, Clone)]
pub struct Function {
    name: alloc::string::String,
    param_count: usize,
    blocks: PrimaryMap<Block, BlockData>,
    values: PrimaryMap<Value, ValueData>,
    /// Block layout order; `entry_block()` is always `layout[0]`.
    layout: Vec<Block>,
    undefined_value: Value,
}

impl Function {
    /// Creates an empty function with `param_count` parameters and a single
    /// canonical `Undefined` value (spec.md's `IRContext.UndefinedValue`),
    /// seeded before any block exists so every analysis can refer to it.
    pub fn new(name: impl Into<alloc::string::String>, param_count: usize) -> Self {
        let mut values = PrimaryMap::new();
        let undefined_value = values.push(ValueData {
            kind: ValueKind::Undefined,
            ty: None,
            // The undefined value has no owning block; Block(0) is never
            // dereferenced for it since no block ever contains it.
            block: Block::from_index(0),
            uses: Vec::new(),
        });
        Function {
            name: name.into(),
            param_count,
            blocks: PrimaryMap::new(),
            values,
            layout: Vec::new(),
            undefined_value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn param_count(&self) -> usize {
        self.param_count
    }

    pub fn undefined_value(&self) -> Value {
        self.undefined_value
    }

    pub fn entry_block(&self) -> Option<Block> {
        self.layout.first().copied()
    }

    /// Block layout order — the order blocks were appended in, which this
    /// crate treats as the function's canonical iteration order (mirroring
    /// `lpc-lpir::function::Function`'s layout list).
    pub fn layout(&self) -> &[Block] {
        &self.layout
    }

    pub fn block_values(&self, block: Block) -> &[Value] {
        self.blocks.get(block).map(|b| b.values()).unwrap_or(&[])
    }

    pub fn block_terminator(&self, block: Block) -> Option<Value> {
        self.blocks.get(block).and_then(|b| b.terminator())
    }

    pub fn value_data(&self, value: Value) -> &ValueData {
        self.values
            .get(value)
            .expect("Value must have been created by this Function")
    }

    pub fn value_kind(&self, value: Value) -> &ValueKind {
        self.value_data(value).kind()
    }

    pub fn value_block(&self, value: Value) -> Block {
        self.value_data(value).block()
    }

    pub fn value_uses(&self, value: Value) -> &[Value] {
        self.value_data(value).uses()
    }

    pub fn values(&self) -> impl Iterator<Item = Value> + '_ {
        self.values.iter().map(|(v, _)| v)
    }

    /// Resolves the function's parameters to their `Value`s, indexed by
    /// parameter position, by scanning the entry block for `Parameter(i)`
    /// values. Used by C6-global to seed argument abstractions.
    pub fn parameters(&self) -> Vec<Option<Value>> {
        let mut params = alloc::vec![None; self.param_count];
        if let Some(entry) = self.entry_block() {
            for &v in self.block_values(entry) {
                if let ValueKind::Parameter(index) = self.value_kind(v) {
                    if let Some(slot) = params.get_mut(*index) {
                        *slot = Some(v);
                    }
                }
            }
        }
        params
    }

    /// Appends a new, empty block to the layout and returns its reference.
    pub fn add_block(&mut self) -> Block {
        let block = self.blocks.push(BlockData::new());
        self.layout.push(block);
        block
    }

    /// Creates a value of `kind` owned by `block`, appends it to the block's
    /// value list, and wires up `Uses` on every operand `kind` reads.
    ///
    /// Operands must already exist (including the function's own
    /// `undefined_value`) — this mirrors `lpc-lpir::function::Function`'s
    /// builder discipline of appending instructions in data-flow order.
    pub fn add_value(&mut self, block: Block, kind: ValueKind, ty: Option<TypeNode>) -> Value {
        let operands = kind.operands();
        let value = self.values.push(ValueData { kind, ty, block, uses: Vec::new() });
        for operand in operands {
            if let Some(data) = self.values.get_mut(operand) {
                data.uses.push(value);
            }
        }
        self.blocks
            .get_mut(block)
            .expect("block must exist")
            .push(value);
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MemoryAddressSpace;
    use crate::value::{AllocaArrayLen, AllocaData, GenericOp, MemoryOp, SideEffectOp, TerminatorOp};

    #[test]
    fn add_value_wires_uses_on_operands() {
        let mut func = Function::new("f", 1);
        let entry = func.add_block();
        let p0 = func.add_value(entry, ValueKind::Parameter(0), Some(TypeNode::scalar(4, 4)));
        let add = func.add_value(
            entry,
            ValueKind::Generic(GenericOp { operands: alloc::vec![p0, p0] }),
            Some(TypeNode::scalar(4, 4)),
        );
        assert_eq!(func.value_uses(p0), &[add, add]);
        assert_eq!(func.value_uses(add), &[] as &[Value]);
    }

    #[test]
    fn block_terminator_is_last_value_in_block() {
        let mut func = Function::new("f", 0);
        let entry = func.add_block();
        let ret = func.add_value(
            entry,
            ValueKind::Terminator(TerminatorOp::Return { values: Vec::new() }),
            None,
        );
        assert_eq!(func.block_terminator(entry), Some(ret));
    }

    #[test]
    fn alloca_records_address_space_and_element_type() {
        let mut func = Function::new("f", 0);
        let entry = func.add_block();
        let alloca = func.add_value(
            entry,
            ValueKind::SideEffect(SideEffectOp::Memory(MemoryOp::Alloca(AllocaData {
                address_space: MemoryAddressSpace::Shared,
                array_len: AllocaArrayLen::Scalar,
                element_type: TypeNode::scalar(4, 4),
            }))),
            Some(TypeNode::pointer(MemoryAddressSpace::Shared, TypeNode::scalar(4, 4))),
        );
        match func.value_kind(alloca).as_memory_op().unwrap() {
            MemoryOp::Alloca(data) => assert_eq!(data.address_space, MemoryAddressSpace::Shared),
            _ => panic!("expected alloca"),
        }
    }

    #[test]
    fn undefined_value_exists_before_any_block() {
        let func = Function::new("f", 0);
        assert!(matches!(func.value_kind(func.undefined_value()), ValueKind::Undefined));
    }
}
