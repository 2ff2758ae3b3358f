//! Basic block storage.

use alloc::vec::Vec;

use crate::entity::Value;

/// A basic block's contents: an ordered list of values, the last of which
/// is always a terminator once the block is sealed (`Function::add_block`
/// does not enforce this — callers build blocks bottom-up and the
/// terminator is simply the last value pushed).
#[derive(Debug, Clone, Default)]
pub struct BlockData {
    values: Vec<Value>,
}

impl BlockData {
    pub fn new() -> Self {
        BlockData { values: Vec::new() }
    }

    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// The block's terminator, if one has been appended yet.
    pub fn terminator(&self) -> Option<Value> {
        self.values.last().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminator_is_last_pushed_value() {
        let mut block = BlockData::new();
        assert_eq!(block.terminator(), None);
        block.push(Value::new(0));
        block.push(Value::new(1));
        assert_eq!(block.terminator(), Some(Value::new(1)));
        assert_eq!(block.values(), &[Value::new(0), Value::new(1)]);
    }
}
