//! Entity reference system for type-safe entity IDs.
//!
//! Blocks, values and functions are never referenced by owning pointer —
//! every cross-reference in this crate is a dense integer index into a
//! `PrimaryMap` arena. This sidesteps the cyclic-ownership problem of a
//! use-def graph and a CFG (a block's successor can itself point back at an
//! earlier block) without reference counting or unsafe code.

use core::fmt;

/// Type-safe identifier for an arena-interned entity.
///
/// Implementors are plain newtypes over `u32`; the trait exists so
/// `PrimaryMap<K, V>` can be generic over the key type while still
/// preventing a `Value` from being used where a `Block` is expected.
pub trait EntityRef: Copy + Clone + PartialEq + Eq + core::hash::Hash + fmt::Debug {
    /// Get the index of this entity.
    fn index(self) -> usize;

    /// Create an entity from an index.
    fn from_index(index: usize) -> Self;
}

/// Basic block entity reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Block(u32);

impl Block {
    pub fn new(index: u32) -> Self {
        Block(index)
    }

    pub fn index(self) -> u32 {
        self.0
    }
}

impl EntityRef for Block {
    fn index(self) -> usize {
        self.0 as usize
    }

    fn from_index(index: usize) -> Self {
        Block(index as u32)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block{}", self.0)
    }
}

/// SSA value entity reference.
///
/// Unlike the Cranelift-style split between an `Inst` and its result
/// `Value`s, this IR follows the source model's single-leveled `Value`
/// hierarchy: a terminator, a load, a phi and a constant are all just
/// `Value`s with different `ValueKind` payloads (see `value.rs`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Value(u32);

impl Value {
    pub fn new(index: u32) -> Self {
        Value(index)
    }

    pub fn index(self) -> u32 {
        self.0
    }
}

impl EntityRef for Value {
    fn index(self) -> usize {
        self.0 as usize
    }

    fn from_index(index: usize) -> Self {
        Value(index as u32)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Function entity reference, used by the inter-procedural analyses (C6/C7)
/// to key their per-method state without borrowing the `Function` itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionRef(u32);

impl FunctionRef {
    pub fn new(index: u32) -> Self {
        FunctionRef(index)
    }

    pub fn index(self) -> u32 {
        self.0
    }
}

impl EntityRef for FunctionRef {
    fn index(self) -> usize {
        self.0 as usize
    }

    fn from_index(index: usize) -> Self {
        FunctionRef(index as u32)
    }
}

impl fmt::Display for FunctionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_index_roundtrip() {
        let b = Block::from_index(5);
        assert_eq!(b.index(), 5);
        assert_eq!(EntityRef::index(b), 5);
    }

    #[test]
    fn value_and_block_indices_are_independent_types() {
        let b = Block::new(3);
        let v = Value::new(3);
        assert_eq!(b.index(), v.index());
    }

    #[test]
    fn display_formats() {
        extern crate alloc;
        use alloc::format;
        assert_eq!(format!("{}", Block::new(2)), "block2");
        assert_eq!(format!("{}", Value::new(7)), "v7");
        assert_eq!(format!("{}", FunctionRef::new(1)), "fn1");
    }
}
