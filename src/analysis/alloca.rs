//! C3: alloca inventory. Categorises every `Alloca` value in a function by
//! address space, computing per-allocation and per-kind sizes.
//!
//! Grounded on `lpc-lpir::analysis::cfg::ControlFlowGraph::from_function`'s
//! "walk every block in layout order, inspect each value once" shape; the
//! three-bucket split (local / shared / dynamic-shared) and the size
//! bookkeeping are new to this crate (spec.md §3/§4.2 have no teacher
//! analogue — `lpc-lpir` has no memory-space concept at all).

use alloc::vec::Vec;

use crate::entity::Value;
use crate::error::AllocaError;
use crate::function::Function;
use crate::types::{MemoryAddressSpace, TypeNode};
use crate::value::{AllocaArrayLen, AllocaData};

/// One allocation's derived geometry (spec.md §3 `AllocaInformation`).
#[derive(Debug, Clone)]
pub struct AllocaInformation {
    pub index: usize,
    pub alloca: Value,
    /// `1` for a scalar, `N` for a statically sized array, `-1` for dynamic.
    pub array_size: i64,
    pub element_size: u32,
    pub element_alignment: u32,
    pub element_type: TypeNode,
}

impl AllocaInformation {
    /// `ElementSize * max(ArraySize, 0)` — dynamic allocations (`ArraySize
    /// == -1`) contribute zero, matching `DynamicSharedAllocations.TotalSize
    /// == 0` (spec.md §4.2, §8 invariant 6).
    pub fn total_size(&self) -> u64 {
        let count = if self.array_size > 0 { self.array_size as u64 } else { 0 };
        count * self.element_size as u64
    }

    fn from_alloca(index: usize, alloca: Value, data: &AllocaData) -> Result<Self, AllocaError> {
        let array_size = match data.array_len {
            AllocaArrayLen::Scalar => 1,
            AllocaArrayLen::Array(n) => n as i64,
            AllocaArrayLen::Dynamic => {
                if data.address_space != MemoryAddressSpace::Shared {
                    return Err(AllocaError::DynamicAllocationNotSupported);
                }
                -1
            }
        };
        Ok(AllocaInformation {
            index,
            alloca,
            array_size,
            element_size: data.element_type.size(),
            element_alignment: data.element_type.alignment(),
            element_type: data.element_type.clone(),
        })
    }
}

/// One kind's allocation list plus its cumulative size (spec.md §3
/// `AllocaKindInformation`).
#[derive(Debug, Clone, Default)]
pub struct AllocaKindInformation {
    allocations: Vec<AllocaInformation>,
    total_size: u64,
}

impl AllocaKindInformation {
    pub fn allocations(&self) -> &[AllocaInformation] {
        &self.allocations
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn len(&self) -> usize {
        self.allocations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }

    /// Linear search — allocation counts are small (spec.md §4.2: "typically
    /// <64"), so a `BTreeSet` index would be overkill.
    pub fn contains(&self, alloca: Value) -> bool {
        self.allocations.iter().any(|info| info.alloca == alloca)
    }

    fn push(&mut self, info: AllocaInformation, contributes_size: bool) {
        if contributes_size {
            self.total_size += info.total_size();
        }
        self.allocations.push(info);
    }
}

/// The three-bucket inventory of every allocation in a function (spec.md §3
/// `Allocas`).
#[derive(Debug, Clone, Default)]
pub struct Allocas {
    pub local_allocations: AllocaKindInformation,
    pub shared_allocations: AllocaKindInformation,
    pub dynamic_shared_allocations: AllocaKindInformation,
}

impl Allocas {
    pub fn local_memory_size(&self) -> u64 {
        self.local_allocations.total_size()
    }

    pub fn shared_memory_size(&self) -> u64 {
        self.shared_allocations.total_size()
    }

    /// Visits every value in block-layout order (spec.md §4.2, §5: "Block
    /// iteration order in Allocas construction defines allocation-index
    /// order"), assigning monotonically increasing indices per kind.
    pub fn build(func: &Function) -> Result<Self, AllocaError> {
        let mut result = Allocas::default();
        let mut local_index = 0;
        let mut shared_index = 0;
        let mut dynamic_index = 0;

        for &block in func.layout() {
            for &value in func.block_values(block) {
                let Some(data) = func.value_kind(value).as_memory_op().and_then(|m| match m {
                    crate::value::MemoryOp::Alloca(data) => Some(data),
                    _ => None,
                }) else {
                    continue;
                };

                match data.address_space {
                    MemoryAddressSpace::Local => {
                        let info = AllocaInformation::from_alloca(local_index, value, data)?;
                        local_index += 1;
                        result.local_allocations.push(info, true);
                    }
                    MemoryAddressSpace::Shared => {
                        if matches!(data.array_len, AllocaArrayLen::Dynamic) {
                            let info = AllocaInformation::from_alloca(dynamic_index, value, data)?;
                            dynamic_index += 1;
                            result.dynamic_shared_allocations.push(info, false);
                        } else {
                            let info = AllocaInformation::from_alloca(shared_index, value, data)?;
                            shared_index += 1;
                            result.shared_allocations.push(info, true);
                        }
                    }
                    MemoryAddressSpace::Generic | MemoryAddressSpace::Global => {
                        debug_assert!(
                            false,
                            "alloca in unexpected address space {:?}",
                            data.address_space
                        );
                    }
                }
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{SideEffectOp, ValueKind};

    fn add_alloca(func: &mut Function, block: crate::entity::Block, space: MemoryAddressSpace, len: AllocaArrayLen, size: u32, align: u32) -> Value {
        func.add_value(
            block,
            ValueKind::SideEffect(SideEffectOp::Memory(crate::value::MemoryOp::Alloca(AllocaData {
                address_space: space,
                array_len: len,
                element_type: TypeNode::scalar(size, align),
            }))),
            Some(TypeNode::pointer(space, TypeNode::scalar(size, align))),
        )
    }

    /// S4: scalar local (4 bytes), array-of-8 local i32 (32 bytes), scalar
    /// shared (8 bytes), dynamic shared array.
    #[test]
    fn s4_allocas_scenario() {
        let mut func = Function::new("f", 0);
        let entry = func.add_block();
        add_alloca(&mut func, entry, MemoryAddressSpace::Local, AllocaArrayLen::Scalar, 4, 4);
        add_alloca(&mut func, entry, MemoryAddressSpace::Local, AllocaArrayLen::Array(8), 4, 4);
        add_alloca(&mut func, entry, MemoryAddressSpace::Shared, AllocaArrayLen::Scalar, 8, 8);
        add_alloca(&mut func, entry, MemoryAddressSpace::Shared, AllocaArrayLen::Dynamic, 4, 4);

        let allocas = Allocas::build(&func).unwrap();
        assert_eq!(allocas.local_allocations.len(), 2);
        assert_eq!(allocas.local_memory_size(), 4 + 32);
        assert_eq!(allocas.shared_allocations.len(), 1);
        assert_eq!(allocas.shared_memory_size(), 8);
        assert_eq!(allocas.dynamic_shared_allocations.len(), 1);
        assert_eq!(allocas.dynamic_shared_allocations.allocations()[0].total_size(), 0);
    }

    #[test]
    fn dynamic_allocation_outside_shared_is_an_error() {
        let mut func = Function::new("f", 0);
        let entry = func.add_block();
        add_alloca(&mut func, entry, MemoryAddressSpace::Local, AllocaArrayLen::Dynamic, 4, 4);
        assert_eq!(Allocas::build(&func).unwrap_err(), AllocaError::DynamicAllocationNotSupported);
    }

    #[test]
    fn allocation_indices_are_monotonic_per_kind() {
        let mut func = Function::new("f", 0);
        let entry = func.add_block();
        let a0 = add_alloca(&mut func, entry, MemoryAddressSpace::Local, AllocaArrayLen::Scalar, 4, 4);
        let a1 = add_alloca(&mut func, entry, MemoryAddressSpace::Local, AllocaArrayLen::Scalar, 4, 4);
        let allocas = Allocas::build(&func).unwrap();
        assert_eq!(allocas.local_allocations.allocations()[0].index, 0);
        assert_eq!(allocas.local_allocations.allocations()[1].index, 1);
        assert!(allocas.local_allocations.contains(a0));
        assert!(allocas.local_allocations.contains(a1));
    }
}
