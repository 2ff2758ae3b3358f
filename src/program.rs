//! A collection of `Function`s keyed by `FunctionRef`, the call-graph
//! universe C6-global and C7 traverse. Nothing outside this crate builds one
//! for us in this exercise (spec.md treats the host module/linker as an
//! external collaborator), so this is the minimal arena needed to exercise
//! the inter-procedural analyses end to end.

use crate::entity::{EntityRef, FunctionRef};
use crate::entity_map::PrimaryMap;
use crate::function::Function;

/// Every function under analysis, addressable by the `FunctionRef`s that
/// `SideEffectOp::Call` targets carry.
#[derive(Debug, Clone, Default)]
pub struct Program {
    functions: PrimaryMap<FunctionRef, Function>,
}

impl Program {
    pub fn new() -> Self {
        Program { functions: PrimaryMap::new() }
    }

    pub fn add_function(&mut self, function: Function) -> FunctionRef {
        self.functions.push(function)
    }

    pub fn get(&self, function_ref: FunctionRef) -> &Function {
        self.functions
            .get(function_ref)
            .expect("FunctionRef must have been created by this Program")
    }

    pub fn contains(&self, function_ref: FunctionRef) -> bool {
        self.functions.get(function_ref).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FunctionRef, &Function)> {
        self.functions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_function_returns_distinct_refs() {
        let mut program = Program::new();
        let a = program.add_function(Function::new("a", 0));
        let b = program.add_function(Function::new("b", 0));
        assert_ne!(a, b);
        assert_eq!(program.get(a).name(), "a");
        assert_eq!(program.get(b).name(), "b");
    }

    #[test]
    fn contains_is_false_for_foreign_ref() {
        let program = Program::new();
        assert!(!program.contains(FunctionRef::from_index(0)));
    }
}
