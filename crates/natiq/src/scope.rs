//! [`Scope`]: the mutable environment plus the constant set (SPEC_FULL §3,
//! §4.E). The function table lives separately on [`crate::engine::Engine`]
//! since it is process-global and never snapshotted - see spec.md §9.

use crate::value::Value;
use ahash::AHashMap;
use std::collections::HashSet;

/// A single flat mapping from identifier to value, plus the set of names
/// that were declared `const`. Call frames are whole-map swaps of this
/// type (see `Engine::call_user_function`), which is why there is no
/// lexical closure over an enclosing scope: a function body only ever
/// sees its own frame (spec.md §3, §9).
#[derive(Debug, Clone, Default)]
pub struct Scope {
    variables: AHashMap<String, Value>,
    constants: HashSet<String>,
}

impl Scope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    #[must_use]
    pub fn is_declared(&self, name: &str) -> bool {
        self.variables.contains_key(name) || self.constants.contains(name)
    }

    #[must_use]
    pub fn is_constant(&self, name: &str) -> bool {
        self.constants.contains(name)
    }

    /// Declare a fresh binding. Callers must check `is_declared` first -
    /// this does not itself enforce the no-redefine invariant, mirroring
    /// how the teacher's `Scope::push` is a dumb append and `Engine`
    /// enforces uniqueness where the language requires it.
    pub fn declare(&mut self, name: String, value: Value, is_const: bool) {
        if is_const {
            self.constants.insert(name.clone());
        }
        self.variables.insert(name, value);
    }

    /// Assign to an existing binding, or create one if absent - bare
    /// assignment without `var` also creates, matching spec.md §4.F.
    pub fn assign(&mut self, name: String, value: Value) {
        self.variables.insert(name, value);
    }

    /// Swap in a fresh, empty scope, returning the one that was active.
    /// Used to implement the "snapshot caller, install fresh frame" call
    /// discipline of spec.md §3.
    pub fn swap_fresh(&mut self) -> Self {
        std::mem::take(self)
    }

    pub fn restore(&mut self, previous: Self) {
        *self = previous;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_assignment_creates_binding() {
        let mut scope = Scope::new();
        assert!(!scope.is_declared("س"));
        scope.assign("س".to_string(), Value::int(1));
        assert!(scope.is_declared("س"));
    }

    #[test]
    fn frame_swap_restores_caller_state() {
        let mut scope = Scope::new();
        scope.assign("caller_only".to_string(), Value::int(1));
        let caller = scope.swap_fresh();
        assert!(!scope.is_declared("caller_only"));
        scope.assign("param".to_string(), Value::int(2));
        scope.restore(caller);
        assert!(scope.is_declared("caller_only"));
        assert!(!scope.is_declared("param"));
    }
}
