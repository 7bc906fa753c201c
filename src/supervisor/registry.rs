//! Module registry — insertion-ordered, name-unique.

use std::collections::HashMap;

use crate::error::AppError;
use crate::module::ModuleHandle;

/// Registered modules in registration order.
///
/// Iteration order is insertion order and drives the wiring phase, so the
/// registry keeps a `Vec` and a name → position index beside it.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: Vec<ModuleHandle>,
    index: HashMap<String, usize>,
}

impl ModuleRegistry {
    /// Insert a module. A name that is already taken is rejected and the
    /// first registration stays in place.
    pub fn insert(&mut self, handle: ModuleHandle) -> Result<(), AppError> {
        let name = handle.name().to_string();
        if self.index.contains_key(&name) {
            return Err(AppError::DuplicateModule(name));
        }
        self.index.insert(name, self.modules.len());
        self.modules.push(handle);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ModuleHandle> {
        self.index.get(name).map(|&i| &self.modules[i])
    }

    pub fn handles(&self) -> &[ModuleHandle] {
        &self.modules
    }

    pub fn names(&self) -> Vec<&str> {
        self.modules.iter().map(ModuleHandle::name).collect()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Every ordered pair of distinct modules, outer and inner loop both in
    /// registration order: n·(n-1) pairs.
    pub fn pairs(&self) -> Vec<(ModuleHandle, ModuleHandle)> {
        let mut pairs = Vec::with_capacity(self.len() * self.len().saturating_sub(1));
        for (i, module) in self.modules.iter().enumerate() {
            for (j, other) in self.modules.iter().enumerate() {
                if i != j {
                    pairs.push((module.clone(), other.clone()));
                }
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{Module, ModuleContext};
    use crate::store::ConfigStore;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Noop;

    #[async_trait]
    impl Module for Noop {}

    fn handle(name: &str) -> ModuleHandle {
        ModuleHandle::new(
            ModuleContext::new(name, Arc::new(ConfigStore::default())),
            Arc::new(Noop),
        )
    }

    fn registry(names: &[&str]) -> ModuleRegistry {
        let mut reg = ModuleRegistry::default();
        for name in names {
            reg.insert(handle(name)).unwrap();
        }
        reg
    }

    #[test]
    fn keeps_insertion_order() {
        let reg = registry(&["zeta", "alpha", "mid"]);
        assert_eq!(reg.names(), vec!["zeta", "alpha", "mid"]);
        assert_eq!(reg.get("alpha").unwrap().name(), "alpha");
        assert!(reg.get("missing").is_none());
    }

    #[test]
    fn duplicate_rejected() {
        let mut reg = registry(&["auth"]);
        let err = reg.insert(handle("auth")).unwrap_err();
        assert!(matches!(err, AppError::DuplicateModule(ref n) if n == "auth"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn pairs_cover_all_ordered_pairs() {
        let reg = registry(&["a", "b", "c"]);
        let pairs: Vec<(String, String)> = reg
            .pairs()
            .iter()
            .map(|(m, o)| (m.name().to_string(), o.name().to_string()))
            .collect();
        let expected = [("a", "b"), ("a", "c"), ("b", "a"), ("b", "c"), ("c", "a"), ("c", "b")];
        assert_eq!(pairs.len(), 6);
        for ((m, o), (em, eo)) in pairs.iter().zip(expected) {
            assert_eq!((m.as_str(), o.as_str()), (em, eo));
        }
    }

    #[test]
    fn single_module_has_no_pairs() {
        assert!(registry(&["solo"]).pairs().is_empty());
        assert!(ModuleRegistry::default().is_empty());
    }
}
