//! Name-keyed class storage and the assignability relation.
//!
//! The registry is populated during startup (builders) and treated as
//! effectively read-only during execution; a `RwLock` makes late
//! registration safe without sharding.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::class::{CallbackCapability, ClassEntry, ThreadAffinity};
use crate::error::RegistryError;
use crate::names;

/// The class registry of a managed runtime.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: RwLock<FxHashMap<String, Arc<ClassEntry>>>,
}

impl ClassRegistry {
    /// An empty registry. Most callers want [`ClassRegistry::with_builtins`].
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the `lang.*` built-ins pre-registered.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register_builtins();
        registry
    }

    /// Register a class. Fails on duplicate or reserved names.
    pub fn register(&self, entry: ClassEntry) -> Result<(), RegistryError> {
        if names::is_primitive(&entry.name) || names::is_array(&entry.name) {
            return Err(RegistryError::ReservedName(entry.name.clone()));
        }
        let mut classes = self.classes.write();
        if classes.contains_key(&entry.name) {
            return Err(RegistryError::DuplicateClass(entry.name.clone()));
        }
        classes.insert(entry.name.clone(), Arc::new(entry));
        Ok(())
    }

    /// Look up a class by name.
    pub fn lookup(&self, name: &str) -> Option<Arc<ClassEntry>> {
        self.classes.read().get(name).cloned()
    }

    /// Whether `name` resolves to a known type: a registered class, a
    /// primitive, or an array of a known type.
    pub fn is_known(&self, name: &str) -> bool {
        if names::is_primitive(name) {
            return true;
        }
        if let Some(elem) = names::element_of(name) {
            return self.is_known(elem);
        }
        self.classes.read().contains_key(name)
    }

    /// The callback capability of a class, inherited through the
    /// superclass chain (the nearest declared capability wins).
    pub fn capability_of(&self, class_name: &str) -> CallbackCapability {
        let mut current = class_name.to_string();
        loop {
            let Some(entry) = self.lookup(&current) else {
                return CallbackCapability::None;
            };
            if entry.callbacks() != CallbackCapability::None {
                return entry.callbacks();
            }
            match entry.superclass() {
                Some(superclass) => current = superclass.to_string(),
                None => return CallbackCapability::None,
            }
        }
    }

    /// The thread affinity of a class, inherited through the superclass
    /// chain (the nearest declared affinity wins).
    pub fn affinity_of(&self, class_name: &str) -> ThreadAffinity {
        let mut current = class_name.to_string();
        loop {
            let Some(entry) = self.lookup(&current) else {
                return ThreadAffinity::Any;
            };
            if entry.affinity() != ThreadAffinity::Any {
                return entry.affinity();
            }
            match entry.superclass() {
                Some(superclass) => current = superclass.to_string(),
                None => return ThreadAffinity::Any,
            }
        }
    }

    /// Whether a value of runtime type `source` can be used where `target`
    /// is expected.
    ///
    /// Identity, boxing equivalence, array covariance, `lang.Object` as the
    /// universal reference supertype, and the full transitive
    /// superclass/interface closure of `source`. Primitives are only
    /// assignable through boxing equivalence; there is no widening.
    pub fn assignable_from(&self, target: &str, source: &str) -> bool {
        if target == source {
            return true;
        }
        let (ct, cs) = (names::canonical(target), names::canonical(source));
        if ct == cs && names::is_primitive(ct) {
            return true;
        }
        if let (Some(te), Some(se)) = (names::element_of(target), names::element_of(source)) {
            return self.assignable_from(te, se);
        }
        if names::is_array(source) {
            return target == names::OBJECT;
        }
        if names::is_array(target) || names::is_primitive(target) || names::is_primitive(source) {
            return false;
        }
        if target == names::OBJECT {
            return true;
        }
        self.closure_contains(source, target)
    }

    /// Whether `target` appears in the transitive superclass + interface
    /// closure of `from`.
    fn closure_contains(&self, from: &str, target: &str) -> bool {
        let mut visited: FxHashSet<String> = FxHashSet::default();
        let mut stack = vec![from.to_string()];
        while let Some(name) = stack.pop() {
            if name == target {
                return true;
            }
            if !visited.insert(name.clone()) {
                continue;
            }
            let Some(entry) = self.lookup(&name) else {
                continue;
            };
            if let Some(superclass) = entry.superclass() {
                stack.push(superclass.to_string());
            }
            stack.extend(entry.interfaces().iter().cloned());
        }
        false
    }

    fn register_builtins(&self) {
        use crate::builder::ClassBuilder;

        let builtins = [
            names::OBJECT,
            names::NULL,
            names::STRING,
            names::LIST,
            names::TASK,
            names::BOOLEAN,
            names::BYTE,
            names::SHORT,
            names::INTEGER,
            names::LONG,
            names::FLOAT,
            names::DOUBLE,
            names::CHARACTER,
        ];
        for name in builtins {
            // Builtins cannot collide: the registry is empty here.
            let _ = self.register(ClassBuilder::new(name).build());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ClassBuilder;

    fn registry_with_hierarchy() -> ClassRegistry {
        let registry = ClassRegistry::with_builtins();
        ClassBuilder::interface("demo.Speaker")
            .register(&registry)
            .unwrap();
        ClassBuilder::interface("demo.LoudSpeaker")
            .implements("demo.Speaker")
            .register(&registry)
            .unwrap();
        ClassBuilder::new("demo.Base").register(&registry).unwrap();
        ClassBuilder::new("demo.Middle")
            .extends("demo.Base")
            .implements("demo.LoudSpeaker")
            .register(&registry)
            .unwrap();
        ClassBuilder::new("demo.Leaf")
            .extends("demo.Middle")
            .register(&registry)
            .unwrap();
        registry
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let registry = ClassRegistry::with_builtins();
        ClassBuilder::new("demo.Thing").register(&registry).unwrap();
        let err = ClassBuilder::new("demo.Thing")
            .register(&registry)
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateClass("demo.Thing".into()));
    }

    #[test]
    fn test_reserved_names_rejected() {
        let registry = ClassRegistry::new();
        assert_eq!(
            ClassBuilder::new("int").register(&registry),
            Err(RegistryError::ReservedName("int".into()))
        );
        assert_eq!(
            ClassBuilder::new("demo.Thing[]").register(&registry),
            Err(RegistryError::ReservedName("demo.Thing[]".into()))
        );
    }

    #[test]
    fn test_assignable_reflexive_and_boxing() {
        let registry = ClassRegistry::with_builtins();
        assert!(registry.assignable_from("int", "int"));
        assert!(registry.assignable_from("int", names::INTEGER));
        assert!(registry.assignable_from(names::INTEGER, "int"));
        assert!(!registry.assignable_from("long", "int"));
    }

    #[test]
    fn test_primitives_do_not_widen_to_object() {
        let registry = ClassRegistry::with_builtins();
        assert!(!registry.assignable_from(names::OBJECT, "int"));
        assert!(registry.assignable_from(names::OBJECT, names::INTEGER));
    }

    #[test]
    fn test_assignable_walks_full_closure() {
        let registry = registry_with_hierarchy();
        // Superclass chain.
        assert!(registry.assignable_from("demo.Base", "demo.Leaf"));
        // Interface of a superclass.
        assert!(registry.assignable_from("demo.LoudSpeaker", "demo.Leaf"));
        // Super-interface of an interface of a superclass.
        assert!(registry.assignable_from("demo.Speaker", "demo.Leaf"));
        // Not the other way around.
        assert!(!registry.assignable_from("demo.Leaf", "demo.Base"));
    }

    #[test]
    fn test_array_covariance() {
        let registry = registry_with_hierarchy();
        assert!(registry.assignable_from("demo.Base[]", "demo.Leaf[]"));
        assert!(!registry.assignable_from("demo.Leaf[]", "demo.Base[]"));
        assert!(registry.assignable_from(names::OBJECT, "demo.Leaf[]"));
        assert!(!registry.assignable_from("demo.Leaf[]", "demo.Leaf"));
    }

    #[test]
    fn test_capability_and_affinity_inherited() {
        let registry = ClassRegistry::with_builtins();
        ClassBuilder::new("demo.Emitter")
            .callbacks(CallbackCapability::Channel)
            .affinity(ThreadAffinity::Event)
            .register(&registry)
            .unwrap();
        ClassBuilder::new("demo.SubEmitter")
            .extends("demo.Emitter")
            .register(&registry)
            .unwrap();

        assert_eq!(
            registry.capability_of("demo.SubEmitter"),
            CallbackCapability::Channel
        );
        assert_eq!(
            registry.affinity_of("demo.SubEmitter"),
            ThreadAffinity::Event
        );
        assert_eq!(registry.capability_of(names::STRING), CallbackCapability::None);
    }
}
