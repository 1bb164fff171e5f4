//! Overload resolution against the class registry.
//!
//! Candidates are collected from the queried type's own declared
//! callables plus, for methods, the methods of its directly implemented
//! interfaces. Interfaces of superclasses are never collected ("leaf
//! interfaces only" — a documented policy, not an accident), while
//! assignability checks inside parameter matching use the full hierarchy.
//!
//! Among matching candidates the first in declaration-enumeration order
//! wins; there is no specificity ranking. When nothing matches at one
//! level, resolution repeats against the direct superclass until the
//! hierarchy is exhausted.

use std::sync::Arc;

use strait_core::{names, ClassRegistry, ConstructorEntry, MethodEntry, ParamSpec};

use crate::errors::{Error, Result};

/// A resolved method plus the class it was found on.
#[derive(Debug, Clone)]
pub struct ResolvedMethod {
    pub method: Arc<MethodEntry>,
    pub owner: String,
}

/// A resolved constructor plus the class it was found on.
#[derive(Debug, Clone)]
pub struct ResolvedConstructor {
    pub constructor: Arc<ConstructorEntry>,
    pub owner: String,
}

/// Resolves methods and constructors by name and runtime argument types.
pub struct MethodResolver<'r> {
    registry: &'r ClassRegistry,
}

impl<'r> MethodResolver<'r> {
    pub fn new(registry: &'r ClassRegistry) -> Self {
        MethodResolver { registry }
    }

    /// Resolve `method_name` on `owner_type` for the given runtime
    /// argument types.
    pub fn resolve(
        &self,
        owner_type: &str,
        method_name: &str,
        arg_types: &[String],
    ) -> Result<ResolvedMethod> {
        let mut current = owner_type.to_string();
        let mut first_level = true;
        loop {
            let Some(entry) = self.registry.lookup(&current) else {
                break;
            };

            let mut candidates: Vec<(Arc<MethodEntry>, String)> = entry
                .methods_named(method_name)
                .map(|m| (m.clone(), current.clone()))
                .collect();
            if first_level {
                // Only the queried type's own interfaces contribute.
                for interface in entry.interfaces() {
                    if let Some(iface) = self.registry.lookup(interface) {
                        candidates.extend(
                            iface
                                .methods_named(method_name)
                                .map(|m| (m.clone(), interface.clone())),
                        );
                    }
                }
            }

            for (method, owner) in candidates {
                if self.params_match(&method.params, arg_types) {
                    return Ok(ResolvedMethod { method, owner });
                }
            }

            first_level = false;
            match entry.superclass() {
                Some(superclass) => current = superclass.to_string(),
                None => break,
            }
        }

        Err(Error::MethodNotFound(format!(
            "method {}({}) was not found in {} or its ancestors",
            method_name,
            arg_types.join(", "),
            owner_type
        )))
    }

    /// Resolve a constructor of `owner_type` for the given runtime
    /// argument types. Walks superclasses, never interfaces.
    pub fn resolve_constructor(
        &self,
        owner_type: &str,
        arg_types: &[String],
    ) -> Result<ResolvedConstructor> {
        let mut current = owner_type.to_string();
        loop {
            let Some(entry) = self.registry.lookup(&current) else {
                break;
            };

            for constructor in entry.constructors() {
                if self.params_match(&constructor.params, arg_types) {
                    return Ok(ResolvedConstructor {
                        constructor: constructor.clone(),
                        owner: current,
                    });
                }
            }

            match entry.superclass() {
                Some(superclass) => current = superclass.to_string(),
                None => break,
            }
        }

        Err(Error::Instantiation(format!(
            "constructor ({}) was not found in {} or its ancestors",
            arg_types.join(", "),
            owner_type
        )))
    }

    /// A candidate matches when every formal parameter accepts the
    /// corresponding argument's runtime type.
    fn params_match(&self, params: &[ParamSpec], arg_types: &[String]) -> bool {
        if params.len() != arg_types.len() {
            return false;
        }
        params.iter().zip(arg_types).all(|(param, arg)| match param {
            // Erasure leaves nothing to check against.
            ParamSpec::Parameterized | ParamSpec::Wildcard | ParamSpec::TypeVar => true,
            ParamSpec::GenericArray => names::is_array(arg),
            ParamSpec::Class(formal) => self.registry.assignable_from(formal, arg),
        })
    }
}
