//! Delegation chains and mixing
//!
//! A mixable object carries an ordered list of delegate objects. A read that
//! the object's own store cannot answer is offered to the delegates, most
//! recently mixed first, before falling back to the ancestor chain. Presence
//! checks (`has`) see delegated members too.

use crate::error::MetaError;
use crate::handler::Handler;
use crate::object::VirtualObject;
use crate::prelude::{Rc, RefCell, fmt};
use crate::value::PropertyKey;

/// Ordered delegate list of one object
#[derive(Clone, Default)]
pub struct DelegationChain(Rc<RefCell<Vec<VirtualObject>>>);

impl DelegationChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Delegates in mix order (oldest first)
    pub fn entries(&self) -> Vec<VirtualObject> {
        self.0.borrow().clone()
    }

    fn push(&self, module: VirtualObject) {
        self.0.borrow_mut().push(module);
    }

    /// Whether `target` is reachable through this chain, directly or through
    /// the delegates' own chains
    pub fn reaches(&self, target: &VirtualObject) -> bool {
        self.entries()
            .iter()
            .any(|delegate| delegate.ptr_eq(target) || delegate.delegates_to(target))
    }
}

impl fmt::Debug for DelegationChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegationChain")
            .field("len", &self.len())
            .finish()
    }
}

/// Wrap `get` and `has` of `handler` to consult `chain`.
///
/// Resolution order for `get`: own member, then delegates newest first, then
/// whatever the wrapped trap does (ancestors included).
pub fn install(handler: &mut Handler, chain: &DelegationChain) {
    let inner_get = handler.get_trap();
    let has_own = handler.has_own_trap();
    let delegates = chain.clone();
    handler.replace_get(Rc::new(move |store, receiver, key| {
        if has_own(store, key)? {
            return inner_get(store, receiver, key);
        }
        for delegate in delegates.entries().iter().rev() {
            if delegate.has(key)? {
                return delegate.get(key);
            }
        }
        inner_get(store, receiver, key)
    }));

    let inner_has = handler.has_trap();
    let delegates = chain.clone();
    handler.replace_has(Rc::new(move |store, key| {
        if inner_has(store, key)? {
            return Ok(true);
        }
        for delegate in delegates.entries().iter().rev() {
            if delegate.has(key)? {
                return Ok(true);
            }
        }
        Ok(false)
    }));
}

/// Enumerable names of `module` already present on `host`
pub fn conflicts(module: &VirtualObject, host: &VirtualObject) -> Result<Vec<PropertyKey>, MetaError> {
    let mut found = Vec::new();
    for name in module.enumerate()? {
        if host.has(&name)? {
            found.push(name);
        }
    }
    Ok(found)
}

/// Append `module` to the delegation chain of `host`.
///
/// In traits mode the names `module` would shadow or be shadowed by are
/// returned; otherwise the returned list is empty. Mixing never fails on a
/// conflict, it only reports it.
pub fn mix(
    module: &VirtualObject,
    host: &VirtualObject,
    traits_mode: bool,
) -> Result<Vec<PropertyKey>, MetaError> {
    let Some(chain) = host.chain() else {
        return Err(MetaError::type_error(
            "target object does not support delegation",
        ));
    };
    if module.ptr_eq(host) || module.delegates_to(host) {
        return Err(MetaError::type_error(
            "mixing would create a cyclic delegation chain",
        ));
    }
    let found = if traits_mode {
        conflicts(module, host)?
    } else {
        Vec::new()
    };
    chain.push(module.clone());
    tracing::debug!(
        depth = chain.len(),
        conflicts = found.len(),
        traits_mode,
        "module mixed into delegation chain"
    );
    Ok(found)
}
