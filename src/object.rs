//! Virtual objects
//!
//! A `VirtualObject` is an opaque handle whose every operation is routed
//! through a [`Handler`]. The optional layers (delegation chain, missing-member
//! resolver, hooks) are assembled by [`ObjectBuilder`] by wrapping the
//! handler's traps; the object itself only dispatches.
//!
//! Once an object is fixed its handler is bypassed for good and operations go
//! straight to a frozen snapshot store.

use crate::delegation::{self, DelegationChain};
use crate::error::MetaError;
use crate::handler::{Handler, TrapSet};
use crate::hooks::{self, Hook, HookNaming, HookTable, MemberCount};
use crate::prelude::{Rc, RefCell, fmt};
use crate::resolver::MissingMemberResolver;
use crate::store::{PropertyDescriptor, Store};
use crate::value::{CheapClone, Function, PropertyKey, Value};

/// Handle to a virtual object; clones share identity
#[derive(Clone)]
pub struct VirtualObject(Rc<ObjectCell>);

struct ObjectCell {
    handler: Handler,
    chain: Option<DelegationChain>,
    hooks: Option<HookTable>,
    count: Option<MemberCount>,
    strict: bool,
    /// Set by a successful `fix`
    fixed: RefCell<Option<Rc<Handler>>>,
}

impl CheapClone for VirtualObject {}

impl fmt::Debug for VirtualObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualObject")
            .field("store", self.0.handler.store())
            .field("hooks", &self.0.hooks)
            .field("delegates", &self.0.chain.as_ref().map(DelegationChain::len))
            .field("fixed", &self.is_fixed())
            .finish()
    }
}

impl VirtualObject {
    /// Create a plain trapping object. An absent store gets a fresh empty one.
    pub fn new(store: Option<Store>, traps: TrapSet) -> Self {
        Self::from_parts(Handler::new(store.unwrap_or_default(), traps), None, None, None, false)
    }

    fn from_parts(
        handler: Handler,
        chain: Option<DelegationChain>,
        hooks: Option<HookTable>,
        count: Option<MemberCount>,
        strict: bool,
    ) -> Self {
        VirtualObject(Rc::new(ObjectCell {
            handler,
            chain,
            hooks,
            count,
            strict,
            fixed: RefCell::new(None),
        }))
    }

    pub fn ptr_eq(&self, other: &VirtualObject) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// The store the handler forwards to
    pub(crate) fn store(&self) -> &Store {
        self.0.handler.store()
    }

    fn receiver(&self) -> Value {
        Value::Object(self.cheap_clone())
    }

    fn route<R>(&self, op: impl FnOnce(&Handler) -> R) -> R {
        let fixed = self.0.fixed.borrow().clone();
        match fixed {
            Some(handler) => op(handler.as_ref()),
            None => op(&self.0.handler),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Member operations
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn get(&self, key: impl Into<PropertyKey>) -> Result<Value, MetaError> {
        let key = key.into();
        let receiver = self.receiver();
        self.route(|handler| handler.get(&receiver, &key))
    }

    /// Write a member. `Ok(false)` reports a rejected write unless the object
    /// was built with strict writes, in which case the rejection is an error.
    pub fn set(&self, key: impl Into<PropertyKey>, value: impl Into<Value>) -> Result<bool, MetaError> {
        let key = key.into();
        let receiver = self.receiver();
        let written = self.route(|handler| handler.set(&receiver, &key, value.into()))?;
        if !written && self.0.strict {
            return Err(MetaError::write_rejected(key.to_string()));
        }
        Ok(written)
    }

    pub fn delete(&self, key: impl Into<PropertyKey>) -> Result<bool, MetaError> {
        let key = key.into();
        let receiver = self.receiver();
        self.route(|handler| handler.delete(&receiver, &key))
    }

    pub fn define_property(
        &self,
        key: impl Into<PropertyKey>,
        desc: PropertyDescriptor,
    ) -> Result<bool, MetaError> {
        let key = key.into();
        let receiver = self.receiver();
        self.route(|handler| handler.define_property(&receiver, &key, desc))
    }

    pub fn get_own_property_descriptor(
        &self,
        key: impl Into<PropertyKey>,
    ) -> Result<Option<PropertyDescriptor>, MetaError> {
        let key = key.into();
        self.route(|handler| handler.get_own_property_descriptor(&key))
    }

    pub fn get_property_descriptor(
        &self,
        key: impl Into<PropertyKey>,
    ) -> Result<Option<PropertyDescriptor>, MetaError> {
        let key = key.into();
        self.route(|handler| handler.get_property_descriptor(&key))
    }

    pub fn get_own_property_names(&self) -> Result<Vec<PropertyKey>, MetaError> {
        self.route(Handler::get_own_property_names)
    }

    pub fn get_property_names(&self) -> Result<Vec<PropertyKey>, MetaError> {
        self.route(Handler::get_property_names)
    }

    pub fn has(&self, key: impl Into<PropertyKey>) -> Result<bool, MetaError> {
        let key = key.into();
        self.route(|handler| handler.has(&key))
    }

    pub fn has_own(&self, key: impl Into<PropertyKey>) -> Result<bool, MetaError> {
        let key = key.into();
        self.route(|handler| handler.has_own(&key))
    }

    /// `for..in` names
    pub fn enumerate(&self) -> Result<Vec<PropertyKey>, MetaError> {
        self.route(Handler::enumerate)
    }

    pub fn keys(&self) -> Result<Vec<PropertyKey>, MetaError> {
        self.route(Handler::keys)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Fixing
    // ═══════════════════════════════════════════════════════════════════════════

    /// Run the `fix` trap and, if it yields descriptors, replace the handler
    /// with a frozen snapshot built from them. Fixing twice is a no-op.
    pub fn fix(&self) -> Result<(), MetaError> {
        if self.is_fixed() {
            return Ok(());
        }
        let Some(descriptors) = self.0.handler.fix()? else {
            return Err(MetaError::cannot_fix("the fix trap returned no descriptors"));
        };
        let snapshot = Store::from_descriptors(self.store().prototype(), descriptors);
        snapshot.freeze();
        tracing::debug!(members = snapshot.own_keys().len(), "object fixed");
        *self.0.fixed.borrow_mut() = Some(Rc::new(Handler::noop(snapshot)));
        Ok(())
    }

    pub fn is_fixed(&self) -> bool {
        self.0.fixed.borrow().is_some()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Calls
    // ═══════════════════════════════════════════════════════════════════════════

    /// Whether the object currently carries an invoke or construct hook
    pub fn is_callable(&self) -> bool {
        self.0
            .hooks
            .as_ref()
            .is_some_and(|hooks| hooks.contains(Hook::Invoke) || hooks.contains(Hook::Construct))
    }

    /// Call the object itself. Uses the invoke hook, else the construct hook.
    pub fn call(&self, args: &[Value]) -> Result<Value, MetaError> {
        self.call_hook([Hook::Invoke, Hook::Construct], args)
    }

    /// Construct with the object. Uses the construct hook, else the invoke hook.
    pub fn construct(&self, args: &[Value]) -> Result<Value, MetaError> {
        self.call_hook([Hook::Construct, Hook::Invoke], args)
    }

    fn call_hook(&self, order: [Hook; 2], args: &[Value]) -> Result<Value, MetaError> {
        let func = self
            .0
            .hooks
            .as_ref()
            .and_then(|hooks| order.into_iter().find_map(|hook| hooks.get(hook)));
        match func {
            Some(func) => func.call(&self.receiver(), args),
            None => Err(MetaError::not_callable("object")),
        }
    }

    /// Read member `name` and call it with this object as `this`
    pub fn invoke(&self, name: impl Into<PropertyKey>, args: &[Value]) -> Result<Value, MetaError> {
        let key = name.into();
        let callee = self.get(&key)?;
        callee.call(&self.receiver(), args, &key.to_string())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Layers
    // ═══════════════════════════════════════════════════════════════════════════

    /// Own data-level members, for hook-augmented objects
    pub fn count(&self) -> Option<usize> {
        self.0.count.as_ref().map(MemberCount::get)
    }

    pub fn hooks(&self) -> Option<&HookTable> {
        self.0.hooks.as_ref()
    }

    /// Reassign a hook directly; `None` removes it
    pub fn set_hook(&self, hook: Hook, func: Option<Function>) -> Result<(), MetaError> {
        let Some(hooks) = &self.0.hooks else {
            return Err(MetaError::type_error("object has no hook table"));
        };
        match func {
            Some(func) => {
                hooks.set(hook, func);
            }
            None => {
                hooks.remove(hook);
            }
        }
        Ok(())
    }

    pub fn chain(&self) -> Option<&DelegationChain> {
        self.0.chain.as_ref()
    }

    /// Whether `target` is reachable through this object's delegation chain
    pub fn delegates_to(&self, target: &VirtualObject) -> bool {
        self.chain().is_some_and(|chain| chain.reaches(target))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Builder
// ═══════════════════════════════════════════════════════════════════════════════

/// Assembles a virtual object from a store, trap overrides and optional layers.
///
/// Layers wrap the traps in a fixed order: delegation innermost, then the
/// missing-member resolver, then hooks outermost. Hooks therefore observe
/// every data-level operation before any layer below resolves it.
pub struct ObjectBuilder {
    store: Store,
    traps: TrapSet,
    hooks: Option<(HookTable, HookNaming)>,
    resolver: Option<MissingMemberResolver>,
    delegation: bool,
    strict: bool,
}

impl ObjectBuilder {
    pub fn new(store: Option<Store>) -> Self {
        Self {
            store: store.unwrap_or_default(),
            traps: TrapSet::default(),
            hooks: None,
            resolver: None,
            delegation: false,
            strict: false,
        }
    }

    pub fn traps(mut self, traps: TrapSet) -> Self {
        self.traps = traps;
        self
    }

    /// Attach a hook table. With magic naming, callable `__name__` members of
    /// the store are moved into the table at build time.
    pub fn hooks(mut self, table: HookTable, naming: HookNaming) -> Self {
        self.hooks = Some((table, naming));
        self
    }

    /// Resolve misses through `resolver`. Implies a hook table.
    pub fn resolver(mut self, resolver: MissingMemberResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn delegation(mut self) -> Self {
        self.delegation = true;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn build(self) -> Result<VirtualObject, MetaError> {
        let ObjectBuilder {
            store,
            traps,
            hooks: mut layer,
            resolver,
            delegation,
            strict,
        } = self;

        if resolver.is_some() && layer.is_none() {
            layer = Some((HookTable::new(), HookNaming::Stratified));
        }

        let mut handler = Handler::new(store.cheap_clone(), traps);

        let chain = delegation.then(DelegationChain::new);
        if let Some(chain) = &chain {
            delegation::install(&mut handler, chain);
        }

        let mut count = None;
        if let Some((table, naming)) = &layer {
            if *naming == HookNaming::Magic {
                hooks::lift_magic_members(&store, table)?;
            }
            if let Some(resolver) = &resolver {
                resolver.install(&mut handler, table);
            }
            let members = MemberCount::new(store.own_keys().len());
            hooks::install(&mut handler, table, &members, *naming);
            count = Some(members);
        }

        Ok(VirtualObject::from_parts(
            handler,
            chain,
            layer.map(|(table, _)| table),
            count,
            strict,
        ))
    }
}
