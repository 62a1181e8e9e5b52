//! Interception handlers
//!
//! A `Handler` pairs a backing `Store` with a `TrapSet`. Every operation on a
//! virtual object is dispatched through the handler: if the trap set carries an
//! override for the operation it is called, otherwise the no-op forwarding
//! behavior runs against the store. A handler is therefore total over the trap
//! set; a missing trap is never an error.
//!
//! Layers (delegation, missing-member resolution, hooks) compose by taking the
//! currently effective trap with e.g. [`Handler::get_trap`] and installing a
//! closure that wraps it.

use crate::error::MetaError;
use crate::prelude::{Rc, fmt};
use crate::store::{PropertyDescriptor, Store};
use crate::value::{PropertyKey, Value};

/// The fixed set of interceptable operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrapKind {
    Get,
    Set,
    Delete,
    DefineProperty,
    GetOwnPropertyDescriptor,
    GetPropertyDescriptor,
    GetOwnPropertyNames,
    GetPropertyNames,
    Has,
    HasOwn,
    Enumerate,
    Keys,
    Fix,
}

impl TrapKind {
    pub const ALL: [TrapKind; 13] = [
        TrapKind::Get,
        TrapKind::Set,
        TrapKind::Delete,
        TrapKind::DefineProperty,
        TrapKind::GetOwnPropertyDescriptor,
        TrapKind::GetPropertyDescriptor,
        TrapKind::GetOwnPropertyNames,
        TrapKind::GetPropertyNames,
        TrapKind::Has,
        TrapKind::HasOwn,
        TrapKind::Enumerate,
        TrapKind::Keys,
        TrapKind::Fix,
    ];

    /// Conventional trap name
    pub fn name(self) -> &'static str {
        match self {
            TrapKind::Get => "get",
            TrapKind::Set => "set",
            TrapKind::Delete => "delete",
            TrapKind::DefineProperty => "defineProperty",
            TrapKind::GetOwnPropertyDescriptor => "getOwnPropertyDescriptor",
            TrapKind::GetPropertyDescriptor => "getPropertyDescriptor",
            TrapKind::GetOwnPropertyNames => "getOwnPropertyNames",
            TrapKind::GetPropertyNames => "getPropertyNames",
            TrapKind::Has => "has",
            TrapKind::HasOwn => "hasOwn",
            TrapKind::Enumerate => "enumerate",
            TrapKind::Keys => "keys",
            TrapKind::Fix => "fix",
        }
    }
}

impl fmt::Display for TrapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Trap signatures
// ═══════════════════════════════════════════════════════════════════════════════

/// `get(store, receiver, key)`
pub type GetTrap = Rc<dyn Fn(&Store, &Value, &PropertyKey) -> Result<Value, MetaError>>;
/// `set(store, receiver, key, value)`; `false` reports a rejected write
pub type SetTrap = Rc<dyn Fn(&Store, &Value, &PropertyKey, Value) -> Result<bool, MetaError>>;
/// `delete(store, receiver, key)`
pub type DeleteTrap = Rc<dyn Fn(&Store, &Value, &PropertyKey) -> Result<bool, MetaError>>;
/// `has` and `hasOwn`
pub type KeyTrap = Rc<dyn Fn(&Store, &PropertyKey) -> Result<bool, MetaError>>;
/// `defineProperty(store, receiver, key, descriptor)`
pub type DefineTrap =
    Rc<dyn Fn(&Store, &Value, &PropertyKey, PropertyDescriptor) -> Result<bool, MetaError>>;
/// `getOwnPropertyDescriptor` and `getPropertyDescriptor`
pub type DescriptorTrap =
    Rc<dyn Fn(&Store, &PropertyKey) -> Result<Option<PropertyDescriptor>, MetaError>>;
/// `getOwnPropertyNames`, `getPropertyNames`, `enumerate` and `keys`
pub type KeysTrap = Rc<dyn Fn(&Store) -> Result<Vec<PropertyKey>, MetaError>>;
/// Own descriptors to fix the object with; `None` means the object cannot be fixed
pub type FixedDescriptors = Option<Vec<(PropertyKey, PropertyDescriptor)>>;
/// `fix(store)`
pub type FixTrap = Rc<dyn Fn(&Store) -> Result<FixedDescriptors, MetaError>>;

/// A partial set of trap overrides. Absent traps forward to the store.
#[derive(Clone, Default)]
pub struct TrapSet {
    pub get: Option<GetTrap>,
    pub set: Option<SetTrap>,
    pub delete: Option<DeleteTrap>,
    pub define_property: Option<DefineTrap>,
    pub get_own_property_descriptor: Option<DescriptorTrap>,
    pub get_property_descriptor: Option<DescriptorTrap>,
    pub get_own_property_names: Option<KeysTrap>,
    pub get_property_names: Option<KeysTrap>,
    pub has: Option<KeyTrap>,
    pub has_own: Option<KeyTrap>,
    pub enumerate: Option<KeysTrap>,
    pub keys: Option<KeysTrap>,
    pub fix: Option<FixTrap>,
}

impl TrapSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_get(
        mut self,
        trap: impl Fn(&Store, &Value, &PropertyKey) -> Result<Value, MetaError> + 'static,
    ) -> Self {
        self.get = Some(Rc::new(trap));
        self
    }

    pub fn on_set(
        mut self,
        trap: impl Fn(&Store, &Value, &PropertyKey, Value) -> Result<bool, MetaError> + 'static,
    ) -> Self {
        self.set = Some(Rc::new(trap));
        self
    }

    pub fn on_delete(
        mut self,
        trap: impl Fn(&Store, &Value, &PropertyKey) -> Result<bool, MetaError> + 'static,
    ) -> Self {
        self.delete = Some(Rc::new(trap));
        self
    }

    pub fn on_define_property(
        mut self,
        trap: impl Fn(&Store, &Value, &PropertyKey, PropertyDescriptor) -> Result<bool, MetaError>
        + 'static,
    ) -> Self {
        self.define_property = Some(Rc::new(trap));
        self
    }

    pub fn on_get_own_property_descriptor(
        mut self,
        trap: impl Fn(&Store, &PropertyKey) -> Result<Option<PropertyDescriptor>, MetaError>
        + 'static,
    ) -> Self {
        self.get_own_property_descriptor = Some(Rc::new(trap));
        self
    }

    pub fn on_get_property_descriptor(
        mut self,
        trap: impl Fn(&Store, &PropertyKey) -> Result<Option<PropertyDescriptor>, MetaError>
        + 'static,
    ) -> Self {
        self.get_property_descriptor = Some(Rc::new(trap));
        self
    }

    pub fn on_get_own_property_names(
        mut self,
        trap: impl Fn(&Store) -> Result<Vec<PropertyKey>, MetaError> + 'static,
    ) -> Self {
        self.get_own_property_names = Some(Rc::new(trap));
        self
    }

    pub fn on_get_property_names(
        mut self,
        trap: impl Fn(&Store) -> Result<Vec<PropertyKey>, MetaError> + 'static,
    ) -> Self {
        self.get_property_names = Some(Rc::new(trap));
        self
    }

    pub fn on_keys(
        mut self,
        trap: impl Fn(&Store) -> Result<Vec<PropertyKey>, MetaError> + 'static,
    ) -> Self {
        self.keys = Some(Rc::new(trap));
        self
    }

    pub fn on_has(
        mut self,
        trap: impl Fn(&Store, &PropertyKey) -> Result<bool, MetaError> + 'static,
    ) -> Self {
        self.has = Some(Rc::new(trap));
        self
    }

    pub fn on_has_own(
        mut self,
        trap: impl Fn(&Store, &PropertyKey) -> Result<bool, MetaError> + 'static,
    ) -> Self {
        self.has_own = Some(Rc::new(trap));
        self
    }

    pub fn on_enumerate(
        mut self,
        trap: impl Fn(&Store) -> Result<Vec<PropertyKey>, MetaError> + 'static,
    ) -> Self {
        self.enumerate = Some(Rc::new(trap));
        self
    }

    pub fn on_fix(
        mut self,
        trap: impl Fn(&Store) -> Result<FixedDescriptors, MetaError> + 'static,
    ) -> Self {
        self.fix = Some(Rc::new(trap));
        self
    }

    /// Which operations carry an override
    pub fn overridden(&self) -> Vec<TrapKind> {
        TrapKind::ALL
            .into_iter()
            .filter(|kind| self.is_overridden(*kind))
            .collect()
    }

    pub fn is_overridden(&self, kind: TrapKind) -> bool {
        match kind {
            TrapKind::Get => self.get.is_some(),
            TrapKind::Set => self.set.is_some(),
            TrapKind::Delete => self.delete.is_some(),
            TrapKind::DefineProperty => self.define_property.is_some(),
            TrapKind::GetOwnPropertyDescriptor => self.get_own_property_descriptor.is_some(),
            TrapKind::GetPropertyDescriptor => self.get_property_descriptor.is_some(),
            TrapKind::GetOwnPropertyNames => self.get_own_property_names.is_some(),
            TrapKind::GetPropertyNames => self.get_property_names.is_some(),
            TrapKind::Has => self.has.is_some(),
            TrapKind::HasOwn => self.has_own.is_some(),
            TrapKind::Enumerate => self.enumerate.is_some(),
            TrapKind::Keys => self.keys.is_some(),
            TrapKind::Fix => self.fix.is_some(),
        }
    }
}

impl fmt::Debug for TrapSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrapSet")
            .field("overridden", &self.overridden())
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// No-op forwarding traps
// ═══════════════════════════════════════════════════════════════════════════════

/// The default behavior of every trap: forward straight to the store.
pub mod noop {
    use super::FixedDescriptors;
    use crate::error::MetaError;
    use crate::store::{PropertyDescriptor, Store};
    use crate::value::{PropertyKey, Value};

    pub fn get(store: &Store, receiver: &Value, key: &PropertyKey) -> Result<Value, MetaError> {
        store.get(key, receiver)
    }

    pub fn set(
        store: &Store,
        receiver: &Value,
        key: &PropertyKey,
        value: Value,
    ) -> Result<bool, MetaError> {
        store.set(key, value, receiver)
    }

    pub fn delete(store: &Store, _receiver: &Value, key: &PropertyKey) -> Result<bool, MetaError> {
        Ok(store.delete(key))
    }

    pub fn define_property(
        store: &Store,
        _receiver: &Value,
        key: &PropertyKey,
        desc: PropertyDescriptor,
    ) -> Result<bool, MetaError> {
        Ok(store.define(key, desc))
    }

    // A trapping object's properties must always be reported configurable,
    // otherwise a later fix would be rejected by the wrapper.
    pub fn get_own_property_descriptor(
        store: &Store,
        key: &PropertyKey,
    ) -> Result<Option<PropertyDescriptor>, MetaError> {
        Ok(store.own_property(key).map(|prop| {
            PropertyDescriptor::from_property(&prop).configurable(true)
        }))
    }

    pub fn get_property_descriptor(
        store: &Store,
        key: &PropertyKey,
    ) -> Result<Option<PropertyDescriptor>, MetaError> {
        Ok(store.property(key).map(|(prop, _)| {
            PropertyDescriptor::from_property(&prop).configurable(true)
        }))
    }

    pub fn get_own_property_names(store: &Store) -> Result<Vec<PropertyKey>, MetaError> {
        Ok(store.own_keys())
    }

    pub fn get_property_names(store: &Store) -> Result<Vec<PropertyKey>, MetaError> {
        Ok(store.property_names())
    }

    pub fn has(store: &Store, key: &PropertyKey) -> Result<bool, MetaError> {
        Ok(store.has(key))
    }

    pub fn has_own(store: &Store, key: &PropertyKey) -> Result<bool, MetaError> {
        Ok(store.has_own(key))
    }

    pub fn enumerate(store: &Store) -> Result<Vec<PropertyKey>, MetaError> {
        Ok(store.enumerate())
    }

    pub fn keys(store: &Store) -> Result<Vec<PropertyKey>, MetaError> {
        Ok(store.keys())
    }

    /// Only an already frozen store can be fixed
    pub fn fix(store: &Store) -> Result<FixedDescriptors, MetaError> {
        if store.is_frozen() {
            Ok(Some(store.own_properties()))
        } else {
            Ok(None)
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Handler
// ═══════════════════════════════════════════════════════════════════════════════

/// A total interception handler over one backing store
pub struct Handler {
    store: Store,
    traps: TrapSet,
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("store", &self.store)
            .field("traps", &self.traps)
            .finish()
    }
}

impl Handler {
    /// Build a handler from a store and a partial set of overrides
    pub fn new(store: Store, overrides: TrapSet) -> Self {
        Self {
            store,
            traps: overrides,
        }
    }

    /// A pure forwarding handler
    pub fn noop(store: Store) -> Self {
        Self::new(store, TrapSet::default())
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn traps(&self) -> &TrapSet {
        &self.traps
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Dispatch
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn get(&self, receiver: &Value, key: &PropertyKey) -> Result<Value, MetaError> {
        match &self.traps.get {
            Some(trap) => trap(&self.store, receiver, key),
            None => noop::get(&self.store, receiver, key),
        }
    }

    pub fn set(&self, receiver: &Value, key: &PropertyKey, value: Value) -> Result<bool, MetaError> {
        match &self.traps.set {
            Some(trap) => trap(&self.store, receiver, key, value),
            None => noop::set(&self.store, receiver, key, value),
        }
    }

    pub fn delete(&self, receiver: &Value, key: &PropertyKey) -> Result<bool, MetaError> {
        match &self.traps.delete {
            Some(trap) => trap(&self.store, receiver, key),
            None => noop::delete(&self.store, receiver, key),
        }
    }

    pub fn define_property(
        &self,
        receiver: &Value,
        key: &PropertyKey,
        desc: PropertyDescriptor,
    ) -> Result<bool, MetaError> {
        match &self.traps.define_property {
            Some(trap) => trap(&self.store, receiver, key, desc),
            None => noop::define_property(&self.store, receiver, key, desc),
        }
    }

    pub fn get_own_property_descriptor(
        &self,
        key: &PropertyKey,
    ) -> Result<Option<PropertyDescriptor>, MetaError> {
        match &self.traps.get_own_property_descriptor {
            Some(trap) => trap(&self.store, key),
            None => noop::get_own_property_descriptor(&self.store, key),
        }
    }

    pub fn get_property_descriptor(
        &self,
        key: &PropertyKey,
    ) -> Result<Option<PropertyDescriptor>, MetaError> {
        match &self.traps.get_property_descriptor {
            Some(trap) => trap(&self.store, key),
            None => noop::get_property_descriptor(&self.store, key),
        }
    }

    pub fn get_own_property_names(&self) -> Result<Vec<PropertyKey>, MetaError> {
        match &self.traps.get_own_property_names {
            Some(trap) => trap(&self.store),
            None => noop::get_own_property_names(&self.store),
        }
    }

    pub fn get_property_names(&self) -> Result<Vec<PropertyKey>, MetaError> {
        match &self.traps.get_property_names {
            Some(trap) => trap(&self.store),
            None => noop::get_property_names(&self.store),
        }
    }

    pub fn has(&self, key: &PropertyKey) -> Result<bool, MetaError> {
        match &self.traps.has {
            Some(trap) => trap(&self.store, key),
            None => noop::has(&self.store, key),
        }
    }

    pub fn has_own(&self, key: &PropertyKey) -> Result<bool, MetaError> {
        match &self.traps.has_own {
            Some(trap) => trap(&self.store, key),
            None => noop::has_own(&self.store, key),
        }
    }

    pub fn enumerate(&self) -> Result<Vec<PropertyKey>, MetaError> {
        match &self.traps.enumerate {
            Some(trap) => trap(&self.store),
            None => noop::enumerate(&self.store),
        }
    }

    pub fn keys(&self) -> Result<Vec<PropertyKey>, MetaError> {
        match &self.traps.keys {
            Some(trap) => trap(&self.store),
            None => noop::keys(&self.store),
        }
    }

    pub fn fix(&self) -> Result<FixedDescriptors, MetaError> {
        match &self.traps.fix {
            Some(trap) => trap(&self.store),
            None => noop::fix(&self.store),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Composition: effective traps and replacement
    // ═══════════════════════════════════════════════════════════════════════════

    /// The `get` trap currently in effect (override or forwarding default)
    pub fn get_trap(&self) -> GetTrap {
        self.traps.get.clone().unwrap_or_else(|| Rc::new(noop::get))
    }

    pub fn set_trap(&self) -> SetTrap {
        self.traps.set.clone().unwrap_or_else(|| Rc::new(noop::set))
    }

    pub fn delete_trap(&self) -> DeleteTrap {
        self.traps.delete.clone().unwrap_or_else(|| Rc::new(noop::delete))
    }

    pub fn define_property_trap(&self) -> DefineTrap {
        self.traps
            .define_property
            .clone()
            .unwrap_or_else(|| Rc::new(noop::define_property))
    }

    pub fn has_trap(&self) -> KeyTrap {
        self.traps.has.clone().unwrap_or_else(|| Rc::new(noop::has))
    }

    pub fn has_own_trap(&self) -> KeyTrap {
        self.traps.has_own.clone().unwrap_or_else(|| Rc::new(noop::has_own))
    }

    pub fn replace_get(&mut self, trap: GetTrap) {
        self.traps.get = Some(trap);
    }

    pub fn replace_set(&mut self, trap: SetTrap) {
        self.traps.set = Some(trap);
    }

    pub fn replace_delete(&mut self, trap: DeleteTrap) {
        self.traps.delete = Some(trap);
    }

    pub fn replace_define_property(&mut self, trap: DefineTrap) {
        self.traps.define_property = Some(trap);
    }

    pub fn replace_has(&mut self, trap: KeyTrap) {
        self.traps.has = Some(trap);
    }
}
