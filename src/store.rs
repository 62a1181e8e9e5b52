//! Property storage
//!
//! A `Store` is the backing storage a virtual object wraps: an insertion-ordered
//! key → property map plus an ancestor (prototype) link. It implements the
//! ordinary get/set/delete/define semantics that the default traps forward to.
//!
//! Borrows of the inner cell never outlive a single method; getters and setters
//! are always invoked after the borrow is released, so user code may re-enter
//! the same store.

use crate::error::MetaError;
use crate::prelude::{IndexMap, IndexSet, Rc, RefCell, fmt, index_map_new, index_set_new};
use crate::value::{CheapClone, Function, PropertyKey, Value};

/// Object property (stored form, all attributes resolved)
#[derive(Debug, Clone)]
pub struct Property {
    pub value: Value,
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
    /// Getter function (for accessor properties)
    pub getter: Option<Function>,
    /// Setter function (for accessor properties)
    pub setter: Option<Function>,
}

impl Property {
    /// Plain assignable data property
    pub fn data(value: Value) -> Self {
        Self {
            value,
            writable: true,
            enumerable: true,
            configurable: true,
            getter: None,
            setter: None,
        }
    }

    /// Create an accessor property with getter and/or setter
    pub fn accessor(getter: Option<Function>, setter: Option<Function>) -> Self {
        Self {
            value: Value::Undefined,
            writable: false,
            enumerable: true,
            configurable: true,
            getter,
            setter,
        }
    }

    /// Check if this is an accessor property (has getter or setter)
    pub fn is_accessor(&self) -> bool {
        self.getter.is_some() || self.setter.is_some()
    }
}

/// A (possibly partial) property descriptor, as passed to `defineProperty`.
///
/// Absent fields default to `false`/undefined when a new property is created and
/// are left untouched when an existing one is redefined.
#[derive(Debug, Clone, Default)]
pub struct PropertyDescriptor {
    pub value: Option<Value>,
    pub writable: Option<bool>,
    pub get: Option<Function>,
    pub set: Option<Function>,
    pub enumerable: Option<bool>,
    pub configurable: Option<bool>,
}

impl PropertyDescriptor {
    /// Data descriptor carrying only a value
    pub fn value(value: impl Into<Value>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// Accessor descriptor
    pub fn accessor(get: Option<Function>, set: Option<Function>) -> Self {
        Self {
            get,
            set,
            ..Self::default()
        }
    }

    pub fn writable(mut self, writable: bool) -> Self {
        self.writable = Some(writable);
        self
    }

    pub fn enumerable(mut self, enumerable: bool) -> Self {
        self.enumerable = Some(enumerable);
        self
    }

    pub fn configurable(mut self, configurable: bool) -> Self {
        self.configurable = Some(configurable);
        self
    }

    pub fn is_accessor_descriptor(&self) -> bool {
        self.get.is_some() || self.set.is_some()
    }

    pub fn is_data_descriptor(&self) -> bool {
        self.value.is_some() || self.writable.is_some()
    }

    /// Complete descriptor describing a stored property
    pub fn from_property(prop: &Property) -> Self {
        if prop.is_accessor() {
            Self {
                value: None,
                writable: None,
                get: prop.getter.clone(),
                set: prop.setter.clone(),
                enumerable: Some(prop.enumerable),
                configurable: Some(prop.configurable),
            }
        } else {
            Self {
                value: Some(prop.value.clone()),
                writable: Some(prop.writable),
                get: None,
                set: None,
                enumerable: Some(prop.enumerable),
                configurable: Some(prop.configurable),
            }
        }
    }

    /// Resolve into a new property, defaulting absent attributes to `false`
    pub fn into_property(self) -> Property {
        if self.is_accessor_descriptor() {
            Property {
                value: Value::Undefined,
                writable: false,
                enumerable: self.enumerable.unwrap_or(false),
                configurable: self.configurable.unwrap_or(false),
                getter: self.get,
                setter: self.set,
            }
        } else {
            Property {
                value: self.value.unwrap_or_default(),
                writable: self.writable.unwrap_or(false),
                enumerable: self.enumerable.unwrap_or(false),
                configurable: self.configurable.unwrap_or(false),
                getter: None,
                setter: None,
            }
        }
    }
}

/// The storage behind a `Store` handle
#[derive(Debug)]
pub struct PropertyStore {
    /// Own properties, in insertion order
    properties: IndexMap<PropertyKey, Property>,
    /// Ancestor link
    prototype: Option<Store>,
    /// Whether new properties may be added
    extensible: bool,
}

impl PropertyStore {
    fn new(prototype: Option<Store>) -> Self {
        Self {
            properties: index_map_new(),
            prototype,
            extensible: true,
        }
    }
}

/// Shared handle to a property store
#[derive(Clone)]
pub struct Store(Rc<RefCell<PropertyStore>>);

impl CheapClone for Store {}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.0.borrow();
        f.debug_struct("Store")
            .field("keys", &inner.properties.keys().collect::<Vec<_>>())
            .field("extensible", &inner.extensible)
            .field("has_prototype", &inner.prototype.is_some())
            .finish()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Create an empty store with no ancestor
    pub fn new() -> Self {
        Store(Rc::new(RefCell::new(PropertyStore::new(None))))
    }

    /// Create an empty store inheriting from `prototype`
    pub fn with_prototype(prototype: Option<Store>) -> Self {
        Store(Rc::new(RefCell::new(PropertyStore::new(prototype))))
    }

    /// Create a store from plain data members (writable, enumerable, configurable)
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<PropertyKey>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let store = Store::new();
        {
            let mut inner = store.0.borrow_mut();
            for (key, value) in pairs {
                inner
                    .properties
                    .insert(key.into(), Property::data(value.into()));
            }
        }
        store
    }

    /// Create a store from a descriptor map, like `Object.create(proto, descriptors)`
    pub fn from_descriptors<I>(prototype: Option<Store>, descriptors: I) -> Self
    where
        I: IntoIterator<Item = (PropertyKey, PropertyDescriptor)>,
    {
        let store = Store::with_prototype(prototype);
        {
            let mut inner = store.0.borrow_mut();
            for (key, desc) in descriptors {
                inner.properties.insert(key, desc.into_property());
            }
        }
        store
    }

    pub fn ptr_eq(&self, other: &Store) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Ancestor link
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn prototype(&self) -> Option<Store> {
        self.0.borrow().prototype.clone()
    }

    /// Replace the ancestor link; rejects links that would form a cycle
    pub fn set_prototype(&self, prototype: Option<Store>) -> bool {
        let mut cursor = prototype.clone();
        while let Some(ancestor) = cursor {
            if ancestor.ptr_eq(self) {
                return false;
            }
            cursor = ancestor.prototype();
        }
        self.0.borrow_mut().prototype = prototype;
        true
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Descriptor access
    // ═══════════════════════════════════════════════════════════════════════════

    /// Get an own property
    pub fn own_property(&self, key: &PropertyKey) -> Option<Property> {
        self.0.borrow().properties.get(key).cloned()
    }

    /// Get a property, searching the ancestor chain.
    /// Returns (property, found_in_ancestor)
    pub fn property(&self, key: &PropertyKey) -> Option<(Property, bool)> {
        if let Some(prop) = self.own_property(key) {
            return Some((prop, false));
        }
        let mut cursor = self.prototype();
        while let Some(ancestor) = cursor {
            if let Some(prop) = ancestor.own_property(key) {
                return Some((prop, true));
            }
            cursor = ancestor.prototype();
        }
        None
    }

    /// Snapshot of all own properties as complete descriptors
    pub fn own_properties(&self) -> Vec<(PropertyKey, PropertyDescriptor)> {
        self.0
            .borrow()
            .properties
            .iter()
            .map(|(key, prop)| (key.clone(), PropertyDescriptor::from_property(prop)))
            .collect()
    }

    pub fn has_own(&self, key: &PropertyKey) -> bool {
        self.0.borrow().properties.contains_key(key)
    }

    /// Own or inherited presence (`key in object`)
    pub fn has(&self, key: &PropertyKey) -> bool {
        self.property(key).is_some()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Key enumeration
    // ═══════════════════════════════════════════════════════════════════════════

    /// All own keys, enumerable or not, in insertion order
    pub fn own_keys(&self) -> Vec<PropertyKey> {
        self.0.borrow().properties.keys().cloned().collect()
    }

    /// Own enumerable keys (`Object.keys`)
    pub fn keys(&self) -> Vec<PropertyKey> {
        self.0
            .borrow()
            .properties
            .iter()
            .filter(|(_, prop)| prop.enumerable)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Own and inherited keys, deduplicated, nearest first
    pub fn property_names(&self) -> Vec<PropertyKey> {
        self.collect_chain_keys(false)
    }

    /// Own and inherited enumerable keys (`for..in` order).
    ///
    /// A non-enumerable property shadows an enumerable inherited one of the same name.
    pub fn enumerate(&self) -> Vec<PropertyKey> {
        self.collect_chain_keys(true)
    }

    fn collect_chain_keys(&self, enumerable_only: bool) -> Vec<PropertyKey> {
        let mut seen: IndexSet<PropertyKey> = index_set_new();
        let mut result = Vec::new();
        let mut cursor = Some(self.cheap_clone());
        while let Some(store) = cursor {
            {
                let inner = store.0.borrow();
                for (key, prop) in inner.properties.iter() {
                    if seen.insert(key.clone()) && (!enumerable_only || prop.enumerable) {
                        result.push(key.clone());
                    }
                }
            }
            cursor = store.prototype();
        }
        result
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Ordinary operations
    // ═══════════════════════════════════════════════════════════════════════════

    /// `[[Get]]`: resolve through the ancestor chain, running getters with `receiver`
    pub fn get(&self, key: &PropertyKey, receiver: &Value) -> Result<Value, MetaError> {
        match self.property(key) {
            Some((prop, _)) if prop.is_accessor() => match prop.getter {
                Some(getter) => getter.call(receiver, &[]),
                None => Ok(Value::Undefined),
            },
            Some((prop, _)) => Ok(prop.value),
            None => Ok(Value::Undefined),
        }
    }

    /// `[[Set]]`: returns `false` when the write is rejected.
    ///
    /// Rejections: non-writable own or inherited data property, accessor
    /// without a setter, or a new key on a non-extensible store.
    pub fn set(&self, key: &PropertyKey, value: Value, receiver: &Value) -> Result<bool, MetaError> {
        match self.property(key) {
            Some((prop, _)) if prop.is_accessor() => match prop.setter {
                Some(setter) => {
                    setter.call(receiver, &[value])?;
                    Ok(true)
                }
                None => Ok(false),
            },
            Some((prop, _)) if !prop.writable => Ok(false),
            Some((_, false)) => {
                let mut inner = self.0.borrow_mut();
                if let Some(own) = inner.properties.get_mut(key) {
                    own.value = value;
                }
                Ok(true)
            }
            Some((_, true)) | None => {
                let mut inner = self.0.borrow_mut();
                if !inner.extensible {
                    return Ok(false);
                }
                inner.properties.insert(key.clone(), Property::data(value));
                Ok(true)
            }
        }
    }

    /// `[[Delete]]`: absent keys delete successfully, non-configurable ones fail
    pub fn delete(&self, key: &PropertyKey) -> bool {
        let mut inner = self.0.borrow_mut();
        match inner.properties.get(key) {
            None => true,
            Some(prop) if !prop.configurable => false,
            Some(_) => {
                inner.properties.shift_remove(key);
                true
            }
        }
    }

    /// `[[DefineOwnProperty]]` with the usual compatibility checks
    pub fn define(&self, key: &PropertyKey, desc: PropertyDescriptor) -> bool {
        let mut inner = self.0.borrow_mut();
        if !inner.properties.contains_key(key) {
            if !inner.extensible {
                return false;
            }
            inner.properties.insert(key.clone(), desc.into_property());
            return true;
        }
        let Some(current) = inner.properties.get_mut(key) else {
            return false;
        };

        if !current.configurable && !redefinition_allowed(current, &desc) {
            return false;
        }

        let switching_kind = (desc.is_accessor_descriptor() && !current.is_accessor())
            || (desc.is_data_descriptor() && current.is_accessor());
        if switching_kind {
            let enumerable = desc.enumerable.unwrap_or(current.enumerable);
            let configurable = desc.configurable.unwrap_or(current.configurable);
            let mut replacement = desc.into_property();
            replacement.enumerable = enumerable;
            replacement.configurable = configurable;
            *current = replacement;
            return true;
        }

        if let Some(value) = desc.value {
            current.value = value;
        }
        if let Some(writable) = desc.writable {
            current.writable = writable;
        }
        if desc.get.is_some() {
            current.getter = desc.get;
        }
        if desc.set.is_some() {
            current.setter = desc.set;
        }
        if let Some(enumerable) = desc.enumerable {
            current.enumerable = enumerable;
        }
        if let Some(configurable) = desc.configurable {
            current.configurable = configurable;
        }
        true
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Integrity levels
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn is_extensible(&self) -> bool {
        self.0.borrow().extensible
    }

    pub fn prevent_extensions(&self) {
        self.0.borrow_mut().extensible = false;
    }

    /// Make every own property read-only and non-configurable and stop extension
    pub fn freeze(&self) {
        let mut inner = self.0.borrow_mut();
        inner.extensible = false;
        for prop in inner.properties.values_mut() {
            prop.configurable = false;
            if !prop.is_accessor() {
                prop.writable = false;
            }
        }
    }

    pub fn is_frozen(&self) -> bool {
        let inner = self.0.borrow();
        !inner.extensible
            && inner
                .properties
                .values()
                .all(|prop| !prop.configurable && (prop.is_accessor() || !prop.writable))
    }

    /// Copy the own properties of `other` that this store lacks, keeping their
    /// descriptors. Returns the number of properties copied.
    pub fn extend(&self, other: &Store) -> usize {
        if self.ptr_eq(other) {
            return 0;
        }
        let mut copied = 0;
        for (key, desc) in other.own_properties() {
            if self.has_own(&key) {
                continue;
            }
            if self.define(&key, desc) {
                copied += 1;
            }
        }
        copied
    }
}

/// Whether `desc` may be applied to a non-configurable `current` property
fn redefinition_allowed(current: &Property, desc: &PropertyDescriptor) -> bool {
    if desc.configurable == Some(true) {
        return false;
    }
    if desc.enumerable.is_some_and(|e| e != current.enumerable) {
        return false;
    }
    if current.is_accessor() {
        if desc.is_data_descriptor() {
            return false;
        }
        let same_getter = match (&desc.get, &current.getter) {
            (None, _) => true,
            (Some(a), Some(b)) => a.ptr_eq(b),
            (Some(_), None) => false,
        };
        let same_setter = match (&desc.set, &current.setter) {
            (None, _) => true,
            (Some(a), Some(b)) => a.ptr_eq(b),
            (Some(_), None) => false,
        };
        return same_getter && same_setter;
    }
    if desc.is_accessor_descriptor() {
        return false;
    }
    if !current.writable {
        if desc.writable == Some(true) {
            return false;
        }
        if let Some(value) = &desc.value
            && !value.strict_equals(&current.value)
        {
            return false;
        }
    }
    true
}
