//! Per-object hooks
//!
//! A hooked object keeps a table of seven optional hook functions next to its
//! store. The table is bookkeeping: it lives outside the store keyspace, so
//! hooks never show up in enumeration or in the member count.
//!
//! Hooks are reachable two ways. With [`HookNaming::Magic`] the object exposes
//! them as reserved members (`__get__`, `__noSuchMethod__`, ...) that can be
//! read, assigned and deleted through the object itself, plus a read-only
//! `__count__`. With [`HookNaming::Stratified`] they are only reachable through
//! the [`HookTable`] handle, and names like `noSuchProperty` stay ordinary data.

use crate::error::MetaError;
use crate::handler::{Handler, TrapSet};
use crate::object::VirtualObject;
use crate::prelude::{Cell, FxHashMap, Rc, RefCell, Weak, fmt};
use crate::store::Store;
use crate::value::{Function, PropertyKey, Value};

/// Reserved member exposing the member count on magic-named objects
pub const COUNT_MEMBER: &str = "__count__";

/// The seven hook slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    /// Called with `(name)` before every data-level read
    MemberRead,
    /// Called with `(name, value)` before every data-level write
    MemberWrite,
    /// Called with `(name)` before every data-level delete
    MemberDelete,
    /// Called with `(name)` when a read misses
    MissingProperty,
    /// Called with `(name, args)` when a missing member is invoked
    MissingMethod,
    /// Called when the object itself is called
    Invoke,
    /// Called when the object itself is constructed
    Construct,
}

impl Hook {
    pub const ALL: [Hook; 7] = [
        Hook::MemberRead,
        Hook::MemberWrite,
        Hook::MemberDelete,
        Hook::MissingProperty,
        Hook::MissingMethod,
        Hook::Invoke,
        Hook::Construct,
    ];

    /// Reserved member name on magic-named objects
    pub fn magic_name(self) -> &'static str {
        match self {
            Hook::MemberRead => "__get__",
            Hook::MemberWrite => "__set__",
            Hook::MemberDelete => "__delete__",
            Hook::MissingProperty => "__noSuchProperty__",
            Hook::MissingMethod => "__noSuchMethod__",
            Hook::Invoke => "__call__",
            Hook::Construct => "__construct__",
        }
    }

    /// Slot name in a stratified meta table
    pub fn meta_name(self) -> &'static str {
        match self {
            Hook::MemberRead => "get",
            Hook::MemberWrite => "set",
            Hook::MemberDelete => "delete",
            Hook::MissingProperty => "noSuchProperty",
            Hook::MissingMethod => "noSuchMethod",
            Hook::Invoke => "call",
            Hook::Construct => "construct",
        }
    }

    pub fn from_magic_name(name: &str) -> Option<Hook> {
        Hook::ALL.into_iter().find(|hook| hook.magic_name() == name)
    }

    pub fn from_meta_name(name: &str) -> Option<Hook> {
        Hook::ALL.into_iter().find(|hook| hook.meta_name() == name)
    }

    fn from_magic_key(key: &PropertyKey) -> Option<Hook> {
        key.as_str().and_then(Hook::from_magic_name)
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.meta_name())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Hook table
// ═══════════════════════════════════════════════════════════════════════════════

type Slots = RefCell<FxHashMap<Hook, Function>>;

/// Shared, mutable table of hook functions.
///
/// Reassigning a slot takes effect on the next operation; layers look hooks up
/// at call time rather than capturing them.
#[derive(Clone, Default)]
pub struct HookTable(Rc<Slots>);

impl HookTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`HookTable::set`]
    pub fn with(self, hook: Hook, func: Function) -> Self {
        self.set(hook, func);
        self
    }

    /// Register a native closure for `hook`
    pub fn on<F>(self, hook: Hook, func: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, MetaError> + 'static,
    {
        self.with(hook, Function::new(hook.meta_name(), func))
    }

    pub fn get(&self, hook: Hook) -> Option<Function> {
        self.0.borrow().get(&hook).cloned()
    }

    /// Install or replace a hook, returning the previous one
    pub fn set(&self, hook: Hook, func: Function) -> Option<Function> {
        self.0.borrow_mut().insert(hook, func)
    }

    pub fn remove(&self, hook: Hook) -> Option<Function> {
        self.0.borrow_mut().remove(&hook)
    }

    pub fn contains(&self, hook: Hook) -> bool {
        self.0.borrow().contains_key(&hook)
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Registered hooks in slot order
    pub fn registered(&self) -> Vec<Hook> {
        let slots = self.0.borrow();
        Hook::ALL
            .into_iter()
            .filter(|hook| slots.contains_key(hook))
            .collect()
    }

    pub fn ptr_eq(&self, other: &HookTable) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn downgrade(&self) -> WeakHookTable {
        WeakHookTable(Rc::downgrade(&self.0))
    }

    /// Assign a hook from a runtime value: functions install, `undefined` and
    /// `null` clear, anything else is rejected.
    pub fn assign(&self, hook: Hook, value: Value) -> Result<(), MetaError> {
        match value {
            Value::Function(func) => {
                self.set(hook, func);
                Ok(())
            }
            Value::Undefined | Value::Null => {
                self.remove(hook);
                Ok(())
            }
            other => Err(MetaError::type_error(format!(
                "{} hook must be a function, got {}",
                hook.magic_name(),
                other.type_of()
            ))),
        }
    }

    /// Call `hook` if registered. The function is cloned out of the table
    /// first, so a hook may reassign hooks while it runs.
    pub fn call(&self, hook: Hook, this: &Value, args: &[Value]) -> Result<Option<Value>, MetaError> {
        match self.get(hook) {
            Some(func) => func.call(this, args).map(Some),
            None => Ok(None),
        }
    }

    /// Call `hook` with a read-only view of `store` as `this`.
    ///
    /// The view is only built when the hook is registered.
    pub fn call_on_target(
        &self,
        hook: Hook,
        store: &Store,
        args: &[Value],
    ) -> Result<Option<Value>, MetaError> {
        match self.get(hook) {
            Some(func) => func.call(&target_view(store), args).map(Some),
            None => Ok(None),
        }
    }
}

/// Receiver for member and missing-property hooks.
///
/// Reads go straight to `store` without re-entering the hooked traps, so a
/// hook can inspect `this` freely. Writes through the view are rejected; the
/// hooked object stays the only way to change its members.
pub fn target_view(store: &Store) -> Value {
    let traps = TrapSet::new()
        .on_set(|_, _, _, _| Ok(false))
        .on_delete(|_, _, _| Ok(false))
        .on_define_property(|_, _, _, _| Ok(false));
    Value::Object(VirtualObject::new(Some(store.clone()), traps))
}

impl fmt::Debug for HookTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookTable")
            .field("registered", &self.registered())
            .finish()
    }
}

/// Non-owning reference to a hook table
#[derive(Clone)]
pub struct WeakHookTable(Weak<Slots>);

impl WeakHookTable {
    pub fn upgrade(&self) -> Option<HookTable> {
        self.0.upgrade().map(HookTable)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Member count
// ═══════════════════════════════════════════════════════════════════════════════

/// Number of own data-level members of a hooked object
#[derive(Debug, Clone, Default)]
pub struct MemberCount(Rc<Cell<usize>>);

impl MemberCount {
    pub fn new(initial: usize) -> Self {
        MemberCount(Rc::new(Cell::new(initial)))
    }

    pub fn get(&self) -> usize {
        self.0.get()
    }

    fn increment(&self) {
        self.0.set(self.0.get() + 1);
    }

    fn decrement(&self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Installation
// ═══════════════════════════════════════════════════════════════════════════════

/// How hooks are addressed on an object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookNaming {
    /// Reserved `__name__` members route to the hook table
    Magic,
    /// Hooks live only in a separate meta table
    Stratified,
}

/// Move callable magic-named members of `store` into `table`.
///
/// Runs once when a magic-named object is created so the store keyspace
/// starts free of bookkeeping names.
pub fn lift_magic_members(store: &Store, table: &HookTable) -> Result<(), MetaError> {
    for key in store.own_keys() {
        if key.eq_str(COUNT_MEMBER) {
            return Err(MetaError::type_error(format!("{COUNT_MEMBER} is reserved")));
        }
        let Some(hook) = Hook::from_magic_key(&key) else {
            continue;
        };
        let value = store
            .own_property(&key)
            .map(|prop| prop.value)
            .unwrap_or_default();
        table.assign(hook, value)?;
        if !store.delete(&key) {
            return Err(MetaError::type_error(format!(
                "{key} is not configurable and cannot become a hook"
            )));
        }
    }
    Ok(())
}

/// Wrap the data-level traps of `handler` with hook calls and count upkeep.
///
/// Member hooks run before the operation; the count changes only after the
/// underlying trap reports success.
pub fn install(handler: &mut Handler, hooks: &HookTable, count: &MemberCount, naming: HookNaming) {
    let magic = naming == HookNaming::Magic;

    let inner_get = handler.get_trap();
    let (table, members) = (hooks.clone(), count.clone());
    handler.replace_get(Rc::new(move |store, receiver, key| {
        if magic {
            if key.eq_str(COUNT_MEMBER) {
                return Ok(Value::from(members.get()));
            }
            if let Some(hook) = Hook::from_magic_key(key) {
                return Ok(table.get(hook).map(Value::Function).unwrap_or_default());
            }
        }
        table.call_on_target(Hook::MemberRead, store, &[Value::from(key)])?;
        inner_get(store, receiver, key)
    }));

    let inner_set = handler.set_trap();
    let (table, members) = (hooks.clone(), count.clone());
    handler.replace_set(Rc::new(move |store, receiver, key, value| {
        if magic {
            if key.eq_str(COUNT_MEMBER) {
                return Ok(false);
            }
            if let Some(hook) = Hook::from_magic_key(key) {
                table.assign(hook, value)?;
                return Ok(true);
            }
        }
        table.call_on_target(Hook::MemberWrite, store, &[Value::from(key), value.clone()])?;
        let existed = store.has_own(key);
        let written = inner_set(store, receiver, key, value)?;
        if written && !existed && store.has_own(key) {
            members.increment();
        }
        Ok(written)
    }));

    let inner_delete = handler.delete_trap();
    let (table, members) = (hooks.clone(), count.clone());
    handler.replace_delete(Rc::new(move |store, receiver, key| {
        if magic {
            if key.eq_str(COUNT_MEMBER) {
                return Ok(false);
            }
            if let Some(hook) = Hook::from_magic_key(key) {
                table.remove(hook);
                return Ok(true);
            }
        }
        table.call_on_target(Hook::MemberDelete, store, &[Value::from(key)])?;
        let existed = store.has_own(key);
        let deleted = inner_delete(store, receiver, key)?;
        if deleted && existed && !store.has_own(key) {
            members.decrement();
        }
        Ok(deleted)
    }));

    let inner_define = handler.define_property_trap();
    let (table, members) = (hooks.clone(), count.clone());
    handler.replace_define_property(Rc::new(move |store, receiver, key, desc| {
        if magic {
            if key.eq_str(COUNT_MEMBER) {
                return Ok(false);
            }
            if let Some(hook) = Hook::from_magic_key(key) {
                if desc.is_accessor_descriptor() {
                    return Err(MetaError::type_error(format!(
                        "{key} cannot be defined as an accessor"
                    )));
                }
                // Attribute-only redefinition leaves the hook in place
                if let Some(value) = desc.value {
                    table.assign(hook, value)?;
                }
                return Ok(true);
            }
        }
        let existed = store.has_own(key);
        let defined = inner_define(store, receiver, key, desc)?;
        if defined && !existed && store.has_own(key) {
            members.increment();
        }
        Ok(defined)
    }));

    if magic {
        let inner_has = handler.has_trap();
        let table = hooks.clone();
        handler.replace_has(Rc::new(move |store, key| {
            if key.eq_str(COUNT_MEMBER) {
                return Ok(true);
            }
            if let Some(hook) = Hook::from_magic_key(key) {
                return Ok(table.contains(hook));
            }
            inner_has(store, key)
        }));
    }
}
