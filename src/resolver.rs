//! Missing-member resolution
//!
//! When a read misses on an object carrying a missing-method hook, the read
//! returns an [`Activator`]: a callable stand-in that remembers which name was
//! asked for. Calling it forwards `(name, args)` to the missing-method hook of
//! the object where the miss happened.
//!
//! One activator belongs to each resolver and is reused for every miss, so the
//! captured name is "last miss wins". Reading `obj.a` and `obj.b` and then
//! calling the first result dispatches with `"b"`. The resolver never allocates
//! per miss.

use crate::error::MetaError;
use crate::handler::Handler;
use crate::hooks::{Hook, HookTable, WeakHookTable};
use crate::prelude::{Rc, RefCell, fmt};
use crate::store::Store;
use crate::value::{PropertyKey, Value};

/// Callable stand-in for a missing member
#[derive(Clone)]
pub struct Activator(Rc<ActivatorState>);

#[derive(Default)]
struct ActivatorState {
    captured: RefCell<Option<PropertyKey>>,
    origin: RefCell<Option<WeakHookTable>>,
}

impl Activator {
    fn new() -> Self {
        Activator(Rc::new(ActivatorState::default()))
    }

    /// Name recorded by the most recent miss
    pub fn captured_name(&self) -> Option<PropertyKey> {
        self.0.captured.borrow().clone()
    }

    fn capture(&self, key: &PropertyKey, hooks: &HookTable) {
        *self.0.captured.borrow_mut() = Some(key.clone());
        *self.0.origin.borrow_mut() = Some(hooks.downgrade());
    }

    /// Call the missing-method hook with `(captured name, args)`.
    ///
    /// `this` is handed through unchanged. If the hook was removed since the
    /// miss, or its object is gone, the call produces `undefined`.
    pub fn invoke(&self, this: &Value, args: &[Value]) -> Result<Value, MetaError> {
        let name = self.captured_name();
        let hooks = self
            .0
            .origin
            .borrow()
            .as_ref()
            .and_then(WeakHookTable::upgrade);
        let (Some(name), Some(hooks)) = (name, hooks) else {
            return Ok(Value::Undefined);
        };
        let result = hooks.call(
            Hook::MissingMethod,
            this,
            &[Value::from(&name), Value::list(args)],
        )?;
        Ok(result.unwrap_or_default())
    }

    pub fn ptr_eq(&self, other: &Activator) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Activator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Activator")
            .field("captured", &self.0.captured.borrow())
            .finish()
    }
}

/// Owns one activator and resolves misses for the objects it is installed on
#[derive(Clone)]
pub struct MissingMemberResolver(Activator);

impl Default for MissingMemberResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl MissingMemberResolver {
    pub fn new() -> Self {
        MissingMemberResolver(Activator::new())
    }

    /// The shared activator handed out on every miss
    pub fn activator(&self) -> Activator {
        self.0.clone()
    }

    pub fn ptr_eq(&self, other: &MissingMemberResolver) -> bool {
        self.0.ptr_eq(&other.0)
    }

    /// Handle a read of `key` that found nothing.
    ///
    /// The missing-property hook is notified first, with a read-only view of
    /// `store` as `this`, and its result discarded. Then, if a missing-method
    /// hook exists, the activator captures `key` and is returned. `None` means
    /// the read falls through to the plain result.
    pub fn resolve_miss(
        &self,
        hooks: &HookTable,
        store: &Store,
        key: &PropertyKey,
    ) -> Result<Option<Activator>, MetaError> {
        hooks.call_on_target(Hook::MissingProperty, store, &[Value::from(key)])?;
        if !hooks.contains(Hook::MissingMethod) {
            return Ok(None);
        }
        self.0.capture(key, hooks);
        tracing::trace!(member = %key, "missing member captured by activator");
        Ok(Some(self.activator()))
    }

    /// Wrap the `get` trap so misses are resolved against `hooks`
    pub fn install(&self, handler: &mut Handler, hooks: &HookTable) {
        let inner_get = handler.get_trap();
        let has = handler.has_trap();
        let resolver = self.clone();
        let hooks = hooks.clone();
        handler.replace_get(Rc::new(move |store, receiver, key| {
            if has(store, key)? {
                return inner_get(store, receiver, key);
            }
            match resolver.resolve_miss(&hooks, store, key)? {
                Some(activator) => Ok(Value::Activator(activator)),
                None => inner_get(store, receiver, key),
            }
        }));
    }
}

impl fmt::Debug for MissingMemberResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MissingMemberResolver").field(&self.0).finish()
    }
}
