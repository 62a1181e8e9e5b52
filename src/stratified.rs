//! Stratified objects
//!
//! A stratified object keeps its data and its hooks apart: the data map seeds
//! the store, while the meta table holds hook functions that ordinary member
//! access can never reach. Writing a member called `noSuchProperty` stores
//! data; only [`HookTable::set`] (or [`VirtualObject::set_hook`]) changes a hook.
//!
//! Each stratified object resolves misses through its own activator instead of
//! the session-wide one.

use crate::error::MetaError;
use crate::hooks::{Hook, HookNaming, HookTable};
use crate::object::{ObjectBuilder, VirtualObject};
use crate::resolver::MissingMemberResolver;
use crate::store::{PropertyDescriptor, Store};
use crate::value::{Function, PropertyKey, Value};

/// The `(data, meta, proto)` triple a stratified object is built from
#[derive(Debug, Clone, Default)]
pub struct StratifiedTemplate {
    /// Data-level members, in definition order
    pub data: Vec<(PropertyKey, PropertyDescriptor)>,
    /// Meta-level hooks
    pub meta: HookTable,
    /// Ancestor of the data store
    pub proto: Option<Store>,
}

impl StratifiedTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a data member described by `desc`
    pub fn define(mut self, key: impl Into<PropertyKey>, desc: PropertyDescriptor) -> Self {
        self.data.push((key.into(), desc));
        self
    }

    /// Add a plain writable, enumerable, configurable data member
    pub fn value(self, key: impl Into<PropertyKey>, value: impl Into<Value>) -> Self {
        let desc = PropertyDescriptor::value(value)
            .writable(true)
            .enumerable(true)
            .configurable(true);
        self.define(key, desc)
    }

    pub fn meta(mut self, meta: HookTable) -> Self {
        self.meta = meta;
        self
    }

    pub fn hook<F>(self, hook: Hook, func: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, MetaError> + 'static,
    {
        self.meta.set(hook, Function::new(hook.meta_name(), func));
        self
    }

    pub fn proto(mut self, proto: Store) -> Self {
        self.proto = Some(proto);
        self
    }
}

/// Build a stratified object. `strict` escalates rejected writes.
pub fn build(template: StratifiedTemplate, strict: bool) -> Result<VirtualObject, MetaError> {
    let StratifiedTemplate { data, meta, proto } = template;
    let store = Store::from_descriptors(proto, data);
    ObjectBuilder::new(Some(store))
        .hooks(meta, HookNaming::Stratified)
        .resolver(MissingMemberResolver::new())
        .strict(strict)
        .build()
}
