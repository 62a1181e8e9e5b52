//! Meta-object composition runtime
//!
//! Virtual objects route every member operation through an interception
//! handler. On top of the handler the runtime layers per-object hooks,
//! missing-member resolution through a reusable activator, delegation chains
//! (mixins) and stratified objects whose hooks live apart from their data.
//!
//! # Example
//!
//! ```
//! use metahooks::{Hook, Runtime, Store, Value};
//!
//! let runtime = Runtime::new();
//! let obj = runtime.create_hooked(Some(Store::from_pairs([("x", 10)]))).unwrap();
//! obj.set_hook(Hook::MissingMethod, Some(metahooks::Function::new("nsm", |_, args| {
//!     Ok(args.first().cloned().unwrap_or_default())
//! }))).unwrap();
//!
//! assert_eq!(obj.get("x").unwrap(), Value::from(10));
//! assert_eq!(obj.invoke("greet", &[]).unwrap(), Value::from("greet"));
//! assert_eq!(obj.count(), Some(1));
//! ```

pub mod config;
pub mod delegation;
pub mod error;
pub mod handler;
pub mod hooks;
pub mod object;
pub mod platform;
pub mod prelude;
pub mod resolver;
pub mod store;
pub mod stratified;
pub mod value;

pub use config::RuntimeConfig;
pub use delegation::DelegationChain;
pub use error::MetaError;
pub use handler::{Handler, TrapKind, TrapSet};
pub use hooks::{Hook, HookNaming, HookTable, MemberCount};
pub use object::{ObjectBuilder, VirtualObject};
pub use platform::{ConsoleLevel, ConsoleProvider};
pub use resolver::{Activator, MissingMemberResolver};
pub use store::{Property, PropertyDescriptor, Store};
pub use stratified::StratifiedTemplate;
pub use value::{CheapClone, Function, MetaString, PropertyKey, Value};

use platform::TracingConsoleProvider;

/// A composition session.
///
/// Owns the configuration, the console that receives diagnostics, and the
/// missing-member resolver shared by every hooked object it creates.
pub struct Runtime {
    config: RuntimeConfig,
    console: Box<dyn ConsoleProvider>,
    resolver: MissingMemberResolver,
}

impl Runtime {
    /// Create a session with the default configuration
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Runtime {
            config,
            console: Box::new(TracingConsoleProvider),
            resolver: MissingMemberResolver::new(),
        }
    }

    /// Route diagnostics to `console`
    pub fn set_console(&mut self, console: Box<dyn ConsoleProvider>) {
        self.console = console;
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn set_traits_mode(&mut self, enabled: bool) {
        self.config.traits_mode = enabled;
    }

    pub fn traits_mode(&self) -> bool {
        self.config.traits_mode
    }

    /// The resolver (and so the activator) shared by hooked objects
    pub fn resolver(&self) -> &MissingMemberResolver {
        &self.resolver
    }

    /// Create a virtual object over `store` (or a fresh one) with the given
    /// trap overrides. Absent traps forward to the store.
    pub fn create(&self, store: Option<Store>, traps: TrapSet) -> Result<VirtualObject, MetaError> {
        ObjectBuilder::new(store)
            .traps(traps)
            .strict(self.config.strict_writes)
            .build()
    }

    /// Create a hook-augmented object.
    ///
    /// Hooks are addressed by their reserved `__name__` members; any such
    /// members already in `store` become the initial hooks. The object also
    /// carries a delegation chain and resolves misses through the session
    /// resolver.
    pub fn create_hooked(&self, store: Option<Store>) -> Result<VirtualObject, MetaError> {
        ObjectBuilder::new(store)
            .delegation()
            .resolver(self.resolver.clone())
            .hooks(HookTable::new(), HookNaming::Magic)
            .strict(self.config.strict_writes)
            .build()
    }

    /// Create an object that can have modules mixed into it
    pub fn create_mixable(&self, store: Option<Store>) -> Result<VirtualObject, MetaError> {
        ObjectBuilder::new(store)
            .delegation()
            .strict(self.config.strict_writes)
            .build()
    }

    /// Create a stratified object from `(data, meta, proto)`
    pub fn create_stratified(
        &self,
        template: StratifiedTemplate,
    ) -> Result<VirtualObject, MetaError> {
        stratified::build(template, self.config.strict_writes)
    }

    /// Append `module` to the delegation chain of `host` and return `host`.
    ///
    /// In traits mode every enumerable member of `module` that already
    /// resolves on `host` is reported as a warning; the mix proceeds anyway.
    pub fn mix(&self, module: &VirtualObject, host: &VirtualObject) -> Result<VirtualObject, MetaError> {
        let conflicts = delegation::mix(module, host, self.config.traits_mode)?;
        for name in &conflicts {
            self.console.write(
                ConsoleLevel::Warn,
                &format!("Warning: \"{name}\" is already in the object."),
            );
        }
        Ok(host.cheap_clone())
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
