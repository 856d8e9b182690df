//! Service registry: registered methods and the active middleware stack.
//!
//! The registry is created once with the server and lives for its whole
//! lifetime. It owns two pieces of shared state:
//!
//! - the service table, written at registration time and read on every
//!   method lookup
//! - the middleware stack, replaced as a whole by
//!   [`set_middlewares`](ServiceRegistry::set_middlewares) and read as an
//!   immutable snapshot by every dispatch
//!
//! Snapshots are `Arc`s swapped atomically, so a call in flight keeps the stack
//! it started with even if the configuration changes under it.

use arc_swap::ArcSwap;
use junction_core::{Callback, MiddlewareStack, RegistryError, RpcError};
use parking_lot::RwLock;
use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Weak},
};

/// Separator between the service and method part of a full method name.
pub const SERVICE_METHOD_SEPARATOR: char = '_';

/// Version reported for every service by [`ServiceRegistry::modules`].
pub const SERVICE_VERSION: &str = "1.0";

/// Name of the built-in service installed by [`ServiceRegistry::with_builtins`].
pub const META_SERVICE: &str = "rpc";

/// A named group of methods.
///
/// # Example
/// ```ignore
/// let service = Service::new()
///     .method("echo", Callback::with_context(echo))
///     .method("add", Callback::new(add));
/// registry.register_name("test", service)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct Service {
    methods: HashMap<String, Arc<Callback>>,
}

impl Service {
    /// Create a service with no methods.
    pub fn new() -> Self {
        Self {
            methods: HashMap::new(),
        }
    }

    /// Add a method (builder version).
    pub fn method(mut self, name: impl Into<String>, callback: Callback) -> Self {
        self.add_method(name, callback);
        self
    }

    /// Add a method, replacing any method of the same name.
    pub fn add_method(&mut self, name: impl Into<String>, callback: Callback) {
        self.methods.insert(name.into(), Arc::new(callback));
    }

    /// Look up a method by its short name.
    pub fn get(&self, name: &str) -> Option<&Arc<Callback>> {
        self.methods.get(name)
    }

    /// Names of all methods, sorted.
    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Get the number of methods.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Check if the service has no methods.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// Registered services and the active middleware stack.
///
/// # Example
/// ```ignore
/// let registry = Arc::new(ServiceRegistry::new());
/// registry.register_name("test", service)?;
/// registry.set_middlewares(MiddlewareStack::new().with(LoggingMiddleware::new()));
///
/// let snapshot = registry.current_middlewares();
/// ```
pub struct ServiceRegistry {
    services: RwLock<HashMap<String, Service>>,
    middlewares: ArcSwap<MiddlewareStack>,
}

impl ServiceRegistry {
    /// Create an empty registry with no middlewares.
    pub fn new() -> Self {
        Self {
            services: RwLock::new(HashMap::new()),
            middlewares: ArcSwap::from_pointee(MiddlewareStack::new()),
        }
    }

    /// Create a shared registry holding the built-in `rpc` service.
    ///
    /// `rpc_modules` reports [`modules`](Self::modules) of this registry. It
    /// holds a weak handle, so the registry is still dropped with its last
    /// strong owner.
    pub fn with_builtins() -> Arc<Self> {
        Arc::new_cyclic(|this: &Weak<Self>| {
            let meta = Service::new().method("modules", modules_method(this.clone()));
            let registry = Self::new();
            registry.services.write().insert(META_SERVICE.to_string(), meta);
            registry
        })
    }

    /// Register `service` under `name`.
    ///
    /// Registering an existing name merges the methods, later registrations
    /// replacing methods of the same name.
    pub fn register_name(&self, name: &str, service: Service) -> Result<(), RegistryError> {
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if service.is_empty() {
            return Err(RegistryError::NoMethods(name.to_string()));
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(service = %name, methods = ?service.method_names(), "Registered service");

        let mut services = self.services.write();
        match services.get_mut(name) {
            Some(existing) => existing.methods.extend(service.methods),
            None => {
                services.insert(name.to_string(), service);
            }
        }
        Ok(())
    }

    /// Resolve a full method name such as `test_echo` to its callback.
    ///
    /// The name is split at the first [`SERVICE_METHOD_SEPARATOR`].
    pub fn callback(&self, method: &str) -> Option<Arc<Callback>> {
        let (service, name) = method.split_once(SERVICE_METHOD_SEPARATOR)?;
        self.services.read().get(service)?.get(name).cloned()
    }

    /// All registered services with their version.
    pub fn modules(&self) -> BTreeMap<String, String> {
        self.services
            .read()
            .keys()
            .map(|name| (name.clone(), SERVICE_VERSION.to_string()))
            .collect()
    }

    /// All registered full method names, sorted.
    pub fn method_names(&self) -> Vec<String> {
        let services = self.services.read();
        let mut names: Vec<String> = services
            .iter()
            .flat_map(|(service, svc)| {
                svc.methods
                    .keys()
                    .map(move |m| format!("{service}{SERVICE_METHOD_SEPARATOR}{m}"))
            })
            .collect();
        names.sort_unstable();
        names
    }

    /// Atomically replace the middleware stack.
    ///
    /// Calls that already took a snapshot keep running with the old stack.
    pub fn set_middlewares(&self, middlewares: impl Into<MiddlewareStack>) {
        let stack = middlewares.into();
        #[cfg(feature = "tracing")]
        tracing::debug!(count = stack.len(), "Installed middlewares");
        self.middlewares.store(Arc::new(stack));
    }

    /// Snapshot of the current middleware stack.
    ///
    /// The snapshot stays valid and unchanged for as long as it is held.
    pub fn current_middlewares(&self) -> Arc<MiddlewareStack> {
        self.middlewares.load_full()
    }
}

fn modules_method(registry: Weak<ServiceRegistry>) -> Callback {
    Callback::new(move || {
        let modules = registry.upgrade().map(|r| r.modules()).unwrap_or_default();
        async move { Ok::<_, RpcError>(modules) }
    })
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
