//! The RPC server facade: registration, middleware configuration and calls.

use junction_core::{
    CallContext, Callback, MethodResult, Middleware, MiddlewareStack, Params, RegistryError,
};
use junction_std::{Dispatcher, Service, ServiceRegistry};
use std::sync::Arc;

/// A JSON-RPC method server.
///
/// Owns the [`ServiceRegistry`] and a [`Dispatcher`] over it. Every server
/// starts with the built-in `rpc_modules` method, which lists the registered
/// services and their versions.
///
/// # Example
///
/// ```rust,ignore
/// let server = Server::builder()
///     .service("test", Service::new().method("echo", Callback::with_context(echo)))
///     .middleware(LoggingMiddleware::new())
///     .build()?;
///
/// let result = server
///     .call(CallContext::background(), "test_echo", vec![json!("hello")])
///     .await;
/// ```
#[derive(Clone)]
pub struct Server {
    registry: Arc<ServiceRegistry>,
    dispatcher: Dispatcher,
}

impl Server {
    /// Create a server with only the built-in `rpc` service and no middlewares.
    pub fn new() -> Self {
        let registry = ServiceRegistry::with_builtins();
        Self {
            dispatcher: Dispatcher::new(registry.clone()),
            registry,
        }
    }

    /// Create a builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Register `service` under `name`.
    ///
    /// Its methods become callable as `name_method`.
    pub fn register_name(&self, name: &str, service: Service) -> Result<(), RegistryError> {
        self.registry.register_name(name, service)
    }

    /// Atomically replace the middleware stack for all subsequent calls.
    pub fn set_middlewares(&self, middlewares: impl Into<MiddlewareStack>) {
        self.registry.set_middlewares(middlewares);
    }

    /// Get a reference to the registry.
    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    /// Look up `method` and run it through the middleware stack.
    ///
    /// An unknown method fails with `method_not_found` before any middleware
    /// runs.
    pub async fn call(&self, ctx: CallContext, method: &str, params: Params) -> MethodResult {
        self.dispatcher.dispatch_method(ctx, method, params).await
    }

    /// Run an already resolved callback through the middleware stack.
    pub async fn run_method(
        &self,
        ctx: CallContext,
        method: &str,
        callback: Arc<Callback>,
        args: Params,
    ) -> MethodResult {
        self.dispatcher.dispatch(ctx, method, callback, args).await
    }
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`Server`].
///
/// Services are registered in the order given; middlewares run in the order
/// given.
#[derive(Default)]
pub struct ServerBuilder {
    services: Vec<(String, Service)>,
    middlewares: MiddlewareStack,
}

impl ServerBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a service.
    pub fn service(mut self, name: impl Into<String>, service: Service) -> Self {
        self.services.push((name.into(), service));
        self
    }

    /// Append a middleware to the stack.
    pub fn middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.middlewares.push(middleware);
        self
    }

    /// Build the server, registering every service.
    pub fn build(self) -> Result<Server, RegistryError> {
        let server = Server::new();
        for (name, service) in self.services {
            server.register_name(&name, service)?;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            modules = ?server.registry.modules(),
            middlewares = self.middlewares.len(),
            "Built server"
        );

        server.set_middlewares(self.middlewares);
        Ok(server)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use junction_core::{RpcError, codes};
    use junction_std::testing::CountingMiddleware;
    use serde_json::json;

    fn add_service() -> Service {
        Service::new().method(
            "add",
            Callback::new(|a: i64, b: i64| async move { Ok::<_, RpcError>(a + b) }),
        )
    }

    #[tokio::test]
    async fn test_builtin_modules() {
        let server = Server::builder().service("test", add_service()).build().unwrap();

        let result = server
            .call(CallContext::background(), "rpc_modules", vec![])
            .await;
        assert_eq!(result.value, Some(json!({"rpc": "1.0", "test": "1.0"})));
    }

    #[tokio::test]
    async fn test_builder_installs_middlewares() {
        let counter = CountingMiddleware::new();
        let server = Server::builder()
            .service("test", add_service())
            .middleware(counter.clone())
            .build()
            .unwrap();

        let result = server
            .call(CallContext::background(), "test_add", vec![json!(2), json!(3)])
            .await;
        assert_eq!(result.value, Some(json!(5)));
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn test_builder_rejects_empty_service() {
        let result = Server::builder().service("empty", Service::new()).build();
        assert!(matches!(result, Err(RegistryError::NoMethods(name)) if name == "empty"));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let server = Server::new();
        let result = server
            .call(CallContext::background(), "test_missing", vec![])
            .await;
        let err = result.error.unwrap();
        assert_eq!(err.code(), codes::METHOD_NOT_FOUND);
        assert_eq!(err.message(), "the method test_missing does not exist/is not available");
    }
}
