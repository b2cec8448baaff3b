//! Route tables: ordered `(method, pattern, handler chain)` registrations.
//!
//! # Design Decisions
//! - Registration order is kept exactly; it is the only precedence rule
//! - Templates are compiled on registration, so a bad pattern fails at startup
//! - Routes are immutable once registered; there is no removal API

use axum::http::Method;

use crate::dispatch::HandlerUnit;
use crate::routing::pattern::{compile, PathPattern, PatternError};

/// HTTP method a route answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    /// Matches every request method.
    Any,
}

impl RouteMethod {
    /// Returns true if a request with `method` may use this route.
    /// `HEAD` requests are served by `Get` routes.
    pub fn matches(self, method: &Method) -> bool {
        match self {
            RouteMethod::Any => true,
            RouteMethod::Get => method == Method::GET || method == Method::HEAD,
            RouteMethod::Post => method == Method::POST,
            RouteMethod::Put => method == Method::PUT,
            RouteMethod::Delete => method == Method::DELETE,
            RouteMethod::Patch => method == Method::PATCH,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RouteMethod::Get => "GET",
            RouteMethod::Post => "POST",
            RouteMethod::Put => "PUT",
            RouteMethod::Delete => "DELETE",
            RouteMethod::Patch => "PATCH",
            RouteMethod::Any => "ANY",
        }
    }
}

impl std::fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered route.
#[derive(Debug, Clone)]
pub struct Route {
    method: RouteMethod,
    pattern: PathPattern,
    chain: Vec<HandlerUnit>,
    mount_prefix: String,
}

impl Route {
    pub fn method(&self) -> RouteMethod {
        self.method
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn chain(&self) -> &[HandlerUnit] {
        &self.chain
    }

    /// Concatenated prefix of every mount enclosing this route's table.
    /// Empty until the route is frozen into a topology.
    pub fn mount_prefix(&self) -> &str {
        &self.mount_prefix
    }

    pub(crate) fn with_mount_prefix(mut self, prefix: &str) -> Self {
        self.mount_prefix = prefix.to_string();
        self
    }
}

/// An ordered collection of routes.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route. Later registrations never shadow earlier ones.
    pub fn register<I>(&mut self, method: RouteMethod, template: &str, units: I) -> Result<&mut Self, PatternError>
    where
        I: IntoIterator<Item = HandlerUnit>,
    {
        let pattern = compile(template)?;
        self.push(method, pattern, units);
        Ok(self)
    }

    pub fn get<I>(&mut self, template: &str, units: I) -> Result<&mut Self, PatternError>
    where
        I: IntoIterator<Item = HandlerUnit>,
    {
        self.register(RouteMethod::Get, template, units)
    }

    pub fn post<I>(&mut self, template: &str, units: I) -> Result<&mut Self, PatternError>
    where
        I: IntoIterator<Item = HandlerUnit>,
    {
        self.register(RouteMethod::Post, template, units)
    }

    pub fn put<I>(&mut self, template: &str, units: I) -> Result<&mut Self, PatternError>
    where
        I: IntoIterator<Item = HandlerUnit>,
    {
        self.register(RouteMethod::Put, template, units)
    }

    pub fn delete<I>(&mut self, template: &str, units: I) -> Result<&mut Self, PatternError>
    where
        I: IntoIterator<Item = HandlerUnit>,
    {
        self.register(RouteMethod::Delete, template, units)
    }

    pub fn patch<I>(&mut self, template: &str, units: I) -> Result<&mut Self, PatternError>
    where
        I: IntoIterator<Item = HandlerUnit>,
    {
        self.register(RouteMethod::Patch, template, units)
    }

    pub fn any<I>(&mut self, template: &str, units: I) -> Result<&mut Self, PatternError>
    where
        I: IntoIterator<Item = HandlerUnit>,
    {
        self.register(RouteMethod::Any, template, units)
    }

    /// Register middleware for every method on `prefix` and everything below it.
    pub fn use_at<I>(&mut self, prefix: &str, units: I) -> Result<&mut Self, PatternError>
    where
        I: IntoIterator<Item = HandlerUnit>,
    {
        let template = format!("{}/*", prefix.trim_end_matches('/'));
        self.register(RouteMethod::Any, &template, units)
    }

    /// Register middleware for every request that reaches this table.
    pub fn middleware<I>(&mut self, units: I) -> Result<&mut Self, PatternError>
    where
        I: IntoIterator<Item = HandlerUnit>,
    {
        self.use_at("/", units)
    }

    /// Group several methods under one template.
    ///
    /// ```ignore
    /// table.route("/test")?
    ///     .get([HandlerUnit::from_sync(|ctx| ctx.send("GET test"))])
    ///     .post([HandlerUnit::from_sync(|ctx| ctx.send("POST test"))]);
    /// ```
    pub fn route(&mut self, template: &str) -> Result<RouteBuilder<'_>, PatternError> {
        let pattern = compile(template)?;
        Ok(RouteBuilder { table: self, pattern })
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub(crate) fn into_routes(self) -> Vec<Route> {
        self.routes
    }

    fn push<I>(&mut self, method: RouteMethod, pattern: PathPattern, units: I)
    where
        I: IntoIterator<Item = HandlerUnit>,
    {
        let chain: Vec<HandlerUnit> = units.into_iter().collect();
        if chain.is_empty() {
            tracing::warn!(method = %method, pattern = %pattern, "Route registered without handler units");
        }
        self.routes.push(Route {
            method,
            pattern,
            chain,
            mount_prefix: String::new(),
        });
    }
}

/// Registers routes that share one compiled template.
pub struct RouteBuilder<'t> {
    table: &'t mut RouteTable,
    pattern: PathPattern,
}

impl RouteBuilder<'_> {
    pub fn method<I>(&mut self, method: RouteMethod, units: I) -> &mut Self
    where
        I: IntoIterator<Item = HandlerUnit>,
    {
        self.table.push(method, self.pattern.clone(), units);
        self
    }

    pub fn get<I: IntoIterator<Item = HandlerUnit>>(&mut self, units: I) -> &mut Self {
        self.method(RouteMethod::Get, units)
    }

    pub fn post<I: IntoIterator<Item = HandlerUnit>>(&mut self, units: I) -> &mut Self {
        self.method(RouteMethod::Post, units)
    }

    pub fn put<I: IntoIterator<Item = HandlerUnit>>(&mut self, units: I) -> &mut Self {
        self.method(RouteMethod::Put, units)
    }

    pub fn delete<I: IntoIterator<Item = HandlerUnit>>(&mut self, units: I) -> &mut Self {
        self.method(RouteMethod::Delete, units)
    }

    pub fn patch<I: IntoIterator<Item = HandlerUnit>>(&mut self, units: I) -> &mut Self {
        self.method(RouteMethod::Patch, units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Signal;

    fn noop() -> HandlerUnit {
        HandlerUnit::from_sync(|_| Signal::Continue)
    }

    #[test]
    fn test_registration_order_preserved() {
        let mut table = RouteTable::new();
        table
            .get("/about", [noop()])
            .unwrap()
            .get("/:id", [noop()])
            .unwrap()
            .post("/:id", [noop(), noop()])
            .unwrap();

        let templates: Vec<&str> = table.routes().iter().map(|r| r.pattern().template()).collect();
        assert_eq!(templates, vec!["/about", "/:id", "/:id"]);
        assert_eq!(table.routes()[2].method(), RouteMethod::Post);
        assert_eq!(table.routes()[2].chain().len(), 2);
    }

    #[test]
    fn test_invalid_template_rejected() {
        let mut table = RouteTable::new();
        assert!(table.get("/users/:", [noop()]).is_err());
        assert!(table.is_empty());
    }

    #[test]
    fn test_use_at_registers_prefix_wildcard() {
        let mut table = RouteTable::new();
        table.use_at("/abc/", [noop()]).unwrap().middleware([noop()]).unwrap();

        let first = &table.routes()[0];
        assert_eq!(first.method(), RouteMethod::Any);
        assert_eq!(first.pattern().template(), "/abc/*");
        assert!(first.pattern().has_wildcard());
        assert_eq!(table.routes()[1].pattern().template(), "/*");
    }

    #[test]
    fn test_route_builder_groups_methods() {
        let mut table = RouteTable::new();
        table.route("/test").unwrap().get([noop()]).post([noop()]);

        assert_eq!(table.len(), 2);
        assert_eq!(table.routes()[0].method(), RouteMethod::Get);
        assert_eq!(table.routes()[1].method(), RouteMethod::Post);
        assert_eq!(table.routes()[1].pattern().template(), "/test");
    }

    #[test]
    fn test_method_matching() {
        assert!(RouteMethod::Any.matches(&Method::OPTIONS));
        assert!(RouteMethod::Get.matches(&Method::HEAD));
        assert!(!RouteMethod::Post.matches(&Method::GET));
        assert!(RouteMethod::Delete.matches(&Method::DELETE));
    }
}
