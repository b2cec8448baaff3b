//! Handler units: the callables a route chain is made of.
//!
//! # Design Decisions
//! - Two shapes, tagged explicitly: normal units see `(ctx)`, error units
//!   see `(err, ctx)`. The dispatcher picks by tag, never by arity.
//! - Every unit returns a boxed future so sync and async units share one
//!   calling convention.
//! - Units are `Arc`-shared; a frozen topology is cloned across requests
//!   without copying closures.

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::dispatch::context::RequestContext;
use crate::dispatch::error::HandlerError;
use crate::dispatch::signal::Signal;

/// A normal unit.
pub trait Handler: Send + Sync + 'static {
    fn call<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, Signal>;
}

/// An error unit. Only runs while a failure is in flight.
pub trait ErrorHandler: Send + Sync + 'static {
    fn call<'a>(&'a self, err: HandlerError, ctx: &'a mut RequestContext) -> BoxFuture<'a, Signal>;
}

/// One entry of a route's handler chain.
#[derive(Clone)]
pub enum HandlerUnit {
    Normal(Arc<dyn Handler>),
    Error(Arc<dyn ErrorHandler>),
}

impl HandlerUnit {
    pub fn normal(handler: impl Handler) -> Self {
        HandlerUnit::Normal(Arc::new(handler))
    }

    pub fn error(handler: impl ErrorHandler) -> Self {
        HandlerUnit::Error(Arc::new(handler))
    }

    /// Wrap an async closure.
    ///
    /// ```ignore
    /// HandlerUnit::from_fn(|ctx| Box::pin(async move {
    ///     tokio::time::sleep(Duration::from_millis(5)).await;
    ///     ctx.send("done")
    /// }))
    /// ```
    pub fn from_fn<F>(f: F) -> Self
    where
        F: for<'a> Fn(&'a mut RequestContext) -> BoxFuture<'a, Signal> + Send + Sync + 'static,
    {
        HandlerUnit::Normal(Arc::new(FnHandler(f)))
    }

    /// Wrap a closure that completes without suspending.
    pub fn from_sync<F>(f: F) -> Self
    where
        F: Fn(&mut RequestContext) -> Signal + Send + Sync + 'static,
    {
        HandlerUnit::Normal(Arc::new(SyncHandler(f)))
    }

    pub fn from_error_fn<F>(f: F) -> Self
    where
        F: for<'a> Fn(HandlerError, &'a mut RequestContext) -> BoxFuture<'a, Signal> + Send + Sync + 'static,
    {
        HandlerUnit::Error(Arc::new(FnErrorHandler(f)))
    }

    pub fn from_error_sync<F>(f: F) -> Self
    where
        F: Fn(HandlerError, &mut RequestContext) -> Signal + Send + Sync + 'static,
    {
        HandlerUnit::Error(Arc::new(SyncErrorHandler(f)))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, HandlerUnit::Error(_))
    }
}

impl fmt::Debug for HandlerUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerUnit::Normal(_) => f.write_str("HandlerUnit::Normal(..)"),
            HandlerUnit::Error(_) => f.write_str("HandlerUnit::Error(..)"),
        }
    }
}

struct FnHandler<F>(F);

impl<F> Handler for FnHandler<F>
where
    F: for<'a> Fn(&'a mut RequestContext) -> BoxFuture<'a, Signal> + Send + Sync + 'static,
{
    fn call<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, Signal> {
        (self.0)(ctx)
    }
}

struct SyncHandler<F>(F);

impl<F> Handler for SyncHandler<F>
where
    F: Fn(&mut RequestContext) -> Signal + Send + Sync + 'static,
{
    fn call<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, Signal> {
        let signal = (self.0)(ctx);
        Box::pin(std::future::ready(signal))
    }
}

struct FnErrorHandler<F>(F);

impl<F> ErrorHandler for FnErrorHandler<F>
where
    F: for<'a> Fn(HandlerError, &'a mut RequestContext) -> BoxFuture<'a, Signal> + Send + Sync + 'static,
{
    fn call<'a>(&'a self, err: HandlerError, ctx: &'a mut RequestContext) -> BoxFuture<'a, Signal> {
        (self.0)(err, ctx)
    }
}

struct SyncErrorHandler<F>(F);

impl<F> ErrorHandler for SyncErrorHandler<F>
where
    F: Fn(HandlerError, &mut RequestContext) -> Signal + Send + Sync + 'static,
{
    fn call<'a>(&'a self, err: HandlerError, ctx: &'a mut RequestContext) -> BoxFuture<'a, Signal> {
        let signal = (self.0)(err, ctx);
        Box::pin(std::future::ready(signal))
    }
}
