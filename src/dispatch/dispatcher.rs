//! The dispatch state machine.
//!
//! # Responsibilities
//! - Walk matching routes in topology order and run their units one at a time
//! - Interpret each unit's `Signal`
//! - Route failures to error units, and fall back to default 404/500 responses
//!
//! # Data Flow
//! ```text
//! RequestContext (method, path)
//!     → Matcher::find_from(cursor)      next matching route
//!     → run units of its chain          skip units of the wrong shape
//!         Continue    → next unit, then next matching route
//!         SkipRouter  → cursor jumps to the next route table
//!         Fail(err)   → error in flight, only error units run
//!         Responded   → done
//!     → no route left                   404, or 500 if an error is in flight
//! ```
//!
//! # Design Decisions
//! - Units of one request are strictly sequential; each is awaited before
//!   its signal is read
//! - A panicking unit is treated as `Fail`
//! - An error unit returning `Continue` marks the error handled

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use axum::http::{Method, StatusCode};
use futures_util::FutureExt;
use tracing::Instrument;

use crate::config::AppConfig;
use crate::dispatch::cancel::CancelToken;
use crate::dispatch::context::RequestContext;
use crate::dispatch::error::HandlerError;
use crate::dispatch::handler::HandlerUnit;
use crate::dispatch::signal::Signal;
use crate::observability::metrics;
use crate::routing::{split_path, Matcher, Router, Topology};

/// How a dispatch ended.
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    /// A unit sent the response.
    Responded,
    /// No unit responded and no error was in flight; a 404 was written.
    Exhausted,
    /// An error reached the end of the topology unhandled; a default error
    /// response was written.
    Failed(HandlerError),
    /// The caller cancelled; the response may be incomplete.
    Cancelled,
}

impl DispatchOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            DispatchOutcome::Responded => "responded",
            DispatchOutcome::Exhausted => "not_found",
            DispatchOutcome::Failed(_) => "failed",
            DispatchOutcome::Cancelled => "cancelled",
        }
    }
}

/// Runs requests against a frozen topology. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    topology: Arc<Topology>,
    config: Arc<AppConfig>,
}

impl Dispatcher {
    /// Freeze `router` and bind it to the startup configuration.
    pub fn new(router: Router, config: impl Into<Arc<AppConfig>>) -> Self {
        Self {
            topology: Arc::new(router.freeze()),
            config: config.into(),
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn config(&self) -> &Arc<AppConfig> {
        &self.config
    }

    pub fn matcher(&self) -> Matcher<'_> {
        Matcher::new(&self.topology, self.config.routing.case_sensitive)
    }

    /// A fresh context for `method` and `target` (path plus optional query).
    pub fn context(&self, method: Method, target: &str) -> RequestContext {
        RequestContext::new(method, target, self.config.clone())
    }

    pub async fn dispatch(&self, ctx: &mut RequestContext) -> DispatchOutcome {
        self.run(ctx, None).await
    }

    /// Like `dispatch`, but stops as soon as `token` is cancelled.
    pub async fn dispatch_with_cancel(&self, ctx: &mut RequestContext, token: &CancelToken) -> DispatchOutcome {
        self.run(ctx, Some(token)).await
    }

    async fn run(&self, ctx: &mut RequestContext, token: Option<&CancelToken>) -> DispatchOutcome {
        let start = Instant::now();
        let span = tracing::debug_span!(
            "dispatch",
            method = %ctx.method,
            path = %ctx.path,
            request_id = ctx.request_id.as_deref().unwrap_or("-"),
        );

        let outcome = self.drive(ctx, token).instrument(span).await;
        metrics::record_dispatch(ctx.method.as_str(), outcome.label(), start);
        outcome
    }

    async fn drive(&self, ctx: &mut RequestContext, token: Option<&CancelToken>) -> DispatchOutcome {
        let matcher = self.matcher();
        let entries = self.topology.entries();
        let path = ctx.path.clone();
        let segments = split_path(&path);
        let mut cursor = 0;

        loop {
            let erroring = ctx.error_in_flight().is_some();
            let found = matcher.find_from(&ctx.method, &segments, cursor, |e| e.has_units_for(erroring));
            let Some((index, params)) = found else {
                break;
            };

            let entry = &entries[index];
            ctx.params = params;
            ctx.base_url = entry.route.mount_prefix().to_string();
            cursor = index + 1;

            tracing::trace!(
                route = %entry.route.pattern(),
                method = %entry.route.method(),
                base_url = %ctx.base_url,
                "Route matched"
            );

            for unit in entry.route.chain() {
                if unit.is_error() != ctx.error_in_flight().is_some() {
                    continue;
                }
                if token.is_some_and(CancelToken::is_cancelled) {
                    tracing::debug!("Dispatch cancelled");
                    return DispatchOutcome::Cancelled;
                }

                let signal = match token {
                    Some(token) => tokio::select! {
                        signal = invoke(unit, ctx) => signal,
                        _ = token.cancelled() => {
                            tracing::debug!("Dispatch cancelled while a unit was running");
                            return DispatchOutcome::Cancelled;
                        }
                    },
                    None => invoke(unit, ctx).await,
                };

                match signal {
                    _ if ctx.is_sent() => {
                        if let Signal::Fail(err) = &signal {
                            tracing::warn!(error = %err, "Unit failed after the response was sent");
                        }
                        return DispatchOutcome::Responded;
                    }
                    Signal::Responded => {
                        let _ = ctx.end();
                        return DispatchOutcome::Responded;
                    }
                    Signal::Continue => {
                        if unit.is_error() {
                            tracing::debug!("Error handled; resuming normal units");
                            ctx.set_error_in_flight(None);
                        }
                    }
                    Signal::SkipRouter => {
                        tracing::debug!(resume_at = entry.table_end, "Skipping rest of route table");
                        cursor = entry.table_end;
                        break;
                    }
                    Signal::Fail(err) => {
                        tracing::debug!(error = %err, status = %err.status(), "Unit failed; diverting to error units");
                        ctx.set_error_in_flight(Some(err));
                    }
                }
            }
        }

        match ctx.error_in_flight().cloned() {
            Some(err) => {
                tracing::error!(
                    error = %err,
                    status = %err.status(),
                    method = %ctx.method,
                    path = %ctx.path,
                    "Unhandled failure; writing default error response"
                );
                let reason = err.status().canonical_reason().unwrap_or("Internal Server Error");
                let _ = ctx.status(err.status()).send(reason);
                DispatchOutcome::Failed(err)
            }
            None => {
                tracing::debug!(method = %ctx.method, path = %ctx.path, "No unit responded");
                let message = format!("Cannot {} {}", ctx.method, ctx.path);
                let _ = ctx.status(StatusCode::NOT_FOUND).send(message);
                DispatchOutcome::Exhausted
            }
        }
    }
}

/// Run one unit, turning a panic into `Fail`.
async fn invoke(unit: &HandlerUnit, ctx: &mut RequestContext) -> Signal {
    let call = async {
        match unit {
            HandlerUnit::Normal(handler) => handler.call(ctx).await,
            HandlerUnit::Error(handler) => {
                let err = ctx
                    .error_in_flight()
                    .cloned()
                    .unwrap_or_else(|| HandlerError::new("error unit invoked without a failure"));
                handler.call(err, ctx).await
            }
        }
    };

    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(signal) => signal,
        Err(payload) => {
            let err = HandlerError::from_panic(payload);
            tracing::error!(error = %err, "Handler unit panicked");
            metrics::record_handler_panic();
            Signal::Fail(err)
        }
    }
}
