//! Conventional last-resort units.

use axum::http::StatusCode;

use crate::dispatch::{HandlerError, HandlerUnit, RequestContext, Signal};

/// Responds 404 to anything that reaches it. Register it last, under `/`.
pub fn not_found() -> HandlerUnit {
    HandlerUnit::from_sync(|ctx: &mut RequestContext| {
        let message = format!("Cannot {} {}", ctx.method, ctx.path);
        ctx.status(StatusCode::NOT_FOUND).send(message)
    })
}

/// Terminal error unit: logs the failure and responds with its status and message.
pub fn error_responder() -> HandlerUnit {
    HandlerUnit::from_error_sync(respond_with_error)
}

fn respond_with_error(err: HandlerError, ctx: &mut RequestContext) -> Signal {
    if err.status().is_server_error() {
        tracing::error!(error = %err, status = %err.status(), path = %ctx.path, "Request failed");
    } else {
        tracing::debug!(error = %err, status = %err.status(), path = %ctx.path, "Request rejected");
    }
    ctx.status(err.status()).send(err.message().to_string())
}
