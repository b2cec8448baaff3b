//! Request body parsing unit.

use axum::http::{header, StatusCode};

use crate::dispatch::{HandlerError, HandlerUnit, ParsedBody, RequestContext, Signal};
use crate::routing::Params;

/// A unit that decodes `ctx.raw_body` into `ctx.body` by content type.
///
/// Handles `application/json`, `application/x-www-form-urlencoded` and
/// `text/*`. Other content types and empty bodies leave `ctx.body` unset.
/// Malformed bodies fail with 400.
pub fn body_parser() -> HandlerUnit {
    HandlerUnit::from_sync(parse_body)
}

fn parse_body(ctx: &mut RequestContext) -> Signal {
    if ctx.raw_body.is_empty() || ctx.body.is_some() {
        return Signal::Continue;
    }

    let Some(mime) = ctx.header(header::CONTENT_TYPE.as_str()).map(essence) else {
        return Signal::Continue;
    };

    let parsed = match mime.as_str() {
        "application/json" => match serde_json::from_slice(&ctx.raw_body) {
            Ok(value) => ParsedBody::Json(value),
            Err(e) => return bad_request(HandlerError::from_error(e)),
        },
        "application/x-www-form-urlencoded" => match std::str::from_utf8(&ctx.raw_body) {
            Ok(text) => ParsedBody::Form(Params::from_urlencoded(text)),
            Err(e) => return bad_request(HandlerError::from_error(e)),
        },
        m if m.starts_with("text/") => match std::str::from_utf8(&ctx.raw_body) {
            Ok(text) => ParsedBody::Text(text.to_string()),
            Err(e) => return bad_request(HandlerError::from_error(e)),
        },
        _ => return Signal::Continue,
    };

    tracing::trace!(content_type = %mime, bytes = ctx.raw_body.len(), "Request body parsed");
    ctx.body = Some(parsed);
    Signal::Continue
}

/// `"Application/JSON; charset=utf-8"` → `"application/json"`.
fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn bad_request(err: HandlerError) -> Signal {
    Signal::Fail(err.with_status(StatusCode::BAD_REQUEST))
}
