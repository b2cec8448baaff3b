//! Cookie header parsing unit.

use axum::http::header;

use crate::dispatch::{HandlerUnit, RequestContext, Signal};

/// A unit that fills `ctx.cookies` from every `Cookie` request header.
///
/// Values are kept as sent, minus surrounding double quotes. On a repeated
/// name the first occurrence wins.
pub fn cookie_parser() -> HandlerUnit {
    HandlerUnit::from_sync(parse_cookies)
}

fn parse_cookies(ctx: &mut RequestContext) -> Signal {
    let pairs: Vec<(String, String)> = ctx
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|line| line.split(';'))
        .filter_map(parse_pair)
        .collect();

    for (name, value) in pairs {
        ctx.cookies.entry(name).or_insert(value);
    }
    Signal::Continue
}

fn parse_pair(pair: &str) -> Option<(String, String)> {
    let (name, value) = pair.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let value = value.trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    Some((name.to_string(), value.to_string()))
}
