//! route-dispatch demo server.
//!
//! Serves a small application through the dispatch engine:
//!
//! ```text
//! GET  /*                       files under `settings.static_dir` (default ./public)
//! GET  /                        hello page
//! GET  /about                   about router
//! GET  /user                    user index (reads ?name=)
//! GET  /user/:userId-:boardId   a user's board
//! GET  /user/:id                single user
//! POST /user                    echo parsed body
//! any  /user/admin/*            skips the user router unless ?admin=1
//! any  /boom                    fails, handled by the error responder
//! *                             404
//! ```

use std::path::PathBuf;

use axum::http::StatusCode;
use clap::Parser;
use tokio::net::TcpListener;

use route_dispatch::config::{load_config, AppConfig};
use route_dispatch::dispatch::{HandlerUnit, ParsedBody, Signal};
use route_dispatch::lifecycle::{spawn_signal_handler, Shutdown};
use route_dispatch::middleware::{body_parser, cookie_parser, error_responder, not_found, serve_dir};
use route_dispatch::observability::{init_logging, init_metrics};
use route_dispatch::routing::{PatternError, RouteTable, Router};
use route_dispatch::HttpServer;

#[derive(Debug, Parser)]
#[command(name = "route-dispatch", version, about = "Route matching and middleware dispatch demo server")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    init_logging(&config.observability);
    tracing::info!("route-dispatch v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        case_sensitive = config.routing.case_sensitive,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let static_dir = config
        .settings
        .get("static_dir")
        .and_then(|v| v.as_str())
        .unwrap_or("public")
        .to_string();
    let server = HttpServer::new(config, app(static_dir.into())?);

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn app(static_dir: PathBuf) -> Result<Router, PatternError> {
    let mut root = RouteTable::new();
    root.middleware([cookie_parser(), body_parser(), serve_dir(static_dir)])?
        .get("/", [HandlerUnit::from_sync(|ctx| {
            let title = ctx
                .setting("title")
                .and_then(|v| v.as_str())
                .unwrap_or("route-dispatch")
                .to_string();
            ctx.send(format!("Hello, {}", title))
        })])?
        .any("/boom", [HandlerUnit::from_sync(|_| Signal::fail("boom"))])?;

    let mut about = RouteTable::new();
    about.get("/", [HandlerUnit::from_sync(|ctx| ctx.send("about"))])?;

    let mut user = RouteTable::new();
    user.use_at("/admin", [HandlerUnit::from_sync(|ctx| {
        if ctx.query.get("admin") == Some("1") {
            Signal::Continue
        } else {
            Signal::SkipRouter
        }
    })])?
    .get("/admin/panel", [HandlerUnit::from_sync(|ctx| ctx.send("admin panel"))])?
    .get("/", [HandlerUnit::from_sync(|ctx| {
        let name = ctx.query.get("name").unwrap_or("guest").to_string();
        ctx.send(format!("user index: {}", name))
    })])?
    .post("/", [HandlerUnit::from_sync(|ctx| {
        let json = match &ctx.body {
            Some(ParsedBody::Json(value)) => Some(value.clone()),
            _ => None,
        };
        match json {
            Some(value) => ctx.json(&value),
            None => ctx.status(StatusCode::BAD_REQUEST).send("expected a JSON body"),
        }
    })])?
    .get("/:userId-:boardId", [HandlerUnit::from_sync(|ctx| {
        let params = ctx.params.clone();
        ctx.json(&params)
    })])?
    .get("/:id", [HandlerUnit::from_sync(|ctx| {
        let params = ctx.params.clone();
        ctx.json(&params)
    })])?;

    let mut fallback = RouteTable::new();
    fallback.middleware([not_found(), error_responder()])?;

    let mut router = Router::new();
    router
        .mount("/", root)?
        .mount("/about", about)?
        .mount("/user", user)?
        .mount("/", fallback)?;
    Ok(router)
}
