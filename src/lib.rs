//! Route matching and middleware dispatch engine.

pub mod config;
pub mod dispatch;
pub mod http;
pub mod lifecycle;
pub mod middleware;
pub mod observability;
pub mod routing;

pub use config::AppConfig;
pub use dispatch::{
    CancelToken, DispatchOutcome, Dispatcher, HandlerError, HandlerUnit, RequestContext, Signal,
};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{PatternError, RouteTable, Router};
