//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use route_dispatch::config::AppConfig;
use route_dispatch::dispatch::{HandlerUnit, Signal};
use route_dispatch::lifecycle::Shutdown;
use route_dispatch::routing::Router;
use route_dispatch::HttpServer;

/// Ordered record of which units ran.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, name: &str) {
        self.0.lock().unwrap().push(name.to_string());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// A normal unit that records `name` and returns `signal`.
pub fn record(log: &CallLog, name: &'static str, signal: Signal) -> HandlerUnit {
    let log = log.clone();
    HandlerUnit::from_sync(move |_| {
        log.push(name);
        signal.clone()
    })
}

/// A normal unit that records `name` and responds with `body`.
pub fn respond(log: &CallLog, name: &'static str, body: &'static str) -> HandlerUnit {
    let log = log.clone();
    HandlerUnit::from_sync(move |ctx| {
        log.push(name);
        ctx.send(body)
    })
}

/// An error unit that records `name` and responds `500 handled: <message>`.
pub fn recover(log: &CallLog, name: &'static str) -> HandlerUnit {
    let log = log.clone();
    HandlerUnit::from_error_sync(move |err, ctx| {
        log.push(name);
        ctx.status(err.status()).send(format!("handled: {}", err.message()))
    })
}

/// A running server bound to an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = self.handle.await;
    }
}

/// Serve `router` on 127.0.0.1 with `config`.
pub async fn start_server(config: AppConfig, router: Router) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();

    let server = HttpServer::new(config, router);
    let rx = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, rx).await });

    TestServer {
        addr,
        shutdown,
        handle,
    }
}
