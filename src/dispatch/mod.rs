//! Dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! (method, target)
//!     → context.rs (RequestContext: path, query, collaborator slots)
//!     → dispatcher.rs (walk matching routes, run units in order)
//!         handler.rs (normal / error units, boxed futures)
//!         signal.rs (Continue, SkipRouter, Fail, Responded)
//!         error.rs (HandlerError carried through the error pipeline)
//!     → DispatchOutcome + finished Response
//! ```
//!
//! # Design Decisions
//! - Topology shared read-only via Arc; no locks on the request path
//! - One context per request, owned by the dispatch that runs it
//! - Cancellation drops the running unit at its next suspension point

pub mod cancel;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod signal;

pub use cancel::CancelToken;
pub use context::{ParsedBody, RequestContext, Response, ResponseState};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use error::HandlerError;
pub use handler::{ErrorHandler, Handler, HandlerUnit};
pub use signal::Signal;
