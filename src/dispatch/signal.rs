//! Control signals returned by handler units.

use crate::dispatch::error::HandlerError;

/// What the dispatcher should do after a unit finishes.
#[derive(Debug, Clone)]
#[must_use]
pub enum Signal {
    /// Run the next unit.
    Continue,
    /// Abandon the current route table and resume at the next one.
    SkipRouter,
    /// Divert to the nearest error unit.
    Fail(HandlerError),
    /// The response is complete; stop dispatching.
    Responded,
}

impl Signal {
    pub fn fail(err: impl Into<HandlerError>) -> Self {
        Signal::Fail(err.into())
    }
}
