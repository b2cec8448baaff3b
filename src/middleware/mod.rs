//! Ready-made handler units.
//!
//! # Data Flow
//! ```text
//! body.rs      raw_body → ctx.body          (Continue, or Fail 400)
//! cookies.rs   Cookie header → ctx.cookies  (Continue)
//! static_files.rs  file under ctx.path → response (Responded, or Continue on a miss)
//! fallback.rs  not_found (404), error_responder (error status + message)
//! ```
//!
//! # Design Decisions
//! - Collaborators are ordinary units; the dispatcher has no special cases
//! - Parsers never respond; they fill context slots and continue
//! - `body_parser` must run before any unit that reads `ctx.body`
//! - `serve_dir` responds directly, so it shadows every unit mounted after it

pub mod body;
pub mod cookies;
pub mod fallback;
pub mod static_files;

pub use body::body_parser;
pub use cookies::cookie_parser;
pub use fallback::{error_responder, not_found};
pub use static_files::serve_dir;
