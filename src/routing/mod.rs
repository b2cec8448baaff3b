//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     template strings
//!     → pattern.rs (compile into segments)
//!     → table.rs (ordered routes with handler chains)
//!     → router.rs (mount tables under prefixes, freeze as Topology)
//!
//! Incoming Request (method, path?query):
//!     → matcher.rs (prefix strip, positional segment match)
//!     → Return: first matching route + params + query, or None
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path
//! - Deterministic: same input always matches same route
//! - First match wins (registration order)

pub mod matcher;
pub mod params;
pub mod pattern;
pub mod router;
pub mod table;

pub use matcher::{split_path, split_target, Matcher, RouteMatch};
pub use params::Params;
pub use pattern::{compile, PathPattern, PatternError, Segment};
pub use router::{Mountable, Router, Topology};
pub use table::{Route, RouteBuilder, RouteMethod, RouteTable};
