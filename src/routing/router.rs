//! Router composition and topology freezing.
//!
//! # Responsibilities
//! - Mount route tables and nested routers under literal path prefixes
//! - Freeze the mount tree into an immutable, flat `Topology`
//!
//! # Design Decisions
//! - Immutable after freezing (shared across requests without locks)
//! - Flattening keeps mount order: a depth-first walk yields routes in the
//!   exact order a recursive matcher would visit them
//! - Each table's routes stay contiguous, so "skip to the next table" is an
//!   index jump

use crate::routing::pattern::PatternError;
use crate::routing::table::{Route, RouteTable};

/// Anything that can be mounted under a prefix.
#[derive(Debug)]
pub enum Mountable {
    Table(RouteTable),
    Router(Router),
}

impl From<RouteTable> for Mountable {
    fn from(table: RouteTable) -> Self {
        Mountable::Table(table)
    }
}

impl From<Router> for Mountable {
    fn from(router: Router) -> Self {
        Mountable::Router(router)
    }
}

#[derive(Debug)]
struct MountEntry {
    prefix: String,
    child: Mountable,
}

/// An ordered list of mounts. Routers nest to any depth.
#[derive(Debug, Default)]
pub struct Router {
    mounts: Vec<MountEntry>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a table or router under `prefix` (e.g. `"/user"`; `"/"` for the root).
    ///
    /// Prefixes are literal: parameters and wildcards are rejected.
    pub fn mount(&mut self, prefix: &str, child: impl Into<Mountable>) -> Result<&mut Self, PatternError> {
        let prefix = normalize_prefix(prefix)?;
        self.mounts.push(MountEntry {
            prefix,
            child: child.into(),
        });
        Ok(self)
    }

    /// Mounted `(prefix, child)` pairs in registration order.
    pub fn mounts(&self) -> impl Iterator<Item = (&str, &Mountable)> {
        self.mounts.iter().map(|m| (m.prefix.as_str(), &m.child))
    }

    /// Freeze into a flat topology.
    pub fn freeze(self) -> Topology {
        let mut topology = Topology { entries: Vec::new() };
        let mut tables = 0;
        flatten(self, "", &mut topology.entries, &mut tables);

        tracing::debug!(
            routes = topology.entries.len(),
            tables = tables,
            "Route topology frozen"
        );
        topology
    }
}

/// A frozen route as the matcher and dispatcher see it.
#[derive(Debug)]
pub(crate) struct TopologyEntry {
    pub(crate) route: Route,
    pub(crate) prefix: Vec<String>,
    /// Index one past the last route of the table this route belongs to.
    pub(crate) table_end: usize,
    has_normal_units: bool,
    has_error_units: bool,
}

impl TopologyEntry {
    /// Whether the route holds any unit of the shape currently wanted.
    pub(crate) fn has_units_for(&self, erroring: bool) -> bool {
        if erroring {
            self.has_error_units
        } else {
            self.has_normal_units
        }
    }
}

/// Immutable, flattened route topology.
#[derive(Debug)]
pub struct Topology {
    entries: Vec<TopologyEntry>,
}

impl Topology {
    /// Routes in match order.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.entries.iter().map(|e| &e.route)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> &[TopologyEntry] {
        &self.entries
    }
}

fn flatten(router: Router, base: &str, entries: &mut Vec<TopologyEntry>, tables: &mut usize) {
    for mount in router.mounts {
        let prefix = format!("{}{}", base, mount.prefix);
        match mount.child {
            Mountable::Router(child) => flatten(child, &prefix, entries, tables),
            Mountable::Table(table) => {
                let start = entries.len();
                let segments: Vec<String> = prefix.split('/').filter(|s| !s.is_empty()).map(String::from).collect();

                for route in table.into_routes() {
                    let has_error_units = route.chain().iter().any(|u| u.is_error());
                    let has_normal_units = route.chain().iter().any(|u| !u.is_error());
                    entries.push(TopologyEntry {
                        route: route.with_mount_prefix(&prefix),
                        prefix: segments.clone(),
                        table_end: 0,
                        has_normal_units,
                        has_error_units,
                    });
                }

                let end = entries.len();
                for entry in &mut entries[start..end] {
                    entry.table_end = end;
                }
                *tables += 1;
            }
        }
    }
}

/// Normalize a mount prefix to `/a/b` form (empty for the root).
fn normalize_prefix(prefix: &str) -> Result<String, PatternError> {
    let mut normalized = String::new();
    for segment in prefix.split('/').filter(|s| !s.is_empty()) {
        if segment.contains([':', '*', '(', ')', '?', '+']) {
            return Err(PatternError::InvalidPrefix {
                prefix: prefix.to_string(),
            });
        }
        normalized.push('/');
        normalized.push_str(segment);
    }
    Ok(normalized)
}
