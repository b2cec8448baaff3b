//! Route matching logic.
//!
//! # Responsibilities
//! - Split a request target into path segments and query string
//! - Strip mount prefixes on segment boundaries
//! - Match path segments positionally against compiled patterns
//!
//! # Design Decisions
//! - First match in registration order wins; no specificity ranking
//! - Query strings never take part in path matching
//! - Captured values are the raw path substrings (no percent-decoding)
//! - No regex to guarantee O(n) matching

use axum::http::Method;

use crate::routing::params::Params;
use crate::routing::pattern::{PathPattern, Segment};
use crate::routing::router::{Topology, TopologyEntry};
use crate::routing::table::Route;

/// A successful lookup.
#[derive(Debug)]
pub struct RouteMatch<'t> {
    /// Position of the route in the topology.
    pub index: usize,
    pub route: &'t Route,
    pub params: Params,
    pub query: Params,
}

/// Looks up routes in a frozen topology.
#[derive(Debug, Clone, Copy)]
pub struct Matcher<'t> {
    topology: &'t Topology,
    case_sensitive: bool,
}

impl<'t> Matcher<'t> {
    pub fn new(topology: &'t Topology, case_sensitive: bool) -> Self {
        Self {
            topology,
            case_sensitive,
        }
    }

    /// Find the first route matching `method` and `target` (path plus optional query).
    pub fn match_route(&self, method: &Method, target: &str) -> Option<RouteMatch<'t>> {
        let (path, query) = split_target(target);
        let segments = split_path(path);
        let (index, params) = self.find_from(method, &segments, 0, |_| true)?;

        Some(RouteMatch {
            index,
            route: &self.topology.entries()[index].route,
            params,
            query: query.map(Params::from_urlencoded).unwrap_or_default(),
        })
    }

    /// Scan forward from `start` for the next matching route accepted by `accept`.
    pub(crate) fn find_from<F>(&self, method: &Method, segments: &[&str], start: usize, accept: F) -> Option<(usize, Params)>
    where
        F: Fn(&TopologyEntry) -> bool,
    {
        let entries = self.topology.entries();
        let mut index = start;

        while let Some(entry) = entries.get(index) {
            let Some(rest) = strip_prefix(&entry.prefix, segments, self.case_sensitive) else {
                // Every route of a table shares its prefix.
                index = entry.table_end.max(index + 1);
                continue;
            };

            if accept(entry) && entry.route.method().matches(method) {
                if let Some(params) = match_pattern(entry.route.pattern(), rest, self.case_sensitive) {
                    return Some((index, params));
                }
            }
            index += 1;
        }
        None
    }
}

/// Split `"/user/1?name=x#top"` into `("/user/1", Some("name=x"))`.
pub fn split_target(target: &str) -> (&str, Option<&str>) {
    let target = target.split_once('#').map_or(target, |(before, _)| before);
    match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    }
}

/// Split a path into its non-empty components.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn strip_prefix<'p, 's>(prefix: &[String], segments: &'p [&'s str], case_sensitive: bool) -> Option<&'p [&'s str]> {
    if segments.len() < prefix.len() {
        return None;
    }
    let (head, rest) = segments.split_at(prefix.len());
    head.iter()
        .zip(prefix)
        .all(|(seg, pre)| literal_eq(pre, seg, case_sensitive))
        .then_some(rest)
}

fn match_pattern(pattern: &PathPattern, segments: &[&str], case_sensitive: bool) -> Option<Params> {
    let (fixed, wildcard) = match pattern.segments().split_last() {
        Some((Segment::Wildcard, fixed)) => (fixed, true),
        _ => (pattern.segments(), false),
    };

    if segments.len() < fixed.len() || (!wildcard && segments.len() != fixed.len()) {
        return None;
    }

    let mut params = Params::new();
    for (segment, text) in fixed.iter().zip(segments) {
        match segment {
            Segment::Literal(literal) => {
                if !literal_eq(literal, text, case_sensitive) {
                    return None;
                }
            }
            Segment::Param(name) => {
                if text.is_empty() {
                    return None;
                }
                params.insert(name.as_str(), *text);
            }
            Segment::MixedParam { parts, trailing } => {
                for (name, value) in match_mixed(parts, trailing, text, case_sensitive)? {
                    params.insert(name, value);
                }
            }
            Segment::Wildcard => return None,
        }
    }
    Some(params)
}

/// Match one component against a `MixedParam`.
///
/// Separators match like literals. A capture runs up to the first occurrence
/// of the next separator; the last capture runs up to the trailing literal.
fn match_mixed<'a>(
    parts: &'a [(String, String)],
    trailing: &str,
    text: &'a str,
    case_sensitive: bool,
) -> Option<Vec<(&'a str, &'a str)>> {
    let mut rest = text;
    let mut captures = Vec::with_capacity(parts.len());

    for (i, (separator, name)) in parts.iter().enumerate() {
        rest = strip_literal_prefix(rest, separator, case_sensitive)?;
        let value = match parts.get(i + 1) {
            Some((next, _)) => {
                let end = find_literal(rest, next, case_sensitive)?;
                let (value, remainder) = rest.split_at(end);
                rest = remainder;
                value
            }
            None => strip_literal_suffix(rest, trailing, case_sensitive)?,
        };
        if value.is_empty() {
            return None;
        }
        captures.push((name.as_str(), value));
    }
    Some(captures)
}

// ASCII case folding keeps byte offsets, so indices found on folded copies
// are valid in the original text.
fn find_literal(text: &str, literal: &str, case_sensitive: bool) -> Option<usize> {
    if case_sensitive {
        text.find(literal)
    } else {
        text.to_ascii_lowercase().find(&literal.to_ascii_lowercase())
    }
}

fn strip_literal_prefix<'a>(text: &'a str, literal: &str, case_sensitive: bool) -> Option<&'a str> {
    let head = text.get(..literal.len())?;
    literal_eq(literal, head, case_sensitive).then(|| &text[literal.len()..])
}

fn strip_literal_suffix<'a>(text: &'a str, literal: &str, case_sensitive: bool) -> Option<&'a str> {
    let split = text.len().checked_sub(literal.len())?;
    let tail = text.get(split..)?;
    literal_eq(literal, tail, case_sensitive).then(|| &text[..split])
}

fn literal_eq(expected: &str, actual: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        expected == actual
    } else {
        expected.eq_ignore_ascii_case(actual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{HandlerUnit, Signal};
    use crate::routing::{Router, RouteTable};

    fn unit() -> HandlerUnit {
        HandlerUnit::from_sync(|_| Signal::Continue)
    }

    fn topology(mounts: Vec<(&str, RouteTable)>) -> Topology {
        let mut router = Router::new();
        for (prefix, table) in mounts {
            router.mount(prefix, table).unwrap();
        }
        router.freeze()
    }

    fn templates(list: &[&str]) -> RouteTable {
        let mut table = RouteTable::new();
        for t in list {
            table.get(t, [unit()]).unwrap();
        }
        table
    }

    #[test]
    fn test_split_target() {
        assert_eq!(split_target("/user/1?name=x"), ("/user/1", Some("name=x")));
        assert_eq!(split_target("/user/1#frag"), ("/user/1", None));
        assert_eq!(split_target("/"), ("/", None));
        assert_eq!(split_path("//a/b/"), vec!["a", "b"]);
    }

    #[test]
    fn test_mixed_param_extraction() {
        let topo = topology(vec![("/", templates(&["/users/:userId-:boardId"]))]);
        let matcher = Matcher::new(&topo, true);

        let m = matcher.match_route(&Method::GET, "/users/test-title").unwrap();
        assert_eq!(m.params.get("userId"), Some("test"));
        assert_eq!(m.params.get("boardId"), Some("title"));

        let m = matcher.match_route(&Method::GET, "/users/a-b-c").unwrap();
        assert_eq!(m.params.get("userId"), Some("a"));
        assert_eq!(m.params.get("boardId"), Some("b-c"));

        assert!(matcher.match_route(&Method::GET, "/users/-title").is_none());
        assert!(matcher.match_route(&Method::GET, "/users/notitle").is_none());
    }

    #[test]
    fn test_trailing_literal_extraction() {
        let topo = topology(vec![("/", templates(&["/files/:name.json"]))]);
        let matcher = Matcher::new(&topo, true);

        let m = matcher.match_route(&Method::GET, "/files/a.b.json").unwrap();
        assert_eq!(m.params.get("name"), Some("a.b"));
        assert!(matcher.match_route(&Method::GET, "/files/.json").is_none());
        assert!(matcher.match_route(&Method::GET, "/files/a.txt").is_none());
    }

    #[test]
    fn test_first_registration_wins() {
        let topo = topology(vec![("/", templates(&["/:id", "/:userId.:boardId"]))]);
        let m = Matcher::new(&topo, true).match_route(&Method::GET, "/test.test").unwrap();
        assert_eq!(m.index, 0);
        assert_eq!(m.params.get("id"), Some("test.test"));

        let topo = topology(vec![("/", templates(&["/:userId.:boardId", "/:id"]))]);
        let matcher = Matcher::new(&topo, true);
        let m = matcher.match_route(&Method::GET, "/test.test").unwrap();
        assert_eq!(m.index, 0);
        assert_eq!(m.params.get("userId"), Some("test"));
        assert_eq!(matcher.match_route(&Method::GET, "/test").unwrap().index, 1);
    }

    #[test]
    fn test_query_does_not_affect_matching() {
        let topo = topology(vec![("/user", templates(&["/:id"]))]);
        let matcher = Matcher::new(&topo, true);

        let plain = matcher.match_route(&Method::GET, "/user/1").unwrap();
        let queried = matcher.match_route(&Method::GET, "/user/1?name=x").unwrap();
        assert_eq!(plain.index, queried.index);
        assert_eq!(plain.params, queried.params);
        assert_eq!(queried.query.get("name"), Some("x"));
        assert!(plain.query.is_empty());
    }

    #[test]
    fn test_prefix_is_segment_aware() {
        let topo = topology(vec![("/user", templates(&["/", "/*"]))]);
        let matcher = Matcher::new(&topo, true);

        assert!(matcher.match_route(&Method::GET, "/user").is_some());
        assert!(matcher.match_route(&Method::GET, "/user/anything/deep").is_some());
        assert!(matcher.match_route(&Method::GET, "/username").is_none());
    }

    #[test]
    fn test_segment_count_and_wildcard() {
        let topo = topology(vec![("/", templates(&["/a/:b", "/static/*"]))]);
        let matcher = Matcher::new(&topo, true);

        assert!(matcher.match_route(&Method::GET, "/a").is_none());
        assert!(matcher.match_route(&Method::GET, "/a/1/2").is_none());
        assert!(matcher.match_route(&Method::GET, "/static").is_some());
        assert!(matcher.match_route(&Method::GET, "/static/css/site.css").is_some());
    }

    #[test]
    fn test_method_filter() {
        let mut table = RouteTable::new();
        table.post("/items", [unit()]).unwrap();
        table.any("/items", [unit()]).unwrap();
        let topo = topology(vec![("/", table)]);
        let matcher = Matcher::new(&topo, true);

        assert_eq!(matcher.match_route(&Method::POST, "/items").unwrap().index, 0);
        assert_eq!(matcher.match_route(&Method::DELETE, "/items").unwrap().index, 1);
    }

    #[test]
    fn test_case_sensitivity_option() {
        let topo = topology(vec![("/Api", templates(&["/About"]))]);

        assert!(Matcher::new(&topo, true).match_route(&Method::GET, "/api/about").is_none());
        assert!(Matcher::new(&topo, false).match_route(&Method::GET, "/api/about").is_some());
    }

    #[test]
    fn test_case_sensitivity_covers_mixed_separators() {
        let topo = topology(vec![("/", templates(&["/files/:name.JSON", "/:a-X-:b"]))]);

        let strict = Matcher::new(&topo, true);
        assert!(strict.match_route(&Method::GET, "/files/a.json").is_none());
        assert!(strict.match_route(&Method::GET, "/one-x-two").is_none());

        let relaxed = Matcher::new(&topo, false);
        let m = relaxed.match_route(&Method::GET, "/files/a.json").unwrap();
        assert_eq!(m.params.get("name"), Some("a"));
        let m = relaxed.match_route(&Method::GET, "/One-x-Two").unwrap();
        assert_eq!(m.params.get("a"), Some("One"));
        assert_eq!(m.params.get("b"), Some("Two"));
    }

    #[test]
    fn test_rematch_is_idempotent() {
        let topo = topology(vec![("/", templates(&["/about", "/:id", "/users/:userId-:boardId"]))]);
        let matcher = Matcher::new(&topo, true);

        for target in ["/about", "/xyz", "/users/test-title"] {
            let first = matcher.match_route(&Method::GET, target).unwrap();
            let second = matcher.match_route(&Method::GET, target).unwrap();
            assert_eq!(first.index, second.index);
            assert_eq!(first.params, second.params);
        }
    }
}
