//! Route pattern compilation.
//!
//! # Responsibilities
//! - Turn a route template (`/users/:userId-:boardId`) into a `PathPattern`
//! - Reject malformed parameters and regex-style tokens at registration time
//!
//! # Design Decisions
//! - No regex: segments are matched positionally by the matcher
//! - Specificity is not encoded here; precedence is registration order
//! - Empty path components are ignored, so `/about/` compiles like `/about`

use thiserror::Error;

/// Characters that would carry meaning in a regex-style route syntax.
const UNSUPPORTED_TOKENS: &[char] = &['(', ')', '[', ']', '{', '}', '?', '+', '^', '$', '|', '\\', '*'];

/// Error raised when a route template or mount prefix cannot be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("empty parameter name in `{template}`")]
    EmptyParamName { template: String },

    #[error("duplicate parameter `{name}` in `{template}`")]
    DuplicateParam { template: String, name: String },

    #[error("parameters `{first}` and `{second}` need a literal separator in `{template}`")]
    AdjacentParams {
        template: String,
        first: String,
        second: String,
    },

    #[error("unsupported token `{token}` in `{template}`")]
    UnsupportedToken { template: String, token: char },

    #[error("wildcard must be the last segment in `{template}`")]
    MisplacedWildcard { template: String },

    #[error("invalid mount prefix `{prefix}`: prefixes must be literal paths")]
    InvalidPrefix { prefix: String },
}

/// One path component of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Exact text, e.g. `about`.
    Literal(String),
    /// A whole component captured under a name, e.g. `:id`.
    Param(String),
    /// Several captures sharing one component, e.g. `:userId-:boardId`.
    ///
    /// Each part is `(separator, name)`: the literal text that precedes the
    /// capture (empty for a leading parameter) and the parameter name.
    /// `trailing` is literal text after the last capture (`:file.json`).
    MixedParam {
        parts: Vec<(String, String)>,
        trailing: String,
    },
    /// Catch-all `*`; accepts zero or more remaining components.
    Wildcard,
}

impl Segment {
    /// Parameter names captured by this segment, in capture order.
    pub fn param_names(&self) -> Vec<&str> {
        match self {
            Segment::Param(name) => vec![name.as_str()],
            Segment::MixedParam { parts, .. } => parts.iter().map(|(_, name)| name.as_str()).collect(),
            Segment::Literal(_) | Segment::Wildcard => Vec::new(),
        }
    }
}

/// A compiled route template. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    template: String,
    segments: Box<[Segment]>,
}

impl PathPattern {
    /// The template this pattern was compiled from.
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// True when the pattern ends with a catch-all.
    pub fn has_wildcard(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::Wildcard))
    }

    /// All parameter names, leftmost first.
    pub fn param_names(&self) -> Vec<&str> {
        self.segments.iter().flat_map(Segment::param_names).collect()
    }
}

impl std::fmt::Display for PathPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.template)
    }
}

/// Compile a route template into a `PathPattern`.
pub fn compile(template: &str) -> Result<PathPattern, PatternError> {
    let components: Vec<&str> = template.split('/').filter(|c| !c.is_empty()).collect();
    let mut segments = Vec::with_capacity(components.len());
    let mut seen: Vec<String> = Vec::new();

    for (i, component) in components.iter().enumerate() {
        if *component == "*" {
            if i + 1 != components.len() {
                return Err(PatternError::MisplacedWildcard {
                    template: template.to_string(),
                });
            }
            segments.push(Segment::Wildcard);
            continue;
        }

        if let Some(token) = component.chars().find(|c| UNSUPPORTED_TOKENS.contains(c)) {
            return Err(PatternError::UnsupportedToken {
                template: template.to_string(),
                token,
            });
        }

        let segment = compile_component(template, component)?;
        for name in segment.param_names() {
            if seen.iter().any(|s| s == name) {
                return Err(PatternError::DuplicateParam {
                    template: template.to_string(),
                    name: name.to_string(),
                });
            }
            seen.push(name.to_string());
        }
        segments.push(segment);
    }

    Ok(PathPattern {
        template: template.to_string(),
        segments: segments.into_boxed_slice(),
    })
}

fn compile_component(template: &str, component: &str) -> Result<Segment, PatternError> {
    if !component.contains(':') {
        return Ok(Segment::Literal(component.to_string()));
    }

    let mut parts: Vec<(String, String)> = Vec::new();
    let mut literal = String::new();
    let mut chars = component.chars().peekable();

    while let Some(c) = chars.next() {
        if c != ':' {
            literal.push(c);
            continue;
        }

        let mut name = String::new();
        while let Some(&next) = chars.peek() {
            if !is_name_char(next) {
                break;
            }
            name.push(next);
            chars.next();
        }

        if name.is_empty() {
            return Err(PatternError::EmptyParamName {
                template: template.to_string(),
            });
        }
        if literal.is_empty() {
            if let Some((_, previous)) = parts.last() {
                return Err(PatternError::AdjacentParams {
                    template: template.to_string(),
                    first: previous.clone(),
                    second: name,
                });
            }
        }

        parts.push((std::mem::take(&mut literal), name));
    }

    match parts.as_slice() {
        [(separator, name)] if separator.is_empty() && literal.is_empty() => Ok(Segment::Param(name.clone())),
        _ => Ok(Segment::MixedParam {
            parts,
            trailing: literal,
        }),
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_literals() {
        let pattern = compile("/user/profile").unwrap();
        assert_eq!(
            pattern.segments(),
            &[
                Segment::Literal("user".into()),
                Segment::Literal("profile".into())
            ]
        );
        assert!(compile("/").unwrap().segments().is_empty());
        assert!(compile("").unwrap().segments().is_empty());
    }

    #[test]
    fn test_compile_trailing_slash_ignored() {
        assert_eq!(
            compile("/about/").unwrap().segments(),
            compile("/about").unwrap().segments()
        );
    }

    #[test]
    fn test_compile_params() {
        let pattern = compile("/users/:userId/board/:boardId").unwrap();
        assert_eq!(pattern.param_names(), vec!["userId", "boardId"]);
        assert_eq!(pattern.segments()[1], Segment::Param("userId".into()));
    }

    #[test]
    fn test_compile_mixed_separators() {
        let pattern = compile("/users/:userId-:boardId").unwrap();
        assert_eq!(
            pattern.segments()[1],
            Segment::MixedParam {
                parts: vec![
                    ("".into(), "userId".into()),
                    ("-".into(), "boardId".into())
                ],
                trailing: String::new(),
            }
        );

        let dotted = compile("/:userId.:boardId").unwrap();
        assert_eq!(dotted.param_names(), vec!["userId", "boardId"]);
    }

    #[test]
    fn test_compile_trailing_literal() {
        let pattern = compile("/files/:name.json").unwrap();
        assert_eq!(
            pattern.segments()[1],
            Segment::MixedParam {
                parts: vec![("".into(), "name".into())],
                trailing: ".json".into(),
            }
        );
    }

    #[test]
    fn test_compile_wildcard() {
        let pattern = compile("/static/*").unwrap();
        assert!(pattern.has_wildcard());
        assert_eq!(pattern.segments().len(), 2);

        let err = compile("/*/tail").unwrap_err();
        assert!(matches!(err, PatternError::MisplacedWildcard { .. }));
    }

    #[test]
    fn test_compile_rejects_malformed_params() {
        assert!(matches!(
            compile("/users/:").unwrap_err(),
            PatternError::EmptyParamName { .. }
        ));
        assert!(matches!(
            compile("/:id/posts/:id").unwrap_err(),
            PatternError::DuplicateParam { name, .. } if name == "id"
        ));
        assert!(matches!(
            compile("/:a:b").unwrap_err(),
            PatternError::AdjacentParams { .. }
        ));
    }

    #[test]
    fn test_compile_rejects_regex_tokens() {
        for template in ["/user/:id(\\d+)", "/ab?cd", "/ab+cd", "/files/a*"] {
            assert!(
                matches!(compile(template), Err(PatternError::UnsupportedToken { .. })),
                "{template} should be rejected"
            );
        }
    }
}
