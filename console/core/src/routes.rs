use crate::{
    validation::{Field, Reason, ValidationError},
    Destination,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt};


/// Maps requests selected by a [`Matcher`] to a [`Destination`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub matcher: Matcher,
    pub destination: Destination,

    /// Route options (rate limiting, external auth, header manipulation, ...)
    /// are carried through without interpretation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<serde_json::Value>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Matcher {
    pub path: PathMatch,
    #[serde(default)]
    pub headers: Vec<HeaderMatcher>,
    #[serde(default)]
    pub query_params: Vec<QueryParamMatcher>,

    /// An empty set matches all methods.
    #[serde(default)]
    pub methods: BTreeSet<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathMatch {
    pub kind: PathMatchKind,
    pub value: String,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PathMatchKind {
    #[default]
    Prefix,
    Exact,
    Regex,
}

/// Constrains a request header. Several matchers may name the same header; all
/// of them must hold.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderMatcher {
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub regex: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParamMatcher {
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub regex: bool,
}

/// Checks a matcher, reporting every problem found rather than the first.
pub fn validate_matcher(matcher: &Matcher) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let PathMatch { kind, value } = &matcher.path;
    if value.is_empty() {
        errors.push(ValidationError::new(Field::Path, Reason::EmptyPath));
    } else if !value.starts_with('/') {
        errors.push(ValidationError::new(
            Field::Path,
            Reason::RelativePath(value.clone()),
        ));
    } else if *kind == PathMatchKind::Regex {
        if let Err(error) = Regex::new(value) {
            errors.push(ValidationError::new(
                Field::Path,
                Reason::InvalidRegex(error.to_string()),
            ));
        }
    }

    for (i, HeaderMatcher { name, value, regex }) in matcher.headers.iter().enumerate() {
        check_pair(Field::Header(i), name, value, *regex, &mut errors);
    }

    for (i, QueryParamMatcher { name, value, regex }) in matcher.query_params.iter().enumerate() {
        check_pair(Field::QueryParameter(i), name, value, *regex, &mut errors);
    }

    if matcher.methods.contains("") {
        errors.push(ValidationError::new(Field::Methods, Reason::EmptyMethod));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_pair(
    field: Field,
    name: &str,
    value: &str,
    regex: bool,
    errors: &mut Vec<ValidationError>,
) {
    if name.is_empty() {
        errors.push(ValidationError::new(field.clone(), Reason::EmptyName));
    }
    if regex {
        if let Err(error) = Regex::new(value) {
            errors.push(ValidationError::new(
                field,
                Reason::InvalidRegex(error.to_string()),
            ));
        }
    }
}

// === impl Matcher ===

impl Default for Matcher {
    fn default() -> Self {
        Self::prefix("/")
    }
}

impl Matcher {
    pub fn prefix(value: impl ToString) -> Self {
        Self::path(PathMatchKind::Prefix, value)
    }

    pub fn exact(value: impl ToString) -> Self {
        Self::path(PathMatchKind::Exact, value)
    }

    pub fn regex(value: impl ToString) -> Self {
        Self::path(PathMatchKind::Regex, value)
    }

    fn path(kind: PathMatchKind, value: impl ToString) -> Self {
        Self {
            path: PathMatch {
                kind,
                value: value.to_string(),
            },
            headers: vec![],
            query_params: vec![],
            methods: BTreeSet::new(),
        }
    }

    #[inline]
    pub fn matches_all_methods(&self) -> bool {
        self.methods.is_empty()
    }
}

// === impl PathMatchKind ===

impl fmt::Display for PathMatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prefix => write!(f, "PREFIX"),
            Self::Exact => write!(f, "EXACT"),
            Self::Regex => write!(f, "REGEX"),
        }
    }
}
