//! Declarative predicates over gNMI path element sequences.
//!
//! Matchers are built once at startup from a handful of element names and
//! are pure, allocation-free predicates over `&[PathElement]` thereafter —
//! per-notification matching is the registry's inner loop.

use std::collections::BTreeMap;

/// One named, optionally-keyed element of a gNMI path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathElement {
    pub name: String,
    pub key: BTreeMap<String, String>,
}

impl PathElement {
    pub fn unkeyed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: BTreeMap::new(),
        }
    }
}

/// An ordered sequence of path elements, as delivered on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path(pub Vec<PathElement>);

impl Path {
    pub fn new(elements: Vec<PathElement>) -> Self {
        Self(elements)
    }

    /// Merges a prefix path in front of this path, per the unmarshal
    /// contract's "merge prefix and update paths" step.
    pub fn merged(prefix: &Path, update: &Path) -> Path {
        let mut elements = Vec::with_capacity(prefix.0.len() + update.0.len());
        elements.extend(prefix.0.iter().cloned());
        elements.extend(update.0.iter().cloned());
        Path(elements)
    }

    pub fn element_names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|e| e.name.as_str())
    }
}

fn trim_element(e: &str) -> &str {
    e.trim_matches('/')
}

/// A compiled predicate over a path's element names. Construct once via
/// [`Matcher::contains`] or [`Matcher::contains_any`]; evaluate via
/// [`Matcher::matches`].
pub struct Matcher {
    elements: Vec<String>,
    mode: Mode,
}

enum Mode {
    All,
    Any,
}

impl Matcher {
    /// True iff every argument appears (in any position, any order) among
    /// the path's element names.
    pub fn contains(elements: &[&str]) -> Self {
        Self {
            elements: elements.iter().map(|e| trim_element(e).to_string()).collect(),
            mode: Mode::All,
        }
    }

    /// True iff at least one argument appears among the path's element
    /// names.
    pub fn contains_any(elements: &[&str]) -> Self {
        Self {
            elements: elements.iter().map(|e| trim_element(e).to_string()).collect(),
            mode: Mode::Any,
        }
    }

    pub fn matches(&self, path: &Path) -> bool {
        match self.mode {
            Mode::All => self
                .elements
                .iter()
                .all(|needle| path.element_names().any(|name| name == needle)),
            Mode::Any => self
                .elements
                .iter()
                .any(|needle| path.element_names().any(|name| name == needle)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(names: &[&str]) -> Path {
        Path(names.iter().map(|n| PathElement::unkeyed(*n)).collect())
    }

    #[test]
    fn contains_is_order_insensitive() {
        let m = Matcher::contains(&["interfaces", "interface", "state"]);
        assert!(m.matches(&path(&["interfaces", "interface", "state", "counters"])));
        assert!(m.matches(&path(&["state", "interfaces", "interface"])));
        assert!(!m.matches(&path(&["interfaces", "interface"])));
    }

    #[test]
    fn contains_trims_separators() {
        let m = Matcher::contains(&["/interfaces/", "/interface"]);
        assert!(m.matches(&path(&["interfaces", "interface"])));
    }

    #[test]
    fn contains_any_matches_first_hit() {
        let m = Matcher::contains_any(&["ifindex", "counters"]);
        assert!(m.matches(&path(&["interfaces", "interface", "state", "ifindex"])));
        assert!(!m.matches(&path(&["interfaces", "interface", "state"])));
    }
}
