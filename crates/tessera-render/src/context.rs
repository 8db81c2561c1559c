/*
 * context.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error context paths.
//!
//! A [`ContextPath`] is the trail of ancestor identifiers leading to the node
//! currently being rendered. Paths are immutable: [`ContextPath::child`]
//! returns a new path and leaves the parent untouched, so concurrently
//! rendered siblings never see each other's segments. Paths only annotate
//! failures and never influence a rendered value.

use std::fmt;
use std::sync::Arc;

/// Separator used when a path is displayed without explicit configuration.
pub const DEFAULT_SEPARATOR: &str = " > ";

/// An immutable trail of ancestor identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextPath {
    segments: Arc<Vec<String>>,
}

impl ContextPath {
    /// The empty path.
    pub fn root() -> Self {
        Self::default()
    }

    /// A copy of this path with one more segment appended.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend(self.segments.iter().cloned());
        segments.push(segment.into());
        Self {
            segments: Arc::new(segments),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Join the segments with `separator`.
    pub fn display(&self, separator: &str) -> String {
        self.segments.join(separator)
    }
}

impl fmt::Display for ContextPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display(DEFAULT_SEPARATOR))
    }
}

impl<S: Into<String>> FromIterator<S> for ContextPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            segments: Arc::new(iter.into_iter().map(Into::into).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_does_not_mutate_parent() {
        let parent = ContextPath::root().child("Deployment").child("spec");
        let left = parent.child("Containers");
        let right = parent.child("Volumes");

        assert_eq!(parent.segments(), &["Deployment", "spec"]);
        assert_eq!(left.segments(), &["Deployment", "spec", "Containers"]);
        assert_eq!(right.segments(), &["Deployment", "spec", "Volumes"]);
        assert_eq!(parent.len(), 2);
        assert_eq!(left.len(), 3);
    }

    #[test]
    fn test_display() {
        let path: ContextPath = ["Deployment", "spec", "Containers", "unknown"]
            .into_iter()
            .collect();
        assert_eq!(path.to_string(), "Deployment > spec > Containers > unknown");
        assert_eq!(path.display("/"), "Deployment/spec/Containers/unknown");
        assert_eq!(ContextPath::root().to_string(), "");
        assert!(ContextPath::root().is_empty());
    }
}
