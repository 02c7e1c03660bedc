//! Backend-scoped hierarchical paths.
//!
//! A [`VPath`] is an immutable location value: which backend it belongs to,
//! an ordered list of segments, and whether it is anchored at the backend
//! root. It says nothing about whether the resource exists.
//!
//! All path-producing operations return new values. Two paths are equal iff
//! backend identity, segment sequence, and absoluteness all match.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{VfsError, VfsResult};

/// Identity of a backend: one `(scheme, authority)` pair.
///
/// Distinct authorities never share a backend, so credentials and
/// connection state never cross host boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BackendId {
    scheme: String,
    authority: String,
}

impl BackendId {
    /// Create a backend identity. The scheme is normalized to lowercase.
    ///
    /// The authority may be empty (e.g. `file://`), but may not contain
    /// a path separator.
    pub fn new(scheme: impl Into<String>, authority: impl Into<String>) -> VfsResult<Self> {
        let scheme = scheme.into().to_ascii_lowercase();
        let authority = authority.into();
        if scheme.is_empty()
            || !scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        {
            return Err(VfsError::invalid_path(format!("bad scheme: {scheme:?}")));
        }
        if authority.contains('/') {
            return Err(VfsError::invalid_path(format!(
                "authority may not contain '/': {authority:?}"
            )));
        }
        Ok(Self { scheme, authority })
    }

    /// Protocol scheme, lowercase (e.g. `https`).
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Authority: `host[:port]`, possibly empty.
    pub fn authority(&self) -> &str {
        &self.authority
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority)
    }
}

/// An immutable, backend-scoped hierarchical path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VPath {
    backend: BackendId,
    segments: Vec<String>,
    absolute: bool,
}

impl VPath {
    /// The root path of a backend: absolute, zero segments.
    pub fn root(backend: BackendId) -> Self {
        Self {
            backend,
            segments: Vec::new(),
            absolute: true,
        }
    }

    /// Build a path from a backend identity and a path string.
    ///
    /// A leading `/` marks the path absolute; anything else (including the
    /// empty string) yields a relative path. Empty segments are dropped, so
    /// `a//b` and `a/b` are the same path.
    pub fn new(backend: BackendId, path: &str) -> VfsResult<Self> {
        let absolute = path.starts_with('/');
        let segments = split_segments(path)?;
        Ok(Self {
            backend,
            segments,
            absolute,
        })
    }

    /// Parse a full URI of the form `scheme://authority[/path]`.
    ///
    /// A missing path means the backend root. URI-born paths are always
    /// absolute.
    pub fn parse(uri: &str) -> VfsResult<Self> {
        let (scheme, rest) = uri
            .split_once("://")
            .ok_or_else(|| VfsError::invalid_path(format!("missing scheme: {uri:?}")))?;
        let (authority, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, "/"),
        };
        let backend = BackendId::new(scheme, authority)?;
        Self::new(backend, path)
    }

    /// The backend this path is bound to.
    pub fn backend_id(&self) -> &BackendId {
        &self.backend
    }

    /// Path segments, in order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// True when the path is anchored at the backend root.
    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// True for the backend root (absolute, zero segments).
    pub fn is_root(&self) -> bool {
        self.absolute && self.segments.is_empty()
    }

    /// The root of this path's backend.
    pub fn backend_root(&self) -> VPath {
        VPath::root(self.backend.clone())
    }

    /// Last segment, or `None` for the root and the empty relative path.
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Parent path. The root has no parent; a single-segment absolute path
    /// has the root as its parent. A relative path with no segments has no
    /// parent either.
    pub fn parent(&self) -> Option<VPath> {
        if self.segments.is_empty() {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Some(Self {
            backend: self.backend.clone(),
            segments,
            absolute: self.absolute,
        })
    }

    /// Resolve `other` against this path.
    ///
    /// Returns `other` unchanged when it is absolute, and this path
    /// unchanged when `other` is the empty relative path. Otherwise the
    /// segments are concatenated.
    pub fn resolve(&self, other: &VPath) -> VfsResult<VPath> {
        if other.backend != self.backend {
            return Err(VfsError::cross_backend(
                self.backend.to_string(),
                other.backend.to_string(),
            ));
        }
        if other.absolute {
            return Ok(other.clone());
        }
        if other.segments.is_empty() {
            return Ok(self.clone());
        }
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Ok(Self {
            backend: self.backend.clone(),
            segments,
            absolute: self.absolute,
        })
    }

    /// Resolve a path string against this path. A leading `/` makes it
    /// absolute in this backend.
    pub fn resolve_str(&self, path: &str) -> VfsResult<VPath> {
        let other = VPath::new(self.backend.clone(), path)?;
        self.resolve(&other)
    }

    /// Replace the last segment: `parent().resolve(name)`.
    ///
    /// Undefined on paths with no parent (the root and the empty relative
    /// path).
    pub fn resolve_sibling(&self, name: &str) -> VfsResult<VPath> {
        let parent = self.parent().ok_or_else(|| {
            VfsError::invalid_path(format!("{self}: no parent to resolve a sibling in"))
        })?;
        parent.resolve_str(name)
    }

    /// Express `other` relative to this path.
    ///
    /// Both paths must share backend and absoluteness, and this path must
    /// be a segment prefix of `other`; the suffix comes back as a relative
    /// path.
    pub fn relativize(&self, other: &VPath) -> VfsResult<VPath> {
        if other.backend != self.backend {
            return Err(VfsError::cross_backend(
                self.backend.to_string(),
                other.backend.to_string(),
            ));
        }
        if self.absolute != other.absolute {
            return Err(VfsError::invalid_path(format!(
                "relativize requires matching absoluteness: {self} vs {other}"
            )));
        }
        if other.segments.len() < self.segments.len()
            || other.segments[..self.segments.len()] != self.segments[..]
        {
            return Err(VfsError::invalid_path(format!(
                "{self} is not a prefix of {other}"
            )));
        }
        Ok(Self {
            backend: self.backend.clone(),
            segments: other.segments[self.segments.len()..].to_vec(),
            absolute: false,
        })
    }

    /// Fold `.` and `..` segments.
    ///
    /// For an absolute path, a `..` that would climb above the root is an
    /// error. For a relative path, leading `..` segments are retained.
    pub fn normalize(&self) -> VfsResult<VPath> {
        let mut out: Vec<String> = Vec::with_capacity(self.segments.len());
        for seg in &self.segments {
            match seg.as_str() {
                "." => {}
                ".." => {
                    if out.last().is_some_and(|s| s != "..") {
                        out.pop();
                    } else if self.absolute {
                        return Err(VfsError::invalid_path(format!(
                            "{self}: path escapes the root"
                        )));
                    } else {
                        out.push("..".to_string());
                    }
                }
                _ => out.push(seg.clone()),
            }
        }
        Ok(Self {
            backend: self.backend.clone(),
            segments: out,
            absolute: self.absolute,
        })
    }

    /// Anchor a relative path under the given working path. Absolute paths
    /// come back unchanged.
    pub fn to_absolute(&self, working: &[String]) -> VPath {
        if self.absolute {
            return self.clone();
        }
        let mut segments = working.to_vec();
        segments.extend(self.segments.iter().cloned());
        Self {
            backend: self.backend.clone(),
            segments,
            absolute: true,
        }
    }

    /// Render the URI string for an absolute path.
    ///
    /// The root renders with a trailing slash (`https://host/`); other
    /// paths without one. Relative paths have no URI of their own — resolve
    /// them against the backend working path first.
    pub fn to_uri(&self) -> VfsResult<String> {
        if !self.absolute {
            return Err(VfsError::invalid_path(format!(
                "relative path has no URI: {self}"
            )));
        }
        if self.segments.is_empty() {
            return Ok(format!("{}/", self.backend));
        }
        Ok(format!("{}/{}", self.backend, self.segments.join("/")))
    }
}

impl fmt::Display for VPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.absolute {
            if self.segments.is_empty() {
                write!(f, "{}/", self.backend)
            } else {
                write!(f, "{}/{}", self.backend, self.segments.join("/"))
            }
        } else {
            write!(f, "{}", self.segments.join("/"))
        }
    }
}

/// Split a path string on `/`, dropping empty segments.
fn split_segments(path: &str) -> VfsResult<Vec<String>> {
    let mut segments = Vec::new();
    for seg in path.split('/') {
        if seg.is_empty() {
            continue;
        }
        if seg.contains(char::is_control) {
            return Err(VfsError::invalid_path(format!(
                "segment contains control characters: {seg:?}"
            )));
        }
        segments.push(seg.to_string());
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> BackendId {
        BackendId::new("https", "example.com").unwrap()
    }

    fn parse(uri: &str) -> VPath {
        VPath::parse(uri).unwrap()
    }

    #[test]
    fn test_parse_forms() {
        let p = parse("https://example.com/foo/bar");
        assert_eq!(p.backend_id().scheme(), "https");
        assert_eq!(p.backend_id().authority(), "example.com");
        assert_eq!(p.segments(), ["foo", "bar"]);
        assert!(p.is_absolute());

        // Missing path means the backend root.
        assert!(parse("https://example.com").is_root());
        assert!(parse("https://example.com/").is_root());

        // Empty segments are dropped.
        assert_eq!(parse("https://example.com//foo///bar").segments(), ["foo", "bar"]);

        // Empty authority is legal (file://).
        assert_eq!(parse("file:///tmp/x").backend_id().authority(), "");

        // Scheme is normalized to lowercase.
        assert_eq!(parse("HTTPS://example.com/a"), parse("https://example.com/a"));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(VPath::parse("no-scheme-here").is_err());
        assert!(VPath::parse("://example.com/x").is_err());
        assert!(VPath::parse("ht tp://example.com/x").is_err());
    }

    #[test]
    fn test_parent_resolve_round_trip() {
        // For all absolute paths with >= 1 segment:
        // p.parent().resolve(p.file_name()) == p
        for uri in [
            "https://example.com/a",
            "https://example.com/a/b",
            "https://example.com/a/b/c.txt",
        ] {
            let p = parse(uri);
            let parent = p.parent().unwrap();
            let name = p.file_name().unwrap();
            assert_eq!(parent.resolve_str(name).unwrap(), p);
        }
    }

    #[test]
    fn test_root_properties() {
        let root = parse("https://example.com/");
        assert!(root.is_absolute());
        assert!(root.parent().is_none());
        assert!(root.file_name().is_none());
        assert_eq!(root.to_uri().unwrap(), "https://example.com/");
    }

    #[test]
    fn test_single_segment_parent_is_root() {
        let p = parse("https://example.com/foo");
        assert!(p.parent().unwrap().is_root());
    }

    #[test]
    fn test_uri_round_trip() {
        for uri in [
            "https://example.com/",
            "https://example.com/foo",
            "https://example.com/foo/bar",
            "http://example.com:8080/a/b",
            "file:///tmp/data.bin",
        ] {
            let p = parse(uri);
            assert_eq!(VPath::parse(&p.to_uri().unwrap()).unwrap(), p);
        }
    }

    #[test]
    fn test_resolve_absolute_wins() {
        let base = parse("https://example.com/a/b");
        let abs = parse("https://example.com/x");
        assert_eq!(base.resolve(&abs).unwrap(), abs);
    }

    #[test]
    fn test_resolve_empty_is_identity() {
        let base = parse("https://example.com/a/b");
        let empty = VPath::new(backend(), "").unwrap();
        assert_eq!(base.resolve(&empty).unwrap(), base);
    }

    #[test]
    fn test_resolve_concatenates() {
        let base = parse("https://example.com/a");
        let joined = base.resolve_str("b/c").unwrap();
        assert_eq!(joined, parse("https://example.com/a/b/c"));
    }

    #[test]
    fn test_resolve_cross_backend_rejected() {
        let a = parse("https://example.com/a");
        let b = parse("https://other.example.com/b");
        assert!(matches!(
            a.resolve(&b),
            Err(VfsError::CrossBackend { .. })
        ));
    }

    #[test]
    fn test_resolve_sibling() {
        let p = parse("https://example.com/a/b");
        let sibling = p.resolve_sibling("x").unwrap();
        assert_eq!(sibling.parent(), p.parent());
        assert_eq!(sibling.file_name(), Some("x"));

        let root = parse("https://example.com/");
        assert!(root.resolve_sibling("x").is_err());
    }

    #[test]
    fn test_relativize() {
        let base = parse("https://example.com/a/b");
        let deep = parse("https://example.com/a/b/c/d");
        let rel = base.relativize(&deep).unwrap();
        assert!(!rel.is_absolute());
        assert_eq!(rel.segments(), ["c", "d"]);
        assert_eq!(base.resolve(&rel).unwrap(), deep);

        // Not a prefix.
        let other = parse("https://example.com/z");
        assert!(base.relativize(&other).is_err());

        // Mixed absoluteness.
        let rel_only = VPath::new(backend(), "a/b").unwrap();
        assert!(base.relativize(&rel_only).is_err());
    }

    #[test]
    fn test_normalize() {
        let p = VPath::new(backend(), "/a/./b/../c").unwrap();
        assert_eq!(p.normalize().unwrap().segments(), ["a", "c"]);

        // Climbing above an absolute root is an error.
        let escape = VPath::new(backend(), "/a/../..").unwrap();
        assert!(escape.normalize().is_err());

        // Relative paths keep leading dot-dots.
        let rel = VPath::new(backend(), "../x").unwrap();
        assert_eq!(rel.normalize().unwrap().segments(), ["..", "x"]);
    }

    #[test]
    fn test_to_absolute_prepends_working_path() {
        let rel = VPath::new(backend(), "data/file.bin").unwrap();
        let working = vec!["srv".to_string(), "pub".to_string()];
        let abs = rel.to_absolute(&working);
        assert!(abs.is_absolute());
        assert_eq!(abs.segments(), ["srv", "pub", "data", "file.bin"]);

        // Already-absolute paths are untouched.
        let p = parse("https://example.com/a");
        assert_eq!(p.to_absolute(&working), p);
    }

    #[test]
    fn test_relative_path_has_no_uri() {
        let rel = VPath::new(backend(), "a/b").unwrap();
        assert!(rel.to_uri().is_err());
    }

    #[test]
    fn test_parent_chain_uri_rendering() {
        let p = parse("https://example.com/foo/bar");
        let parent = p.parent().unwrap();
        assert_eq!(parent, parse("https://example.com/foo"));
        assert_eq!(parent.to_uri().unwrap(), "https://example.com/foo");
    }
}
