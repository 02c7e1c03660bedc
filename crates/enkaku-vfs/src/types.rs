//! Core VFS value types.
//!
//! These are deliberately small, serializable values: size hints, backend
//! capability flags, per-open resource configuration, and probe results.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Resource size, possibly not yet known.
///
/// Protocols may be unable to report a length without a full fetch; callers
/// must tolerate `Unknown` and sizes discovered incrementally. Modeled as a
/// tagged union so "unknown" can never leak into arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeHint {
    /// Exact size in bytes.
    Known(u64),
    /// Size not yet discovered.
    Unknown,
}

impl SizeHint {
    /// Returns true if the size is known.
    pub fn is_known(&self) -> bool {
        matches!(self, SizeHint::Known(_))
    }

    /// The size, if known.
    pub fn known(&self) -> Option<u64> {
        match self {
            SizeHint::Known(n) => Some(*n),
            SizeHint::Unknown => None,
        }
    }
}

impl std::fmt::Display for SizeHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SizeHint::Known(n) => write!(f, "{n}"),
            SizeHint::Unknown => write!(f, "unknown"),
        }
    }
}

/// Construction-time capability flags for a backend.
///
/// The transfer engine consults these before attempting an operation, so a
/// capability violation is a descriptive error up front rather than a
/// protocol error mid-flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Resources can be read.
    pub read: bool,
    /// New resources can be created and written.
    pub write: bool,
    /// Resources can be deleted.
    pub delete: bool,
    /// Partial-range fetches are supported natively.
    pub range_read: bool,
    /// Directories can be listed.
    pub list: bool,
}

impl Capabilities {
    /// Read-only backend with native range fetches (e.g. HTTP).
    pub fn read_only_ranged() -> Self {
        Self {
            read: true,
            write: false,
            delete: false,
            range_read: true,
            list: false,
        }
    }

    /// Fully capable backend (e.g. local or in-memory storage).
    pub fn full() -> Self {
        Self {
            read: true,
            write: true,
            delete: true,
            range_read: true,
            list: true,
        }
    }

    /// Drop the mutating capabilities, keeping read/list.
    pub fn read_only(mut self) -> Self {
        self.write = false;
        self.delete = false;
        self
    }
}

/// Per-open resource configuration: credentials, extra headers, and the
/// request deadline.
///
/// Configuration travels here, explicitly, rather than through the
/// attribute side table — the attribute store holds only derived metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Username for backend authentication.
    pub user: Option<String>,
    /// Password for backend authentication.
    pub password: Option<String>,
    /// Extra protocol headers, applied verbatim.
    pub headers: Vec<(String, String)>,
    /// Deadline applied to every blocking call made under this config.
    pub deadline: Option<Duration>,
}

impl ResourceConfig {
    /// Empty configuration: anonymous, no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set credentials.
    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    /// Append a protocol header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the per-call deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Credentials as a pair, when both halves are present.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.user, &self.password) {
            (Some(u), Some(p)) => Some((u.as_str(), p.as_str())),
            _ => None,
        }
    }
}

/// Result of a cheap metadata probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMeta {
    /// Whether the resource exists.
    pub exists: bool,
    /// Reported size, if the backend could learn it cheaply.
    pub size: SizeHint,
    /// Backend-reported content type, if any.
    pub content_type: Option<String>,
    /// Whether the backend honors partial-range fetches for this resource.
    pub supports_ranges: bool,
}

impl ResourceMeta {
    /// Probe result for an absent resource.
    pub fn missing() -> Self {
        Self {
            exists: false,
            size: SizeHint::Unknown,
            content_type: None,
            supports_ranges: false,
        }
    }
}

/// One backend fetch: the bytes for a requested range plus whatever the
/// backend learned about the total size along the way.
#[derive(Debug, Clone)]
pub struct FetchChunk {
    /// The fetched bytes. Shorter than requested only at end of resource.
    pub data: Vec<u8>,
    /// Authoritative total size, when the response carried one.
    pub size: SizeHint,
}

impl FetchChunk {
    /// An empty chunk with a size report.
    pub fn empty(size: SizeHint) -> Self {
        Self {
            data: Vec::new(),
            size,
        }
    }
}
