//! VFS error taxonomy.
//!
//! Every variant maps to one retry posture: `Transport` is the only class a
//! caller may retry; everything else is terminal at the call site that
//! raised it.

use std::io;
use thiserror::Error;

/// VFS error type.
#[derive(Debug, Error)]
pub enum VfsError {
    /// Malformed URI or path string. A caller bug, never retried.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// An operation mixed paths from two different backends.
    #[error("cross-backend operation: {left} vs {right}")]
    CrossBackend { left: String, right: String },

    /// Resource absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Authorization rejected. Terminal unless the caller supplies
    /// different credentials.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Network or protocol failure. `bytes_delivered` counts the bytes the
    /// caller received on this stream before the failure, so partial-copy
    /// cleanup is possible.
    #[error("transport failure after {bytes_delivered} bytes: {message}")]
    Transport {
        message: String,
        bytes_delivered: u64,
    },

    /// Operation not in this backend's capability set. The message names
    /// the allowed alternative where one exists.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Backend (or channel) has been closed.
    #[error("closed: {0}")]
    Closed(String),

    /// A backend was re-opened with options conflicting with the live
    /// instance.
    #[error("conflicting backend options: {0}")]
    Conflict(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl VfsError {
    /// Create an InvalidPath error.
    pub fn invalid_path(msg: impl Into<String>) -> Self {
        Self::InvalidPath(msg.into())
    }

    /// Create a CrossBackend error.
    pub fn cross_backend(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self::CrossBackend {
            left: left.into(),
            right: right.into(),
        }
    }

    /// Create a NotFound error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create an AccessDenied error.
    pub fn access_denied(msg: impl Into<String>) -> Self {
        Self::AccessDenied(msg.into())
    }

    /// Create a Transport error with no bytes delivered.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport {
            message: msg.into(),
            bytes_delivered: 0,
        }
    }

    /// Create an Unsupported error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Create a Closed error.
    pub fn closed(msg: impl Into<String>) -> Self {
        Self::Closed(msg.into())
    }

    /// Create a Conflict error.
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// True for the only error class eligible for caller-driven retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Prefix the error message with operation context (e.g. the source and
    /// destination of a transfer), preserving the variant.
    pub fn context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            Self::InvalidPath(m) => Self::InvalidPath(format!("{ctx}: {m}")),
            // Both offending backends are already named; context adds nothing.
            e @ Self::CrossBackend { .. } => e,
            Self::NotFound(m) => Self::NotFound(format!("{ctx}: {m}")),
            Self::AccessDenied(m) => Self::AccessDenied(format!("{ctx}: {m}")),
            Self::Transport {
                message,
                bytes_delivered,
            } => Self::Transport {
                message: format!("{ctx}: {message}"),
                bytes_delivered,
            },
            Self::Unsupported(m) => Self::Unsupported(format!("{ctx}: {m}")),
            Self::Closed(m) => Self::Closed(format!("{ctx}: {m}")),
            Self::Conflict(m) => Self::Conflict(format!("{ctx}: {m}")),
            Self::Io(e) => Self::Io(io::Error::new(e.kind(), format!("{ctx}: {e}"))),
        }
    }
}

/// Convert VfsError to std::io::Error so channels can implement
/// [`std::io::Read`] and [`std::io::Seek`].
impl From<VfsError> for io::Error {
    fn from(e: VfsError) -> Self {
        let kind = match &e {
            VfsError::InvalidPath(_) | VfsError::CrossBackend { .. } => io::ErrorKind::InvalidInput,
            VfsError::NotFound(_) => io::ErrorKind::NotFound,
            VfsError::AccessDenied(_) => io::ErrorKind::PermissionDenied,
            VfsError::Transport { .. } => io::ErrorKind::ConnectionAborted,
            VfsError::Unsupported(_) => io::ErrorKind::Unsupported,
            VfsError::Closed(_) => io::ErrorKind::NotConnected,
            VfsError::Conflict(_) => io::ErrorKind::AlreadyExists,
            VfsError::Io(e) => e.kind(),
        };
        match e {
            VfsError::Io(e) => e,
            other => io::Error::new(kind, other.to_string()),
        }
    }
}

/// VFS result type.
pub type VfsResult<T> = Result<T, VfsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(VfsError::transport("connection reset").is_retryable());
        assert!(!VfsError::not_found("x").is_retryable());
        assert!(!VfsError::unsupported("y").is_retryable());
        assert!(!VfsError::invalid_path("z").is_retryable());
    }

    #[test]
    fn test_context_preserves_variant_and_bytes() {
        let e = VfsError::Transport {
            message: "reset".into(),
            bytes_delivered: 42,
        }
        .context("copy a -> b");
        match e {
            VfsError::Transport {
                message,
                bytes_delivered,
            } => {
                assert!(message.starts_with("copy a -> b"));
                assert_eq!(bytes_delivered, 42);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_io_conversion() {
        let e: io::Error = VfsError::not_found("missing.txt").into();
        assert_eq!(e.kind(), io::ErrorKind::NotFound);

        let e: io::Error = VfsError::access_denied("401").into();
        assert_eq!(e.kind(), io::ErrorKind::PermissionDenied);
    }
}
