//! Backend operations trait.
//!
//! A backend is a live capability object bound to one `(scheme, authority)`
//! pair. It owns no per-request state; channels and the transfer engine
//! drive it through this trait. All calls are blocking — `probe`, `fetch`,
//! `create`, and `delete` are the only operations that touch the network or
//! disk.

use std::fmt;
use std::io;

use crate::error::{VfsError, VfsResult};
use crate::path::{BackendId, VPath};
use crate::types::{Capabilities, FetchChunk, ResourceConfig, ResourceMeta};

/// Options a backend is constructed with.
///
/// Compared verbatim when a live backend is re-opened: the registry rejects
/// a conflicting re-open rather than racing two instances per authority.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendOptions {
    /// Working path that relative paths are resolved under.
    pub working_path: Vec<String>,
    /// Force the backend read-only even when the protocol could write.
    pub read_only: bool,
}

impl BackendOptions {
    /// Default options: root working path, writable where supported.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the working path from a `/`-separated string.
    pub fn with_working_path(mut self, path: &str) -> Self {
        self.working_path = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        self
    }

    /// Force read-only.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

/// Core backend operations.
///
/// Contracts:
/// - `probe` reports absence via `ResourceMeta::missing()`, not an error;
///   errors are reserved for auth and transport failures.
/// - `fetch` returns exactly `len` bytes unless the end of the resource is
///   reached; a short or empty chunk means end-of-data, never an error.
/// - Mutating operations have default implementations that fail with a
///   descriptive [`VfsError::Unsupported`]; write-capable backends override
///   them and advertise the capability.
pub trait BackendOps: Send + Sync {
    /// The `(scheme, authority)` identity this backend serves.
    fn id(&self) -> &BackendId;

    /// Capability flags, fixed at construction time.
    fn capabilities(&self) -> Capabilities;

    /// Working path for anchoring relative paths.
    fn working_path(&self) -> &[String];

    /// Cheap metadata probe (e.g. a header-only request).
    fn probe(&self, path: &VPath, config: &ResourceConfig) -> VfsResult<ResourceMeta>;

    /// Fetch up to `len` bytes starting at `offset`.
    fn fetch(
        &self,
        path: &VPath,
        offset: u64,
        len: usize,
        config: &ResourceConfig,
    ) -> VfsResult<FetchChunk>;

    /// Open a writer that creates (or replaces) the resource.
    fn create(&self, path: &VPath) -> VfsResult<Box<dyn io::Write + Send>> {
        let _ = path;
        Err(VfsError::unsupported(format!(
            "{} does not support writing",
            self.id()
        )))
    }

    /// Delete the resource.
    fn delete(&self, path: &VPath) -> VfsResult<()> {
        let _ = path;
        Err(VfsError::unsupported(format!(
            "{} does not support deletion",
            self.id()
        )))
    }

    /// List the names under a directory-like path.
    fn list(&self, path: &VPath) -> VfsResult<Vec<String>> {
        let _ = path;
        Err(VfsError::unsupported(format!(
            "{} does not support directory listing",
            self.id()
        )))
    }

    /// Mark the backend closed. Idempotent. Paths bound to a closed backend
    /// stop resolving to live operations.
    fn close(&self);

    /// Whether [`BackendOps::close`] has been called.
    fn is_closed(&self) -> bool;

    /// Guard used by operations that require a live backend.
    fn ensure_open(&self) -> VfsResult<()> {
        if self.is_closed() {
            Err(VfsError::closed(self.id().to_string()))
        } else {
            Ok(())
        }
    }

    /// Build a path bound to this backend from a path string.
    fn path(&self, path: &str) -> VfsResult<VPath> {
        VPath::new(self.id().clone(), path)
    }

    /// Guard that the given path belongs to this backend.
    fn ensure_same_backend(&self, path: &VPath) -> VfsResult<()> {
        if path.backend_id() != self.id() {
            Err(VfsError::cross_backend(
                self.id().to_string(),
                path.backend_id().to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

impl fmt::Debug for dyn BackendOps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendOps").field("id", self.id()).finish()
    }
}
