//! Backend registry.
//!
//! Maps each `(scheme, authority)` pair to a single live backend instance.
//! The registry is an explicit, injectable object — construction is
//! memoized because a network backend is expensive to set up, and the map's
//! atomic entry API guarantees concurrent opens of one key observe exactly
//! one instance.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use crate::backend::{BackendOps, BackendOptions};
use crate::channel::RangeChannel;
use crate::error::{VfsError, VfsResult};
use crate::path::{BackendId, VPath};
use crate::types::{ResourceConfig, ResourceMeta};

/// Constructs a backend for a scheme the first time its key is opened.
pub trait BackendFactory: Send + Sync {
    /// Build a backend for the given identity and options.
    fn create(&self, id: &BackendId, options: &BackendOptions) -> VfsResult<Arc<dyn BackendOps>>;
}

impl<F> BackendFactory for F
where
    F: Fn(&BackendId, &BackendOptions) -> VfsResult<Arc<dyn BackendOps>> + Send + Sync,
{
    fn create(&self, id: &BackendId, options: &BackendOptions) -> VfsResult<Arc<dyn BackendOps>> {
        self(id, options)
    }
}

struct BackendEntry {
    ops: Arc<dyn BackendOps>,
    options: BackendOptions,
}

/// Registry of live backends, keyed by `(scheme, authority)`.
#[derive(Default)]
pub struct BackendRegistry {
    factories: DashMap<String, Arc<dyn BackendFactory>>,
    backends: DashMap<BackendId, BackendEntry>,
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("schemes", &self.factories.len())
            .field("backends", &self.backends.len())
            .finish()
    }
}

impl BackendRegistry {
    /// Create an empty registry with no schemes registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for a scheme (e.g. `https`).
    pub fn register_scheme(&self, scheme: impl Into<String>, factory: impl BackendFactory + 'static) {
        let scheme = scheme.into().to_ascii_lowercase();
        self.factories.insert(scheme, Arc::new(factory));
    }

    /// Get the live backend for a key, creating it with default options if
    /// absent. An existing instance is returned regardless of the options
    /// it was created with.
    pub fn open(&self, scheme: &str, authority: &str) -> VfsResult<Arc<dyn BackendOps>> {
        let id = BackendId::new(scheme, authority)?;
        self.open_id(&id, None)
    }

    /// Get the live backend for a key, creating it with the given options.
    ///
    /// If the key is already live and its options differ, the call is
    /// rejected with [`VfsError::Conflict`] — there is never more than one
    /// backend per `(scheme, authority)`.
    pub fn open_with(
        &self,
        scheme: &str,
        authority: &str,
        options: BackendOptions,
    ) -> VfsResult<Arc<dyn BackendOps>> {
        let id = BackendId::new(scheme, authority)?;
        self.open_id(&id, Some(options))
    }

    fn open_id(
        &self,
        id: &BackendId,
        options: Option<BackendOptions>,
    ) -> VfsResult<Arc<dyn BackendOps>> {
        // The entry holds its shard lock across creation, so concurrent
        // opens of one key serialize and observe a single instance.
        match self.backends.entry(id.clone()) {
            Entry::Occupied(entry) => {
                if let Some(requested) = options
                    && requested != entry.get().options
                {
                    return Err(VfsError::conflict(format!(
                        "{id} is already open with different options"
                    )));
                }
                Ok(Arc::clone(&entry.get().ops))
            }
            Entry::Vacant(entry) => {
                let factory = self
                    .factories
                    .get(id.scheme())
                    .ok_or_else(|| {
                        VfsError::unsupported(format!(
                            "no backend registered for scheme {:?}",
                            id.scheme()
                        ))
                    })?
                    .clone();
                let options = options.unwrap_or_default();
                let ops = factory.create(id, &options)?;
                debug!(backend = %id, "opened backend");
                entry.insert(BackendEntry {
                    ops: Arc::clone(&ops),
                    options,
                });
                Ok(ops)
            }
        }
    }

    /// Insert a pre-built backend under its own identity.
    ///
    /// Rejected with [`VfsError::Conflict`] when the key is already live.
    pub fn insert(&self, ops: Arc<dyn BackendOps>, options: BackendOptions) -> VfsResult<()> {
        let id = ops.id().clone();
        match self.backends.entry(id.clone()) {
            Entry::Occupied(_) => Err(VfsError::conflict(format!("{id} is already open"))),
            Entry::Vacant(entry) => {
                entry.insert(BackendEntry { ops, options });
                Ok(())
            }
        }
    }

    /// The live backend a path is bound to.
    pub fn backend_for(&self, path: &VPath) -> VfsResult<Arc<dyn BackendOps>> {
        self.backends
            .get(path.backend_id())
            .map(|e| Arc::clone(&e.ops))
            .ok_or_else(|| VfsError::closed(format!("{} is not open", path.backend_id())))
    }

    /// Close and drop the backend for a key. Idempotent: closing an absent
    /// or already-closed backend is a no-op. Returns whether a live backend
    /// was removed.
    pub fn close(&self, id: &BackendId) -> bool {
        match self.backends.remove(id) {
            Some((_, entry)) => {
                entry.ops.close();
                debug!(backend = %id, "closed backend");
                true
            }
            None => false,
        }
    }

    /// Parse a URI and ensure its backend is open (creating it with default
    /// options when needed).
    pub fn path(&self, uri: &str) -> VfsResult<VPath> {
        let path = VPath::parse(uri)?;
        self.open_id(path.backend_id(), None)?;
        Ok(path)
    }

    /// Anchor a path at its backend's working path.
    pub fn absolutize(&self, path: &VPath) -> VfsResult<VPath> {
        let backend = self.backend_for(path)?;
        Ok(path.to_absolute(backend.working_path()))
    }

    /// Probe a resource's metadata.
    pub fn probe(&self, path: &VPath, config: &ResourceConfig) -> VfsResult<ResourceMeta> {
        let backend = self.backend_for(path)?;
        backend.ensure_open()?;
        let abs = path.to_absolute(backend.working_path());
        backend.probe(&abs, config)
    }

    /// Open a read channel on a resource.
    pub fn open_read(&self, path: &VPath, config: ResourceConfig) -> VfsResult<RangeChannel> {
        let backend = self.backend_for(path)?;
        backend.ensure_open()?;
        if !backend.capabilities().read {
            return Err(VfsError::unsupported(format!(
                "{} does not support reading",
                backend.id()
            )));
        }
        let abs = path.to_absolute(backend.working_path());
        Ok(RangeChannel::new(backend, abs, config))
    }

    /// Open a read channel with explicit credentials.
    pub fn open_read_with_credentials(
        &self,
        path: &VPath,
        user: &str,
        password: &str,
    ) -> VfsResult<RangeChannel> {
        self.open_read(path, ResourceConfig::new().with_credentials(user, password))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryBackend;
    use std::sync::Barrier;
    use std::thread;

    fn memory_registry() -> BackendRegistry {
        let registry = BackendRegistry::new();
        registry.register_scheme("memory", |id: &BackendId, options: &BackendOptions| {
            Ok(Arc::new(MemoryBackend::with_options(id.clone(), options)) as Arc<dyn BackendOps>)
        });
        registry
    }

    #[test]
    fn test_open_is_memoized() {
        let registry = memory_registry();
        let a = registry.open("memory", "box").unwrap();
        let b = registry.open("memory", "box").unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        // Distinct authorities get distinct backends.
        let c = registry.open("memory", "other").unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn test_concurrent_open_yields_one_instance() {
        let registry = Arc::new(memory_registry());
        let n = 8;
        let barrier = Arc::new(Barrier::new(n));

        let handles: Vec<_> = (0..n)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    registry.open("memory", "shared").unwrap()
                })
            })
            .collect();

        let backends: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for b in &backends[1..] {
            assert!(Arc::ptr_eq(&backends[0], b));
        }
    }

    #[test]
    fn test_conflicting_reopen_rejected() {
        let registry = memory_registry();
        registry
            .open_with(
                "memory",
                "box",
                BackendOptions::new().with_working_path("srv/pub"),
            )
            .unwrap();

        // Same options: fine, same instance.
        assert!(
            registry
                .open_with(
                    "memory",
                    "box",
                    BackendOptions::new().with_working_path("srv/pub"),
                )
                .is_ok()
        );

        // Different options: rejected.
        let err = registry
            .open_with("memory", "box", BackendOptions::new())
            .unwrap_err();
        assert!(matches!(err, VfsError::Conflict(_)));

        // Optionless open reuses the live instance.
        assert!(registry.open("memory", "box").is_ok());
    }

    #[test]
    fn test_close_is_idempotent() {
        let registry = memory_registry();
        let backend = registry.open("memory", "box").unwrap();
        let id = backend.id().clone();

        assert!(registry.close(&id));
        assert!(backend.is_closed());
        assert!(!registry.close(&id));

        // Paths bound to a closed backend stop resolving.
        let path = VPath::parse("memory://box/file.txt").unwrap();
        assert!(matches!(
            registry.probe(&path, &ResourceConfig::new()),
            Err(VfsError::Closed(_))
        ));
    }

    #[test]
    fn test_unknown_scheme_rejected() {
        let registry = memory_registry();
        let err = registry.open("gopher", "example.com").unwrap_err();
        assert!(matches!(err, VfsError::Unsupported(_)));
    }

    #[test]
    fn test_path_auto_opens_backend() {
        let registry = memory_registry();
        let path = registry.path("memory://box/a/b.txt").unwrap();
        assert_eq!(path.segments(), ["a", "b.txt"]);
        assert!(registry.backend_for(&path).is_ok());
    }
}
