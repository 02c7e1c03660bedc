//! Per-path attribute store.
//!
//! A side table of string-keyed metadata hanging off paths: detected
//! content types and opaque caller metadata. Attributes are never
//! persisted, and — deliberately — never carry input configuration;
//! credentials and deadlines travel in
//! [`ResourceConfig`](crate::types::ResourceConfig) instead, so the store
//! has exactly one meaning.

use dashmap::DashMap;
use tracing::debug;

use crate::error::VfsResult;
use crate::media;
use crate::path::VPath;
use crate::registry::BackendRegistry;
use crate::types::ResourceConfig;

/// Well-known attribute keys, namespaced `enkaku:`.
pub mod keys {
    /// Detected (or overridden) content type.
    pub const CONTENT_TYPE: &str = "enkaku:content-type";
}

/// How many leading bytes the sniffing fallback reads.
const SNIFF_LEN: usize = 512;

/// String-keyed attribute table, keyed by `(path, key)`.
#[derive(Debug, Default)]
pub struct AttrStore {
    entries: DashMap<(VPath, String), String>,
}

impl AttrStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an attribute.
    pub fn get(&self, path: &VPath, key: &str) -> Option<String> {
        self.entries
            .get(&(path.clone(), key.to_string()))
            .map(|v| v.clone())
    }

    /// Set an attribute.
    pub fn set(&self, path: &VPath, key: impl Into<String>, value: impl Into<String>) {
        self.entries
            .insert((path.clone(), key.into()), value.into());
    }

    /// Remove an attribute, returning the previous value.
    pub fn remove(&self, path: &VPath, key: &str) -> Option<String> {
        self.entries
            .remove(&(path.clone(), key.to_string()))
            .map(|(_, v)| v)
    }

    /// Detect the content type of a resource.
    ///
    /// Resolution order: an explicit override in the store, the
    /// backend-reported type from a metadata probe, an extension-based
    /// guess, then content sniffing of the leading bytes. The result is
    /// cached in the store per path.
    pub fn detect_content_type(
        &self,
        registry: &BackendRegistry,
        path: &VPath,
        config: &ResourceConfig,
    ) -> VfsResult<String> {
        if let Some(explicit) = self.get(path, keys::CONTENT_TYPE) {
            return Ok(explicit);
        }

        let meta = registry.probe(path, config)?;
        if let Some(reported) = meta.content_type {
            self.set(path, keys::CONTENT_TYPE, &reported);
            return Ok(reported);
        }

        if let Some(guessed) = path.file_name().and_then(media::from_extension) {
            self.set(path, keys::CONTENT_TYPE, guessed);
            return Ok(guessed.to_string());
        }

        debug!(path = %path, "sniffing content type from leading bytes");
        let mut channel = registry.open_read(path, config.clone())?;
        let mut head = vec![0u8; SNIFF_LEN];
        let mut filled = 0;
        while filled < head.len() {
            let n = channel.read_bytes(&mut head[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        head.truncate(filled);

        let sniffed = media::sniff(&head).unwrap_or(media::OCTET_STREAM);
        self.set(path, keys::CONTENT_TYPE, sniffed);
        Ok(sniffed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendOptions;
    use crate::backends::MemoryBackend;
    use crate::path::BackendId;
    use std::sync::Arc;

    fn setup() -> (BackendRegistry, MemoryBackendHandle) {
        let registry = BackendRegistry::new();
        let backend = Arc::new(MemoryBackend::new(BackendId::new("memory", "t").unwrap()));
        registry
            .insert(
                Arc::clone(&backend) as Arc<dyn crate::backend::BackendOps>,
                BackendOptions::new(),
            )
            .unwrap();
        (registry, MemoryBackendHandle(backend))
    }

    struct MemoryBackendHandle(Arc<MemoryBackend>);

    fn path(s: &str) -> VPath {
        VPath::parse(&format!("memory://t{s}")).unwrap()
    }

    #[test]
    fn test_get_set_remove() {
        let store = AttrStore::new();
        let p = path("/a.bin");
        assert_eq!(store.get(&p, "k"), None);
        store.set(&p, "k", "v");
        assert_eq!(store.get(&p, "k").as_deref(), Some("v"));

        // Attributes belong to the path value, not its parent or siblings.
        assert_eq!(store.get(&path("/other.bin"), "k"), None);

        assert_eq!(store.remove(&p, "k").as_deref(), Some("v"));
        assert_eq!(store.get(&p, "k"), None);
    }

    #[test]
    fn test_explicit_override_wins() {
        let (registry, handle) = setup();
        handle.0.put_typed("/doc", b"x".to_vec(), "application/pdf");

        let store = AttrStore::new();
        let p = path("/doc");
        store.set(&p, keys::CONTENT_TYPE, "text/x-custom");
        let ct = store
            .detect_content_type(&registry, &p, &ResourceConfig::new())
            .unwrap();
        assert_eq!(ct, "text/x-custom");
    }

    #[test]
    fn test_backend_reported_type() {
        let (registry, handle) = setup();
        handle.0.put_typed("/doc", b"x".to_vec(), "application/pdf");

        let store = AttrStore::new();
        let ct = store
            .detect_content_type(&registry, &path("/doc"), &ResourceConfig::new())
            .unwrap();
        assert_eq!(ct, "application/pdf");
        // Cached for the next lookup.
        assert_eq!(
            store.get(&path("/doc"), keys::CONTENT_TYPE).as_deref(),
            Some("application/pdf")
        );
    }

    #[test]
    fn test_sniff_fallback() {
        let (registry, handle) = setup();
        // No extension, no backend type: sniffing decides.
        handle.0.put("/blob", b"%PDF-1.4 ...".to_vec());

        let store = AttrStore::new();
        let ct = store
            .detect_content_type(&registry, &path("/blob"), &ResourceConfig::new())
            .unwrap();
        assert_eq!(ct, "application/pdf");
    }

    #[test]
    fn test_octet_stream_fallback() {
        let (registry, handle) = setup();
        handle.0.put("/blob", vec![0x00, 0xff, 0x00, 0xff]);

        let store = AttrStore::new();
        let ct = store
            .detect_content_type(&registry, &path("/blob"), &ResourceConfig::new())
            .unwrap();
        assert_eq!(ct, media::OCTET_STREAM);
    }
}
