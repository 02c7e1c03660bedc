//! In-memory backend.
//!
//! Fully capable (read, write, delete, list, ranges) and cheap, so it
//! doubles as scratch space and as the reference backend in tests.

use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::backend::{BackendOps, BackendOptions};
use crate::error::{VfsError, VfsResult};
use crate::media;
use crate::path::{BackendId, VPath};
use crate::types::{Capabilities, FetchChunk, ResourceConfig, ResourceMeta, SizeHint};

#[derive(Debug, Clone)]
struct MemoryEntry {
    data: Vec<u8>,
    content_type: Option<String>,
}

type FileMap = Arc<RwLock<HashMap<String, MemoryEntry>>>;

/// In-memory backend: a flat map of absolute path strings to byte vectors.
pub struct MemoryBackend {
    id: BackendId,
    files: FileMap,
    working: Vec<String>,
    read_only: bool,
    closed: AtomicBool,
}

impl MemoryBackend {
    /// Create an empty, writable backend.
    pub fn new(id: BackendId) -> Self {
        Self {
            id,
            files: Arc::new(RwLock::new(HashMap::new())),
            working: Vec::new(),
            read_only: false,
            closed: AtomicBool::new(false),
        }
    }

    /// Create a backend honoring registry options.
    pub fn with_options(id: BackendId, options: &BackendOptions) -> Self {
        let mut backend = Self::new(id);
        backend.working = options.working_path.clone();
        backend.read_only = options.read_only;
        backend
    }

    /// Seed a resource. The path is an absolute `/`-separated string.
    pub fn put(&self, path: &str, data: Vec<u8>) {
        self.files.write().insert(
            normalize_key(path),
            MemoryEntry {
                data,
                content_type: None,
            },
        );
    }

    /// Seed a resource with an explicit content type.
    pub fn put_typed(&self, path: &str, data: Vec<u8>, content_type: &str) {
        self.files.write().insert(
            normalize_key(path),
            MemoryEntry {
                data,
                content_type: Some(content_type.to_string()),
            },
        );
    }

    /// Resource contents, for assertions in tests.
    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.files
            .read()
            .get(&normalize_key(path))
            .map(|e| e.data.clone())
    }

    fn key(&self, path: &VPath) -> VfsResult<String> {
        let abs = path.to_absolute(&self.working).normalize()?;
        Ok(normalize_key(&abs.segments().join("/")))
    }

    fn check_writable(&self) -> VfsResult<()> {
        if self.read_only {
            Err(VfsError::unsupported(format!(
                "{} is read-only; writes are rejected",
                self.id
            )))
        } else {
            Ok(())
        }
    }
}

fn normalize_key(path: &str) -> String {
    let trimmed: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", trimmed.join("/"))
}

impl BackendOps for MemoryBackend {
    fn id(&self) -> &BackendId {
        &self.id
    }

    fn capabilities(&self) -> Capabilities {
        if self.read_only {
            Capabilities::full().read_only()
        } else {
            Capabilities::full()
        }
    }

    fn working_path(&self) -> &[String] {
        &self.working
    }

    fn probe(&self, path: &VPath, _config: &ResourceConfig) -> VfsResult<ResourceMeta> {
        self.ensure_open()?;
        let key = self.key(path)?;
        match self.files.read().get(&key) {
            Some(entry) => {
                let content_type = entry.content_type.clone().or_else(|| {
                    path.file_name()
                        .and_then(media::from_extension)
                        .map(String::from)
                });
                Ok(ResourceMeta {
                    exists: true,
                    size: SizeHint::Known(entry.data.len() as u64),
                    content_type,
                    supports_ranges: true,
                })
            }
            None => Ok(ResourceMeta::missing()),
        }
    }

    fn fetch(
        &self,
        path: &VPath,
        offset: u64,
        len: usize,
        _config: &ResourceConfig,
    ) -> VfsResult<FetchChunk> {
        self.ensure_open()?;
        let key = self.key(path)?;
        let files = self.files.read();
        let entry = files
            .get(&key)
            .ok_or_else(|| VfsError::not_found(path.to_string()))?;

        let total = entry.data.len() as u64;
        let start = offset.min(total) as usize;
        let end = (offset.saturating_add(len as u64)).min(total) as usize;
        Ok(FetchChunk {
            data: entry.data[start..end].to_vec(),
            size: SizeHint::Known(total),
        })
    }

    fn create(&self, path: &VPath) -> VfsResult<Box<dyn io::Write + Send>> {
        self.ensure_open()?;
        self.check_writable()?;
        Ok(Box::new(MemoryWriter {
            key: self.key(path)?,
            content_type: path
                .file_name()
                .and_then(media::from_extension)
                .map(String::from),
            buf: Vec::new(),
            files: Arc::clone(&self.files),
            committed: false,
        }))
    }

    fn delete(&self, path: &VPath) -> VfsResult<()> {
        self.ensure_open()?;
        self.check_writable()?;
        let key = self.key(path)?;
        self.files
            .write()
            .remove(&key)
            .map(|_| ())
            .ok_or_else(|| VfsError::not_found(path.to_string()))
    }

    fn list(&self, path: &VPath) -> VfsResult<Vec<String>> {
        self.ensure_open()?;
        let key = self.key(path)?;
        let prefix = if key == "/" { "/".to_string() } else { format!("{key}/") };
        let files = self.files.read();
        let mut names: Vec<String> = files
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix))
            .map(|rest| rest.split('/').next().unwrap_or(rest).to_string())
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Buffering writer: contents land in the map on flush or drop.
struct MemoryWriter {
    key: String,
    content_type: Option<String>,
    buf: Vec<u8>,
    files: FileMap,
    committed: bool,
}

impl MemoryWriter {
    fn commit(&mut self) {
        self.files.write().insert(
            self.key.clone(),
            MemoryEntry {
                data: std::mem::take(&mut self.buf),
                content_type: self.content_type.clone(),
            },
        );
        self.committed = true;
    }
}

impl io::Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.commit();
        Ok(())
    }
}

impl Drop for MemoryWriter {
    fn drop(&mut self) {
        if !self.committed {
            self.commit();
        }
    }
}
