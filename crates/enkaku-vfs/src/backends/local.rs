//! Local filesystem backend.
//!
//! Serves a rooted directory tree, with path normalization to keep `..`
//! from escaping the root. This is the canonical write-capable destination
//! for transfers out of read-only remote backends.

use std::fs;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::backend::{BackendOps, BackendOptions};
use crate::error::{VfsError, VfsResult};
use crate::media;
use crate::path::{BackendId, VPath};
use crate::types::{Capabilities, FetchChunk, ResourceConfig, ResourceMeta, SizeHint};

/// Local filesystem backend rooted at a directory.
pub struct LocalBackend {
    id: BackendId,
    root: PathBuf,
    working: Vec<String>,
    read_only: bool,
    closed: AtomicBool,
}

impl LocalBackend {
    /// Create a writable backend rooted at `root`.
    pub fn new(id: BackendId, root: impl Into<PathBuf>) -> Self {
        let root: PathBuf = root.into();
        let root = root.canonicalize().unwrap_or(root);
        Self {
            id,
            root,
            working: Vec::new(),
            read_only: false,
            closed: AtomicBool::new(false),
        }
    }

    /// Create a backend honoring registry options.
    pub fn with_options(id: BackendId, root: impl Into<PathBuf>, options: &BackendOptions) -> Self {
        let mut backend = Self::new(id, root);
        backend.working = options.working_path.clone();
        backend.read_only = options.read_only;
        backend
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a VPath to a real filesystem path under the root.
    ///
    /// Normalization happens first, so `..` segments cannot escape.
    fn resolve(&self, path: &VPath) -> VfsResult<PathBuf> {
        let abs = path.to_absolute(&self.working).normalize()?;
        let mut full = self.root.clone();
        for seg in abs.segments() {
            full.push(seg);
        }
        Ok(full)
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

/// Map an I/O error onto the VFS taxonomy, naming the path.
fn io_err(path: &VPath, e: io::Error) -> VfsError {
    match e.kind() {
        io::ErrorKind::NotFound => VfsError::not_found(path.to_string()),
        io::ErrorKind::PermissionDenied => VfsError::access_denied(path.to_string()),
        _ => VfsError::Io(e),
    }
}

impl BackendOps for LocalBackend {
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
        let full = self.resolve(path)?;
        match fs::metadata(&full) {
            Ok(meta) => Ok(ResourceMeta {
                exists: true,
                size: if meta.is_file() {
                    SizeHint::Known(meta.len())
                } else {
                    SizeHint::Unknown
                },
                content_type: path
                    .file_name()
                    .and_then(media::from_extension)
                    .map(String::from),
                supports_ranges: true,
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(ResourceMeta::missing()),
            Err(e) => Err(io_err(path, e)),
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
        let full = self.resolve(path)?;
        let mut file = fs::File::open(&full).map_err(|e| io_err(path, e))?;
        let total = file.metadata().map_err(|e| io_err(path, e))?.len();

        file.seek(SeekFrom::Start(offset.min(total)))
            .map_err(|e| io_err(path, e))?;

        let mut data = vec![0u8; len];
        let mut filled = 0;
        while filled < len {
            match file.read(&mut data[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(io_err(path, e)),
            }
        }
        data.truncate(filled);
        Ok(FetchChunk {
            data,
            size: SizeHint::Known(total),
        })
    }

    fn create(&self, path: &VPath) -> VfsResult<Box<dyn io::Write + Send>> {
        self.ensure_open()?;
        self.check_writable()?;
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| io_err(path, e))?;
        }
        let file = fs::File::create(&full).map_err(|e| io_err(path, e))?;
        Ok(Box::new(io::BufWriter::new(file)))
    }

    fn delete(&self, path: &VPath) -> VfsResult<()> {
        self.ensure_open()?;
        self.check_writable()?;
        let full = self.resolve(path)?;
        fs::remove_file(&full).map_err(|e| io_err(path, e))
    }

    fn list(&self, path: &VPath) -> VfsResult<Vec<String>> {
        self.ensure_open()?;
        let full = self.resolve(path)?;
        let mut names = Vec::new();
        for entry in fs::read_dir(&full).map_err(|e| io_err(path, e))? {
            let entry = entry.map_err(|e| io_err(path, e))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fixture() -> (tempfile::TempDir, LocalBackend) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("hello.txt"), b"hello from disk").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/nested.bin"), [0xAB; 64]).unwrap();
        let backend = LocalBackend::new(BackendId::new("file", "").unwrap(), dir.path());
        (dir, backend)
    }

    fn path(s: &str) -> VPath {
        VPath::parse(&format!("file://{s}")).unwrap()
    }

    #[test]
    fn test_probe() {
        let (_dir, b) = fixture();
        let meta = b.probe(&path("/hello.txt"), &ResourceConfig::new()).unwrap();
        assert!(meta.exists);
        assert_eq!(meta.size, SizeHint::Known(15));
        assert_eq!(meta.content_type.as_deref(), Some("text/plain"));

        assert!(
            !b.probe(&path("/absent.txt"), &ResourceConfig::new())
                .unwrap()
                .exists
        );
    }

    #[test]
    fn test_fetch_ranges() {
        let (_dir, b) = fixture();
        let chunk = b
            .fetch(&path("/hello.txt"), 6, 4, &ResourceConfig::new())
            .unwrap();
        assert_eq!(chunk.data, b"from");
        assert_eq!(chunk.size, SizeHint::Known(15));

        // Past-end reads are empty, not errors.
        let chunk = b
            .fetch(&path("/hello.txt"), 1000, 4, &ResourceConfig::new())
            .unwrap();
        assert!(chunk.data.is_empty());
    }

    #[test]
    fn test_create_and_delete() {
        let (dir, b) = fixture();
        {
            let mut w = b.create(&path("/new/dir/out.txt")).unwrap();
            w.write_all(b"written").unwrap();
            w.flush().unwrap();
        }
        assert_eq!(
            fs::read(dir.path().join("new/dir/out.txt")).unwrap(),
            b"written"
        );

        b.delete(&path("/new/dir/out.txt")).unwrap();
        assert!(!dir.path().join("new/dir/out.txt").exists());
    }

    #[test]
    fn test_escape_is_blocked() {
        let (_dir, b) = fixture();
        let sneaky = path("/sub/../../etc/passwd");
        assert!(matches!(
            b.probe(&sneaky, &ResourceConfig::new()),
            Err(VfsError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_read_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("x"), b"1").unwrap();
        let b = LocalBackend::with_options(
            BackendId::new("file", "").unwrap(),
            dir.path(),
            &BackendOptions::new().read_only(),
        );
        assert!(matches!(b.create(&path("/y")), Err(VfsError::Unsupported(_))));
        assert!(matches!(b.delete(&path("/x")), Err(VfsError::Unsupported(_))));
        assert!(!b.capabilities().write);
    }

    #[test]
    fn test_list() {
        let (_dir, b) = fixture();
        assert_eq!(b.list(&path("/")).unwrap(), ["hello.txt", "sub"]);
    }
}
