//! HTTP(S) backend.
//!
//! Emulates random access over plain request/response HTTP: a header-only
//! probe for cheap metadata, and `Range` GETs for byte fetches. Servers
//! that ignore ranges still work — the backend slices the full response
//! locally, which costs bandwidth but preserves the channel contract.
//!
//! Read-only by design: HTTP resources cannot be deleted or listed here,
//! and the capability flags say so up front.

use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::{debug, warn};

use enkaku_vfs::{
    BackendId, BackendOps, BackendOptions, BackendRegistry, Capabilities, FetchChunk,
    ResourceConfig, ResourceMeta, SizeHint, VPath, VfsError, VfsResult,
};

use crate::range;

/// HTTP(S) backend over a shared blocking agent.
pub struct HttpBackend {
    id: BackendId,
    agent: ureq::Agent,
    working: Vec<String>,
    closed: AtomicBool,
}

impl HttpBackend {
    /// Create a backend for one `(scheme, authority)` pair.
    pub fn new(id: BackendId) -> Self {
        Self {
            id,
            agent: ureq::AgentBuilder::new().build(),
            working: Vec::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Create a backend honoring registry options.
    pub fn with_options(id: BackendId, options: &BackendOptions) -> Self {
        let mut backend = Self::new(id);
        backend.working = options.working_path.clone();
        backend
    }

    /// Register factories for the `http` and `https` schemes.
    pub fn register(registry: &BackendRegistry) {
        for scheme in ["http", "https"] {
            registry.register_scheme(scheme, |id: &BackendId, options: &BackendOptions| {
                Ok(std::sync::Arc::new(HttpBackend::with_options(id.clone(), options))
                    as std::sync::Arc<dyn BackendOps>)
            });
        }
    }

    fn url_for(&self, path: &VPath) -> VfsResult<String> {
        path.to_absolute(&self.working).to_uri()
    }

    /// Build a request with credentials, extra headers, and the deadline
    /// applied.
    fn request(&self, method: &str, url: &str, config: &ResourceConfig) -> ureq::Request {
        let mut req = self.agent.request(method, url);
        if let Some((user, password)) = config.credentials() {
            let token = BASE64.encode(format!("{user}:{password}"));
            req = req.set("Authorization", &format!("Basic {token}"));
        }
        for (name, value) in &config.headers {
            req = req.set(name, value);
        }
        if let Some(deadline) = config.deadline {
            req = req.timeout(deadline);
        }
        req
    }

    /// Map a non-2xx status onto the error taxonomy.
    fn status_error(&self, code: u16, url: &str) -> VfsError {
        match code {
            404 | 410 => VfsError::not_found(url.to_string()),
            401 | 403 => VfsError::access_denied(format!("HTTP {code} from {url}")),
            _ => VfsError::transport(format!("HTTP {code} from {url}")),
        }
    }

    fn meta_from_headers(&self, resp: &ureq::Response) -> ResourceMeta {
        let size = resp
            .header("Content-Length")
            .map(range::content_length)
            .unwrap_or(SizeHint::Unknown);
        let content_type = resp.header("Content-Type").and_then(range::media_type);
        let supports_ranges = resp
            .header("Accept-Ranges")
            .is_some_and(|v| v.to_ascii_lowercase().contains("bytes"));
        ResourceMeta {
            exists: true,
            size,
            content_type,
            supports_ranges,
        }
    }

    /// Probe via a minimal range GET, for servers that reject HEAD or omit
    /// Content-Length.
    fn probe_by_range(&self, url: &str, config: &ResourceConfig) -> VfsResult<ResourceMeta> {
        debug!(url, "probing via 1-byte range fetch");
        let req = self.request("GET", url, config).set("Range", "bytes=0-0");
        match req.call() {
            Ok(resp) => {
                let mut meta = self.meta_from_headers(&resp);
                match resp.status() {
                    206 => {
                        meta.supports_ranges = true;
                        meta.size = resp
                            .header("Content-Range")
                            .map(range::content_range_total)
                            .unwrap_or(SizeHint::Unknown);
                    }
                    _ => {
                        // Range ignored; Content-Length of the full body is
                        // already the size. Drop the body unread.
                        meta.supports_ranges = false;
                    }
                }
                Ok(meta)
            }
            // A 416 on bytes=0-0 means an empty resource; the unsatisfied
            // Content-Range still names the total.
            Err(ureq::Error::Status(416, resp)) => Ok(ResourceMeta {
                exists: true,
                size: resp
                    .header("Content-Range")
                    .map(range::content_range_total)
                    .unwrap_or(SizeHint::Known(0)),
                content_type: resp.header("Content-Type").and_then(range::media_type),
                supports_ranges: true,
            }),
            Err(ureq::Error::Status(404 | 410, _)) => Ok(ResourceMeta::missing()),
            Err(ureq::Error::Status(code, _)) => Err(self.status_error(code, url)),
            Err(ureq::Error::Transport(t)) => Err(VfsError::transport(t.to_string())),
        }
    }

    /// Read up to `len` bytes from a response body, skipping `skip` bytes
    /// first (for servers that ignored the range).
    fn read_body(resp: ureq::Response, skip: u64, len: usize) -> VfsResult<Vec<u8>> {
        let mut reader = resp.into_reader();
        if skip > 0 {
            let skipped = io::copy(&mut reader.by_ref().take(skip), &mut io::sink())
                .map_err(|e| VfsError::transport(format!("skipping range prefix: {e}")))?;
            if skipped < skip {
                // Resource ends before the requested offset.
                return Ok(Vec::new());
            }
        }
        let mut data = Vec::with_capacity(len.min(1 << 20));
        reader
            .take(len as u64)
            .read_to_end(&mut data)
            .map_err(|e| VfsError::transport(format!("reading body: {e}")))?;
        Ok(data)
    }
}

impl BackendOps for HttpBackend {
    fn id(&self) -> &BackendId {
        &self.id
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::read_only_ranged()
    }

    fn working_path(&self) -> &[String] {
        &self.working
    }

    fn probe(&self, path: &VPath, config: &ResourceConfig) -> VfsResult<ResourceMeta> {
        self.ensure_open()?;
        self.ensure_same_backend(path)?;
        let url = self.url_for(path)?;

        match self.request("HEAD", &url, config).call() {
            Ok(resp) => {
                let meta = self.meta_from_headers(&resp);
                if meta.size.is_known() {
                    Ok(meta)
                } else {
                    // Header-only probe came back sizeless; a minimal range
                    // fetch can still pin the length down.
                    self.probe_by_range(&url, config)
                }
            }
            Err(ureq::Error::Status(404 | 410, _)) => Ok(ResourceMeta::missing()),
            Err(ureq::Error::Status(code @ (401 | 403), _)) => Err(self.status_error(code, &url)),
            Err(ureq::Error::Status(code, _)) => {
                warn!(url, code, "HEAD rejected, falling back to range probe");
                self.probe_by_range(&url, config)
            }
            Err(ureq::Error::Transport(t)) => Err(VfsError::transport(t.to_string())),
        }
    }

    fn fetch(
        &self,
        path: &VPath,
        offset: u64,
        len: usize,
        config: &ResourceConfig,
    ) -> VfsResult<FetchChunk> {
        self.ensure_open()?;
        self.ensure_same_backend(path)?;
        if len == 0 {
            return Ok(FetchChunk::empty(SizeHint::Unknown));
        }
        let url = self.url_for(path)?;
        let req = self
            .request("GET", &url, config)
            .set("Range", &range::range_value(offset, len));

        match req.call() {
            Ok(resp) => match resp.status() {
                206 => {
                    let size = resp
                        .header("Content-Range")
                        .map(range::content_range_total)
                        .unwrap_or(SizeHint::Unknown);
                    let data = Self::read_body(resp, 0, len)?;
                    Ok(FetchChunk { data, size })
                }
                // Server ignored the range and sent the whole resource.
                _ => {
                    let size = resp
                        .header("Content-Length")
                        .map(range::content_length)
                        .unwrap_or(SizeHint::Unknown);
                    debug!(url, offset, "range ignored, slicing full response");
                    let data = Self::read_body(resp, offset, len)?;
                    Ok(FetchChunk { data, size })
                }
            },
            // Requested range starts at or past the end: no more data.
            Err(ureq::Error::Status(416, resp)) => {
                let size = resp
                    .header("Content-Range")
                    .map(range::content_range_total)
                    .unwrap_or(SizeHint::Unknown);
                Ok(FetchChunk::empty(size))
            }
            Err(ureq::Error::Status(code, _)) => Err(self.status_error(code, &url)),
            Err(ureq::Error::Transport(t)) => Err(VfsError::transport(t.to_string())),
        }
    }

    fn delete(&self, path: &VPath) -> VfsResult<()> {
        let _ = path;
        Err(VfsError::unsupported(format!(
            "{} is read-only; delete is not supported (use copy to a writable backend)",
            self.id
        )))
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
