//! # enkaku-http
//!
//! HTTP(S) backend for the enkaku virtual filesystem.
//!
//! Byte-range channels are emulated with `Range` GETs; metadata probes are
//! HEAD requests with a 1-byte range fallback. The backend is read-only:
//! `copy` out of it works anywhere, `move`/`delete` are refused up front by
//! its capability flags.
//!
//! ```no_run
//! use enkaku_http::HttpBackend;
//! use enkaku_vfs::{BackendRegistry, ResourceConfig};
//!
//! let registry = BackendRegistry::new();
//! HttpBackend::register(&registry);
//!
//! let path = registry.path("https://example.com/data/report.pdf")?;
//! let mut channel = registry.open_read(&path, ResourceConfig::new())?;
//! let size = channel.size()?;
//! # Ok::<(), enkaku_vfs::VfsError>(())
//! ```

mod backend;
mod range;

pub use backend::HttpBackend;
