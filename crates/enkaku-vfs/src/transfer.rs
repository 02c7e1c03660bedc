//! Transfer engine.
//!
//! High-level copy/move/stat/delete expressed purely through paths,
//! channels, and backend probes, so it is backend-agnostic. Capability
//! restrictions are enforced up front — a move off a backend that cannot
//! delete fails before a single byte moves, with a message naming the
//! allowed alternative.

use std::io::Write;

use tracing::{debug, info};

use crate::error::{VfsError, VfsResult};
use crate::path::VPath;
use crate::registry::BackendRegistry;
use crate::types::{ResourceConfig, SizeHint};

/// Fixed buffer size for streaming copies.
const COPY_BUFFER: usize = 64 * 1024;

/// Backend-agnostic transfer operations over a registry.
pub struct TransferEngine<'r> {
    registry: &'r BackendRegistry,
    config: ResourceConfig,
    buffer_size: usize,
}

impl<'r> TransferEngine<'r> {
    /// Create an engine with anonymous configuration.
    pub fn new(registry: &'r BackendRegistry) -> Self {
        Self {
            registry,
            config: ResourceConfig::new(),
            buffer_size: COPY_BUFFER,
        }
    }

    /// Use the given configuration (credentials, deadline) for every
    /// channel the engine opens.
    pub fn with_config(mut self, config: ResourceConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the copy buffer size. Values below 1 are clamped to 1.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    /// Whether the resource exists.
    pub fn exists(&self, path: &VPath) -> VfsResult<bool> {
        Ok(self.registry.probe(path, &self.config)?.exists)
    }

    /// Resource size in bytes.
    ///
    /// Uses the cheap probe when the backend reports a length; otherwise
    /// streams the resource and counts.
    pub fn size(&self, path: &VPath) -> VfsResult<u64> {
        let meta = self.registry.probe(path, &self.config)?;
        if !meta.exists {
            return Err(VfsError::not_found(path.to_string()));
        }
        if let SizeHint::Known(n) = meta.size {
            return Ok(n);
        }

        debug!(path = %path, "size unknown from probe, counting by read");
        let mut channel = self.registry.open_read(path, self.config.clone())?;
        let mut buf = vec![0u8; self.buffer_size];
        let mut total = 0u64;
        loop {
            let n = channel.read_bytes(&mut buf)?;
            if n == 0 {
                break;
            }
            total += n as u64;
        }
        Ok(total)
    }

    /// Copy `src` to `dst`, streaming through a fixed-size buffer.
    ///
    /// Legal between any read-capable source and write-capable destination,
    /// across backends. Returns the number of bytes copied.
    pub fn copy(&self, src: &VPath, dst: &VPath) -> VfsResult<u64> {
        self.copy_inner(src, dst)
            .map_err(|e| e.context(format!("copy {src} -> {dst}")))
    }

    fn copy_inner(&self, src: &VPath, dst: &VPath) -> VfsResult<u64> {
        let dst_backend = self.registry.backend_for(dst)?;
        if !dst_backend.capabilities().write {
            return Err(VfsError::unsupported(format!(
                "{} does not support writing; choose a writable destination",
                dst_backend.id()
            )));
        }

        let mut channel = self.registry.open_read(src, self.config.clone())?;
        // Probe before creating the destination, so a missing source
        // leaves no empty file behind.
        channel.size()?;

        let dst_abs = self.registry.absolutize(dst)?;
        let mut writer = dst_backend.create(&dst_abs)?;

        let mut buf = vec![0u8; self.buffer_size];
        let mut total = 0u64;
        loop {
            let n = channel.read_bytes(&mut buf)?;
            if n == 0 {
                break;
            }
            writer.write_all(&buf[..n])?;
            total += n as u64;
        }
        writer.flush()?;
        info!(src = %src, dst = %dst, bytes = total, "copy complete");
        Ok(total)
    }

    /// Move `src` to `dst`: copy, then delete the source.
    ///
    /// Requires the source backend to support deletion; a read-only source
    /// fails up front with no partial side effect. Callers that want copy
    /// semantics on such backends must call [`TransferEngine::copy`].
    pub fn rename(&self, src: &VPath, dst: &VPath) -> VfsResult<u64> {
        let src_backend = self.registry.backend_for(src)?;
        if !src_backend.capabilities().delete {
            return Err(VfsError::unsupported(format!(
                "move {src} -> {dst}: {} cannot delete its resources; use copy instead of move",
                src_backend.id()
            )));
        }

        let copied = self.copy(src, dst)?;
        let src_abs = self.registry.absolutize(src)?;
        src_backend
            .delete(&src_abs)
            .map_err(|e| e.context(format!("move {src} -> {dst}: source delete")))?;
        info!(src = %src, dst = %dst, bytes = copied, "move complete");
        Ok(copied)
    }

    /// Delete a resource. Fails with [`VfsError::Unsupported`] on backends
    /// without the delete capability — never silently succeeds.
    pub fn delete(&self, path: &VPath) -> VfsResult<()> {
        let backend = self.registry.backend_for(path)?;
        if !backend.capabilities().delete {
            return Err(VfsError::unsupported(format!(
                "{} does not support deletion",
                backend.id()
            )));
        }
        let abs = self.registry.absolutize(path)?;
        backend.delete(&abs)
    }
}
