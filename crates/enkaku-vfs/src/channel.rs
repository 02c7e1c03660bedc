//! Byte-range channel.
//!
//! A positional, seekable read abstraction emulated over request/response
//! fetches. Opening a channel does no I/O; the first read or size query
//! negotiates with the backend. Size may stay [`SizeHint::Unknown`] until
//! the reader runs off the end, at which point the size latches to the
//! final position — exactly once.
//!
//! Channels are single-owner: `read` and `seek` take `&mut self`, so
//! concurrent reads on one channel are ruled out by construction. Each
//! fetch is a self-contained exchange; no connection outlives a call, so
//! dropping a channel on any exit path releases the transport.

use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Arc;

use tracing::debug;

use crate::backend::BackendOps;
use crate::error::{VfsError, VfsResult};
use crate::path::VPath;
use crate::types::{ResourceConfig, SizeHint};

/// A read channel over one resource.
pub struct RangeChannel {
    ops: Arc<dyn BackendOps>,
    path: VPath,
    config: ResourceConfig,
    position: u64,
    size: SizeHint,
    probed: bool,
    closed: bool,
}

impl RangeChannel {
    /// Create an unopened channel. No network traffic happens here.
    pub(crate) fn new(ops: Arc<dyn BackendOps>, path: VPath, config: ResourceConfig) -> Self {
        Self {
            ops,
            path,
            config,
            position: 0,
            size: SizeHint::Unknown,
            probed: false,
            closed: false,
        }
    }

    /// The path this channel reads.
    pub fn path(&self) -> &VPath {
        &self.path
    }

    /// Current read position.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Resource size.
    ///
    /// Asks the backend for a cheap metadata probe on first use; if the
    /// backend cannot report a size, returns [`SizeHint::Unknown`] until a
    /// read runs off the end of the data.
    pub fn size(&mut self) -> VfsResult<SizeHint> {
        self.ensure_live()?;
        if self.size.is_known() {
            return Ok(self.size);
        }
        if !self.probed {
            self.probed = true;
            let meta = self.ops.probe(&self.path, &self.config)?;
            if !meta.exists {
                return Err(VfsError::not_found(self.path.to_string()));
            }
            if let SizeHint::Known(n) = meta.size {
                self.latch_size(n);
            }
        }
        Ok(self.size)
    }

    /// Read into `buf` at the current position, advancing it.
    ///
    /// A zero-length buffer is a no-op. Reading past the end returns fewer
    /// bytes than requested; a subsequent read returns zero. Never conflates
    /// "no more data" with an error.
    pub fn read_bytes(&mut self, buf: &mut [u8]) -> VfsResult<usize> {
        self.ensure_live()?;
        if buf.is_empty() {
            return Ok(0);
        }
        if let SizeHint::Known(n) = self.size
            && self.position >= n
        {
            return Ok(0);
        }

        let chunk = self
            .ops
            .fetch(&self.path, self.position, buf.len(), &self.config)
            .map_err(|e| self.stamp_delivered(e))?;
        self.probed = true;

        if let SizeHint::Known(n) = chunk.size
            && !self.size.is_known()
        {
            self.latch_size(n);
        }

        let n = chunk.data.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk.data[..n]);
        self.position += n as u64;

        // End-of-data discovered mid-read: the size becomes the current
        // position, latched exactly once.
        if n < buf.len() && !self.size.is_known() {
            self.latch_size(self.position);
        }
        Ok(n)
    }

    /// Move the read position. Seeking does no I/O, except `SeekFrom::End`,
    /// which needs the size and fails while it is still unknown.
    pub fn seek_to(&mut self, pos: SeekFrom) -> VfsResult<u64> {
        self.ensure_live()?;
        let target = match pos {
            SeekFrom::Start(n) => Some(n),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
            SeekFrom::End(delta) => match self.size()? {
                SizeHint::Known(n) => n.checked_add_signed(delta),
                SizeHint::Unknown => {
                    return Err(VfsError::unsupported(format!(
                        "{}: size unknown, cannot seek from end",
                        self.path
                    )));
                }
            },
        };
        let target = target.ok_or_else(|| {
            VfsError::invalid_path(format!("{}: seek before start", self.path))
        })?;
        self.position = target;
        Ok(target)
    }

    /// Close the channel. Safe to call multiple times; reads after close
    /// fail with [`VfsError::Closed`].
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Whether the channel has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_live(&self) -> VfsResult<()> {
        if self.closed {
            return Err(VfsError::closed(format!("channel on {}", self.path)));
        }
        self.ops.ensure_open()
    }

    fn latch_size(&mut self, n: u64) {
        debug!(path = %self.path, size = n, "resource size latched");
        self.size = SizeHint::Known(n);
    }

    /// Rewrite a transport error so `bytes_delivered` reflects this
    /// stream's position — what the caller actually received.
    fn stamp_delivered(&self, e: VfsError) -> VfsError {
        match e {
            VfsError::Transport { message, .. } => VfsError::Transport {
                message,
                bytes_delivered: self.position,
            },
            other => other,
        }
    }
}

impl Read for RangeChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_bytes(buf).map_err(io::Error::from)
    }
}

impl Seek for RangeChannel {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.seek_to(pos).map_err(io::Error::from)
    }
}

impl Drop for RangeChannel {
    fn drop(&mut self) {
        self.closed = true;
    }
}
