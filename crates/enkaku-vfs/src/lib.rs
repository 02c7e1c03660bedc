//! # enkaku-vfs
//!
//! Virtual filesystem core for enkaku: a path/byte-stream API over
//! resources that are not local files but remote, protocol-addressed
//! objects.
//!
//! Key components:
//!
//! - [`VPath`] - immutable, backend-scoped hierarchical path values
//! - [`BackendRegistry`] - one live backend per `(scheme, authority)` pair
//! - [`RangeChannel`] - positional, seekable reads emulated over
//!   request/response fetches, with lazily discovered size
//! - [`AttrStore`] - per-path derived metadata (content types)
//! - [`TransferEngine`] - copy/move/stat/delete with capability checks
//!
//! ## Design Decisions
//!
//! - **Paths are values**: a [`VPath`] carries backend identity, segments,
//!   and absoluteness; nothing about resource existence.
//! - **Capabilities up front**: each backend declares what it can do at
//!   construction time; the transfer engine refuses unsupported operations
//!   with a message naming the alternative, rather than discovering the
//!   limitation via a protocol error.
//! - **Size is a tagged union**: [`SizeHint::Unknown`] instead of sentinel
//!   integers, so "unknown" cannot leak into arithmetic.
//! - **Configuration is explicit**: credentials and deadlines ride in
//!   [`ResourceConfig`], never through the attribute side table.

pub mod attrs;
pub mod backend;
pub mod backends;
pub mod channel;
pub mod error;
pub mod media;
pub mod path;
pub mod registry;
pub mod transfer;
pub mod types;

pub use attrs::AttrStore;
pub use backend::{BackendOps, BackendOptions};
pub use backends::{LocalBackend, MemoryBackend};
pub use channel::RangeChannel;
pub use error::{VfsError, VfsResult};
pub use path::{BackendId, VPath};
pub use registry::{BackendFactory, BackendRegistry};
pub use transfer::TransferEngine;
pub use types::{Capabilities, FetchChunk, ResourceConfig, ResourceMeta, SizeHint};
