//! Command handling for the `enkaku` binary.
//!
//! Wires a [`BackendRegistry`] with the HTTP, local-file, and in-memory
//! backends, then drives probes, reads, and transfers from the command
//! line. Credentials come from flags first, then the
//! `ENKAKU_USER`/`ENKAKU_PASSWORD` environment.

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::debug;

use enkaku_http::HttpBackend;
use enkaku_vfs::{
    AttrStore, BackendId, BackendOps, BackendOptions, BackendRegistry, LocalBackend,
    MemoryBackend, ResourceConfig, SizeHint, TransferEngine, VPath,
};

/// Environment variable consulted for a default username.
pub const ENV_USER: &str = "ENKAKU_USER";
/// Environment variable consulted for a default password.
pub const ENV_PASSWORD: &str = "ENKAKU_PASSWORD";

#[derive(Debug, Parser)]
#[command(name = "enkaku", about = "Remote virtual filesystem tool", version)]
pub struct Cli {
    /// Username for backends that need authentication.
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Password for backends that need authentication.
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Deadline in seconds for each blocking network call.
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Report existence, size, and content type of a resource.
    Probe { uri: String },
    /// Stream a resource to stdout.
    Cat { uri: String },
    /// Copy a resource between backends.
    Copy { src: String, dst: String },
    /// Move a resource; the source backend must support deletion.
    Move { src: String, dst: String },
    /// Delete a resource on a backend that supports deletion.
    Delete { uri: String },
    /// Read or write a path attribute.
    Attr {
        #[command(subcommand)]
        command: AttrCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum AttrCommand {
    /// Print one attribute (detects content type for the well-known key).
    Get { uri: String, key: String },
    /// Set one attribute.
    Set { uri: String, key: String, value: String },
}

/// Build the per-call configuration from flags and environment.
fn resource_config(cli: &Cli) -> ResourceConfig {
    let mut config = ResourceConfig::new();

    let user = cli.user.clone().or_else(|| std::env::var(ENV_USER).ok());
    let password = cli
        .password
        .clone()
        .or_else(|| std::env::var(ENV_PASSWORD).ok());
    if let (Some(user), Some(password)) = (user, password) {
        debug!("using configured credentials");
        config = config.with_credentials(user, password);
    }

    if let Some(secs) = cli.timeout_secs {
        config = config.with_deadline(Duration::from_secs(secs));
    }
    config
}

/// Registry with the standard schemes: `http(s)`, `file`, and `memory`.
pub fn standard_registry() -> BackendRegistry {
    let registry = BackendRegistry::new();
    HttpBackend::register(&registry);
    registry.register_scheme("file", |id: &BackendId, options: &BackendOptions| {
        Ok(Arc::new(LocalBackend::with_options(id.clone(), "/", options)) as Arc<dyn BackendOps>)
    });
    registry.register_scheme("memory", |id: &BackendId, options: &BackendOptions| {
        Ok(Arc::new(MemoryBackend::with_options(id.clone(), options)) as Arc<dyn BackendOps>)
    });
    registry
}

/// Run one parsed command, writing human output to `out`.
pub fn run(cli: Cli, out: &mut impl Write) -> anyhow::Result<()> {
    let registry = standard_registry();
    let config = resource_config(&cli);
    let engine = TransferEngine::new(&registry).with_config(config.clone());
    let attrs = AttrStore::new();

    match cli.command {
        Command::Probe { uri } => {
            let path = registry.path(&uri)?;
            let meta = registry.probe(&path, &config)?;
            if !meta.exists {
                writeln!(out, "{uri}: not found")?;
                return Ok(());
            }
            let size = match meta.size {
                SizeHint::Known(n) => n.to_string(),
                SizeHint::Unknown => "unknown".to_string(),
            };
            let content_type = attrs
                .detect_content_type(&registry, &path, &config)
                .unwrap_or_else(|_| "unknown".to_string());
            writeln!(out, "{uri}: exists, {size} bytes, {content_type}")?;
        }
        Command::Cat { uri } => {
            let path = registry.path(&uri)?;
            let mut channel = registry.open_read(&path, config)?;
            io::copy(&mut channel, out).with_context(|| format!("reading {uri}"))?;
        }
        Command::Copy { src, dst } => {
            let (src, dst) = (registry.path(&src)?, registry.path(&dst)?);
            let copied = engine.copy(&src, &dst)?;
            writeln!(out, "copied {copied} bytes")?;
        }
        Command::Move { src, dst } => {
            let (src, dst) = (registry.path(&src)?, registry.path(&dst)?);
            let moved = engine.rename(&src, &dst)?;
            writeln!(out, "moved {moved} bytes")?;
        }
        Command::Delete { uri } => {
            let path = registry.path(&uri)?;
            engine.delete(&path)?;
            writeln!(out, "deleted {uri}")?;
        }
        Command::Attr { command } => match command {
            AttrCommand::Get { uri, key } => {
                let path = registry.path(&uri)?;
                let value = if key == enkaku_vfs::attrs::keys::CONTENT_TYPE {
                    Some(attrs.detect_content_type(&registry, &path, &config)?)
                } else {
                    attrs.get(&path, &key)
                };
                match value {
                    Some(v) => writeln!(out, "{v}")?,
                    None => writeln!(out, "{key}: unset")?,
                }
            }
            AttrCommand::Set { uri, key, value } => {
                let path = registry.path(&uri)?;
                attrs.set(&path, key, value);
            }
        },
    }
    Ok(())
}

/// Parse a URI against the standard registry without performing I/O.
pub fn parse_target(uri: &str) -> anyhow::Result<VPath> {
    let registry = standard_registry();
    Ok(registry.path(uri)?)
}
