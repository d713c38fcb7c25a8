//! # studio-cli: tRPC Studio Command Line
//!
//! Provides the `trpc-studio` binary.
//!
//! ## Subcommands
//!
//! - `trpc-studio serve` (default): discover the router, then serve the
//!   procedure catalog and relay executions to the tRPC endpoint.
//! - `trpc-studio inspect`: discover the router and print its catalog
//!   as JSON.
//!
//! ```bash
//! trpc-studio -p src/router.ts -e http://localhost:4000/trpc
//! trpc-studio inspect -p src/router.ts user.byId
//! ```
//!
//! Options can also come from `trpcStudio.config.json`, `.json5` or
//! `.jsonc` in the working directory; see [`config`].

pub mod config;
pub mod inspect;
pub mod logging;
pub mod serve;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use studio_router::{discover, loader_for, Discovered};

/// Discover the router in `path` on the blocking pool.
///
/// Script modules are imported by a child process, so this can take a
/// while and must not stall the runtime.
pub async fn discover_router(path: &Path) -> Result<Discovered> {
    let path: PathBuf = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let loader = loader_for(&path);
        tracing::debug!(module = %path.display(), loader = loader.name(), "discovering router");
        discover(loader.as_ref(), &path)
    })
    .await
    .context("router discovery task failed")?
    .context("failed to discover a tRPC router")
}
