//! # Inspect Subcommand
//!
//! Prints the discovered catalog, or one procedure of it, as JSON. Useful
//! for checking what the studio will show without starting the server.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;

use crate::discover_router;

/// Arguments for `trpc-studio inspect`.
#[derive(Args, Debug, Clone, Default)]
pub struct InspectArgs {
    /// Print only this procedure (e.g. `user.byId`).
    pub procedure: Option<String>,

    /// Print compact JSON instead of pretty-printed.
    #[arg(long)]
    pub compact: bool,
}

/// Execute the inspect subcommand.
pub async fn run_inspect(args: &InspectArgs, router_path: &Path) -> Result<u8> {
    let discovered = discover_router(router_path).await?;

    let document = match &args.procedure {
        Some(path) => {
            let info = discovered
                .catalog
                .get(path)
                .with_context(|| format!("no procedure at `{path}`"))?;
            serde_json::to_value(info)?
        }
        None => json!({
            "router": discovered.router.name,
            "transformer": discovered.router.transformer,
            "procedures": discovered.catalog,
        }),
    };

    let rendered = if args.compact {
        serde_json::to_string(&document)?
    } else {
        serde_json::to_string_pretty(&document)?
    };
    println!("{rendered}");
    Ok(0)
}
