//! # Router Locator
//!
//! Picks the router out of a module's exports.
//!
//! An export is a candidate when it is an object whose `_def` is an object
//! with `router` set to boolean `true`. When a module exports several
//! routers (typically the app router plus the sub-routers it merges), the
//! one with the most procedures is taken; a tie goes to the candidate
//! declared first. Selection only counts entries in `_def.procedures`; the
//! winner is then decoded in full.

use serde_json::Value;
use thiserror::Error;

use crate::export::ModuleExportTable;
use crate::router::{Router, RouterError};

#[derive(Debug, Error)]
pub enum LocateError {
    #[error("no router found among {export_count} export(s)")]
    NoRouterFound { export_count: usize },

    #[error("router `{export}` is malformed")]
    MalformedRouter {
        export: String,
        #[source]
        source: RouterError,
    },
}

/// Does this export value look like a router?
pub fn is_router_candidate(value: &Value) -> bool {
    value
        .get("_def")
        .and_then(Value::as_object)
        .and_then(|def| def.get("router"))
        == Some(&Value::Bool(true))
}

fn procedure_count(value: &Value) -> usize {
    value
        .get("_def")
        .and_then(|def| def.get("procedures"))
        .and_then(Value::as_object)
        .map_or(0, |procedures| procedures.len())
}

/// Find the router in `exports`.
pub fn locate(exports: &ModuleExportTable) -> Result<Router, LocateError> {
    let mut best: Option<(&str, &Value, usize)> = None;
    let mut candidates = Vec::new();

    for (name, value) in exports {
        if !is_router_candidate(value) {
            tracing::trace!(export = %name, "export is not a router");
            continue;
        }
        let count = procedure_count(value);
        tracing::debug!(export = %name, procedures = count, "detected router export");
        candidates.push(name.as_str());
        if best.map_or(true, |(_, _, max)| count > max) {
            best = Some((name.as_str(), value, count));
        }
    }

    let Some((name, value, count)) = best else {
        return Err(LocateError::NoRouterFound {
            export_count: exports.len(),
        });
    };

    if candidates.len() > 1 {
        tracing::info!(
            candidates = ?candidates,
            selected = name,
            "multiple routers exported; using the one with the most procedures"
        );
    }

    let router =
        Router::from_export(name, value).map_err(|source| LocateError::MalformedRouter {
            export: name.to_string(),
            source,
        })?;
    tracing::info!(router = name, procedures = count, "router located");
    Ok(router)
}
