//! Startup discovery: load a module, find its router and build the catalog.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::enumerate::{enumerate, ProcedureCatalog};
use crate::loader::{LoadError, ModuleLoader};
use crate::locate::{locate, LocateError};
use crate::router::Router;

/// Discovery is fatal at startup; every variant names the module.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("could not load {path}")]
    Load {
        path: PathBuf,
        #[source]
        source: LoadError,
    },

    #[error("could not find a usable router in {path}")]
    Locate {
        path: PathBuf,
        #[source]
        source: LocateError,
    },
}

/// The result of discovery: the selected router and its catalog.
#[derive(Debug, Clone)]
pub struct Discovered {
    pub router: Router,
    pub catalog: ProcedureCatalog,
}

/// Load `path` with `loader`, locate its router and enumerate it.
///
/// The loader is engaged for the duration of the load only.
pub fn discover(loader: &dyn ModuleLoader, path: &Path) -> Result<Discovered, DiscoveryError> {
    let load_err = |source| DiscoveryError::Load {
        path: path.to_path_buf(),
        source,
    };

    tracing::info!(module = %path.display(), loader = loader.name(), "loading router module");
    let registration = loader.engage().map_err(load_err)?;
    let exports = loader.load(&registration, path).map_err(load_err)?;
    registration.release().map_err(load_err)?;

    for name in exports.keys() {
        tracing::debug!(export = %name, "detected export");
    }

    let router = locate(&exports).map_err(|source| DiscoveryError::Locate {
        path: path.to_path_buf(),
        source,
    })?;
    let catalog = enumerate(&router);
    Ok(Discovered { router, catalog })
}
