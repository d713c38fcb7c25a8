//! # Module Loading
//!
//! Produces a [`ModuleExportTable`] from a file on disk.
//!
//! Loading is a scoped acquisition: [`ModuleLoader::engage`] sets up
//! whatever the loader needs (for script modules, a scratch directory
//! holding the export-dump shim) and hands back a [`LoaderRegistration`].
//! [`ModuleLoader::load`] only works with a registration in hand, and the
//! registration tears its resources down when it is released or dropped,
//! so nothing leaks on an early return.
//!
//! ## Loaders
//!
//! - [`ManifestLoader`] reads `.json`, `.json5` and `.jsonc` export
//!   manifests directly.
//! - [`ScriptLoader`] runs `node` on an embedded shim that imports a
//!   TypeScript or JavaScript module and prints its exports as a manifest.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tempfile::TempDir;
use thiserror::Error;

use crate::export::{parse_manifest, ModuleExportTable};

/// Node.js script that dumps a module's exports as a manifest.
const EXPORT_DUMP_SHIM: &str = include_str!("../shim/export-dump.cjs");
const SHIM_FILE_NAME: &str = "export-dump.cjs";

/// How long [`ScriptLoader`] waits for a module by default.
pub const DEFAULT_SCRIPT_TIMEOUT: Duration = Duration::from_secs(60);
const WAIT_INTERVAL: Duration = Duration::from_millis(20);

/// Extensions read by [`ManifestLoader`].
pub const MANIFEST_EXTENSIONS: &[&str] = &["json", "json5", "jsonc"];
/// Extensions handed to [`ScriptLoader`].
pub const SCRIPT_EXTENSIONS: &[&str] = &["ts", "js", "mjs", "cjs", "mts", "cts"];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path} is not a valid export manifest")]
    Manifest {
        path: PathBuf,
        #[source]
        source: json5::Error,
    },

    #[error("failed to prepare the module loader")]
    Setup(#[source] io::Error),

    #[error("failed to release the module loader")]
    Release(#[source] io::Error),

    #[error("failed to run `{program}`; is Node.js installed?")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("loading {path} failed ({status}): {stderr}")]
    Script {
        path: PathBuf,
        status: ExitStatus,
        stderr: String,
    },

    #[error("loading {path} did not finish within {timeout:?}")]
    TimedOut { path: PathBuf, timeout: Duration },

    #[error("the {loader} loader was used without being engaged")]
    NotEngaged { loader: &'static str },
}

/// Proof that a loader has been engaged, and owner of its resources.
#[derive(Debug)]
pub struct LoaderRegistration {
    loader: &'static str,
    workdir: Option<TempDir>,
    released: bool,
}

impl LoaderRegistration {
    fn new(loader: &'static str, workdir: Option<TempDir>) -> Self {
        tracing::debug!(loader, "module loader engaged");
        Self {
            loader,
            workdir,
            released: false,
        }
    }

    pub fn loader(&self) -> &'static str {
        self.loader
    }

    /// Scratch directory owned by this registration, if the loader uses one.
    pub fn workdir(&self) -> Option<&Path> {
        self.workdir.as_ref().map(TempDir::path)
    }

    /// Release the registration, reporting cleanup failures.
    pub fn release(mut self) -> Result<(), LoadError> {
        self.released = true;
        if let Some(dir) = self.workdir.take() {
            dir.close().map_err(LoadError::Release)?;
        }
        tracing::debug!(loader = self.loader, "module loader released");
        Ok(())
    }
}

impl Drop for LoaderRegistration {
    fn drop(&mut self) {
        if !self.released {
            tracing::debug!(loader = self.loader, "module loader released on drop");
        }
    }
}

/// A way of turning a module file into its export table.
pub trait ModuleLoader {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Set up the loader for one or more loads.
    fn engage(&self) -> Result<LoaderRegistration, LoadError>;

    /// Load `path`. Requires a registration obtained from [`Self::engage`].
    fn load(
        &self,
        registration: &LoaderRegistration,
        path: &Path,
    ) -> Result<ModuleExportTable, LoadError>;
}

/// Reads export manifests written as JSON, JSON5 or JSONC.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestLoader;

impl ModuleLoader for ManifestLoader {
    fn name(&self) -> &'static str {
        "manifest"
    }

    fn engage(&self) -> Result<LoaderRegistration, LoadError> {
        Ok(LoaderRegistration::new(self.name(), None))
    }

    fn load(
        &self,
        _registration: &LoaderRegistration,
        path: &Path,
    ) -> Result<ModuleExportTable, LoadError> {
        let text = fs::read_to_string(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        parse_manifest(&text).map_err(|source| LoadError::Manifest {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Imports TypeScript/JavaScript modules through Node.js.
///
/// TypeScript sources need `esbuild-register` or `tsx` to be resolvable
/// from the module's directory or the working directory. A module that
/// has not been dumped within the timeout is killed.
#[derive(Debug, Clone)]
pub struct ScriptLoader {
    node: OsString,
    timeout: Duration,
}

impl Default for ScriptLoader {
    fn default() -> Self {
        Self {
            node: OsString::from("node"),
            timeout: DEFAULT_SCRIPT_TIMEOUT,
        }
    }
}

impl ScriptLoader {
    /// Use a specific Node.js executable.
    pub fn with_node(node: impl Into<OsString>) -> Self {
        Self {
            node: node.into(),
            ..Self::default()
        }
    }

    /// Give up on a module after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn spawn_error(&self, source: io::Error) -> LoadError {
        LoadError::Spawn {
            program: self.node.to_string_lossy().into_owned(),
            source,
        }
    }

    /// Run the shim on `path`, killing it once the timeout passes.
    fn run(&self, shim: &Path, path: &Path) -> Result<Output, LoadError> {
        let mut child = Command::new(&self.node)
            .arg(shim)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| self.spawn_error(source))?;

        // Pipes are drained concurrently so a large manifest cannot block the child.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait().map_err(|source| self.spawn_error(source))? {
                Some(status) => break status,
                None if Instant::now() >= deadline => {
                    tracing::warn!(
                        module = %path.display(),
                        timeout = ?self.timeout,
                        "module did not finish loading, killing node"
                    );
                    if let Err(error) = child.kill() {
                        tracing::debug!(%error, "failed to kill node");
                    }
                    if let Err(error) = child.wait() {
                        tracing::debug!(%error, "failed to reap node");
                    }
                    return Err(LoadError::TimedOut {
                        path: path.to_path_buf(),
                        timeout: self.timeout,
                    });
                }
                None => thread::sleep(WAIT_INTERVAL),
            }
        };

        Ok(Output {
            status,
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
        })
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            if let Err(error) = pipe.read_to_end(&mut buf) {
                tracing::debug!(%error, "failed to read from node");
            }
        }
        buf
    })
}

impl ModuleLoader for ScriptLoader {
    fn name(&self) -> &'static str {
        "script"
    }

    fn engage(&self) -> Result<LoaderRegistration, LoadError> {
        let dir = tempfile::Builder::new()
            .prefix("trpc-studio-")
            .tempdir()
            .map_err(LoadError::Setup)?;
        fs::write(dir.path().join(SHIM_FILE_NAME), EXPORT_DUMP_SHIM).map_err(LoadError::Setup)?;
        Ok(LoaderRegistration::new(self.name(), Some(dir)))
    }

    fn load(
        &self,
        registration: &LoaderRegistration,
        path: &Path,
    ) -> Result<ModuleExportTable, LoadError> {
        let workdir = registration
            .workdir()
            .ok_or(LoadError::NotEngaged { loader: self.name() })?;
        let shim = workdir.join(SHIM_FILE_NAME);

        tracing::debug!(module = %path.display(), "importing module through node");
        let output = self.run(&shim, path)?;

        if !output.status.success() {
            return Err(LoadError::Script {
                path: path.to_path_buf(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_manifest(&stdout).map_err(|source| LoadError::Manifest {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Whether `path` has one of `extensions` (case-insensitive).
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

/// Pick the loader for a module path by its extension.
pub fn loader_for(path: &Path) -> Box<dyn ModuleLoader + Send + Sync> {
    if has_extension(path, MANIFEST_EXTENSIONS) {
        Box::new(ManifestLoader)
    } else {
        Box::new(ScriptLoader::default())
    }
}
