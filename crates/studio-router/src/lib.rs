//! # studio-router: Router Introspection
//!
//! Everything between a module file on disk and the immutable
//! [`ProcedureCatalog`] a client browses:
//!
//! 1. a [`ModuleLoader`] produces the module's [`ModuleExportTable`];
//! 2. [`locate`] picks the router among the exports and decodes it;
//! 3. [`enumerate`] compiles every procedure's input and output schemas.
//!
//! [`discover`] runs the three steps in order.
//!
//! ## Modules
//!
//! - [`export`]: export tables and manifest parsing.
//! - [`loader`]: manifest and script loaders, scoped by registration.
//! - [`router`]: typed router model and its defensive decoder.
//! - [`procedure`]: procedure kinds and input chains.
//! - [`transformer`]: the router's wire transformer.
//! - [`locate`]: router selection.
//! - [`enumerate`]: catalog construction.
//! - [`discover`]: the startup pipeline.

pub mod discover;
pub mod enumerate;
pub mod export;
pub mod loader;
pub mod locate;
pub mod procedure;
pub mod router;
pub mod transformer;

pub use discover::{discover, Discovered, DiscoveryError};
pub use enumerate::{enumerate, ProcedureCatalog, ProcedureInfo};
pub use export::{parse_manifest, ModuleExportTable};
pub use loader::{
    loader_for, LoadError, LoaderRegistration, ManifestLoader, ModuleLoader, ScriptLoader,
};
pub use locate::{is_router_candidate, locate, LocateError};
pub use procedure::{OpaquePredicate, Procedure, ProcedureInput, ProcedureKind};
pub use router::{Router, RouterError};
pub use transformer::WireTransformer;
