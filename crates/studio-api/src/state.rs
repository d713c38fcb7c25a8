//! Shared application state.

use std::sync::Arc;

use studio_relay::{ExecutionRelay, HttpRpcClient};
use studio_router::ProcedureCatalog;

/// State handed to every handler.
///
/// Everything here is built once at startup and only read afterwards, so
/// cloning the state is two reference-count bumps and no locking is needed.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<ProcedureCatalog>,
    pub relay: Arc<ExecutionRelay<HttpRpcClient>>,
}

impl AppState {
    pub fn new(catalog: ProcedureCatalog, relay: ExecutionRelay<HttpRpcClient>) -> Self {
        Self {
            catalog: Arc::new(catalog),
            relay: Arc::new(relay),
        }
    }
}
