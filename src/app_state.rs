use tokio::sync::RwLock;

use crate::{config::Config, solver::Solver};

/// Shared application state injected into every request handler via Axum's
/// `State` extractor.
pub struct AppState {
    pub config: Config,
    /// The solver owns the outbound `reqwest::Client` and the proxy flag it
    /// was built with. Handlers take a read lock for the duration of an
    /// upstream call; `/toggle_proxy` takes the write lock and swaps in a
    /// freshly built solver, so a toggle can never tear the configuration
    /// out from under an in-flight request.
    pub solver: RwLock<Solver>,
}
