//! Shared application state threaded into every handler via `State<...>`.

use std::sync::Arc;

use engram_core::Engine;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
}
