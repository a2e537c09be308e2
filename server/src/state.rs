use std::sync::Arc;

use crate::auth::Verifier;
use crate::db::DrinkStore;

/// Shared context handed to every handler through axum `State`.
pub struct AppState {
    pub store: DrinkStore,
    pub verifier: Arc<Verifier>,
}

impl AppState {
    #[must_use]
    pub const fn new(store: DrinkStore, verifier: Arc<Verifier>) -> Self {
        Self { store, verifier }
    }
}
