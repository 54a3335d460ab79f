//! API server state

use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::storage::DrinkStore;

/// Shared by every request
#[derive(Clone)]
pub struct AppState {
    /// Drink persistence
    pub store: Arc<dyn DrinkStore>,

    /// Bearer-token verification
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    pub fn new(store: Arc<dyn DrinkStore>, verifier: Arc<TokenVerifier>) -> Self {
        Self { store, verifier }
    }
}
