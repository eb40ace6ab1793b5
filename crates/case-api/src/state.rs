//! Application state shared across handlers.

use database::Database;

use crate::auth::TokenSigner;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Database,
    /// Bearer token signer.
    pub tokens: TokenSigner,
}

impl AppState {
    /// Create new application state.
    pub fn new(db: Database, tokens: TokenSigner) -> Self {
        Self { db, tokens }
    }
}
