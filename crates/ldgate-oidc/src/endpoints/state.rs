//! Shared handler state.

use std::sync::Arc;

use ldgate_core::AppConfig;
use ldgate_token::TokenManager;

use crate::provider::DirectoryProvider;

/// State shared by every endpoint handler.
///
/// Everything here is read-only after startup, so cloning per request is a
/// couple of reference count bumps.
#[derive(Clone)]
pub struct AppState {
    /// Immutable server configuration.
    pub config: Arc<AppConfig>,

    /// Token subsystem.
    pub tokens: Arc<TokenManager>,

    /// Identity backend.
    pub directory: Arc<dyn DirectoryProvider>,
}

impl AppState {
    /// Bundles the shared pieces.
    #[must_use]
    pub fn new(
        config: Arc<AppConfig>,
        tokens: Arc<TokenManager>,
        directory: Arc<dyn DirectoryProvider>,
    ) -> Self {
        Self {
            config,
            tokens,
            directory,
        }
    }
}
