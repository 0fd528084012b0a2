use crate::auth::AuthService;
use crate::db::Repository;
use std::path::PathBuf;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// This struct is wrapped in `Arc` and shared across all request handlers
/// via Axum's State extraction.
#[derive(Clone)]
pub struct AppState {
    /// Document store, JSON file or PostgreSQL depending on configuration
    pub repository: Arc<dyn Repository>,

    /// JWT authentication service for token generation and validation
    pub auth_service: AuthService,

    /// Base URL prefixed to locally stored photo paths
    pub public_url: String,

    /// Directory uploaded photos are written to
    pub upload_dir: PathBuf,
}
