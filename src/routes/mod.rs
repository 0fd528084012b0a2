pub mod auth_handlers;
pub mod favorite_handlers;
pub mod health;
mod helpers;
pub mod recipe_handlers;
mod router;
pub mod types;

pub use router::create_router;

// Re-export AppState for convenience
pub use crate::state::AppState;
