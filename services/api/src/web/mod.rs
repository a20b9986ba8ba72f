pub mod protocol;
pub mod rest;
pub mod state;

// Re-export the router builder so the binary can mount the API in one call.
pub use rest::router;
pub use state::AppState;
