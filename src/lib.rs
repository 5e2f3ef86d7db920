pub mod app;
pub mod authz;
pub mod cache;
pub mod config;
pub mod docs;
pub mod errors;
pub mod gitlab;
pub mod models;
pub mod routes;
pub mod utils;

// Re-export commonly used items for tests
pub use app::create_app;
