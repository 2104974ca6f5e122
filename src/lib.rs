pub mod api;
pub mod audit;
pub mod config;
pub mod error;
pub mod ingest;
pub mod models;
pub mod search;
pub mod state;
pub mod utils;

pub use api::build_router;
pub use state::AppState;
