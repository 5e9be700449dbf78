pub mod app;
pub mod client;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod journey;
pub mod models;
pub mod notifications;
pub mod reflection;
pub mod router;
pub mod rules;
pub mod state;
pub mod stats;
pub mod storage;
pub mod tasks;
pub mod templates;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use storage::{resolve_data_path, FileProfileStore, ProfileStore};
