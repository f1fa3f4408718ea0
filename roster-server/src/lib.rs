pub mod api;
pub mod config;
pub mod repository;
pub mod service;

pub use api::AppState;
pub use config::Config;
