pub mod analytics;
pub mod api;
pub mod config;
pub mod data_manager;
pub mod error;
pub mod http_client;
pub mod logging;
pub mod persist;
pub mod pitch;
pub mod player_analysis;
pub mod provider;
pub mod slot;
pub mod state;
pub mod theme;
