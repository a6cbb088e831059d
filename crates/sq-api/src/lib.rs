pub mod auth;
pub mod category;
pub mod code;
pub mod config;
pub mod error;
pub mod jobs;
pub mod media;
pub mod metrics;
pub mod middleware;
pub mod mystery_box;
pub mod normalization;
pub mod notification;
pub mod play;
pub mod quiz;
pub mod router;
pub mod state;
pub mod story;
pub mod tracing;
pub mod user;
pub mod validation;
pub mod word_search;

pub use config::ApiConfig;
pub use state::{ApiState, AuthConfig, CookieConfig};
