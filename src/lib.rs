pub mod api;
pub mod config;
pub mod dataset;

/// Application name for XDG paths
pub const APP_NAME: &str = "featureset";
