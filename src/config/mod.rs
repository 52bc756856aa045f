//! Configuration module for orform
//!
//! Handles loading and managing application settings from TOML files.

mod settings;

pub use settings::{GeneralSettings, LabelSettings, ModelSettings, Settings, API_KEY_ENV};
