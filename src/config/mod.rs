// src/config/mod.rs
//! Process settings (env), user profile (TOML/JSON file) and localized strings.

pub mod messages;
pub mod profile;
pub mod settings;

pub use messages::{Language, Messages};
pub use profile::Profile;
pub use settings::Settings;
