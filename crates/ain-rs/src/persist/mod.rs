//! Local persistence: a keyed JSON document directory and the settings
//! document stored in it.

pub mod local_store;
pub mod settings;

pub use local_store::{LANGUAGE_KEY, LocalStore, SETTINGS_KEY};
pub use settings::{
    AppSettings, DEFAULT_DEVELOPMENT_TIME, DEVELOPMENT_TIME_RANGE, SETTINGS_VERSION,
    clamp_development_time, load_language, save_language,
};
