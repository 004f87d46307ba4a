use bevy_utils::tracing::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::persistence::repository::{PreferenceError, PreferenceStore};

pub const PROGRESS_KEY: &str = "playerProgress";
pub const SETTINGS_KEY: &str = "gameSettings";

/// Result of reading a record at start-up. Backend read errors are not an
/// outcome; `load_record` returns them as `Err`.
#[derive(Debug)]
pub enum LoadOutcome<T> {
    Loaded(T),
    /// Nothing stored under the key yet.
    Missing,
    /// Something is stored but it does not decode.
    Corrupt(serde_json::Error),
}

impl<T: Default> LoadOutcome<T> {
    /// Collapse to a value, substituting the default for missing or corrupt
    /// records.
    pub fn into_value_or_default(self, key: &str) -> T {
        match self {
            LoadOutcome::Loaded(value) => value,
            LoadOutcome::Missing => {
                debug!("no stored {}; starting fresh", key);
                T::default()
            }
            LoadOutcome::Corrupt(err) => {
                warn!("stored {} is unreadable ({}); starting fresh", key, err);
                T::default()
            }
        }
    }
}

impl<T> LoadOutcome<T> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded(_))
    }
}

/// Serialize a record into JSON for persistence.
pub fn encode_record<T: Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

/// Deserialize JSON back into a record.
pub fn decode_record<T: DeserializeOwned>(data: &str) -> serde_json::Result<T> {
    serde_json::from_str(data)
}

pub fn load_record<T: DeserializeOwned>(
    store: &dyn PreferenceStore,
    key: &str,
) -> Result<LoadOutcome<T>, PreferenceError> {
    let Some(raw) = store.get(key)? else {
        return Ok(LoadOutcome::Missing);
    };
    Ok(match decode_record(&raw) {
        Ok(value) => LoadOutcome::Loaded(value),
        Err(err) => LoadOutcome::Corrupt(err),
    })
}

pub fn save_record<T: Serialize>(
    store: &mut dyn PreferenceStore,
    key: &str,
    value: &T,
) -> Result<(), PreferenceError> {
    let json = encode_record(value)?;
    store.set(key, &json)
}
