pub mod memory;
pub mod repository;
pub mod serialization;
pub mod sqlite;

pub use memory::MemoryPreferenceStore;
pub use repository::{PreferenceError, PreferenceStore};
pub use serialization::{
    decode_record, encode_record, load_record, save_record, LoadOutcome, PROGRESS_KEY,
    SETTINGS_KEY,
};
pub use sqlite::SqlitePreferenceStore;
