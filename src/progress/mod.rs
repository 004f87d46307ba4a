pub mod events;
pub mod state;
pub mod store;

pub use events::{ProgressEvent, ProgressSubscription};
pub use state::{Achievement, GameSettings, PlayerProgress, SAVE_VERSION};
pub use store::{CompletionOutcome, ProgressStore};
