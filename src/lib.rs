pub mod cli;
pub mod config;
pub mod links;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod storage;
pub mod store;
pub mod tracking;
pub mod utils;
pub mod workspace;

pub use config::Config;
pub use storage::{SlotStorage, StorageBackend, StorageError, open_storage};
pub use store::{Entity, EntityId, EntityStore, SortDirection};
pub use utils::Profile;
pub use workspace::{Tab, Workspace};
