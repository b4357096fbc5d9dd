pub mod file;
pub mod listener;
pub mod memory;
pub mod traits;

pub use file::FileStore;
pub use listener::ChangeListener;
pub use memory::InMemoryStore;
pub use traits::{EditBatch, PreferenceStore, StoreHandle, WriteMode};
