pub mod local_exclude;
pub mod state_dir;
pub mod store;

pub use state_dir::{StateDir, STATE_DIR_NAME};
pub use store::StateStore;
