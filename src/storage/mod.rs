mod loro_store;

pub use loro_store::{LoroStore, TALLY_DIR};
