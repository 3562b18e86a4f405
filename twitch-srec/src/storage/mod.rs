//! Recording file layout on disk.

mod layout;

pub use layout::{Role, StorageLayout};
