//! On-disk layout primitives: allocation table, control blocks, directories.

pub mod directory;
pub mod fat;
pub mod fcb;
pub mod pcb;

pub use directory::Directory;
pub use fat::Fat;
pub use fcb::{FCB_SIZE, Fcb, MAX_NAME};
pub use pcb::Pcb;
