//! FAT-style filesystem engine over a single container file that emulates a
//! fixed-capacity block device.

pub mod disk;
pub mod error;
pub mod fs;
pub mod layout;
pub mod oft;

pub use error::{FsError, Result};
pub use fs::Tfs;
