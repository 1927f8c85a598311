use thiserror::Error;

/// Failure kinds surfaced by the engine and its components.
///
/// Kept fieldless so operations can be matched exactly in tests; the shell
/// picks its user-facing message per variant.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    #[error("malformed path")]
    InvalidPath,
    #[error("file system not mounted")]
    NotMounted,
    #[error("file system already mounted")]
    AlreadyMounted,
    #[error("a directory along the path does not exist")]
    PathNotFound,
    #[error("target not found in parent directory")]
    NotFound,
    #[error("entry already exists in parent directory")]
    DuplicateEntry,
    #[error("directory is not empty")]
    DirNotEmpty,
    #[error("not enough free blocks")]
    OutOfSpace,
    #[error("illegal file allocation table mutation")]
    FatGuard,
    #[error("file handle invalid or not open")]
    BadHandle,
    #[error("open file table is full")]
    TableFull,
    #[error("read outside the valid range")]
    InvalidRead,
    #[error("write outside the valid range")]
    InvalidWrite,
    #[error("block device operation failed")]
    IoError,
    #[error("block index out of range")]
    IoBounds,
    #[error("directory bytes are malformed")]
    InvalidDirBytes,
}

pub type Result<T> = std::result::Result<T, FsError>;
