//! Host-file block device: a preallocated container addressed by block index.


use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::{MmapMut, MmapOptions};
use tracing::warn;

use crate::error::{FsError, Result};

/// A fixed-capacity emulated disk backed by a single host file.
///
/// The container is preallocated at creation time and memory-mapped for the
/// duration of the session. Block size and count are fixed once opened.
pub struct Disk {
    path: PathBuf,
    file: Option<File>,
    map: Option<MmapMut>,
    len: u64,
    block_size: usize,
}

impl Disk {
    /// Creates the container file, replacing any existing one, and
    /// preallocates `total_bytes`.
    ///
    /// # Errors
    /// Returns `IoError` if `total_bytes` is smaller than one block or the
    /// file cannot be created.
    pub fn create(path: &Path, total_bytes: u64, block_size: usize) -> Result<()> {
        if block_size == 0 || total_bytes < block_size as u64 {
            return Err(FsError::IoError);
        }
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| {
                warn!("container create failed for {}: {e}", path.display());
                FsError::IoError
            })?;
        file.set_len(total_bytes).map_err(|_| FsError::IoError)?;
        Ok(())
    }

    /// Opens an existing container and forces its length to `total_bytes`.
    ///
    /// # Errors
    /// Returns `IoError` if the container is missing or cannot be mapped.
    pub fn open(path: &Path, total_bytes: u64, block_size: usize) -> Result<Self> {
        if !path.exists() {
            return Err(FsError::IoError);
        }
        let file = open_rw(path)?;
        file.set_len(total_bytes).map_err(|_| FsError::IoError)?;
        Self::from_file(path, file, total_bytes, block_size)
    }

    /// Opens an existing container, taking its length from file metadata.
    ///
    /// # Errors
    /// Returns `IoError` if the container is missing or cannot be mapped.
    pub fn open_existing(path: &Path, block_size: usize) -> Result<Self> {
        if !path.exists() {
            return Err(FsError::IoError);
        }
        let file = open_rw(path)?;
        let len = file.metadata().map_err(|_| FsError::IoError)?.len();
        Self::from_file(path, file, len, block_size)
    }

    fn from_file(path: &Path, file: File, len: u64, block_size: usize) -> Result<Self> {
        if block_size == 0 || len < block_size as u64 {
            return Err(FsError::IoError);
        }
        let map_len = usize::try_from(len).map_err(|_| FsError::IoError)?;
        let map = unsafe {
            MmapOptions::new()
                .len(map_len)
                .map_mut(&file)
                .map_err(|e| {
                    warn!("container map failed for {}: {e}", path.display());
                    FsError::IoError
                })?
        };
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            map: Some(map),
            len,
            block_size,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of whole blocks in the container.
    #[must_use]
    pub const fn block_count(&self) -> usize {
        (self.len / self.block_size as u64) as usize
    }

    #[must_use]
    pub const fn is_operational(&self) -> bool {
        self.file.is_some() && self.map.is_some()
    }

    /// Fills `buf` with the contents of one block.
    ///
    /// # Errors
    /// `IoBounds` for an out-of-range index, `IoError` if the device is
    /// closed or `buf` cannot hold a full block.
    pub fn read_block(&self, index: usize, buf: &mut [u8]) -> Result<()> {
        let map = self.map.as_ref().ok_or(FsError::IoError)?;
        if buf.len() < self.block_size {
            return Err(FsError::IoError);
        }
        if index >= self.block_count() {
            return Err(FsError::IoBounds);
        }
        let off = index * self.block_size;
        buf[..self.block_size].copy_from_slice(&map[off..off + self.block_size]);
        Ok(())
    }

    /// Writes up to one block of `buf` at the block's offset.
    ///
    /// # Errors
    /// `IoBounds` for an out-of-range index, `IoError` if the device is
    /// closed.
    pub fn write_block(&mut self, index: usize, buf: &[u8]) -> Result<()> {
        let block_size = self.block_size;
        let count = self.block_count();
        let map = self.map.as_mut().ok_or(FsError::IoError)?;
        if index >= count {
            return Err(FsError::IoBounds);
        }
        let n = buf.len().min(block_size);
        let off = index * block_size;
        map[off..off + n].copy_from_slice(&buf[..n]);
        Ok(())
    }

    /// Drops the mapping and the file handle; later accesses fail `IoError`.
    pub fn close(&mut self) {
        self.map.take();
        self.file.take();
    }
}

fn open_rw(path: &Path) -> Result<File> {
    std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|e| {
            warn!("container open failed for {}: {e}", path.display());
            FsError::IoError
        })
}
