//! Directories: ordered lists of file control blocks with a byte codec.


use crate::error::{FsError, Result};
use crate::layout::fcb::{FCB_SIZE, Fcb};

/// An in-memory directory. On disk it is the plain concatenation of its
/// entries' 24-byte records; the byte size is always `len() * FCB_SIZE`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directory {
    entries: Vec<Fcb>,
}

impl Directory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Size of the serialized directory in bytes.
    #[must_use]
    pub fn byte_size(&self) -> i32 {
        (self.entries.len() * FCB_SIZE) as i32
    }

    #[must_use]
    pub fn entries(&self) -> &[Fcb] {
        &self.entries
    }

    /// Index of the entry answering to `(name, is_dir)`.
    #[must_use]
    pub fn find(&self, name: &str, is_dir: bool) -> Option<usize> {
        self.entries.iter().position(|e| e.matches(name, is_dir))
    }

    #[must_use]
    pub fn get(&self, name: &str, is_dir: bool) -> Option<&Fcb> {
        self.find(name, is_dir).map(|i| &self.entries[i])
    }

    #[must_use]
    pub fn contains(&self, name: &str, is_dir: bool) -> bool {
        self.find(name, is_dir).is_some()
    }

    /// Appends `entry` to the directory.
    ///
    /// # Errors
    /// `DuplicateEntry` if an entry with the same name and kind exists.
    pub fn add(&mut self, entry: Fcb) -> Result<()> {
        if self.contains(&entry.name(), entry.is_dir()) {
            return Err(FsError::DuplicateEntry);
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Removes and returns the entry answering to `(name, is_dir)`.
    ///
    /// # Errors
    /// `NotFound` if no such entry exists.
    pub fn remove(&mut self, name: &str, is_dir: bool) -> Result<Fcb> {
        let index = self.find(name, is_dir).ok_or(FsError::NotFound)?;
        Ok(self.entries.remove(index))
    }

    /// Overwrites the entry matching `entry` by name and kind.
    ///
    /// # Errors
    /// `NotFound` if no such entry exists.
    pub fn update(&mut self, entry: Fcb) -> Result<()> {
        let index = self
            .find(&entry.name(), entry.is_dir())
            .ok_or(FsError::NotFound)?;
        self.entries[index] = entry;
        Ok(())
    }

    /// Renames the entry answering to `(name, is_dir)`.
    ///
    /// # Errors
    /// `NotFound` if no such entry exists.
    pub fn update_name(&mut self, name: &str, new_name: &str, is_dir: bool) -> Result<()> {
        let index = self.find(name, is_dir).ok_or(FsError::NotFound)?;
        self.entries[index].set_name(new_name);
        Ok(())
    }

    /// Points the entry answering to `(name, is_dir)` at a new starting block.
    ///
    /// # Errors
    /// `NotFound` if no such entry exists.
    pub fn update_location(&mut self, name: &str, block: i32, is_dir: bool) -> Result<()> {
        let index = self.find(name, is_dir).ok_or(FsError::NotFound)?;
        self.entries[index].set_starting_block(block);
        Ok(())
    }

    /// Stores a new byte size in the entry answering to `(name, is_dir)`.
    ///
    /// # Errors
    /// `NotFound` if no such entry exists.
    pub fn update_size(&mut self, name: &str, size: i32, is_dir: bool) -> Result<()> {
        let index = self.find(name, is_dir).ok_or(FsError::NotFound)?;
        self.entries[index].set_size(size);
        Ok(())
    }

    /// Serializes the directory; an empty directory yields an empty buffer.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.entries.len() * FCB_SIZE);
        for entry in &self.entries {
            out.extend_from_slice(&entry.to_bytes());
        }
        out
    }

    /// Reconstructs a directory of `size` bytes from `buf`.
    ///
    /// # Errors
    /// `InvalidDirBytes` if `size` is negative, not a record multiple, larger
    /// than `buf`, or the records contain duplicates.
    pub fn from_bytes(buf: &[u8], size: i32) -> Result<Self> {
        if size < 0 || size as usize % FCB_SIZE != 0 {
            return Err(FsError::InvalidDirBytes);
        }
        let size = size as usize;
        if buf.len() < size {
            return Err(FsError::InvalidDirBytes);
        }
        let mut dir = Self::new();
        for chunk in buf[..size].chunks_exact(FCB_SIZE) {
            dir.add(Fcb::from_bytes(chunk))
                .map_err(|_| FsError::InvalidDirBytes)?;
        }
        Ok(dir)
    }
}
