//! The filesystem engine: mount lifecycle, directory tree operations and
//! file I/O over the block chains.


mod chains;
mod ops_dir;
mod ops_file;
mod walk;

use std::path::Path;

use tracing::{debug, warn};

use crate::disk::Disk;
use crate::error::{FsError, Result};
use crate::layout::directory::Directory;
use crate::layout::fat::END_OF_CHAIN;
use crate::layout::fcb::{FCB_SIZE, Fcb};
use crate::layout::pcb::Pcb;
use crate::oft::OpenFileTable;

/// Reserved name of the root directory's self-entry.
pub const ROOT_NAME: &str = "ROOT";

/// Everything held in memory while the filesystem is mounted.
pub(crate) struct Mounted {
    pub(crate) pcb: Pcb,
    pub(crate) root: Directory,
    pub(crate) oft: OpenFileTable,
}

/// The engine handle. Owns the disk session and, while mounted, the control
/// block, the root directory and the open-file table. The lifecycle is
/// uninitialized, then mounted, then uninitialized again; `mkfs` leaves the
/// disk session open but unmounted.
#[derive(Default)]
pub struct Tfs {
    disk: Option<Disk>,
    state: Option<Mounted>,
}

impl Tfs {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            disk: None,
            state: None,
        }
    }

    #[must_use]
    pub const fn is_mounted(&self) -> bool {
        self.state.is_some()
    }

    /// Creates a fresh filesystem in the container at `path`, destroying any
    /// existing one: reserved chain for the control block, an empty root
    /// directory holding only its self-entry, and a pivot block past it.
    ///
    /// # Errors
    /// `AlreadyMounted` while a filesystem is mounted; `IoError` if the
    /// container cannot be created or the block size cannot hold a directory
    /// record; allocation and guard failures as their own kinds.
    pub fn mkfs(&mut self, path: &Path, total_bytes: u64, block_size: usize) -> Result<()> {
        if self.state.is_some() {
            return Err(FsError::AlreadyMounted);
        }
        if block_size < FCB_SIZE {
            return Err(FsError::IoError);
        }
        Disk::create(path, total_bytes, block_size)?;
        let mut disk = Disk::open(path, total_bytes, block_size)?;

        let mut pcb = Pcb::new(block_size, disk.block_count() as i32);
        pcb.link_reserved_chain()?;

        let root_block = pcb.root_dir_block();
        let mut root = Directory::new();
        root.add(Fcb::new(ROOT_NAME, true, root_block, FCB_SIZE as i32))?;
        disk.write_block(root_block as usize, &root.to_bytes())?;
        pcb.set_fat(root_block, END_OF_CHAIN)?;
        pcb.set_first_free_block(root_block + 1)?;

        chains::sync(&mut disk, &pcb)?;
        debug!(
            "mkfs: {} blocks of {block_size} bytes, root at {root_block}",
            disk.block_count()
        );
        self.disk = Some(disk);
        Ok(())
    }

    /// Mounts the filesystem in the container at `path`: reads the control
    /// block and table, loads the root directory in two passes (one record
    /// to learn its size from the self-entry, then the full directory) and
    /// allocates the open-file table.
    ///
    /// # Errors
    /// `AlreadyMounted` while mounted, `IoError` for a missing or corrupt
    /// container.
    pub fn mount(&mut self, path: &Path, total_bytes: u64, block_size: usize) -> Result<()> {
        if self.state.is_some() {
            return Err(FsError::AlreadyMounted);
        }
        let disk = Disk::open_existing(path, block_size)?;
        let pcb = chains::read_pcb(&disk)?;
        let root_block = pcb.root_dir_block();

        let boot = chains::load_dir(&disk, &pcb, root_block, FCB_SIZE as i32)?;
        let self_entry = boot.get(ROOT_NAME, true).ok_or(FsError::IoError)?;
        let root = chains::load_dir(&disk, &pcb, root_block, self_entry.size())?;

        let oft = OpenFileTable::new((total_bytes / block_size as u64) as usize);
        debug!("mount: root holds {} entries", root.len());
        self.disk = Some(disk);
        self.state = Some(Mounted { pcb, root, oft });
        Ok(())
    }

    /// Writes the control block and table back to their reserved blocks.
    ///
    /// # Errors
    /// `NotMounted` without a mounted filesystem.
    pub fn sync(&mut self) -> Result<()> {
        let (disk, state) = self.parts()?;
        chains::sync(disk, &state.pcb)
    }

    /// Unmounts: syncs metadata, freshens the root's self-entry, writes the
    /// root directory out and drops the in-memory state. Open handles are
    /// discarded with the table.
    ///
    /// # Errors
    /// `NotMounted` without a mounted filesystem.
    pub fn unmount(&mut self) -> Result<()> {
        let (disk, state) = self.parts()?;
        chains::sync(disk, &state.pcb)?;
        let size = state.root.byte_size();
        state.root.update_size(ROOT_NAME, size, true)?;
        let root_block = state.pcb.root_dir_block();
        let bytes = state.root.to_bytes();
        chains::write_blocks(disk, &mut state.pcb, &bytes, root_block)?;
        self.state = None;
        debug!("unmounted");
        Ok(())
    }

    /// Unmounts if mounted, then closes the disk session.
    ///
    /// # Errors
    /// Propagates unmount failures.
    pub fn exit(&mut self) -> Result<()> {
        if self.state.is_some() {
            self.unmount()?;
        }
        if let Some(disk) = self.disk.as_mut() {
            disk.close();
        }
        self.disk = None;
        Ok(())
    }

    /// The in-memory control block and table, rendered.
    ///
    /// # Errors
    /// `NotMounted` without a mounted filesystem.
    pub fn print_memory_state(&self) -> Result<String> {
        let state = self.state.as_ref().ok_or(FsError::NotMounted)?;
        Ok(state.pcb.to_string())
    }

    /// The control block and table as currently stored on disk, rendered.
    /// Works on any open disk session, mounted or not.
    ///
    /// # Errors
    /// `NotMounted` without an open session, `IoError` on a corrupt
    /// container.
    pub fn print_disk_state(&self) -> Result<String> {
        let disk = self.disk.as_ref().ok_or(FsError::NotMounted)?;
        let pcb = chains::read_pcb(disk)?;
        Ok(pcb.to_string())
    }

    pub(crate) fn parts(&mut self) -> Result<(&mut Disk, &mut Mounted)> {
        match (self.disk.as_mut(), self.state.as_mut()) {
            (Some(disk), Some(state)) => Ok((disk, state)),
            _ => {
                warn!("operation on unmounted file system");
                Err(FsError::NotMounted)
            }
        }
    }

    pub(crate) fn parts_ref(&self) -> Result<(&Disk, &Mounted)> {
        match (self.disk.as_ref(), self.state.as_ref()) {
            (Some(disk), Some(state)) => Ok((disk, state)),
            _ => Err(FsError::NotMounted),
        }
    }
}
