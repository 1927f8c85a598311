//! Directory tree operations: mkdir, rmdir, ls.

use tracing::debug;

use crate::error::{FsError, Result};
use crate::fs::{ROOT_NAME, Tfs, chains, walk};
use crate::layout::fcb::Fcb;

impl Tfs {
    /// Creates an empty directory at `path`. Intermediate directories are not
    /// created.
    ///
    /// # Errors
    /// `PathNotFound` for a missing interior directory, `DuplicateEntry` when
    /// the parent already holds a directory of that name.
    pub fn mkdir(&mut self, path: &str) -> Result<()> {
        let components = walk::parse_path(path)?;
        let (disk, state) = self.parts()?;
        let name = components.last().ok_or(FsError::InvalidPath)?;

        if components.len() == 1 {
            if state.root.contains(name, true) {
                return Err(FsError::DuplicateEntry);
            }
            let location = chains::write_blocks_anywhere(disk, &mut state.pcb, &[])?;
            state.root.add(Fcb::new(name, true, location, 0))?;
            let size = state.root.byte_size();
            state.root.update_size(ROOT_NAME, size, true)?;
            let root_block = state.pcb.root_dir_block();
            chains::store_dir(disk, &mut state.pcb, &state.root, root_block)?;
            debug!("mkdir {path} at block {location}");
            return Ok(());
        }

        let mut w = walk::walk_to_parent(disk, &state.pcb, &state.root, &components)?;
        if w.parent.contains(name, true) {
            return Err(FsError::DuplicateEntry);
        }
        let location = chains::write_blocks_anywhere(disk, &mut state.pcb, &[])?;
        w.parent.add(Fcb::new(name, true, location, 0))?;
        debug!("mkdir {path} at block {location}");
        walk::store_parent_and_propagate(disk, &mut state.pcb, &mut state.root, &components, w)
    }

    /// Removes the directory at `path` if it is empty. The root's self-entry
    /// is not removable.
    ///
    /// # Errors
    /// `NotFound` when the target is missing, `DirNotEmpty` when it still
    /// holds entries.
    pub fn rmdir(&mut self, path: &str) -> Result<()> {
        let components = walk::parse_path(path)?;
        let (disk, state) = self.parts()?;
        let name = components.last().ok_or(FsError::InvalidPath)?;

        if components.len() == 1 {
            if name.eq_ignore_ascii_case(ROOT_NAME) {
                return Err(FsError::InvalidPath);
            }
            let target = state
                .root
                .get(name, true)
                .ok_or(FsError::NotFound)?
                .clone();
            if target.size() != 0 {
                return Err(FsError::DirNotEmpty);
            }
            state.root.remove(name, true)?;
            chains::clear_blocks(disk, &mut state.pcb, target.starting_block())?;
            let size = state.root.byte_size();
            state.root.update_size(ROOT_NAME, size, true)?;
            let root_block = state.pcb.root_dir_block();
            chains::store_dir(disk, &mut state.pcb, &state.root, root_block)?;
            return Ok(());
        }

        let mut w = walk::walk_to_parent(disk, &state.pcb, &state.root, &components)?;
        let target = w.parent.get(name, true).ok_or(FsError::NotFound)?.clone();
        if target.size() != 0 {
            return Err(FsError::DirNotEmpty);
        }
        chains::clear_blocks(disk, &mut state.pcb, target.starting_block())?;
        w.parent.remove(name, true)?;
        walk::store_parent_and_propagate(disk, &mut state.pcb, &mut state.root, &components, w)
    }

    /// Lists the directory at `path`. `/` lists the root, self-entry
    /// included.
    ///
    /// # Errors
    /// `NotFound` when the terminal component is not a directory in its
    /// parent, `PathNotFound` for missing interior components.
    pub fn ls(&self, path: &str) -> Result<Vec<Fcb>> {
        let (disk, state) = self.parts_ref()?;
        if path == "/" {
            return Ok(state.root.entries().to_vec());
        }
        let components = walk::parse_path(path)?;
        let name = components.last().ok_or(FsError::InvalidPath)?;
        let parent = walk::locate_parent(disk, &state.pcb, &state.root, &components)?;
        let target = parent
            .dir(&state.root)
            .get(name, true)
            .ok_or(FsError::NotFound)?;
        let dir = chains::load_dir(disk, &state.pcb, target.starting_block(), target.size())?;
        Ok(dir.entries().to_vec())
    }
}
