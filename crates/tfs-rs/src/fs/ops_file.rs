//! File operations: create, rm, rename, cp, append and ranged reads.

use tracing::debug;

use crate::error::{FsError, Result};
use crate::fs::{ROOT_NAME, Tfs, chains, walk};
use crate::layout::fcb::Fcb;

impl Tfs {
    /// Creates a file of `size` bytes at `path`, zero-filled. Even an empty
    /// file reserves one block. Returns the starting block.
    ///
    /// # Errors
    /// `DuplicateEntry` when the parent already holds a file of that name,
    /// `OutOfSpace` when blocks run out.
    pub fn create(&mut self, path: &str, size: i32) -> Result<i32> {
        let components = walk::parse_path(path)?;
        let (disk, state) = self.parts()?;
        if size < 0 {
            return Err(FsError::InvalidWrite);
        }
        let name = components.last().ok_or(FsError::InvalidPath)?;
        let block_size = state.pcb.block_size();
        let write_size = (size as usize).div_ceil(block_size).max(1) * block_size;

        if components.len() == 1 {
            if state.root.contains(name, false) {
                return Err(FsError::DuplicateEntry);
            }
            let zeros = vec![0u8; write_size];
            let location = chains::write_blocks_anywhere(disk, &mut state.pcb, &zeros)?;
            state.root.add(Fcb::new(name, false, location, size))?;
            let root_size = state.root.byte_size();
            state.root.update_size(ROOT_NAME, root_size, true)?;
            let root_block = state.pcb.root_dir_block();
            chains::store_dir(disk, &mut state.pcb, &state.root, root_block)?;
            debug!("create {path} ({size} bytes) at block {location}");
            return Ok(location);
        }

        let mut w = walk::walk_to_parent(disk, &state.pcb, &state.root, &components)?;
        if w.parent.contains(name, false) {
            return Err(FsError::DuplicateEntry);
        }
        let zeros = vec![0u8; write_size];
        let location = chains::write_blocks_anywhere(disk, &mut state.pcb, &zeros)?;
        w.parent.add(Fcb::new(name, false, location, size))?;
        debug!("create {path} ({size} bytes) at block {location}");
        walk::store_parent_and_propagate(disk, &mut state.pcb, &mut state.root, &components, w)?;
        Ok(location)
    }

    /// Creates an empty file at `path`. Returns the starting block.
    ///
    /// # Errors
    /// As [`Tfs::create`].
    pub fn create_empty(&mut self, path: &str) -> Result<i32> {
        self.create(path, 0)
    }

    /// Removes the file at `path`, freeing its chain and closing any open
    /// handle on it.
    ///
    /// # Errors
    /// `NotFound` when the parent holds no such file.
    pub fn rm(&mut self, path: &str) -> Result<()> {
        let components = walk::parse_path(path)?;
        let (disk, state) = self.parts()?;
        let name = components.last().ok_or(FsError::InvalidPath)?;

        if components.len() == 1 {
            let target = state
                .root
                .get(name, false)
                .ok_or(FsError::NotFound)?
                .clone();
            if let Some(handle) = state.oft.lookup_handle(&target) {
                state.oft.remove(handle)?;
            }
            chains::clear_blocks(disk, &mut state.pcb, target.starting_block())?;
            state.root.remove(name, false)?;
            let size = state.root.byte_size();
            state.root.update_size(ROOT_NAME, size, true)?;
            let root_block = state.pcb.root_dir_block();
            chains::store_dir(disk, &mut state.pcb, &state.root, root_block)?;
            return Ok(());
        }

        let mut w = walk::walk_to_parent(disk, &state.pcb, &state.root, &components)?;
        let target = w.parent.get(name, false).ok_or(FsError::NotFound)?.clone();
        if let Some(handle) = state.oft.lookup_handle(&target) {
            state.oft.remove(handle)?;
        }
        chains::clear_blocks(disk, &mut state.pcb, target.starting_block())?;
        w.parent.remove(name, false)?;
        walk::store_parent_and_propagate(disk, &mut state.pcb, &mut state.root, &components, w)
    }

    /// Renames the file at `path` to `new_name` within its directory. An open
    /// handle follows the rename.
    ///
    /// # Errors
    /// `NotFound` when the file is missing, `DuplicateEntry` when a file
    /// named `new_name` already exists there (renaming to the same name
    /// included).
    pub fn rename(&mut self, path: &str, new_name: &str) -> Result<()> {
        let components = walk::parse_path(path)?;
        if new_name.is_empty()
            || new_name.contains('/')
            || new_name.chars().any(char::is_whitespace)
        {
            return Err(FsError::InvalidPath);
        }
        let (disk, state) = self.parts()?;
        let name = components.last().ok_or(FsError::InvalidPath)?;

        match walk::locate_parent(disk, &state.pcb, &state.root, &components)? {
            walk::Parent::Root => {
                let old = state
                    .root
                    .get(name, false)
                    .ok_or(FsError::NotFound)?
                    .clone();
                if state.root.contains(new_name, false) {
                    return Err(FsError::DuplicateEntry);
                }
                let handle = state.oft.lookup_handle(&old);
                state.root.update_name(name, new_name, false)?;
                if let Some(handle) = handle {
                    let updated = state
                        .root
                        .get(new_name, false)
                        .ok_or(FsError::NotFound)?
                        .clone();
                    state.oft.update_fcb(handle, updated)?;
                }
                let root_block = state.pcb.root_dir_block();
                chains::store_dir(disk, &mut state.pcb, &state.root, root_block)
            }
            walk::Parent::Nested { mut dir, fcb } => {
                let old = dir.get(name, false).ok_or(FsError::NotFound)?.clone();
                if dir.contains(new_name, false) {
                    return Err(FsError::DuplicateEntry);
                }
                let handle = state.oft.lookup_handle(&old);
                dir.update_name(name, new_name, false)?;
                if let Some(handle) = handle {
                    let updated = dir
                        .get(new_name, false)
                        .ok_or(FsError::NotFound)?
                        .clone();
                    state.oft.update_fcb(handle, updated)?;
                }
                chains::store_dir(disk, &mut state.pcb, &dir, fcb.starting_block())
            }
        }
    }

    /// Copies the non-empty file at `src` to the fresh path `dst`.
    ///
    /// # Errors
    /// `NotFound` when the source is missing, `InvalidRead` when it is
    /// empty, `DuplicateEntry` when the destination already exists.
    pub fn cp(&mut self, src: &str, dst: &str) -> Result<()> {
        walk::parse_path(dst)?;
        let (source_block, source_size) = {
            let components = walk::parse_path(src)?;
            let (disk, state) = self.parts()?;
            let name = components.last().ok_or(FsError::InvalidPath)?;
            let parent = walk::locate_parent(disk, &state.pcb, &state.root, &components)?;
            let source = parent
                .dir(&state.root)
                .get(name, false)
                .ok_or(FsError::NotFound)?;
            if source.size() == 0 {
                return Err(FsError::InvalidRead);
            }
            (source.starting_block(), source.size())
        };

        let destination = self.create(dst, source_size)?;
        let (disk, state) = self.parts()?;
        let bytes = chains::read_blocks(disk, &state.pcb, source_block)?;
        chains::write_blocks(disk, &mut state.pcb, &bytes, destination)?;
        debug!("cp {src} -> {dst} ({source_size} bytes)");
        Ok(())
    }

    /// Appends `data` to the file at `path`, opening it if needed, and
    /// refreshes the size recorded in its parent and any open handle.
    ///
    /// # Errors
    /// `NotFound` when the parent holds no such file, `InvalidWrite` for an
    /// empty payload.
    pub fn append(&mut self, path: &str, data: &[u8]) -> Result<()> {
        let components = walk::parse_path(path)?;
        if data.is_empty() {
            return Err(FsError::InvalidWrite);
        }
        let added = i32::try_from(data.len()).map_err(|_| FsError::InvalidWrite)?;
        let (disk, state) = self.parts()?;
        let name = components.last().ok_or(FsError::InvalidPath)?;

        let parent = walk::locate_parent(disk, &state.pcb, &state.root, &components)?;
        let target = parent
            .dir(&state.root)
            .get(name, false)
            .ok_or(FsError::NotFound)?
            .clone();

        let handle = match state.oft.lookup_handle(&target) {
            Some(handle) => handle,
            None => state.oft.add(target.clone(), 0)?,
        };
        state.oft.update_offset(handle, target.size())?;
        let offset = state.oft.offset(handle)?;
        chains::write_at(disk, &mut state.pcb, target.starting_block(), offset, data)?;

        let mut updated = target;
        updated.set_size(updated.size() + added);
        state.oft.update_fcb(handle, updated.clone())?;

        match parent {
            walk::Parent::Root => {
                state.root.update(updated)?;
                let root_block = state.pcb.root_dir_block();
                chains::store_dir(disk, &mut state.pcb, &state.root, root_block)
            }
            walk::Parent::Nested { mut dir, fcb } => {
                dir.update(updated)?;
                chains::store_dir(disk, &mut state.pcb, &dir, fcb.starting_block())
            }
        }
    }

    /// Reads `n` bytes from `position` in the file at `path` and decodes them
    /// as UTF-8, opening the file if needed.
    ///
    /// # Errors
    /// `NotFound` when the file is missing, `InvalidRead` when the range
    /// falls outside the file.
    pub fn read_range(&mut self, path: &str, position: i32, n: i32) -> Result<String> {
        let components = walk::parse_path(path)?;
        let (disk, state) = self.parts()?;
        let name = components.last().ok_or(FsError::InvalidPath)?;

        let parent = walk::locate_parent(disk, &state.pcb, &state.root, &components)?;
        let target = parent
            .dir(&state.root)
            .get(name, false)
            .ok_or(FsError::NotFound)?
            .clone();

        if position < 0 || position > target.size() {
            return Err(FsError::InvalidRead);
        }
        if n < 0 || position + n > target.size() {
            return Err(FsError::InvalidRead);
        }

        let handle = match state.oft.lookup_handle(&target) {
            Some(handle) => handle,
            None => state.oft.add(target.clone(), 0)?,
        };
        state.oft.update_offset(handle, position)?;
        let offset = state.oft.offset(handle)?;
        let start = state.oft.fcb(handle)?.starting_block();

        let mut buf = vec![0u8; n as usize];
        let read = chains::read_at(disk, &state.pcb, start, offset, &mut buf, n as usize)?;
        buf.truncate(read);
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
