//! The open-file table: per-handle file control block copies and offsets.

#[cfg(test)]
mod oft_tests;

use std::fmt;

use crate::error::{FsError, Result};
use crate::layout::fcb::Fcb;

#[derive(Debug, Clone)]
struct Slot {
    fcb: Fcb,
    offset: i32,
}

/// Fixed-capacity table of open files. A handle is the index of the slot an
/// entry was installed in and stays valid until the entry is removed.
#[derive(Debug, Clone)]
pub struct OpenFileTable {
    slots: Vec<Option<Slot>>,
}

impl OpenFileTable {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.is_none())
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.slots.iter().all(|s| s.is_some())
    }

    /// Installs a copy of `fcb` with the given offset in the first empty slot
    /// and returns its handle.
    ///
    /// # Errors
    /// `InvalidWrite` if the offset is outside `0..=fcb.size()`, `TableFull`
    /// if every slot is occupied.
    pub fn add(&mut self, fcb: Fcb, offset: i32) -> Result<usize> {
        if offset < 0 || offset > fcb.size() {
            return Err(FsError::InvalidWrite);
        }
        let slot = self
            .slots
            .iter()
            .position(|s| s.is_none())
            .ok_or(FsError::TableFull)?;
        self.slots[slot] = Some(Slot { fcb, offset });
        Ok(slot)
    }

    /// Clears the slot for `handle`.
    ///
    /// # Errors
    /// `BadHandle` if the handle is out of range or the slot is empty.
    pub fn remove(&mut self, handle: usize) -> Result<()> {
        self.occupied(handle)?;
        self.slots[handle] = None;
        Ok(())
    }

    /// The handle of the slot holding the same on-disk entry as `fcb`.
    #[must_use]
    pub fn lookup_handle(&self, fcb: &Fcb) -> Option<usize> {
        self.slots.iter().position(|s| {
            s.as_ref()
                .is_some_and(|slot| slot.fcb.same_entry(fcb))
        })
    }

    #[must_use]
    pub fn is_open(&self, fcb: &Fcb) -> bool {
        self.lookup_handle(fcb).is_some()
    }

    /// # Errors
    /// `BadHandle` if the handle is out of range or the slot is empty.
    pub fn fcb(&self, handle: usize) -> Result<&Fcb> {
        self.occupied(handle).map(|slot| &slot.fcb)
    }

    /// # Errors
    /// `BadHandle` if the handle is out of range or the slot is empty.
    pub fn offset(&self, handle: usize) -> Result<i32> {
        self.occupied(handle).map(|slot| slot.offset)
    }

    /// Moves the slot's offset.
    ///
    /// # Errors
    /// `BadHandle` for an invalid handle, `InvalidWrite` for an offset
    /// outside the slot's current file size.
    pub fn update_offset(&mut self, handle: usize, offset: i32) -> Result<()> {
        let size = self.occupied(handle)?.fcb.size();
        if offset < 0 || offset > size {
            return Err(FsError::InvalidWrite);
        }
        if let Some(slot) = self.slots[handle].as_mut() {
            slot.offset = offset;
        }
        Ok(())
    }

    /// Replaces the slot's file control block copy, keeping the offset.
    ///
    /// # Errors
    /// `BadHandle` if the handle is out of range or the slot is empty.
    pub fn update_fcb(&mut self, handle: usize, fcb: Fcb) -> Result<()> {
        self.occupied(handle)?;
        if let Some(slot) = self.slots[handle].as_mut() {
            slot.fcb = fcb;
        }
        Ok(())
    }

    fn occupied(&self, handle: usize) -> Result<&Slot> {
        self.slots
            .get(handle)
            .and_then(|s| s.as_ref())
            .ok_or(FsError::BadHandle)
    }
}

impl fmt::Display for OpenFileTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "open file table ({} of {} slots)", self.len(), self.capacity())?;
        for (i, slot) in self.slots.iter().enumerate() {
            if let Some(slot) = slot {
                writeln!(
                    f,
                    "  {i}: {} @ block {}, size {}, offset {}",
                    slot.fcb.name(),
                    slot.fcb.starting_block(),
                    slot.fcb.size(),
                    slot.offset
                )?;
            }
        }
        Ok(())
    }
}
