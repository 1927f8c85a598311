//! The partition control block: geometry header plus the allocation table.

#[cfg(test)]
mod pcb_tests;

use std::collections::VecDeque;
use std::fmt;

use tracing::warn;

use crate::error::{FsError, Result};
use crate::layout::fat::{END_OF_CHAIN, FREE, Fat};

/// Serialized header size: four 32-bit fields before the table.
pub const HEADER_SIZE: usize = 16;

/// In-memory partition control block. Serialized as four big-endian `i32`s
/// (block size, block count, first free block, root directory block) followed
/// by the table, padded to a whole number of blocks starting at block 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pcb {
    block_size: usize,
    num_blocks: i32,
    first_free_block: i32,
    root_dir_block: i32,
    fat: Fat,
}

impl Pcb {
    /// A fresh control block for `num_blocks` blocks of `block_size` bytes.
    /// The table starts all-free; the reserved span is computed but not yet
    /// linked (see [`Pcb::link_reserved_chain`]).
    #[must_use]
    pub fn new(block_size: usize, num_blocks: i32) -> Self {
        let span = Self::block_span(block_size, num_blocks as usize) as i32;
        Self {
            block_size,
            num_blocks,
            first_free_block: span,
            root_dir_block: span,
            fat: Fat::new(num_blocks as usize),
        }
    }

    /// Number of blocks the serialized control block occupies.
    #[must_use]
    pub const fn block_span(block_size: usize, num_blocks: usize) -> usize {
        (HEADER_SIZE + 4 * num_blocks).div_ceil(block_size)
    }

    #[must_use]
    pub const fn block_size(&self) -> usize {
        self.block_size
    }

    #[must_use]
    pub const fn num_blocks(&self) -> i32 {
        self.num_blocks
    }

    #[must_use]
    pub const fn first_free_block(&self) -> i32 {
        self.first_free_block
    }

    #[must_use]
    pub const fn root_dir_block(&self) -> i32 {
        self.root_dir_block
    }

    #[must_use]
    pub const fn fat(&self) -> &Fat {
        &self.fat
    }

    /// # Errors
    /// `FatGuard` if `block` does not address the partition.
    pub fn set_first_free_block(&mut self, block: i32) -> Result<()> {
        if block < 0 || block >= self.num_blocks {
            return Err(FsError::FatGuard);
        }
        self.first_free_block = block;
        Ok(())
    }

    /// # Errors
    /// `FatGuard` if `block` does not address the partition.
    pub fn set_root_dir_block(&mut self, block: i32) -> Result<()> {
        if block < 0 || block >= self.num_blocks {
            return Err(FsError::FatGuard);
        }
        self.root_dir_block = block;
        Ok(())
    }

    /// Guarded table mutation. Entries for the blocks holding this control
    /// block are frozen once set.
    ///
    /// # Errors
    /// `FatGuard` for an out-of-range index or value, or for a reserved-block
    /// entry that is already non-zero.
    pub fn set_fat(&mut self, index: i32, value: i32) -> Result<()> {
        if index < 0 || index >= self.num_blocks || value < END_OF_CHAIN || value >= self.num_blocks
        {
            warn!("rejected table update: {index} -> {value}");
            return Err(FsError::FatGuard);
        }
        if index < self.root_dir_block && self.fat.get(index) != FREE {
            return Err(FsError::FatGuard);
        }
        self.fat.set_raw(index as usize, value);
        Ok(())
    }

    /// Links the reserved span `0 -> 1 -> .. -> span-1 -> end` so the blocks
    /// holding this control block are never handed out.
    ///
    /// # Errors
    /// `FatGuard` if the span was already linked.
    pub fn link_reserved_chain(&mut self) -> Result<()> {
        let end = self.root_dir_block - 1;
        for i in 0..end {
            self.set_fat(i, i + 1)?;
        }
        self.set_fat(end, END_OF_CHAIN)
    }

    /// Up to `n` free blocks in ascending order, skipping the reserved span
    /// and the pivot block held by `first_free_block`.
    ///
    /// # Errors
    /// `OutOfSpace` if fewer than `n` blocks are free.
    pub fn allocate(&self, n: usize) -> Result<VecDeque<i32>> {
        let mut found = VecDeque::with_capacity(n);
        let mut i = self.root_dir_block + 1;
        while found.len() < n && i < self.num_blocks {
            if self.fat.get(i) == FREE && i != self.first_free_block {
                found.push_back(i);
            }
            i += 1;
        }
        if found.len() < n {
            warn!("allocation of {n} blocks failed; {} found", found.len());
            return Err(FsError::OutOfSpace);
        }
        Ok(found)
    }

    /// Any free block distinct from the pivot, or `-1` if none remains.
    #[must_use]
    pub fn one_free(&self) -> i32 {
        let mut i = self.root_dir_block + 1;
        while i < self.num_blocks {
            if self.fat.get(i) == FREE && i != self.first_free_block {
                return i;
            }
            i += 1;
        }
        -1
    }

    /// Frees every block of the chain entered at `head`.
    ///
    /// # Errors
    /// `FatGuard` if `head` lies inside the reserved span or out of range.
    pub fn free_chain(&mut self, head: i32) -> Result<()> {
        if head < self.root_dir_block || head >= self.num_blocks {
            return Err(FsError::FatGuard);
        }
        let mut cur = head;
        while cur > 0 {
            let next = self.fat.get(cur);
            self.set_fat(cur, FREE)?;
            cur = next;
        }
        Ok(())
    }

    /// Serializes the control block, padded to a whole number of blocks.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let span = Self::block_span(self.block_size, self.num_blocks as usize);
        let mut buf = vec![0u8; span * self.block_size];
        buf[0..4].copy_from_slice(&(self.block_size as i32).to_be_bytes());
        buf[4..8].copy_from_slice(&self.num_blocks.to_be_bytes());
        buf[8..12].copy_from_slice(&self.first_free_block.to_be_bytes());
        buf[12..16].copy_from_slice(&self.root_dir_block.to_be_bytes());
        for (i, entry) in self.fat.entries().iter().enumerate() {
            let off = HEADER_SIZE + 4 * i;
            buf[off..off + 4].copy_from_slice(&entry.to_be_bytes());
        }
        buf
    }

    /// Reconstructs a control block from its serialized form. The stored
    /// block size and count are discarded in favor of the caller's values;
    /// the pivot, root location and table come from `buf`.
    ///
    /// # Errors
    /// `IoError` if `buf` is short or the stored locations are out of range.
    pub fn from_bytes(buf: &[u8], block_size: usize, num_blocks: usize) -> Result<Self> {
        if buf.len() < HEADER_SIZE + 4 * num_blocks {
            return Err(FsError::IoError);
        }
        let mut pcb = Self::new(block_size, num_blocks as i32);
        let first_free = read_i32(buf, 8);
        let root_dir = read_i32(buf, 12);
        pcb.set_root_dir_block(root_dir).map_err(|_| FsError::IoError)?;
        pcb.set_first_free_block(first_free)
            .map_err(|_| FsError::IoError)?;
        let mut entries = Vec::with_capacity(num_blocks);
        for i in 0..num_blocks {
            entries.push(read_i32(buf, HEADER_SIZE + 4 * i));
        }
        pcb.fat = Fat::from_entries(entries);
        Ok(pcb)
    }
}

fn read_i32(buf: &[u8], offset: usize) -> i32 {
    i32::from_be_bytes(
        buf[offset..offset + 4]
            .try_into()
            .expect("four bytes available"),
    )
}

impl fmt::Display for Pcb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "partition control block")?;
        writeln!(f, "  block size: {}", self.block_size)?;
        writeln!(f, "  blocks: {}", self.num_blocks)?;
        writeln!(f, "  first free block: {}", self.first_free_block)?;
        writeln!(f, "  root directory block: {}", self.root_dir_block)?;
        writeln!(f, "file allocation table")?;
        for (i, entry) in self.fat.entries().iter().enumerate() {
            writeln!(f, "  {i}: {entry}")?;
        }
        Ok(())
    }
}
