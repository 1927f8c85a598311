//! Block-chain reads and writes against the allocation table.

use tracing::debug;

use crate::disk::Disk;
use crate::error::{FsError, Result};
use crate::layout::directory::Directory;
use crate::layout::fat::{END_OF_CHAIN, FREE};
use crate::layout::pcb::Pcb;

/// Blocks required to store `len` bytes; an empty payload still takes one.
pub(crate) fn blocks_needed(len: usize, block_size: usize) -> usize {
    if len == 0 {
        1
    } else {
        len.div_ceil(block_size)
    }
}

/// Writes the serialized control block to its reserved span.
pub(crate) fn sync(disk: &mut Disk, pcb: &Pcb) -> Result<()> {
    let bytes = pcb.to_bytes();
    for (i, chunk) in bytes.chunks(pcb.block_size()).enumerate() {
        disk.write_block(i, chunk)?;
    }
    Ok(())
}

/// Reconstructs the control block from the reserved span on disk, trusting
/// the device geometry over the stored header fields.
pub(crate) fn read_pcb(disk: &Disk) -> Result<Pcb> {
    let block_size = disk.block_size();
    let num_blocks = disk.block_count();
    let span = Pcb::block_span(block_size, num_blocks);
    let mut buf = vec![0u8; span * block_size];
    for i in 0..span {
        disk.read_block(i, &mut buf[i * block_size..(i + 1) * block_size])?;
    }
    Pcb::from_bytes(&buf, block_size, num_blocks)
}

/// Reads the whole chain entered at `location` into one buffer of
/// `block_size * chain_length` bytes.
///
/// # Errors
/// `InvalidRead` if `location` is out of range or a free block.
pub(crate) fn read_blocks(disk: &Disk, pcb: &Pcb, location: i32) -> Result<Vec<u8>> {
    if location < 0 || location >= pcb.num_blocks() {
        return Err(FsError::InvalidRead);
    }
    if pcb.fat().get(location) == FREE {
        return Err(FsError::InvalidRead);
    }
    let chain: Vec<i32> = pcb.fat().chain(location).collect();
    let block_size = pcb.block_size();
    let mut out = vec![0u8; block_size * chain.len()];
    for (i, block) in chain.iter().enumerate() {
        disk.read_block(*block as usize, &mut out[i * block_size..(i + 1) * block_size])?;
    }
    Ok(out)
}

/// Writes `buf` as a chain starting at `location`, linking, extending or
/// shrinking as required, then syncs the table. Returns the starting block.
///
/// # Errors
/// `InvalidWrite` for an out-of-range location or a broken chain,
/// `OutOfSpace` when free blocks run out.
pub(crate) fn write_blocks(
    disk: &mut Disk,
    pcb: &mut Pcb,
    buf: &[u8],
    location: i32,
) -> Result<i32> {
    if location < 0 || location >= pcb.num_blocks() {
        return Err(FsError::InvalidWrite);
    }
    let needed = blocks_needed(buf.len(), pcb.block_size());
    if pcb.fat().get(location) == FREE {
        write_fresh(disk, pcb, buf, location, needed)?;
    } else {
        overwrite_chain(disk, pcb, buf, location, needed)?;
    }
    sync(disk, pcb)?;
    Ok(location)
}

/// Writes `buf` at the pivot block.
///
/// # Errors
/// `OutOfSpace` if the pivot is spent, otherwise as [`write_blocks`].
pub(crate) fn write_blocks_anywhere(disk: &mut Disk, pcb: &mut Pcb, buf: &[u8]) -> Result<i32> {
    let location = pcb.first_free_block();
    if location < 0 || pcb.fat().get(location) != FREE {
        return Err(FsError::OutOfSpace);
    }
    write_blocks(disk, pcb, buf, location)
}

fn write_fresh(
    disk: &mut Disk,
    pcb: &mut Pcb,
    buf: &[u8],
    location: i32,
    needed: usize,
) -> Result<()> {
    let block_size = pcb.block_size();
    if needed == 1 {
        write_chunk(disk, block_size, location, buf, 0)?;
        pcb.set_fat(location, END_OF_CHAIN)?;
    } else {
        let mut queue = pcb.allocate(needed - 1)?;
        let mut loc = location;
        let mut pos = 0;
        while pos < buf.len() {
            write_chunk(disk, block_size, loc, buf, pos)?;
            if let Some(next) = queue.pop_front() {
                pcb.set_fat(loc, next)?;
                loc = next;
            }
            pos += block_size;
        }
        pcb.set_fat(loc, END_OF_CHAIN)?;
    }
    if location == pcb.first_free_block() {
        let next_pivot = pcb.one_free();
        if next_pivot >= 0 {
            pcb.set_first_free_block(next_pivot)?;
            debug!("pivot moved to {next_pivot}");
        }
    }
    Ok(())
}

fn overwrite_chain(
    disk: &mut Disk,
    pcb: &mut Pcb,
    buf: &[u8],
    location: i32,
    needed: usize,
) -> Result<()> {
    let block_size = pcb.block_size();
    let mut loc = location;
    let mut pos = 0;
    let mut written = 0;
    loop {
        write_chunk(disk, block_size, loc, buf, pos)?;
        written += 1;
        pos += block_size;
        let next = pcb.fat().get(loc);
        if written == needed {
            if next != END_OF_CHAIN {
                pcb.free_chain(next)?;
                pcb.set_fat(loc, END_OF_CHAIN)?;
            }
            return Ok(());
        }
        if next == END_OF_CHAIN {
            // the old chain is shorter than the payload; append fresh blocks
            let mut queue = pcb.allocate(needed - written)?;
            while let Some(block) = queue.pop_front() {
                pcb.set_fat(loc, block)?;
                loc = block;
                write_chunk(disk, block_size, loc, buf, pos)?;
                pos += block_size;
            }
            return pcb.set_fat(loc, END_OF_CHAIN);
        }
        if next <= 0 {
            return Err(FsError::InvalidWrite);
        }
        loc = next;
    }
}

/// Writes one block's worth of `buf` starting at `pos`, zero-padding the
/// final partial chunk so recycled blocks never expose old bytes.
fn write_chunk(disk: &mut Disk, block_size: usize, block: i32, buf: &[u8], pos: usize) -> Result<()> {
    let mut chunk = vec![0u8; block_size];
    if pos < buf.len() {
        let end = (pos + block_size).min(buf.len());
        chunk[..end - pos].copy_from_slice(&buf[pos..end]);
    }
    disk.write_block(block as usize, &chunk)
}

/// Frees the chain entered at `location` and syncs the table.
pub(crate) fn clear_blocks(disk: &mut Disk, pcb: &mut Pcb, location: i32) -> Result<()> {
    pcb.free_chain(location)?;
    sync(disk, pcb)
}

pub(crate) fn load_dir(disk: &Disk, pcb: &Pcb, location: i32, size: i32) -> Result<Directory> {
    let bytes = read_blocks(disk, pcb, location)?;
    Directory::from_bytes(&bytes, size)
}

pub(crate) fn store_dir(
    disk: &mut Disk,
    pcb: &mut Pcb,
    dir: &Directory,
    location: i32,
) -> Result<()> {
    write_blocks(disk, pcb, &dir.to_bytes(), location).map(|_| ())
}

/// Copies up to `len` bytes into `buf`, starting `offset` bytes into the
/// chain entered at `start`. Stops at the end of the chain; returns the
/// number of bytes copied. The handle offset is not advanced here.
///
/// # Errors
/// `InvalidRead` for a zero length, an undersized buffer or a broken chain.
pub(crate) fn read_at(
    disk: &Disk,
    pcb: &Pcb,
    start: i32,
    offset: i32,
    buf: &mut [u8],
    len: usize,
) -> Result<usize> {
    if len == 0 || buf.len() < len || offset < 0 {
        return Err(FsError::InvalidRead);
    }
    let block_size = pcb.block_size();
    let nth = offset as usize / block_size;
    let mut loc = start;
    for _ in 0..nth {
        loc = pcb.fat().get(loc);
        if loc <= 0 {
            return Err(FsError::InvalidRead);
        }
    }
    if loc <= 0 || loc >= pcb.num_blocks() {
        return Err(FsError::InvalidRead);
    }

    let mut block = vec![0u8; block_size];
    disk.read_block(loc as usize, &mut block)?;
    let skip = offset as usize % block_size;
    let first = (block_size - skip).min(len);
    buf[..first].copy_from_slice(&block[skip..skip + first]);
    let mut copied = first;

    let mut cur = pcb.fat().get(loc);
    while cur > 0 && copied < len {
        disk.read_block(cur as usize, &mut block)?;
        let take = (len - copied).min(block_size);
        buf[copied..copied + take].copy_from_slice(&block[..take]);
        copied += take;
        cur = pcb.fat().get(cur);
    }
    Ok(copied)
}

/// Writes `data` into the chain entered at `start`, `offset` bytes in: the
/// tail of the file from the containing block onward is read, patched in
/// memory and written back, extending the chain when the payload runs past
/// it. Returns the number of bytes written.
///
/// # Errors
/// `InvalidWrite` for a negative offset or a broken chain, `OutOfSpace` when
/// extension fails.
pub(crate) fn write_at(
    disk: &mut Disk,
    pcb: &mut Pcb,
    start: i32,
    offset: i32,
    data: &[u8],
) -> Result<usize> {
    if offset < 0 {
        return Err(FsError::InvalidWrite);
    }
    let block_size = pcb.block_size();
    let nth = offset as usize / block_size;
    let mut loc = start;
    for _ in 0..nth {
        let next = pcb.fat().get(loc);
        if next == END_OF_CHAIN {
            // the offset sits exactly past the last block: grow the chain
            return extend_chain(disk, pcb, loc, data);
        }
        if next <= 0 {
            return Err(FsError::InvalidWrite);
        }
        loc = next;
    }

    let mut view = read_blocks(disk, pcb, loc)?;
    let skip = offset as usize % block_size;
    if data.len() > view.len() - skip {
        view.resize(skip + data.len(), 0);
    }
    view[skip..skip + data.len()].copy_from_slice(data);
    write_blocks(disk, pcb, &view, loc)?;
    Ok(data.len())
}

fn extend_chain(disk: &mut Disk, pcb: &mut Pcb, tail: i32, data: &[u8]) -> Result<usize> {
    let head = write_blocks_anywhere(disk, pcb, data)?;
    pcb.set_fat(tail, head)?;
    sync(disk, pcb)?;
    Ok(data.len())
}

#[cfg(test)]
mod tests {
    use super::blocks_needed;

    #[test]
    fn blocks_needed_is_exact() {
        assert_eq!(blocks_needed(0, 128), 1);
        assert_eq!(blocks_needed(1, 128), 1);
        assert_eq!(blocks_needed(128, 128), 1);
        assert_eq!(blocks_needed(129, 128), 2);
        assert_eq!(blocks_needed(256, 128), 2);
        assert_eq!(blocks_needed(257, 128), 3);
    }
}
