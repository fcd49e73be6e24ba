//! Byte-range reads and writes over an inode's direct blocks.

use alloc::boxed::Box;
use alloc::vec::Vec;

use log::{trace, warn};

use crate::config::*;
use crate::error::{FsError, Result};
use crate::inode::{blocks_for, write_inode};
use crate::{BlockDevice, FileSystem, Inode};

/// Part of block `block_idx` covered by `[offset, end)`, as in-block offsets.
fn block_span(block_idx: usize, offset: u64, end: u64) -> (usize, usize) {
    let block_start = block_idx as u64 * BLOCK_SIZE as u64;
    let from = offset.max(block_start) - block_start;
    let to = end.min(block_start + BLOCK_SIZE as u64) - block_start;
    (from as usize, to as usize)
}

/// Reads data from a file into the provided buffer.
/// Reading at or past the end of file yields 0 bytes; a read running past the
/// end is cut short. Returns the number of bytes read.
pub fn fread(
    device: &impl BlockDevice,
    inode: &Inode,
    offset: u64,
    buffer: &mut [u8],
) -> Result<usize> {
    if !inode.is_file() {
        return Err(FsError::IsADirectory);
    }
    let size = inode.checked_size()?;
    if offset >= size || buffer.is_empty() {
        return Ok(0);
    }

    let len = buffer.len().min((size - offset) as usize);
    let end = offset + len as u64;
    let first_block = (offset / BLOCK_SIZE as u64) as usize;
    let last_block = ((end - 1) / BLOCK_SIZE as u64) as usize;

    let mut bytes_read = 0;
    let mut block_buf = Box::new([0u8; BLOCK_SIZE]);
    for block_idx in first_block..=last_block {
        let (from, to) = block_span(block_idx, offset, end);
        device.read_block(inode.ptrs[block_idx], block_buf.as_mut_slice())?;
        buffer[bytes_read..bytes_read + to - from].copy_from_slice(&block_buf[from..to]);
        bytes_read += to - from;
    }

    Ok(bytes_read)
}

impl<D: BlockDevice> FileSystem<D> {
    /// Writes `buffer` at `offset`, growing the file with fresh blocks as
    /// needed. New blocks are reserved in the bitmap before any data lands in
    /// them. Returns the number of bytes written, always `buffer.len()`.
    pub(crate) fn write_at(
        &mut self,
        inode_id: u32,
        inode: &mut Inode,
        offset: u64,
        buffer: &[u8],
    ) -> Result<usize> {
        if !inode.is_file() {
            return Err(FsError::IsADirectory);
        }
        let size = inode.checked_size()?;
        // No holes: a write starts inside the file or right at its end.
        if offset > size {
            return Err(FsError::InvalidArgument);
        }
        if buffer.is_empty() {
            return Ok(0);
        }
        let end = offset + buffer.len() as u64;
        if end > MAX_FSIZE as u64 {
            return Err(FsError::FileTooLarge);
        }

        let first_block = (offset / BLOCK_SIZE as u64) as usize;
        let last_block = ((end - 1) / BLOCK_SIZE as u64) as usize;
        let cur_blocks = inode.num_blocks();
        if last_block >= cur_blocks {
            let new_blocks = self
                .bitmap
                .find_first_n_free(RESERVED_BLOCKS, last_block + 1 - cur_blocks)?;
            self.reserve_blocks(&new_blocks)?;
            inode.ptrs[cur_blocks..=last_block].copy_from_slice(&new_blocks);
            trace!("[write] inode {} grew by blocks {:?}", inode_id, new_blocks);
        }

        if end > size {
            inode.size = end as i32;
        }
        inode.mtime = self.clock.now();
        write_inode(&*self.device, &self.superblock, inode_id, inode)?;

        let mut bytes_written = 0;
        let mut block_buf = Box::new([0u8; BLOCK_SIZE]);
        for block_idx in first_block..=last_block {
            let (from, to) = block_span(block_idx, offset, end);
            let block_id = inode.ptrs[block_idx];
            // Only the boundary blocks can be partial; keep their other bytes.
            if from != 0 || to != BLOCK_SIZE {
                self.device.read_block(block_id, block_buf.as_mut_slice())?;
            }
            block_buf[from..to].copy_from_slice(&buffer[bytes_written..bytes_written + to - from]);
            self.device.write_block(block_id, block_buf.as_slice())?;
            bytes_written += to - from;
        }

        Ok(bytes_written)
    }

    /// Shrinks a file to `len` bytes and releases the blocks past the new end.
    pub(crate) fn shrink(&mut self, inode_id: u32, inode: &mut Inode, len: u64) -> Result<()> {
        if !inode.is_file() {
            return Err(FsError::IsADirectory);
        }
        if len > inode.checked_size()? {
            warn!(
                "[truncate] inode {} cannot grow from {} to {} bytes",
                inode_id,
                inode.size,
                len
            );
            return Err(FsError::InvalidArgument);
        }

        let new_blocks = blocks_for(len);
        let cur_blocks = inode.num_blocks();
        let freed: Vec<u32> = inode.ptrs[new_blocks..cur_blocks].to_vec();
        inode.ptrs[new_blocks..cur_blocks].fill(0);
        inode.size = len as i32;
        write_inode(&*self.device, &self.superblock, inode_id, inode)?;

        self.release_blocks(&freed)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_block_span() {
        let bs = BLOCK_SIZE as u64;
        // Write of 10 bytes straddling the first block boundary.
        assert_eq!(block_span(0, bs - 4, bs + 6), (BLOCK_SIZE - 4, BLOCK_SIZE));
        assert_eq!(block_span(1, bs - 4, bs + 6), (0, 6));
        // Interior block fully covered.
        assert_eq!(block_span(1, 10, 3 * bs), (0, BLOCK_SIZE));
    }
}
