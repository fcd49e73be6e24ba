//! Block allocation bitmap.
//! One bit per block of the whole device, superblock and bitmap included.
//! Kept in memory and written back to its fixed block by `persist`.

use alloc::boxed::Box;
use alloc::vec::Vec;

use log::trace;

use crate::config::*;
use crate::error::{FsError, Result};
use crate::BlockDevice;

fn bit_test(map: &[u8], i: usize) -> bool {
    map[i / 8] & (1 << (i % 8)) != 0
}

fn bit_set(map: &mut [u8], i: usize) {
    map[i / 8] |= 1 << (i % 8);
}

fn bit_clear(map: &mut [u8], i: usize) {
    map[i / 8] &= !(1 << (i % 8));
}

pub struct Bitmap {
    map: Box<[u8; BLOCK_SIZE]>,
    num_blocks: u32,
}

impl Bitmap {
    pub fn load(device: &impl BlockDevice, num_blocks: u32) -> Result<Self> {
        let mut map = Box::new([0u8; BLOCK_SIZE]);
        device.read_block(BITMAP_BLOCK_ID, map.as_mut_slice())?;
        Ok(Self { map, num_blocks })
    }

    pub fn num_blocks(&self) -> u32 {
        self.num_blocks
    }

    /// Blocks past the end of the device are never free.
    pub fn is_free(&self, index: u32) -> bool {
        index < self.num_blocks && !bit_test(self.map.as_slice(), index as usize)
    }

    /// Blocks past the end of the device are rejected, never marked.
    pub fn mark(&mut self, index: u32, used: bool) -> Result<()> {
        if index >= self.num_blocks {
            return Err(FsError::Io);
        }
        if used {
            bit_set(self.map.as_mut_slice(), index as usize);
        } else {
            bit_clear(self.map.as_mut_slice(), index as usize);
        }
        Ok(())
    }

    /// All or nothing: one bad index leaves the bitmap untouched.
    pub fn mark_all(&mut self, indices: &[u32], used: bool) -> Result<()> {
        if indices.iter().any(|&index| index >= self.num_blocks) {
            return Err(FsError::Io);
        }
        for &index in indices {
            self.mark(index, used)?;
        }
        Ok(())
    }

    /// First-fit scan from `start`. Returns exactly `n` block indices or
    /// `NoSpace`; nothing is marked.
    pub fn find_first_n_free(&self, start: u32, n: usize) -> Result<Vec<u32>> {
        let mut found = Vec::with_capacity(n);
        if n == 0 {
            return Ok(found);
        }
        for index in start..self.num_blocks {
            if self.is_free(index) {
                found.push(index);
                if found.len() == n {
                    trace!("[bitmap] found {} free blocks from {}: {:?}", n, start, found);
                    return Ok(found);
                }
            }
        }
        Err(FsError::NoSpace)
    }

    /// Number of used blocks in `[from, num_blocks)`.
    pub fn count_used(&self, from: u32) -> u32 {
        (from..self.num_blocks)
            .filter(|&i| bit_test(self.map.as_slice(), i as usize))
            .count() as u32
    }

    pub fn persist(&self, device: &impl BlockDevice) -> Result<()> {
        device.write_block(BITMAP_BLOCK_ID, self.map.as_slice())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn bitmap(num_blocks: u32, used: &[u32]) -> Bitmap {
        let mut bm = Bitmap {
            map: Box::new([0u8; BLOCK_SIZE]),
            num_blocks,
        };
        bm.mark_all(used, true).unwrap();
        bm
    }

    #[test]
    fn test_mark_and_test() {
        let mut bm = bitmap(64, &[0, 1, 9]);
        assert!(!bm.is_free(9));
        assert!(bm.is_free(8));
        assert_eq!(bm.map[1], 0b10);
        bm.mark(9, false).unwrap();
        assert!(bm.is_free(9));
        assert!(!bm.is_free(64));
    }

    #[test]
    fn test_mark_out_of_range() {
        let mut bm = bitmap(20, &[0, 1]);
        assert_eq!(bm.mark(20, true), Err(FsError::Io));
        // Bit 20 lives in byte 2 of the map; it must stay clear.
        assert_eq!(bm.map[2], 0);
        assert_eq!(bm.mark_all(&[5, 6, 99], true), Err(FsError::Io));
        assert!(bm.is_free(5));
        assert!(bm.is_free(6));
        assert_eq!(bm.count_used(0), 2);
    }

    #[test]
    fn test_first_fit() {
        let bm = bitmap(16, &[0, 1, 2, 3, 5]);
        assert_eq!(bm.find_first_n_free(2, 3).unwrap(), vec![4, 6, 7]);
        assert_eq!(bm.find_first_n_free(10, 6).unwrap(), vec![10, 11, 12, 13, 14, 15]);
        assert_eq!(bm.find_first_n_free(10, 7), Err(FsError::NoSpace));
        assert!(bm.find_first_n_free(0, 0).unwrap().is_empty());
    }

    #[test]
    fn test_count_used() {
        let bm = bitmap(32, &[0, 1, 2, 3, 30]);
        assert_eq!(bm.count_used(0), 5);
        assert_eq!(bm.count_used(RESERVED_BLOCKS), 3);
    }
}
