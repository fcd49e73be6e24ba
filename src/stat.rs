//! Attribute translation and free-space accounting.

use crate::bitmap::Bitmap;
use crate::config::*;
use crate::{FileType, Inode};

/// Attributes reported to callers, `struct stat` style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileAttr {
    pub ino: u32,
    pub kind: FileType,
    pub mode: u32,
    pub nlink: u32,
    pub uid: u16,
    pub gid: u16,
    pub size: u64,
    pub blocks: u64,
    pub atime: u32,
    pub mtime: u32,
    pub ctime: u32,
}

/// Only the modification time is stored, so it stands in for all three.
/// There are no hard links.
pub fn inode_to_attr(inode_id: u32, inode: &Inode) -> FileAttr {
    FileAttr {
        ino: inode_id,
        kind: inode.file_type(),
        mode: inode.mode,
        nlink: 1,
        uid: inode.uid,
        gid: inode.gid,
        size: inode.byte_size(),
        blocks: inode.num_blocks() as u64,
        atime: inode.mtime,
        mtime: inode.mtime,
        ctime: inode.mtime,
    }
}

/// `statvfs` subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatFs {
    pub block_size: u32,
    pub blocks: u32,
    pub blocks_free: u32,
    pub blocks_available: u32,
    pub name_max: u32,
}

/// Running block counts. Built once from the bitmap, then adjusted by every
/// allocation and release; never rescanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    total: u32,
    free: u32,
}

impl Usage {
    /// Superblock and bitmap are not usable blocks and are not counted.
    pub fn from_bitmap(bitmap: &Bitmap) -> Self {
        let total = bitmap.num_blocks().saturating_sub(RESERVED_BLOCKS);
        let used = bitmap.count_used(RESERVED_BLOCKS);
        Self {
            total,
            free: total.saturating_sub(used),
        }
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn free(&self) -> u32 {
        self.free
    }

    /// Same as `free`: nothing is held back for privileged users.
    pub fn available(&self) -> u32 {
        self.free
    }

    pub fn used(&self) -> u32 {
        self.total - self.free
    }

    pub(crate) fn allocate(&mut self, n: usize) {
        self.free -= n as u32;
    }

    pub(crate) fn release(&mut self, n: usize) {
        self.free += n as u32;
    }

    pub fn statfs(&self) -> StatFs {
        StatFs {
            block_size: BLOCK_SIZE as u32,
            blocks: self.total,
            blocks_free: self.free,
            blocks_available: self.available(),
            name_max: MAX_NAME_LEN as u32,
        }
    }
}
