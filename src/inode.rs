//! Management of reading and writing inodes.
//! There is no inode table: an inode number is the block number holding it.

use alloc::boxed::Box;

use crate::config::*;
use crate::error::{FsError, Result};
use crate::{BlockDevice, FileType, Inode, SuperBlock};

/// Identity stamped on newly created inodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Credentials {
    pub uid: u16,
    pub gid: u16,
}

impl Credentials {
    pub fn new(uid: u16, gid: u16) -> Self {
        Self { uid, gid }
    }
}

/// Number of blocks needed to hold `size` bytes.
pub fn blocks_for(size: u64) -> usize {
    size.div_ceil(BLOCK_SIZE as u64) as usize
}

fn check_inode_id(superblock: &SuperBlock, inode_id: u32) -> Result<()> {
    if inode_id < ROOT_INODE_ID || inode_id >= superblock.disk_size {
        return Err(FsError::Io);
    }
    Ok(())
}

pub fn get_inode(
    device: &impl BlockDevice,
    superblock: &SuperBlock,
    inode_id: u32,
) -> Result<Inode> {
    check_inode_id(superblock, inode_id)?;
    let mut buf = Box::new([0u8; BLOCK_SIZE]);
    device.read_block(inode_id, buf.as_mut_slice())?;
    Ok(Inode::decode(buf.as_slice()))
}

pub fn write_inode(
    device: &impl BlockDevice,
    superblock: &SuperBlock,
    inode_id: u32,
    inode: &Inode,
) -> Result<()> {
    check_inode_id(superblock, inode_id)?;
    let mut buf = Box::new([0u8; BLOCK_SIZE]);
    inode.encode(buf.as_mut_slice());
    device.write_block(inode_id, buf.as_slice())
}

impl Inode {
    /// Fresh inode with no data blocks. A directory gets `dir_block` as its
    /// only pointer and a size of one block.
    pub fn new(
        ftype: FileType,
        perm: u32,
        cred: Credentials,
        now: u32,
        dir_block: Option<u32>,
    ) -> Self {
        let mut inode = Inode {
            uid: cred.uid,
            gid: cred.gid,
            mode: (perm & !S_IFMT) | ftype.type_bits(),
            ctime: now,
            mtime: now,
            size: 0,
            ptrs: [0; NUM_DIRECT_PTRS],
        };
        if let (FileType::Directory, Some(block_id)) = (ftype, dir_block) {
            inode.ptrs[0] = block_id;
            inode.size = BLOCK_SIZE as i32;
        }
        inode
    }

    pub fn byte_size(&self) -> u64 {
        self.size.max(0) as u64
    }

    /// File size for the data paths. A size no direct pointer array could
    /// hold means the inode is corrupt.
    pub fn checked_size(&self) -> Result<u64> {
        let size = self.byte_size();
        if size > MAX_FSIZE as u64 {
            return Err(FsError::Io);
        }
        Ok(size)
    }

    /// Blocks in use by this inode's data, `ceil(size / BLOCK_SIZE)`.
    pub fn num_blocks(&self) -> usize {
        blocks_for(self.byte_size()).min(NUM_DIRECT_PTRS)
    }

    /// Pointers that are actually allocated. Anything past these is garbage.
    pub fn data_blocks(&self) -> &[u32] {
        &self.ptrs[..self.num_blocks()]
    }
}
