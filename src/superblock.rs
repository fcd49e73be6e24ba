use alloc::boxed::Box;

use log::info;

use crate::config::*;
use crate::error::{FsError, Result};
use crate::{BlockDevice, Inode, SuperBlock};

pub fn read_superblock<D: BlockDevice>(device: &D) -> Result<SuperBlock> {
    let mut buf = Box::new([0u8; BLOCK_SIZE]);
    device.read_block(SUPERBLOCK_ID, buf.as_mut_slice())?;
    let superblock = SuperBlock::decode(buf.as_slice());

    if superblock.magic != MAGIC {
        return Err(FsError::InvalidSuperBlock);
    }
    check_disk_size(device, superblock.disk_size)?;

    Ok(superblock)
}

pub fn write_superblock<D: BlockDevice>(device: &D, superblock: &SuperBlock) -> Result<()> {
    let mut buf = Box::new([0u8; BLOCK_SIZE]);
    superblock.encode(buf.as_mut_slice());
    device.write_block(SUPERBLOCK_ID, buf.as_slice())?;
    Ok(())
}

/// The root inode, its directory block and the two metadata blocks must fit,
/// and the bitmap is a single block.
fn check_disk_size<D: BlockDevice>(device: &D, disk_size: u32) -> Result<()> {
    if disk_size < ROOT_INODE_ID + 2
        || disk_size > MAX_DISK_BLOCKS
        || disk_size as usize > device.num_blocks()
    {
        return Err(FsError::InvalidSuperBlock);
    }
    Ok(())
}

/// Lays out an empty file system over the first `disk_size` blocks:
/// superblock, bitmap, root inode and the root's directory block.
pub fn format_fs<D: BlockDevice>(device: &D, disk_size: u32, now: u32) -> Result<SuperBlock> {
    check_disk_size(device, disk_size)?;
    let root_dir_block = ROOT_INODE_ID + 1;

    let superblock = SuperBlock::new(disk_size);
    let mut blocks = vec![0u8; BLOCK_SIZE * (root_dir_block as usize + 1)];
    let (sb_buf, rest) = blocks.split_at_mut(BLOCK_SIZE);
    let (bitmap_buf, rest) = rest.split_at_mut(BLOCK_SIZE);
    let (root_buf, _) = rest.split_at_mut(BLOCK_SIZE);

    superblock.encode(sb_buf);
    for block_id in 0..=root_dir_block as usize {
        bitmap_buf[block_id / 8] |= 1 << (block_id % 8);
    }
    let mut root = Inode {
        uid: 0,
        gid: 0,
        mode: S_IFDIR | 0o755,
        ctime: now,
        mtime: now,
        size: BLOCK_SIZE as i32,
        ptrs: [0; NUM_DIRECT_PTRS],
    };
    root.ptrs[0] = root_dir_block;
    root.encode(root_buf);

    device.write_blocks(SUPERBLOCK_ID, &blocks)?;
    device.flush()?;

    info!("formatted {} blocks, root inode at block {}", disk_size, ROOT_INODE_ID);
    Ok(superblock)
}
