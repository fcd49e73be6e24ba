use alloc::{string::String, sync::Arc, vec::Vec};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info};

use crate::bitmap::Bitmap;
use crate::config::*;
use crate::directory::{
    dir_is_empty, dir_rename_entry, dir_rm_entry, init_dir_block, read_dir, read_dir_block,
    write_dir_block,
};
use crate::error::{FsError, Result};
use crate::file::fread;
use crate::inode::{Credentials, get_inode, write_inode};
use crate::path::{final_name, parse, resolve};
use crate::stat::{FileAttr, StatFs, Usage, inode_to_attr};
use crate::superblock::{format_fs, read_superblock};
use crate::{BlockDevice, DirEntry, FileType, Inode, SuperBlock};

/// Source of timestamps for created and modified inodes, in seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> u32;
}

/// Wall clock, seconds since the Unix epoch.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u32 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0)
    }
}

/// A mounted file system. Owns the device, the in-memory bitmap and the usage
/// counters. Mutating operations take `&mut self`: there is a single writer,
/// and callers sharing an instance must wrap it in a lock themselves.
pub struct FileSystem<D: BlockDevice> {
    pub(crate) device: Arc<D>,
    pub(crate) superblock: SuperBlock,
    pub(crate) bitmap: Bitmap,
    pub(crate) usage: Usage,
    pub(crate) clock: Arc<dyn Clock>,
}

impl<D: BlockDevice> FileSystem<D> {
    /// Writes a fresh, empty file system over the first `disk_size` blocks
    /// of `device` and mounts it.
    pub fn format(device: Arc<D>, disk_size: u32) -> Result<Self> {
        format_fs(&*device, disk_size, SystemClock.now())?;
        Self::mount(device)
    }

    pub fn mount(device: Arc<D>) -> Result<Self> {
        let superblock = read_superblock(&*device)?;
        let bitmap = Bitmap::load(&*device, superblock.disk_size)?;
        let usage = Usage::from_bitmap(&bitmap);
        // The root inode must be there and be a directory.
        if !get_inode(&*device, &superblock, ROOT_INODE_ID)?.is_dir() {
            return Err(FsError::InvalidSuperBlock);
        }

        info!(
            "mounted: block size {}, magic {:#x}, disk size {} blocks, {} used, {} free",
            BLOCK_SIZE,
            superblock.magic,
            superblock.disk_size,
            usage.used(),
            usage.free()
        );
        Ok(Self {
            device,
            superblock,
            bitmap,
            usage,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Marks freshly allocated blocks used, writes the bitmap back and
    /// charges the usage counters.
    pub(crate) fn reserve_blocks(&mut self, blocks: &[u32]) -> Result<()> {
        self.bitmap.mark_all(blocks, true)?;
        self.bitmap.persist(&*self.device)?;
        self.usage.allocate(blocks.len());
        Ok(())
    }

    /// Returns blocks to the free pool. Callers detach every reference first.
    pub(crate) fn release_blocks(&mut self, blocks: &[u32]) -> Result<()> {
        if blocks.is_empty() {
            return Ok(());
        }
        self.bitmap.mark_all(blocks, false)?;
        self.bitmap.persist(&*self.device)?;
        self.usage.release(blocks.len());
        Ok(())
    }

    /// Resolves `path` to its target (depth 0) or an ancestor (depth n).
    fn resolve_path(&self, path: &str, depth: usize) -> Result<(u32, Inode)> {
        let components = parse(path)?;
        let inode_id = resolve(&*self.device, &self.superblock, &components, depth)?;
        let inode = get_inode(&*self.device, &self.superblock, inode_id)?;
        Ok((inode_id, inode))
    }

    pub fn lookup(&self, path: &str) -> Result<u32> {
        Ok(self.resolve_path(path, 0)?.0)
    }

    pub fn get_attributes(&self, path: &str) -> Result<FileAttr> {
        let (inode_id, inode) = self.resolve_path(path, 0)?;
        Ok(inode_to_attr(inode_id, &inode))
    }

    /// Every live entry with its attributes, in slot order.
    pub fn list_directory(&self, path: &str) -> Result<Vec<(String, FileAttr)>> {
        let (_, dir_inode) = self.resolve_path(path, 0)?;
        if !dir_inode.is_dir() {
            return Err(FsError::NotADirectory);
        }

        let mut listing = Vec::new();
        for entry in read_dir(&*self.device, &dir_inode)? {
            let inode = get_inode(&*self.device, &self.superblock, entry.inode_id)?;
            listing.push((
                String::from_utf8_lossy(entry.name_bytes()).into_owned(),
                inode_to_attr(entry.inode_id, &inode),
            ));
        }
        Ok(listing)
    }

    /// Creates a file or directory at `path`. A directory takes two blocks,
    /// its inode and its entry block; a file takes one.
    /// Returns the inode ID of the new entry.
    pub fn create_entry(
        &mut self,
        path: &str,
        mode: u32,
        ftype: FileType,
        cred: Credentials,
    ) -> Result<u32> {
        let components = parse(path)?;
        // "/" always exists.
        let name = final_name(&components).ok_or(FsError::AlreadyExists)?;
        let parent_id = resolve(&*self.device, &self.superblock, &components, 1)?;
        let parent_inode = get_inode(&*self.device, &self.superblock, parent_id)?;
        if !parent_inode.is_dir() {
            return Err(FsError::NotADirectory);
        }

        let mut dir_block = read_dir_block(&*self.device, &parent_inode)?;
        if dir_block.lookup(name).is_some() {
            return Err(FsError::AlreadyExists);
        }
        let slot = dir_block.first_free().ok_or(FsError::NoSpace)?;

        let num_blocks = match ftype {
            FileType::Regular => 1,
            FileType::Directory => 2,
        };
        let blocks = self.bitmap.find_first_n_free(RESERVED_BLOCKS, num_blocks)?;
        let inode_id = blocks[0];
        let inode = Inode::new(ftype, mode, cred, self.clock.now(), blocks.get(1).copied());
        write_inode(&*self.device, &self.superblock, inode_id, &inode)?;

        *dir_block.entry_mut(slot) = DirEntry::new(inode_id, name);
        write_dir_block(&*self.device, &parent_inode, &dir_block)?;

        if let FileType::Directory = ftype {
            init_dir_block(&*self.device, blocks[1])?;
        }
        self.reserve_blocks(&blocks)?;

        debug!(
            "created {:?} {} (inode {}, mode {:o}) in slot {} of inode {}",
            ftype, path, inode_id, inode.mode, slot, parent_id
        );
        Ok(inode_id)
    }

    pub fn remove_file(&mut self, path: &str) -> Result<()> {
        let (inode_id, inode) = self.resolve_path(path, 0)?;
        if inode.is_dir() {
            return Err(FsError::IsADirectory);
        }
        inode.checked_size()?;
        let mut freed = inode.data_blocks().to_vec();
        freed.push(inode_id);

        self.unlink(path)?;
        self.release_blocks(&freed)?;
        debug!("removed file {} (inode {}, {} blocks)", path, inode_id, freed.len());
        Ok(())
    }

    pub fn remove_directory(&mut self, path: &str) -> Result<()> {
        let (inode_id, inode) = self.resolve_path(path, 0)?;
        if inode_id == ROOT_INODE_ID {
            return Err(FsError::InvalidArgument);
        }
        if !inode.is_dir() {
            return Err(FsError::NotADirectory);
        }
        if !dir_is_empty(&*self.device, &inode)? {
            return Err(FsError::NotEmpty);
        }

        self.unlink(path)?;
        self.release_blocks(&[inode_id, inode.ptrs[0]])?;
        debug!("removed directory {} (inode {})", path, inode_id);
        Ok(())
    }

    /// Detaches the final component of `path` from its parent directory.
    fn unlink(&mut self, path: &str) -> Result<u32> {
        let components = parse(path)?;
        let name = final_name(&components).ok_or(FsError::InvalidArgument)?;
        let (_, parent_inode) = self.resolve_path(path, 1)?;
        dir_rm_entry(&*self.device, &parent_inode, name)
    }

    /// Renames within one directory. The destination must not exist.
    pub fn rename(&mut self, src_path: &str, dst_path: &str) -> Result<()> {
        self.resolve_path(src_path, 0)?;
        match self.resolve_path(dst_path, 0) {
            Ok(_) => return Err(FsError::AlreadyExists),
            Err(FsError::NotFound) => {}
            Err(e) => return Err(e),
        }

        let src = parse(src_path)?;
        let dst = parse(dst_path)?;
        let (Some((old_name, src_dir)), Some((new_name, dst_dir))) =
            (src.split_last(), dst.split_last())
        else {
            return Err(FsError::InvalidArgument);
        };
        if src_dir != dst_dir {
            return Err(FsError::InvalidArgument);
        }

        let (_, parent_inode) = self.resolve_path(src_path, 1)?;
        dir_rename_entry(&*self.device, &parent_inode, old_name, new_name)?;
        debug!("renamed {} to {}", src_path, dst_path);
        Ok(())
    }

    /// Replaces the permission bits, keeping type and any higher bits.
    pub fn change_mode(&mut self, path: &str, mode: u32) -> Result<()> {
        let (inode_id, mut inode) = self.resolve_path(path, 0)?;
        inode.mode = (inode.mode & !PERM_MASK) | (mode & PERM_MASK);
        write_inode(&*self.device, &self.superblock, inode_id, &inode)
    }

    /// Sets the modification time of a regular file.
    pub fn change_times(&mut self, path: &str, mtime: u32) -> Result<()> {
        let (inode_id, mut inode) = self.resolve_path(path, 0)?;
        if !inode.is_file() {
            return Err(FsError::IsADirectory);
        }
        inode.mtime = mtime;
        write_inode(&*self.device, &self.superblock, inode_id, &inode)
    }

    /// Shrinks a regular file to `len` bytes. Growing is not supported.
    pub fn truncate(&mut self, path: &str, len: i64) -> Result<()> {
        if len < 0 {
            return Err(FsError::InvalidArgument);
        }
        let (inode_id, mut inode) = self.resolve_path(path, 0)?;
        self.shrink(inode_id, &mut inode, len as u64)?;
        debug!("truncated {} to {} bytes", path, len);
        Ok(())
    }

    pub fn read(&self, path: &str, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let (_, inode) = self.resolve_path(path, 0)?;
        fread(&*self.device, &inode, offset, buf)
    }

    pub fn write(&mut self, path: &str, offset: u64, buf: &[u8]) -> Result<usize> {
        let (inode_id, mut inode) = self.resolve_path(path, 0)?;
        let bytes_written = self.write_at(inode_id, &mut inode, offset, buf)?;
        debug!("wrote {} bytes at {} to {}", bytes_written, offset, path);
        Ok(bytes_written)
    }

    pub fn get_usage(&self) -> StatFs {
        self.usage.statfs()
    }

    pub fn usage(&self) -> Usage {
        self.usage
    }

    pub fn sync(&self) -> Result<()> {
        self.device.flush()
    }

    pub fn root_inode_id(&self) -> u32 {
        ROOT_INODE_ID
    }

    pub fn superblock(&self) -> &SuperBlock {
        &self.superblock
    }

    pub fn device(&self) -> Arc<D> {
        Arc::clone(&self.device)
    }
}
