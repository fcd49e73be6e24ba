use alloc::boxed::Box;
use alloc::vec::Vec;

use log::trace;

use crate::config::*;
use crate::error::{FsError, Result};
use crate::structs::*;
use crate::BlockDevice;

pub fn trim_zero(name: &[u8]) -> &[u8] {
    let end = name.iter().position(|&c| c == 0).unwrap_or(name.len());
    &name[..end]
}

/// Names longer than `MAX_NAME_LEN` are cut, never rejected. The cut backs
/// up to the start of a UTF-8 sequence so no partial character is stored.
pub fn truncate_name(name: &[u8]) -> &[u8] {
    if name.len() <= MAX_NAME_LEN {
        return name;
    }
    let mut end = MAX_NAME_LEN;
    while end > 0 && name[end] & 0xC0 == 0x80 {
        end -= 1;
    }
    &name[..end]
}

fn name_cmp(n1: &[u8], n2: &[u8]) -> bool {
    trim_zero(n1) == truncate_name(trim_zero(n2))
}

impl DirEntry {
    pub fn new(inode_id: u32, name: &[u8]) -> Self {
        let mut entry = DirEntry::NULL;
        entry.valid = true;
        entry.inode_id = inode_id;
        entry.set_name(name);
        entry
    }

    pub fn name_bytes(&self) -> &[u8] {
        trim_zero(&self.name)
    }

    pub fn name_eq(&self, name: &[u8]) -> bool {
        name_cmp(&self.name, name)
    }

    pub fn set_name(&mut self, name: &[u8]) {
        let name = truncate_name(name);
        self.name = [0; NAME_BUF_LEN];
        self.name[..name.len()].copy_from_slice(name);
    }
}

/// The single block of entries a directory owns. Slots are never compacted.
#[derive(Clone)]
pub struct DirBlock {
    entries: [DirEntry; NUM_DIR_ENTRIES],
}

impl DirBlock {
    pub fn empty() -> Self {
        Self {
            entries: [DirEntry::NULL; NUM_DIR_ENTRIES],
        }
    }

    pub fn decode(buf: &[u8]) -> Self {
        let mut block = Self::empty();
        for (entry, raw) in block.entries.iter_mut().zip(buf.chunks_exact(DIR_ENTRY_SIZE)) {
            *entry = DirEntry::decode(raw);
        }
        block
    }

    pub fn encode(&self, buf: &mut [u8]) {
        for (entry, raw) in self.entries.iter().zip(buf.chunks_exact_mut(DIR_ENTRY_SIZE)) {
            entry.encode(raw);
        }
    }

    /// Slot of the valid entry called `name`.
    pub fn lookup(&self, name: &[u8]) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.valid && entry.name_eq(name))
    }

    pub fn first_free(&self) -> Option<usize> {
        self.entries.iter().position(|entry| !entry.valid)
    }

    /// Scans every slot, so holes left by earlier removals are not mistaken
    /// for the end of the directory.
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|entry| !entry.valid)
    }

    pub fn entry(&self, slot: usize) -> &DirEntry {
        &self.entries[slot]
    }

    pub fn entry_mut(&mut self, slot: usize) -> &mut DirEntry {
        &mut self.entries[slot]
    }

    pub fn valid_entries(&self) -> impl Iterator<Item = &DirEntry> {
        self.entries.iter().filter(|entry| entry.valid)
    }
}

fn dir_block_id(dir_inode: &Inode) -> Result<u32> {
    if !dir_inode.is_dir() {
        return Err(FsError::NotADirectory);
    }
    Ok(dir_inode.ptrs[0])
}

pub fn read_dir_block(device: &impl BlockDevice, dir_inode: &Inode) -> Result<DirBlock> {
    let block_id = dir_block_id(dir_inode)?;
    let mut buf = Box::new([0u8; BLOCK_SIZE]);
    device.read_block(block_id, buf.as_mut_slice())?;
    Ok(DirBlock::decode(buf.as_slice()))
}

pub fn write_dir_block(
    device: &impl BlockDevice,
    dir_inode: &Inode,
    block: &DirBlock,
) -> Result<()> {
    let block_id = dir_block_id(dir_inode)?;
    let mut buf = Box::new([0u8; BLOCK_SIZE]);
    block.encode(buf.as_mut_slice());
    device.write_block(block_id, buf.as_slice())
}

/// Zero-fills a freshly allocated directory block: every slot invalid.
pub fn init_dir_block(device: &impl BlockDevice, block_id: u32) -> Result<()> {
    let zero_block = Box::new([0u8; BLOCK_SIZE]);
    device.write_block(block_id, zero_block.as_slice())
}

/// Query inode id of a file by name in the parent directory inode.
pub fn dir_lookup(device: &impl BlockDevice, dir_inode: &Inode, name: &[u8]) -> Result<u32> {
    let block = read_dir_block(device, dir_inode)?;
    match block.lookup(name) {
        Some(slot) => {
            trace!(
                "[dir_lookup] found {} in slot {}",
                String::from_utf8_lossy(name),
                slot
            );
            Ok(block.entry(slot).inode_id)
        }
        None => Err(FsError::NotFound),
    }
}

/// Clears the valid flag of the entry called `name`.
/// Blocks of the removed inode are the caller's to reclaim.
/// Returns the inode ID of the removed entry.
pub fn dir_rm_entry(device: &impl BlockDevice, dir_inode: &Inode, name: &[u8]) -> Result<u32> {
    let mut block = read_dir_block(device, dir_inode)?;
    let slot = block.lookup(name).ok_or(FsError::NotFound)?;
    let entry = block.entry_mut(slot);
    entry.valid = false;
    let inode_id = entry.inode_id;
    write_dir_block(device, dir_inode, &block)?;
    trace!("[dir_rm_entry] cleared slot {} (inode {})", slot, inode_id);
    Ok(inode_id)
}

/// Renames an entry in place. The slot and inode number are kept.
pub fn dir_rename_entry(
    device: &impl BlockDevice,
    dir_inode: &Inode,
    old_name: &[u8],
    new_name: &[u8],
) -> Result<()> {
    let mut block = read_dir_block(device, dir_inode)?;
    let slot = block.lookup(old_name).ok_or(FsError::NotFound)?;
    block.entry_mut(slot).set_name(new_name);
    write_dir_block(device, dir_inode, &block)
}

pub fn dir_is_empty(device: &impl BlockDevice, dir_inode: &Inode) -> Result<bool> {
    Ok(read_dir_block(device, dir_inode)?.is_empty())
}

/// Valid entries in storage order.
pub fn read_dir(device: &impl BlockDevice, dir_inode: &Inode) -> Result<Vec<DirEntry>> {
    let block = read_dir_block(device, dir_inode)?;
    Ok(block.valid_entries().copied().collect())
}
