//! On-disk records and their little-endian codecs.

use byteorder::{ByteOrder, LittleEndian};

use crate::config::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuperBlock {
    pub magic: u32,     // Magic number to identify the filesystem
    pub disk_size: u32, // Total number of blocks in the filesystem
}

impl SuperBlock {
    pub fn new(disk_size: u32) -> Self {
        Self {
            magic: MAGIC,
            disk_size,
        }
    }

    pub fn decode(buf: &[u8]) -> Self {
        Self {
            magic: LittleEndian::read_u32(&buf[0..4]),
            disk_size: LittleEndian::read_u32(&buf[4..8]),
        }
    }

    /// Encodes into a whole block, zero padded.
    pub fn encode(&self, buf: &mut [u8]) {
        buf.fill(0);
        LittleEndian::write_u32(&mut buf[0..4], self.magic);
        LittleEndian::write_u32(&mut buf[4..8], self.disk_size);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Regular,
    Directory,
}

impl FileType {
    pub fn from_mode(mode: u32) -> Self {
        if mode & S_IFMT == S_IFDIR {
            FileType::Directory
        } else {
            FileType::Regular
        }
    }

    pub fn type_bits(&self) -> u32 {
        match self {
            FileType::Regular => S_IFREG,
            FileType::Directory => S_IFDIR,
        }
    }
}

/// One inode occupies a whole block; its block number is its inode number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inode {
    pub uid: u16,
    pub gid: u16,
    pub mode: u32,
    pub ctime: u32,
    pub mtime: u32,
    pub size: i32,
    pub ptrs: [u32; NUM_DIRECT_PTRS],
}

impl Inode {
    pub fn decode(buf: &[u8]) -> Self {
        let mut ptrs = [0u32; NUM_DIRECT_PTRS];
        LittleEndian::read_u32_into(&buf[INODE_HEADER_SIZE..BLOCK_SIZE], &mut ptrs);
        Self {
            uid: LittleEndian::read_u16(&buf[0..2]),
            gid: LittleEndian::read_u16(&buf[2..4]),
            mode: LittleEndian::read_u32(&buf[4..8]),
            ctime: LittleEndian::read_u32(&buf[8..12]),
            mtime: LittleEndian::read_u32(&buf[12..16]),
            size: LittleEndian::read_i32(&buf[16..20]),
            ptrs,
        }
    }

    pub fn encode(&self, buf: &mut [u8]) {
        LittleEndian::write_u16(&mut buf[0..2], self.uid);
        LittleEndian::write_u16(&mut buf[2..4], self.gid);
        LittleEndian::write_u32(&mut buf[4..8], self.mode);
        LittleEndian::write_u32(&mut buf[8..12], self.ctime);
        LittleEndian::write_u32(&mut buf[12..16], self.mtime);
        LittleEndian::write_i32(&mut buf[16..20], self.size);
        LittleEndian::write_u32_into(&self.ptrs, &mut buf[INODE_HEADER_SIZE..BLOCK_SIZE]);
    }

    pub fn file_type(&self) -> FileType {
        FileType::from_mode(self.mode)
    }

    pub fn is_dir(&self) -> bool {
        self.file_type() == FileType::Directory
    }

    pub fn is_file(&self) -> bool {
        self.mode & S_IFMT == S_IFREG
    }
}

/// Directory entry: valid bit in bit 0, inode number in bits 1..32.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntry {
    pub valid: bool,
    pub inode_id: u32,
    pub name: [u8; NAME_BUF_LEN],
}

impl DirEntry {
    pub const NULL: Self = Self {
        valid: false,
        inode_id: 0,
        name: [0; NAME_BUF_LEN],
    };

    pub fn decode(buf: &[u8]) -> Self {
        let word = LittleEndian::read_u32(&buf[0..4]);
        let mut name = [0u8; NAME_BUF_LEN];
        name.copy_from_slice(&buf[4..DIR_ENTRY_SIZE]);
        Self {
            valid: word & 1 != 0,
            inode_id: word >> 1,
            name,
        }
    }

    pub fn encode(&self, buf: &mut [u8]) {
        let word = (self.inode_id << 1) | self.valid as u32;
        LittleEndian::write_u32(&mut buf[0..4], word);
        buf[4..DIR_ENTRY_SIZE].copy_from_slice(&self.name);
    }
}
