pub const MAGIC: u32 = 0x30303635; // "5600" in ASCII

pub const BLOCK_SIZE: usize = 4096;
pub const SUPERBLOCK_ID: u32 = 0; // Block ID for the superblock
pub const BITMAP_BLOCK_ID: u32 = 1; // Block ID for the allocation bitmap
pub const ROOT_INODE_ID: u32 = 2; // Inode ID (= block ID) of the root directory
pub const RESERVED_BLOCKS: u32 = 2; // Superblock + bitmap, excluded from usable blocks
pub const MAX_DISK_BLOCKS: u32 = (BLOCK_SIZE * 8) as u32; // One bitmap block

pub const DIR_ENTRY_SIZE: usize = 32; // Valid bit + inode number (4 bytes) + name buffer
pub const NUM_DIR_ENTRIES: usize = BLOCK_SIZE / DIR_ENTRY_SIZE;
pub const NAME_BUF_LEN: usize = DIR_ENTRY_SIZE - 4; // Name buffer, trailing NUL included
pub const MAX_NAME_LEN: usize = NAME_BUF_LEN - 1;
pub const MAX_PATH_DEPTH: usize = 10;

pub const INODE_HEADER_SIZE: usize = 20;
pub const NUM_DIRECT_PTRS: usize = (BLOCK_SIZE - INODE_HEADER_SIZE) / 4;
pub const MAX_FSIZE: usize = NUM_DIRECT_PTRS * BLOCK_SIZE;

pub const S_IFMT: u32 = 0o170000;
pub const S_IFDIR: u32 = 0o040000;
pub const S_IFREG: u32 = 0o100000;
pub const PERM_MASK: u32 = 0o777;
