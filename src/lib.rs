//! A small flat file system over a fixed-size block device.
//! No indirect blocks, no hard links, no journal.
//!
//! Linear layout:
//! - Block 0: Superblock (magic, disk size in blocks)
//! - Block 1: Block Bitmap, one bit per block of the device
//! - Block 2: Root directory inode
//! - Everything else: inodes, directory blocks and file data, told apart only
//!   by what points at them. An inode's block number is its inode number.
//!
//! Layers (from bottom to top):
//! 1. Block Device: Abstraction for low level devices.         | User implemented
//! 2. Bitmap: First-fit block allocation.                      | Fs implemented
//! 3. Inode / Directory: One-block records and their codecs.   | Fs implemented
//! 4. Path: Component parsing and resolution from the root.    | Fs implemented
//! 5. File: Byte-range reads and writes over direct blocks.    | Fs implemented
//! 6. FileSystem: POSIX-like operation set with usage counts.  | Fs implemented
//!
//! The library logs through `log` and never installs a logger itself.

extern crate alloc;

mod config;
mod block_dev;
mod structs;
mod error;
mod superblock;
mod bitmap;
mod inode;
mod directory;
mod path;
mod stat;
mod file;
mod fs;

pub use block_dev::BlockDevice;
pub use config::*;
pub use structs::*;
pub use superblock::{read_superblock, write_superblock};
pub use bitmap::Bitmap;
pub use inode::{blocks_for, get_inode, write_inode, Credentials};
pub use directory::{read_dir, DirBlock};
pub use path::{parse, resolve};
pub use stat::{inode_to_attr, FileAttr, StatFs, Usage};
pub use file::fread;
pub use fs::*;
pub use error::FsError as Error;
pub use error::Result;
