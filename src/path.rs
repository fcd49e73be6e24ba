//! Path parsing and resolution.

use alloc::vec::Vec;

use log::trace;

use crate::config::*;
use crate::directory::{dir_lookup, truncate_name};
use crate::error::{FsError, Result};
use crate::inode::get_inode;
use crate::{BlockDevice, SuperBlock};

/// Splits a path into its components, each cut to `MAX_NAME_LEN` bytes.
/// Empty components are skipped, so `/a//b/` is `[a, b]` and `/` is `[]`.
/// NUL terminates names on disk, so it may not appear inside one.
pub fn parse(path: &str) -> Result<Vec<&[u8]>> {
    if path.contains('\0') {
        return Err(FsError::InvalidArgument);
    }
    let components: Vec<&[u8]> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| truncate_name(s.as_bytes()))
        .collect();
    if components.len() > MAX_PATH_DEPTH {
        return Err(FsError::InvalidArgument);
    }
    Ok(components)
}

/// Last component, the name an operation creates or removes.
pub fn final_name<'a>(components: &[&'a [u8]]) -> Option<&'a [u8]> {
    components.last().copied()
}

/// Walks `components` from the root, leaving the last `depth` of them
/// unresolved. Depth 0 yields the target, depth 1 its parent directory.
/// A depth at or past the path length yields the root.
pub fn resolve(
    device: &impl BlockDevice,
    superblock: &SuperBlock,
    components: &[&[u8]],
    depth: usize,
) -> Result<u32> {
    let walk = components.len().saturating_sub(depth);
    let mut current_inode_id = ROOT_INODE_ID;

    for component in &components[..walk] {
        let current_inode = get_inode(device, superblock, current_inode_id)?;
        if !current_inode.is_dir() {
            return Err(FsError::NotADirectory);
        }
        current_inode_id = dir_lookup(device, &current_inode, component)?;
        trace!(
            "[resolve] {} -> inode {}",
            String::from_utf8_lossy(component),
            current_inode_id
        );
    }

    Ok(current_inode_id)
}
