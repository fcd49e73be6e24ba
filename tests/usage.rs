#![allow(unused)]

mod common;

use common::{assert_usage_consistent, pattern, ram_fs, CRED};
use flatfs::*;

#[test]
fn test_statfs_fresh() {
    let fs = ram_fs(100);
    let st = fs.get_usage();
    assert_eq!(st.block_size, BLOCK_SIZE as u32);
    assert_eq!(st.blocks, 98);
    // Root inode and root directory block.
    assert_eq!(st.blocks_free, 96);
    assert_eq!(st.blocks_available, 96);
    assert_eq!(st.name_max, MAX_NAME_LEN as u32);
    assert_eq!(fs.usage().used(), 2);
}

#[test]
fn test_counters_follow_operations() {
    let mut fs = ram_fs(100);
    let free = fs.usage().free();
    assert_usage_consistent(&fs);

    fs.create_entry("/d", 0o755, FileType::Directory, CRED).unwrap();
    assert_eq!(fs.usage().free(), free - 2);
    assert_usage_consistent(&fs);
    fs.create_entry("/d/f", 0o644, FileType::Regular, CRED).unwrap();
    assert_eq!(fs.usage().free(), free - 3);
    assert_usage_consistent(&fs);
    fs.write("/d/f", 0, &pattern(2 * BLOCK_SIZE, 0)).unwrap();
    assert_eq!(fs.usage().free(), free - 5);
    assert_usage_consistent(&fs);
    fs.write("/d/f", 100, &pattern(BLOCK_SIZE, 1)).unwrap();
    assert_eq!(fs.usage().free(), free - 5);
    assert_usage_consistent(&fs);
    fs.truncate("/d/f", 10).unwrap();
    assert_eq!(fs.usage().free(), free - 4);
    assert_usage_consistent(&fs);
    fs.rename("/d/f", "/d/g").unwrap();
    assert_eq!(fs.usage().free(), free - 4);
    assert_usage_consistent(&fs);
    fs.remove_file("/d/g").unwrap();
    assert_eq!(fs.usage().free(), free - 2);
    assert_usage_consistent(&fs);
    fs.remove_directory("/d").unwrap();
    assert_eq!(fs.usage().free(), free);
    assert_usage_consistent(&fs);
}

#[test]
fn test_counters_match_bitmap_after_remount() {
    let mut fs = ram_fs(200);
    for i in 0..10 {
        let path = format!("/f{}", i);
        fs.create_entry(&path, 0o644, FileType::Regular, CRED).unwrap();
        fs.write(&path, 0, &pattern(i * 1500, i as u8)).unwrap();
        assert_usage_consistent(&fs);
    }
    for i in (0..10).step_by(3) {
        fs.remove_file(&format!("/f{}", i)).unwrap();
        assert_usage_consistent(&fs);
    }
    fs.truncate("/f5", 100).unwrap();
    fs.create_entry("/sub", 0o755, FileType::Directory, CRED).unwrap();
    assert_usage_consistent(&fs);

    let running = fs.usage();
    let device = fs.device();
    drop(fs);
    let remounted = FileSystem::mount(device).unwrap();
    assert_eq!(remounted.usage(), running);
    assert_eq!(remounted.get_attributes("/f5").unwrap().size, 100);
}

#[test]
fn test_freed_blocks_are_reused() {
    let mut fs = ram_fs(64);
    let a = fs.create_entry("/a", 0o644, FileType::Regular, CRED).unwrap();
    fs.remove_file("/a").unwrap();
    let b = fs.create_entry("/b", 0o644, FileType::Regular, CRED).unwrap();
    // First fit hands back the same block.
    assert_eq!(a, b);
}

#[test]
fn test_failed_operations_leave_counters() {
    let mut fs = ram_fs(64);
    fs.create_entry("/f", 0o644, FileType::Regular, CRED).unwrap();
    let before = fs.usage();
    let _ = fs.create_entry("/f", 0o644, FileType::Regular, CRED);
    let _ = fs.create_entry("/nope/f", 0o644, FileType::Regular, CRED);
    let _ = fs.write("/f", 10, b"x");
    let _ = fs.truncate("/f", 1);
    let _ = fs.remove_directory("/f");
    let _ = fs.rename("/f", "/f");
    assert_eq!(fs.usage(), before);
    assert_usage_consistent(&fs);
}
