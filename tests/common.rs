//! Common utilities for tests

use std::sync::{Arc, Mutex, Once};

use flatfs::{
    BlockDevice, Clock, Credentials, Error, FileSystem, Result, BITMAP_BLOCK_ID, BLOCK_SIZE,
    RESERVED_BLOCKS,
};
use log::LevelFilter;
use simple_logger::SimpleLogger;

pub const ORANGE: &str = "\x1b[38;5;214m";
pub const RESET: &str = "\x1b[0m";

pub const CRED: Credentials = Credentials { uid: 500, gid: 500 };
pub const NOW: u32 = 1_600_000_000;

/// Provides a macro for logging messages during tests.
/// e.g. log!("placeholder") -> println!("[test] placeholder");
#[macro_export]
macro_rules! log {
    ($msg:expr) => {
        println!("{}[test] {}{}", crate::common::ORANGE, $msg, crate::common::RESET)
    };
    ($msg:expr, $($arg:tt)*) => {
        println!("{}[test] {}{}", crate::common::ORANGE, format!($msg, $($arg)*), crate::common::RESET)
    };
}

pub fn setup_logger() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = SimpleLogger::new().with_level(LevelFilter::Debug).init();
    });
}

pub struct RamDisk {
    inner: Arc<Mutex<Vec<u8>>>,
    num_blocks: usize,
}

impl RamDisk {
    /// Creates a new RamDisk with the specified number of blocks.
    /// Each block is BLOCK_SIZE bytes.
    pub fn new(num_blocks: usize) -> Self {
        let size = num_blocks * BLOCK_SIZE;
        let inner = Arc::new(Mutex::new(vec![0u8; size]));
        RamDisk { inner, num_blocks }
    }
}

impl BlockDevice for RamDisk {
    fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    fn read_block(&self, block_id: u32, buf: &mut [u8]) -> Result<()> {
        if block_id as usize >= self.num_blocks || buf.len() != BLOCK_SIZE {
            return Err(Error::Io);
        }
        let start = block_id as usize * BLOCK_SIZE;
        let data = self.inner.lock().unwrap();
        buf.copy_from_slice(&data[start..start + BLOCK_SIZE]);
        Ok(())
    }

    fn write_block(&self, block_id: u32, buf: &[u8]) -> Result<()> {
        if block_id as usize >= self.num_blocks || buf.len() != BLOCK_SIZE {
            return Err(Error::Io);
        }
        let start = block_id as usize * BLOCK_SIZE;
        let mut data = self.inner.lock().unwrap();
        data[start..start + BLOCK_SIZE].copy_from_slice(buf);
        Ok(())
    }
}

/// Clock pinned to `NOW` so timestamps can be asserted.
pub struct FixedClock(pub u32);

impl Clock for FixedClock {
    fn now(&self) -> u32 {
        self.0
    }
}

/// Freshly formatted file system on a RAM disk of `num_blocks` blocks.
pub fn ram_fs(num_blocks: u32) -> FileSystem<RamDisk> {
    setup_logger();
    let rd = Arc::new(RamDisk::new(num_blocks as usize));
    FileSystem::format(rd, num_blocks)
        .unwrap()
        .with_clock(Arc::new(FixedClock(NOW)))
}

/// Usage counters must agree with the bitmap on disk: `used` is the number of
/// set bits past the superblock and bitmap, and `free + used == total`.
pub fn assert_usage_consistent<D: BlockDevice>(fs: &FileSystem<D>) {
    let disk_size = fs.superblock().disk_size;
    let mut bitmap = vec![0u8; BLOCK_SIZE];
    fs.device().read_block(BITMAP_BLOCK_ID, &mut bitmap).unwrap();
    let on_disk_used = (RESERVED_BLOCKS..disk_size)
        .filter(|&i| bitmap[i as usize / 8] & (1 << (i % 8)) != 0)
        .count() as u32;

    let usage = fs.usage();
    assert_eq!(usage.used(), on_disk_used, "counters drifted from the bitmap");
    assert_eq!(usage.total(), disk_size - RESERVED_BLOCKS);
    assert_eq!(usage.free() + on_disk_used, usage.total());
    let st = fs.get_usage();
    assert_eq!(st.blocks_free, usage.free());
    assert_eq!(st.blocks_available, st.blocks_free);
}

/// Deterministic, non-repeating-per-block test data.
pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8 ^ seed).collect()
}
