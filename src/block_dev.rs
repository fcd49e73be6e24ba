use crate::config::BLOCK_SIZE;
use crate::error::Result;

/// Block store the file system lives on.
/// The file system assumes exclusive ownership of the whole device.
pub trait BlockDevice: Send + Sync {
    /// Returns the number of blocks in the block device.
    fn num_blocks(&self) -> usize;

    /// Reads one block. `buf.len()` must be equal to `BLOCK_SIZE`.
    fn read_block(&self, block_id: u32, buf: &mut [u8]) -> Result<()>;

    /// Writes one block. `buf.len()` must be equal to `BLOCK_SIZE`.
    fn write_block(&self, block_id: u32, buf: &[u8]) -> Result<()>;

    /// Flushes any cached data to the block device.
    fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Reads `buf.len() / BLOCK_SIZE` consecutive blocks starting at `block_id`.
    fn read_blocks(&self, block_id: u32, buf: &mut [u8]) -> Result<()> {
        for (i, chunk) in buf.chunks_exact_mut(BLOCK_SIZE).enumerate() {
            self.read_block(block_id + i as u32, chunk)?;
        }
        Ok(())
    }

    /// Writes `buf.len() / BLOCK_SIZE` consecutive blocks starting at `block_id`.
    fn write_blocks(&self, block_id: u32, buf: &[u8]) -> Result<()> {
        for (i, chunk) in buf.chunks_exact(BLOCK_SIZE).enumerate() {
            self.write_block(block_id + i as u32, chunk)?;
        }
        Ok(())
    }
}
