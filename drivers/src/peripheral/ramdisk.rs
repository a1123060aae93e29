//! RAM disk
//!
//! A block device held entirely in memory. Useful as the RAM-disk drive of
//! the drive map and as a medium for exercising filesystem code on a host.

use alloc::vec;
use alloc::vec::Vec;

use crate::hal::block_device::{BlockDevice, BlockDeviceError, BlockDeviceInfo, SECTOR_SIZE};

pub struct RamDisk {
    data: Vec<u8>,
    read_only: bool,
}

impl RamDisk {
    /// Create a zero-filled disk of `block_count` 512-byte blocks.
    pub fn new(block_count: usize) -> Self {
        Self {
            data: vec![0; block_count * SECTOR_SIZE],
            read_only: false,
        }
    }

    /// Wrap an existing image. Trailing bytes that do not fill a whole
    /// block are dropped.
    pub fn from_bytes(mut data: Vec<u8>) -> Self {
        data.truncate(data.len() - data.len() % SECTOR_SIZE);
        Self {
            data,
            read_only: false,
        }
    }

    /// Refuse block writes, as a card with its lock switch set would.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn block_count(&self) -> u64 {
        (self.data.len() / SECTOR_SIZE) as u64
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    fn range(&self, block: u64, len: usize) -> Result<core::ops::Range<usize>, BlockDeviceError> {
        if len != SECTOR_SIZE {
            return Err(BlockDeviceError::InvalidBuffer);
        }
        if block >= self.block_count() {
            return Err(BlockDeviceError::InvalidAddress);
        }
        let start = block as usize * SECTOR_SIZE;
        Ok(start..start + SECTOR_SIZE)
    }
}

impl BlockDevice for RamDisk {
    fn info(&self) -> BlockDeviceInfo {
        let info = BlockDeviceInfo::new(self.block_count());
        if self.read_only {
            info.read_only()
        } else {
            info
        }
    }

    fn init(&mut self) -> Result<(), BlockDeviceError> {
        Ok(())
    }

    fn read_block(&mut self, block: u64, buffer: &mut [u8]) -> Result<(), BlockDeviceError> {
        let range = self.range(block, buffer.len())?;
        buffer.copy_from_slice(&self.data[range]);
        Ok(())
    }

    fn write_block(&mut self, block: u64, buffer: &[u8]) -> Result<(), BlockDeviceError> {
        if self.read_only {
            return Err(BlockDeviceError::WriteProtected);
        }
        let range = self.range(block, buffer.len())?;
        self.data[range].copy_from_slice(buffer);
        Ok(())
    }
}
