//! Disk image file used as a stand-in memory card on a development host.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use drivers::hal::block_device::{BlockDevice, BlockDeviceError, BlockDeviceInfo, SECTOR_SIZE};
use log::debug;

/// Block driver backed by a raw image file (for example one produced by
/// `dd` from a real SD card).
pub struct ImageDisk {
    file: File,
    block_count: u64,
}

impl ImageDisk {
    /// Open an existing image for reading and writing.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let block_count = file.metadata()?.len() / SECTOR_SIZE as u64;
        Ok(Self { file, block_count })
    }

    fn seek_to(&mut self, block: u64, len: usize) -> Result<(), BlockDeviceError> {
        if len != SECTOR_SIZE {
            return Err(BlockDeviceError::InvalidBuffer);
        }
        if block >= self.block_count {
            return Err(BlockDeviceError::InvalidAddress);
        }
        self.file
            .seek(SeekFrom::Start(block * SECTOR_SIZE as u64))
            .map_err(|e| {
                debug!("image: seek to block {} failed: {}", block, e);
                BlockDeviceError::IoError
            })?;
        Ok(())
    }
}

impl BlockDevice for ImageDisk {
    fn info(&self) -> BlockDeviceInfo {
        BlockDeviceInfo::new(self.block_count).removable()
    }

    /// Re-reads the image size; an empty image behaves like a missing card.
    fn init(&mut self) -> Result<(), BlockDeviceError> {
        let len = self
            .file
            .metadata()
            .map_err(|_| BlockDeviceError::IoError)?
            .len();
        self.block_count = len / SECTOR_SIZE as u64;
        if self.block_count == 0 {
            return Err(BlockDeviceError::NotReady);
        }
        Ok(())
    }

    fn read_block(&mut self, block: u64, buffer: &mut [u8]) -> Result<(), BlockDeviceError> {
        self.seek_to(block, buffer.len())?;
        self.file.read_exact(buffer).map_err(|e| {
            debug!("image: read of block {} failed: {}", block, e);
            BlockDeviceError::ReadError
        })
    }

    fn write_block(&mut self, block: u64, buffer: &[u8]) -> Result<(), BlockDeviceError> {
        self.seek_to(block, buffer.len())?;
        self.file.write_all(buffer).map_err(|e| {
            debug!("image: write of block {} failed: {}", block, e);
            BlockDeviceError::WriteError
        })
    }
}
