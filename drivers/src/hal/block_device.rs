//! Block Device Hardware Abstraction Layer
//!
//! This module provides the sector-level contract that storage drivers
//! (SD cards over SPI, RAM disks, disk images) implement so the disk I/O
//! adapter can forward filesystem requests to them.
//!
//! # Architecture
//!
//! ```text
//! File System Layer (embedded-sdmmc)
//!           ↓
//! Disk I/O Adapter (diskio)
//!           ↓
//! Block Device HAL ← You are here
//!           ↓
//! Storage Drivers (SPI-SD, RAM disk, image file)
//! ```

use core::fmt;

/// Standard sector size of SD/MMC media.
pub const SECTOR_SIZE: usize = 512;

/// Block device information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockDeviceInfo {
    /// Block size in bytes (typically 512)
    pub block_size: usize,
    /// Total number of blocks
    pub block_count: u64,
    /// Device is read-only
    pub read_only: bool,
    /// Device is removable (e.g., SD card)
    pub removable: bool,
}

impl BlockDeviceInfo {
    /// Create info for a standard 512-byte block device
    pub const fn new(block_count: u64) -> Self {
        Self {
            block_size: SECTOR_SIZE,
            block_count,
            read_only: false,
            removable: false,
        }
    }

    /// Mark device as read-only
    pub const fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Mark device as removable
    pub const fn removable(mut self) -> Self {
        self.removable = true;
        self
    }

    /// Total capacity in bytes
    pub const fn capacity(&self) -> u64 {
        self.block_count * self.block_size as u64
    }
}

/// Block device errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockDeviceError {
    /// Device not initialized or not present
    NotReady,
    /// Invalid block address (out of range)
    InvalidAddress,
    /// Hardware error during read
    ReadError,
    /// Hardware error during write
    WriteError,
    /// Device is write-protected
    WriteProtected,
    /// Buffer size doesn't match block size
    InvalidBuffer,
    /// Operation timed out
    Timeout,
    /// Generic I/O error
    IoError,
}

impl fmt::Display for BlockDeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockDeviceError::NotReady => write!(f, "device not ready"),
            BlockDeviceError::InvalidAddress => write!(f, "block address out of range"),
            BlockDeviceError::ReadError => write!(f, "read failed"),
            BlockDeviceError::WriteError => write!(f, "write failed"),
            BlockDeviceError::WriteProtected => write!(f, "device is write-protected"),
            BlockDeviceError::InvalidBuffer => write!(f, "buffer does not match block size"),
            BlockDeviceError::Timeout => write!(f, "operation timed out"),
            BlockDeviceError::IoError => write!(f, "I/O error"),
        }
    }
}

/// Block device trait - the storage driver seen by the disk I/O adapter
///
/// Drivers transfer exactly one block per call. Multi-block requests are
/// split by the adapter, so a driver never has to know about transfer
/// lengths.
///
/// # Example
///
/// ```rust
/// use drivers::hal::block_device::{BlockDevice, BlockDeviceError, SECTOR_SIZE};
///
/// fn read_first_block<B: BlockDevice>(device: &mut B) -> Result<[u8; SECTOR_SIZE], BlockDeviceError> {
///     let mut buf = [0u8; SECTOR_SIZE];
///     device.read_block(0, &mut buf)?;
///     Ok(buf)
/// }
/// ```
pub trait BlockDevice {
    /// Get device information
    fn info(&self) -> BlockDeviceInfo;

    /// Bring the device up so that block transfers can succeed.
    ///
    /// Called again on every initialize request; implementations must
    /// tolerate re-initialization.
    fn init(&mut self) -> Result<(), BlockDeviceError>;

    /// Read a single block
    ///
    /// # Arguments
    /// - `block`: Block address (LBA)
    /// - `buffer`: Buffer to read into (must be block_size bytes)
    fn read_block(&mut self, block: u64, buffer: &mut [u8]) -> Result<(), BlockDeviceError>;

    /// Write a single block
    ///
    /// # Arguments
    /// - `block`: Block address (LBA)
    /// - `buffer`: Buffer to write from (must be block_size bytes)
    fn write_block(&mut self, block: u64, buffer: &[u8]) -> Result<(), BlockDeviceError>;
}

impl<T: BlockDevice + ?Sized> BlockDevice for &mut T {
    fn info(&self) -> BlockDeviceInfo {
        (**self).info()
    }

    fn init(&mut self) -> Result<(), BlockDeviceError> {
        (**self).init()
    }

    fn read_block(&mut self, block: u64, buffer: &mut [u8]) -> Result<(), BlockDeviceError> {
        (**self).read_block(block, buffer)
    }

    fn write_block(&mut self, block: u64, buffer: &[u8]) -> Result<(), BlockDeviceError> {
        (**self).write_block(block, buffer)
    }
}
