//! Disk I/O glue between a FAT filesystem consumer and block drivers
//!
//! A filesystem library talks to storage through five operations: status,
//! initialize, read, write and control. This module implements them on top
//! of any [`BlockDevice`](crate::hal::block_device::BlockDevice).
//!
//! # Module Organization
//!
//! - [`adapter`]: [`DiskIo`], one drive backed by one block driver
//! - [`table`]: [`DiskTable`], drive-number dispatch over several adapters
//! - [`sdmmc`]: [`SdmmcDisk`], the bridge into `embedded-sdmmc`
//!
//! # Usage Example
//!
//! ```no_run
//! use drivers::diskio::{DiskIo, DiskStatus, Drive};
//! use drivers::peripheral::ramdisk::RamDisk;
//!
//! let mut disk = DiskIo::new(Drive::MemoryCard, RamDisk::new(64));
//! let status = disk.initialize(Drive::MemoryCard.number());
//! assert!(!status.contains(DiskStatus::NOINIT));
//!
//! let mut sector = [0u8; 512];
//! disk.read(0, &mut sector, 0, 1).unwrap();
//! ```

use core::fmt;

pub mod adapter;
pub mod sdmmc;
pub mod table;

pub use adapter::DiskIo;
pub use sdmmc::SdmmcDisk;
pub use table::DiskTable;

/// Physical drive selected by a drive number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Drive {
    /// SD/MMC memory card
    MemoryCard = 0,
    /// RAM disk
    RamDisk = 1,
    /// USB mass storage
    Usb = 2,
}

impl Drive {
    /// Number of drive slots a consumer can address.
    pub const COUNT: usize = 3;

    /// Physical drive number handed to the filesystem consumer.
    pub const fn number(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Drive {
    type Error = DiskError;

    fn try_from(pdrv: u8) -> Result<Self, Self::Error> {
        match pdrv {
            0 => Ok(Drive::MemoryCard),
            1 => Ok(Drive::RamDisk),
            2 => Ok(Drive::Usb),
            _ => Err(DiskError::ParamError),
        }
    }
}

bitflags::bitflags! {
    /// Drive status flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DiskStatus: u8 {
        /// Drive not initialized
        const NOINIT = 0x01;
        /// Medium is write protected
        const PROTECT = 0x04;
    }
}

/// Result of a sector transfer or control request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskError {
    /// Unrecoverable error during a transfer
    Error,
    /// Write to a write-protected medium
    WriteProtected,
    /// Drive has not been initialized
    NotReady,
    /// Invalid drive number, zero-length request or undersized buffer
    ParamError,
}

impl fmt::Display for DiskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiskError::Error => write!(f, "disk I/O error"),
            DiskError::WriteProtected => write!(f, "disk is write protected"),
            DiskError::NotReady => write!(f, "disk not ready"),
            DiskError::ParamError => write!(f, "invalid parameter"),
        }
    }
}

pub type DiskResult = Result<(), DiskError>;

/// Control codes understood by filesystem consumers.
///
/// The adapter accepts every code and acts on none of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoctlCommand {
    /// Complete pending write process
    Sync,
    /// Get media size in sectors
    GetSectorCount,
    /// Get sector size in bytes
    GetSectorSize,
    /// Get erase block size in sectors
    GetBlockSize,
    /// Inform device that a sector range is no longer used
    Trim,
    Other(u8),
}

impl From<u8> for IoctlCommand {
    fn from(code: u8) -> Self {
        match code {
            0 => IoctlCommand::Sync,
            1 => IoctlCommand::GetSectorCount,
            2 => IoctlCommand::GetSectorSize,
            3 => IoctlCommand::GetBlockSize,
            4 => IoctlCommand::Trim,
            other => IoctlCommand::Other(other),
        }
    }
}

/// The five operations a filesystem consumer calls on a drive.
///
/// Object safe, so drives backed by different block drivers can share a
/// [`DiskTable`].
pub trait Disk {
    /// Cached drive status; never touches the hardware.
    fn status(&self, pdrv: u8) -> DiskStatus;

    /// (Re)initialize the drive and return the new status.
    fn initialize(&mut self, pdrv: u8) -> DiskStatus;

    /// Read `count` sectors starting at `sector` into `buf`.
    fn read(&mut self, pdrv: u8, buf: &mut [u8], sector: u64, count: u32) -> DiskResult;

    /// Write `count` sectors starting at `sector` from `buf`.
    #[cfg(not(feature = "readonly"))]
    fn write(&mut self, pdrv: u8, buf: &[u8], sector: u64, count: u32) -> DiskResult;

    /// Miscellaneous drive control.
    fn control(&self, pdrv: u8, cmd: IoctlCommand, buf: &mut [u8]) -> DiskResult;
}
