//! Disk I/O Driver Subsystem
//!
//! This crate glues a FAT filesystem consumer to sector-level storage
//! drivers.
//!
//! # Module Organization
//!
//! - [`hal`]: Platform-independent block driver trait
//! - [`diskio`]: Drive adapter, drive table and filesystem bridge
//! - [`peripheral`]: Reusable block drivers
//!
//! # Usage Example
//!
//! ```no_run
//! use drivers::diskio::{DiskIo, Drive};
//! use drivers::peripheral::ramdisk::RamDisk;
//!
//! let mut disk = DiskIo::new(Drive::MemoryCard, RamDisk::new(64));
//! disk.initialize(Drive::MemoryCard.number());
//!
//! let mut sectors = [0u8; 1024];
//! disk.read(Drive::MemoryCard.number(), &mut sectors, 0, 2).unwrap();
//! ```

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod diskio;
pub mod hal;
pub mod peripheral;

// Re-export commonly used types
pub use diskio::{Disk, DiskError, DiskIo, DiskStatus, DiskTable, Drive, SdmmcDisk};
pub use hal::block_device::{BlockDevice, BlockDeviceError, BlockDeviceInfo};
