//! Peripheral Drivers
//!
//! This module contains block drivers that are not tied to a particular
//! platform.
//!
//! # Available Peripherals
//!
//! - [`ramdisk`]: In-memory block device

pub mod ramdisk;
