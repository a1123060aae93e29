//! One-shot filesystem demo
//!
//! Brings up the memory-card drive, mounts its first FAT volume through
//! `embedded-sdmmc` and writes a fixed text file to the root directory.

use std::fmt;

use drivers::{BlockDevice, DiskError, DiskIo, DiskStatus, SdmmcDisk};
use embedded_sdmmc::{Mode, TimeSource, Timestamp, VolumeIdx, VolumeManager};
use log::{debug, info};

pub mod image;

/// 8.3 name of the file written to the root directory.
pub const FILE_NAME: &str = "HELLO.TXT";

pub const PAYLOAD: &str = "A Microcontroller (MCU for microcontroller unit) is a small computer on a single metal-oxide-semiconductor (MOS) integrated circuit (IC) chip. A microcontroller contains one or more CPUs (processor cores) along with memory and programmable input/output peripherals. Program memory in the form of ferroelectric RAM, NOR flash or OTP ROM is also often included on chip, as well as a small amount of RAM. Microcontrollers are designed for embedded applications, in contrast to the microprocessors used in personal computers or other general purpose applications consisting of various discrete chips. In modern terminology, a microcontroller is similar to, but less sophisticated than, a system on a chip (SoC). An SoC may include a microcontroller as one of its components, but usually integrates it with advanced peripherals like a graphics processing unit (GPU), a Wi-Fi module, or one or more coprocessors. Microcontrollers are used in automatically controlled products and devices, such as automobile engine control systems, implantable medical devices, remote controls, office machines, appliances, power tools, toys and other embedded systems. By reducing the size and cost compared to a design that uses a separate microprocessor, memory, and input/output devices, microcontrollers make it economical to digitally control even more devices and processes. Mixed signal microcontrollers are common, integrating analog components needed to control non-digital electronic systems. In the context of the internet of things, microcontrollers are an economical and popular means of data collection, sensing and actuating the physical world as edge devices.";

/// Time source for boards without a real-time clock.
///
/// Every directory entry is stamped 2020-01-01 00:00:00.
pub struct FixedClock;

impl TimeSource for FixedClock {
    fn get_timestamp(&self) -> Timestamp {
        Timestamp {
            year_since_1970: 50,
            zero_indexed_month: 0,
            zero_indexed_day: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
        }
    }
}

#[derive(Debug)]
pub enum DemoError {
    /// The drive did not come up; carries the status it reported.
    NotReady(DiskStatus),
    /// Mounting, opening or writing through the filesystem failed.
    Filesystem(embedded_sdmmc::Error<DiskError>),
}

impl From<embedded_sdmmc::Error<DiskError>> for DemoError {
    fn from(err: embedded_sdmmc::Error<DiskError>) -> Self {
        DemoError::Filesystem(err)
    }
}

impl fmt::Display for DemoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemoError::NotReady(status) => write!(f, "drive not ready (status {:?})", status),
            DemoError::Filesystem(err) => write!(f, "filesystem error: {:?}", err),
        }
    }
}

impl std::error::Error for DemoError {}

/// Initialize `disk`, then create (or truncate) [`FILE_NAME`] on its first
/// volume and fill it with [`PAYLOAD`].
///
/// Stops at the first failure. The drive is handed back wrapped in its
/// filesystem bridge once the file is closed.
pub fn write_hello<D: BlockDevice>(mut disk: DiskIo<D>) -> Result<SdmmcDisk<D>, DemoError> {
    let pdrv = disk.drive().number();
    let status = disk.initialize(pdrv);
    if status.contains(DiskStatus::NOINIT) {
        return Err(DemoError::NotReady(status));
    }

    let mut volume_mgr = VolumeManager::new(SdmmcDisk::new(disk), FixedClock);
    {
        let mut volume = volume_mgr.open_volume(VolumeIdx(0))?;
        debug!("demo: volume 0 mounted");
        let mut root = volume.open_root_dir()?;
        let mut file = root.open_file_in_dir(FILE_NAME, Mode::ReadWriteCreateOrTruncate)?;
        file.write(PAYLOAD.as_bytes())?;
        file.close()?;
    }
    info!("demo: wrote {} bytes to {}", PAYLOAD.len(), FILE_NAME);

    let (bridge, _clock) = volume_mgr.free();
    Ok(bridge)
}
