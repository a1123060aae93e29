//! Drive-number dispatch over several independent drives

use alloc::boxed::Box;

use log::trace;

use super::{Disk, DiskError, DiskResult, DiskStatus, Drive, IoctlCommand};

/// Routes the five disk operations to whichever [`Disk`] is registered for
/// the requested drive number.
///
/// Drive numbers with nothing registered behave like a missing drive:
/// status queries report [`DiskStatus::NOINIT`] and transfers fail with
/// [`DiskError::ParamError`].
pub struct DiskTable {
    disks: [Option<Box<dyn Disk>>; Drive::COUNT],
}

impl DiskTable {
    pub const fn new() -> Self {
        Self {
            disks: [None, None, None],
        }
    }

    /// Install `disk` as `drive`, returning whatever was registered before.
    pub fn register(&mut self, drive: Drive, disk: Box<dyn Disk>) -> Option<Box<dyn Disk>> {
        self.disks[drive as usize].replace(disk)
    }

    /// Remove the disk registered as `drive`.
    pub fn unregister(&mut self, drive: Drive) -> Option<Box<dyn Disk>> {
        self.disks[drive as usize].take()
    }

    pub fn is_registered(&self, drive: Drive) -> bool {
        self.disks[drive as usize].is_some()
    }

    /// Drives that currently have a disk registered.
    pub fn list(&self) -> impl Iterator<Item = Drive> + '_ {
        [Drive::MemoryCard, Drive::RamDisk, Drive::Usb]
            .into_iter()
            .filter(|drive| self.is_registered(*drive))
    }

    fn get(&self, pdrv: u8) -> Option<&dyn Disk> {
        let drive = Drive::try_from(pdrv).ok()?;
        self.disks[drive as usize].as_deref()
    }

    fn get_mut(&mut self, pdrv: u8) -> Option<&mut (dyn Disk + 'static)> {
        let drive = Drive::try_from(pdrv).ok()?;
        self.disks[drive as usize].as_deref_mut()
    }

    pub fn status(&self, pdrv: u8) -> DiskStatus {
        match self.get(pdrv) {
            Some(disk) => disk.status(pdrv),
            None => DiskStatus::NOINIT,
        }
    }

    pub fn initialize(&mut self, pdrv: u8) -> DiskStatus {
        match self.get_mut(pdrv) {
            Some(disk) => disk.initialize(pdrv),
            None => {
                trace!("diskio: no disk registered as drive {}", pdrv);
                DiskStatus::NOINIT
            }
        }
    }

    pub fn read(&mut self, pdrv: u8, buf: &mut [u8], sector: u64, count: u32) -> DiskResult {
        self.get_mut(pdrv)
            .ok_or(DiskError::ParamError)?
            .read(pdrv, buf, sector, count)
    }

    #[cfg(not(feature = "readonly"))]
    pub fn write(&mut self, pdrv: u8, buf: &[u8], sector: u64, count: u32) -> DiskResult {
        self.get_mut(pdrv)
            .ok_or(DiskError::ParamError)?
            .write(pdrv, buf, sector, count)
    }

    pub fn control(&self, pdrv: u8, cmd: IoctlCommand, buf: &mut [u8]) -> DiskResult {
        self.get(pdrv)
            .ok_or(DiskError::ParamError)?
            .control(pdrv, cmd, buf)
    }
}

impl Default for DiskTable {
    fn default() -> Self {
        Self::new()
    }
}
