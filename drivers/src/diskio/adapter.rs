//! Single-drive disk I/O adapter
//!
//! [`DiskIo`] owns one block driver and the status of the drive it is
//! mounted as. Requests addressed to any other drive number are refused
//! before the driver is consulted.

use log::{debug, trace, warn};

use super::{Disk, DiskError, DiskResult, DiskStatus, Drive, IoctlCommand};
use crate::hal::block_device::BlockDevice;

/// One drive backed by one block driver.
///
/// The drive starts out with [`DiskStatus::NOINIT`] set and refuses
/// transfers until [`initialize`](Self::initialize) succeeds.
pub struct DiskIo<D> {
    drive: Drive,
    device: D,
    status: DiskStatus,
}

impl<D: BlockDevice> DiskIo<D> {
    /// Mount `device` as `drive`.
    pub const fn new(drive: Drive, device: D) -> Self {
        Self {
            drive,
            device,
            status: DiskStatus::NOINIT,
        }
    }

    pub fn drive(&self) -> Drive {
        self.drive
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Give the block driver back, dropping the drive status.
    pub fn into_device(self) -> D {
        self.device
    }

    fn owns(&self, pdrv: u8) -> bool {
        Drive::try_from(pdrv).is_ok_and(|drive| drive == self.drive)
    }

    /// Cached drive status. No driver I/O is performed.
    pub fn status(&self, pdrv: u8) -> DiskStatus {
        if !self.owns(pdrv) {
            return DiskStatus::NOINIT;
        }
        self.status
    }

    /// Run the driver's initialization and return the updated status.
    ///
    /// A read-only medium comes up with [`DiskStatus::PROTECT`] set. A failed
    /// initialization forces the status back to exactly
    /// [`DiskStatus::NOINIT`], even if the drive was ready before.
    pub fn initialize(&mut self, pdrv: u8) -> DiskStatus {
        if !self.owns(pdrv) {
            trace!("diskio: initialize on foreign drive {}", pdrv);
            return DiskStatus::NOINIT;
        }

        match self.device.init() {
            Ok(()) => {
                self.status = if self.device.info().read_only {
                    DiskStatus::PROTECT
                } else {
                    DiskStatus::empty()
                };
                debug!("diskio: {:?} ready ({:?})", self.drive, self.device.info());
            }
            Err(e) => {
                self.status = DiskStatus::NOINIT;
                warn!("diskio: {:?} initialization failed: {}", self.drive, e);
            }
        }
        self.status
    }

    /// Validate a transfer request and return the sector size to split on.
    ///
    /// Checks run in order: drive number and zero count (`ParamError`),
    /// then readiness (`NotReady`), then buffer size and address range.
    fn check_transfer(
        &self,
        pdrv: u8,
        len: usize,
        sector: u64,
        count: u32,
    ) -> Result<usize, DiskError> {
        if !self.owns(pdrv) || count == 0 {
            return Err(DiskError::ParamError);
        }
        if self.status.contains(DiskStatus::NOINIT) {
            return Err(DiskError::NotReady);
        }

        let block_size = self.device.info().block_size;
        let needed = block_size
            .checked_mul(count as usize)
            .ok_or(DiskError::ParamError)?;
        if block_size == 0 || len < needed {
            trace!("diskio: buffer of {} bytes cannot hold {} sectors", len, count);
            return Err(DiskError::ParamError);
        }
        sector
            .checked_add(u64::from(count) - 1)
            .ok_or(DiskError::ParamError)?;

        Ok(block_size)
    }

    /// Read `count` sectors starting at `sector` into `buf`.
    ///
    /// Sectors are fetched one driver call at a time in ascending order.
    /// The result is all-or-nothing: if any sector fails the whole request
    /// reports [`DiskError::Error`] and `buf` holds whatever was read before
    /// the failure.
    pub fn read(&mut self, pdrv: u8, buf: &mut [u8], sector: u64, count: u32) -> DiskResult {
        let block_size = self.check_transfer(pdrv, buf.len(), sector, count)?;

        let mut remaining = count;
        for (i, chunk) in buf
            .chunks_exact_mut(block_size)
            .take(count as usize)
            .enumerate()
        {
            let lba = sector + i as u64;
            if let Err(e) = self.device.read_block(lba, chunk) {
                warn!(
                    "diskio: read of sector {} failed: {} ({} of {} sectors left)",
                    lba, e, remaining, count
                );
                break;
            }
            remaining -= 1;
        }

        if remaining == 0 {
            Ok(())
        } else {
            Err(DiskError::Error)
        }
    }

    /// Write `count` sectors starting at `sector` from `buf`.
    ///
    /// Mirrors [`read`](Self::read); a failure part way through leaves the
    /// medium with only the leading sectors updated. A drive with
    /// [`DiskStatus::PROTECT`] set refuses with [`DiskError::WriteProtected`]
    /// before the driver is called.
    #[cfg(not(feature = "readonly"))]
    pub fn write(&mut self, pdrv: u8, buf: &[u8], sector: u64, count: u32) -> DiskResult {
        let block_size = self.check_transfer(pdrv, buf.len(), sector, count)?;
        if self.status.contains(DiskStatus::PROTECT) {
            trace!("diskio: write to protected {:?} refused", self.drive);
            return Err(DiskError::WriteProtected);
        }

        let mut remaining = count;
        for (i, chunk) in buf.chunks_exact(block_size).take(count as usize).enumerate() {
            let lba = sector + i as u64;
            if let Err(e) = self.device.write_block(lba, chunk) {
                warn!(
                    "diskio: write of sector {} failed: {} ({} of {} sectors left)",
                    lba, e, remaining, count
                );
                break;
            }
            remaining -= 1;
        }

        if remaining == 0 {
            Ok(())
        } else {
            Err(DiskError::Error)
        }
    }

    /// Accepts every control code on this drive without acting on it.
    pub fn control(&self, pdrv: u8, cmd: IoctlCommand, _buf: &mut [u8]) -> DiskResult {
        if !self.owns(pdrv) {
            return Err(DiskError::ParamError);
        }
        trace!("diskio: control {:?} on {:?} ignored", cmd, self.drive);
        Ok(())
    }
}

impl<D: BlockDevice> Disk for DiskIo<D> {
    fn status(&self, pdrv: u8) -> DiskStatus {
        DiskIo::status(self, pdrv)
    }

    fn initialize(&mut self, pdrv: u8) -> DiskStatus {
        DiskIo::initialize(self, pdrv)
    }

    fn read(&mut self, pdrv: u8, buf: &mut [u8], sector: u64, count: u32) -> DiskResult {
        DiskIo::read(self, pdrv, buf, sector, count)
    }

    #[cfg(not(feature = "readonly"))]
    fn write(&mut self, pdrv: u8, buf: &[u8], sector: u64, count: u32) -> DiskResult {
        DiskIo::write(self, pdrv, buf, sector, count)
    }

    fn control(&self, pdrv: u8, cmd: IoctlCommand, buf: &mut [u8]) -> DiskResult {
        DiskIo::control(self, pdrv, cmd, buf)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::hal::block_device::{BlockDeviceError, BlockDeviceInfo, SECTOR_SIZE};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) enum Call {
        Init,
        Read(u64),
        Write(u64),
    }

    /// Driver double that records every call and fills each block it
    /// reads with the low byte of the block address.
    pub(crate) struct RecordingDevice {
        pub calls: Vec<Call>,
        pub written: Vec<(u64, u8)>,
        pub fail_init: bool,
        pub fail_sector: Option<u64>,
    }

    impl RecordingDevice {
        pub fn new() -> Self {
            Self {
                calls: Vec::new(),
                written: Vec::new(),
                fail_init: false,
                fail_sector: None,
            }
        }

        pub fn failing_at(sector: u64) -> Self {
            Self {
                fail_sector: Some(sector),
                ..Self::new()
            }
        }

        pub fn io_calls(&self) -> Vec<Call> {
            self.calls
                .iter()
                .copied()
                .filter(|c| *c != Call::Init)
                .collect()
        }
    }

    impl BlockDevice for RecordingDevice {
        fn info(&self) -> BlockDeviceInfo {
            BlockDeviceInfo::new(1024).removable()
        }

        fn init(&mut self) -> Result<(), BlockDeviceError> {
            self.calls.push(Call::Init);
            if self.fail_init {
                Err(BlockDeviceError::NotReady)
            } else {
                Ok(())
            }
        }

        fn read_block(&mut self, block: u64, buffer: &mut [u8]) -> Result<(), BlockDeviceError> {
            self.calls.push(Call::Read(block));
            if self.fail_sector == Some(block) {
                return Err(BlockDeviceError::ReadError);
            }
            buffer.fill(block as u8);
            Ok(())
        }

        fn write_block(&mut self, block: u64, buffer: &[u8]) -> Result<(), BlockDeviceError> {
            self.calls.push(Call::Write(block));
            if self.fail_sector == Some(block) {
                return Err(BlockDeviceError::WriteError);
            }
            self.written.push((block, buffer[0]));
            Ok(())
        }
    }

    fn ready(device: RecordingDevice) -> DiskIo<RecordingDevice> {
        let mut disk = DiskIo::new(Drive::MemoryCard, device);
        disk.initialize(0);
        disk
    }

    #[test]
    fn starts_not_initialized() {
        let disk = DiskIo::new(Drive::MemoryCard, RecordingDevice::new());
        assert_eq!(disk.status(0), DiskStatus::NOINIT);
        assert!(disk.device().calls.is_empty());
    }

    #[test]
    fn initialize_clears_noinit_on_success() {
        let mut disk = DiskIo::new(Drive::MemoryCard, RecordingDevice::new());
        let status = disk.initialize(0);
        assert!(!status.contains(DiskStatus::NOINIT));
        assert_eq!(disk.status(0), status);
        assert_eq!(disk.device().calls, [Call::Init]);
    }

    #[test]
    fn failed_initialize_reports_noinit() {
        let mut device = RecordingDevice::new();
        device.fail_init = true;
        let mut disk = DiskIo::new(Drive::MemoryCard, device);
        assert_eq!(disk.initialize(0), DiskStatus::NOINIT);
        assert_eq!(disk.status(0), DiskStatus::NOINIT);
        assert_eq!(disk.device().calls, [Call::Init]);
    }

    #[test]
    fn failed_reinitialize_sets_noinit_again() {
        struct Flaky {
            inits: u32,
        }

        impl BlockDevice for Flaky {
            fn info(&self) -> BlockDeviceInfo {
                BlockDeviceInfo::new(8)
            }
            fn init(&mut self) -> Result<(), BlockDeviceError> {
                self.inits += 1;
                if self.inits == 1 {
                    Ok(())
                } else {
                    Err(BlockDeviceError::Timeout)
                }
            }
            fn read_block(&mut self, _: u64, _: &mut [u8]) -> Result<(), BlockDeviceError> {
                Ok(())
            }
            fn write_block(&mut self, _: u64, _: &[u8]) -> Result<(), BlockDeviceError> {
                Ok(())
            }
        }

        let mut disk = DiskIo::new(Drive::MemoryCard, Flaky { inits: 0 });
        assert!(disk.initialize(0).is_empty());
        assert_eq!(disk.initialize(0), DiskStatus::NOINIT);

        let mut buf = [0u8; SECTOR_SIZE];
        assert_eq!(disk.read(0, &mut buf, 0, 1), Err(DiskError::NotReady));
    }

    #[test]
    fn initialize_reruns_driver_init_each_time() {
        let mut disk = DiskIo::new(Drive::MemoryCard, RecordingDevice::new());
        disk.initialize(0);
        disk.initialize(0);
        assert_eq!(disk.device().calls, [Call::Init, Call::Init]);
        assert!(disk.status(0).is_empty());
    }

    #[test]
    fn foreign_drive_numbers_never_reach_driver() {
        let mut disk = ready(RecordingDevice::new());
        let mut buf = [0u8; SECTOR_SIZE];

        for pdrv in 1..=u8::MAX {
            assert_eq!(disk.status(pdrv), DiskStatus::NOINIT);
            assert_eq!(disk.initialize(pdrv), DiskStatus::NOINIT);
            assert_eq!(disk.read(pdrv, &mut buf, 0, 1), Err(DiskError::ParamError));
            #[cfg(not(feature = "readonly"))]
            assert_eq!(disk.write(pdrv, &buf, 0, 1), Err(DiskError::ParamError));
            assert_eq!(
                disk.control(pdrv, IoctlCommand::Sync, &mut []),
                Err(DiskError::ParamError)
            );
        }

        assert_eq!(disk.device().calls, [Call::Init]);
        assert!(disk.status(0).is_empty());
    }

    #[test]
    fn read_on_unknown_drive_is_param_error() {
        let mut disk = ready(RecordingDevice::new());
        let mut buf = [0u8; SECTOR_SIZE];
        assert_eq!(disk.read(1, &mut buf, 0, 1), Err(DiskError::ParamError));
        assert!(disk.device().io_calls().is_empty());
    }

    #[test]
    fn zero_count_is_param_error_even_when_not_ready() {
        let mut disk = DiskIo::new(Drive::MemoryCard, RecordingDevice::new());
        let mut buf = [0u8; SECTOR_SIZE];
        assert_eq!(disk.read(0, &mut buf, 0, 0), Err(DiskError::ParamError));
    }

    #[test]
    fn transfers_refused_until_initialized() {
        let mut disk = DiskIo::new(Drive::MemoryCard, RecordingDevice::new());
        let mut buf = [0u8; SECTOR_SIZE * 4];

        for count in 1..=4 {
            assert_eq!(disk.read(0, &mut buf, 0, count), Err(DiskError::NotReady));
            #[cfg(not(feature = "readonly"))]
            assert_eq!(disk.write(0, &buf, 0, count), Err(DiskError::NotReady));
        }
        assert!(disk.device().calls.is_empty());
    }

    #[test]
    fn multi_sector_read_walks_ascending_addresses() {
        let mut disk = ready(RecordingDevice::new());
        let mut buf = [0u8; SECTOR_SIZE * 3];

        assert_eq!(disk.read(0, &mut buf, 100, 3), Ok(()));
        assert_eq!(
            disk.device().io_calls(),
            [Call::Read(100), Call::Read(101), Call::Read(102)]
        );
        assert!(buf[..SECTOR_SIZE].iter().all(|&b| b == 100));
        assert!(buf[SECTOR_SIZE..SECTOR_SIZE * 2].iter().all(|&b| b == 101));
        assert!(buf[SECTOR_SIZE * 2..].iter().all(|&b| b == 102));
    }

    #[test]
    fn single_sector_read_is_one_driver_call() {
        let mut exact = ready(RecordingDevice::new());
        let mut buf = [0u8; SECTOR_SIZE];
        assert_eq!(exact.read(0, &mut buf, 7, 1), Ok(()));

        let mut roomy = ready(RecordingDevice::new());
        let mut big = [0u8; SECTOR_SIZE * 2];
        assert_eq!(roomy.read(0, &mut big, 7, 1), Ok(()));

        assert_eq!(exact.device().io_calls(), [Call::Read(7)]);
        assert_eq!(exact.device().io_calls(), roomy.device().io_calls());
        assert_eq!(&buf[..], &big[..SECTOR_SIZE]);
        assert!(big[SECTOR_SIZE..].iter().all(|&b| b == 0));
    }

    #[test]
    fn failing_last_sector_fails_whole_read() {
        let mut disk = ready(RecordingDevice::failing_at(12));
        let mut buf = [0u8; SECTOR_SIZE * 3];

        assert_eq!(disk.read(0, &mut buf, 10, 3), Err(DiskError::Error));
        assert_eq!(
            disk.device().io_calls(),
            [Call::Read(10), Call::Read(11), Call::Read(12)]
        );
    }

    #[test]
    fn failing_first_sector_stops_transfer() {
        let mut disk = ready(RecordingDevice::failing_at(10));
        let mut buf = [0u8; SECTOR_SIZE * 3];

        assert_eq!(disk.read(0, &mut buf, 10, 3), Err(DiskError::Error));
        assert_eq!(disk.device().io_calls(), [Call::Read(10)]);
    }

    #[test]
    fn undersized_buffer_is_param_error() {
        let mut disk = ready(RecordingDevice::new());
        let mut buf = [0u8; SECTOR_SIZE * 2 - 1];
        assert_eq!(disk.read(0, &mut buf, 0, 2), Err(DiskError::ParamError));
        assert!(disk.device().io_calls().is_empty());
    }

    #[test]
    fn address_overflow_is_param_error() {
        let mut disk = ready(RecordingDevice::new());
        let mut buf = [0u8; SECTOR_SIZE * 2];
        assert_eq!(disk.read(0, &mut buf, u64::MAX, 2), Err(DiskError::ParamError));
        assert_eq!(disk.read(0, &mut buf, u64::MAX, 1), Ok(()));
        assert_eq!(disk.device().io_calls(), [Call::Read(u64::MAX)]);
    }

    #[cfg(not(feature = "readonly"))]
    #[test]
    fn multi_sector_write_sends_matching_slices() {
        let mut disk = ready(RecordingDevice::new());
        let mut buf = [0u8; SECTOR_SIZE * 3];
        for (i, chunk) in buf.chunks_exact_mut(SECTOR_SIZE).enumerate() {
            chunk.fill(0xA0 + i as u8);
        }

        assert_eq!(disk.write(0, &buf, 40, 3), Ok(()));
        assert_eq!(
            disk.device().io_calls(),
            [Call::Write(40), Call::Write(41), Call::Write(42)]
        );
        assert_eq!(disk.device().written, [(40, 0xA0), (41, 0xA1), (42, 0xA2)]);
    }

    #[cfg(not(feature = "readonly"))]
    #[test]
    fn failing_write_sector_fails_whole_write() {
        let mut disk = ready(RecordingDevice::failing_at(41));
        let buf = [0x55u8; SECTOR_SIZE * 3];

        assert_eq!(disk.write(0, &buf, 40, 3), Err(DiskError::Error));
        assert_eq!(disk.device().written, [(40, 0x55)]);
    }

    #[test]
    fn control_always_succeeds_without_side_effects() {
        let disk = DiskIo::new(Drive::MemoryCard, RecordingDevice::new());
        let mut arg = [0u8; 8];

        for code in 0..=u8::MAX {
            assert_eq!(disk.control(0, IoctlCommand::from(code), &mut arg), Ok(()));
        }
        assert_eq!(arg, [0u8; 8]);
        assert_eq!(disk.status(0), DiskStatus::NOINIT);
        assert!(disk.device().calls.is_empty());
    }

    #[test]
    fn adapter_bound_to_other_drive_rejects_zero() {
        let mut disk = DiskIo::new(Drive::RamDisk, RecordingDevice::new());
        assert_eq!(disk.initialize(0), DiskStatus::NOINIT);
        assert!(disk.initialize(1).is_empty());

        let mut buf = [0u8; SECTOR_SIZE];
        assert_eq!(disk.read(0, &mut buf, 0, 1), Err(DiskError::ParamError));
        assert_eq!(disk.read(1, &mut buf, 5, 1), Ok(()));
        assert_eq!(disk.device().io_calls(), [Call::Read(5)]);
    }

    #[test]
    fn read_only_medium_comes_up_protected() {
        use crate::peripheral::ramdisk::RamDisk;

        let mut disk = DiskIo::new(Drive::MemoryCard, RamDisk::new(4).read_only());
        assert_eq!(disk.initialize(0), DiskStatus::PROTECT);
        assert_eq!(disk.status(0), DiskStatus::PROTECT);

        let mut buf = [0u8; SECTOR_SIZE];
        assert_eq!(disk.read(0, &mut buf, 3, 1), Ok(()));
    }

    #[cfg(not(feature = "readonly"))]
    #[test]
    fn protected_drive_refuses_writes_before_driver() {
        use crate::peripheral::ramdisk::RamDisk;

        let mut disk = DiskIo::new(Drive::MemoryCard, RamDisk::new(4).read_only());
        let buf = [0xFFu8; SECTOR_SIZE * 2];

        assert_eq!(disk.write(0, &buf, 0, 2), Err(DiskError::NotReady));
        disk.initialize(0);
        assert_eq!(disk.write(0, &buf, 0, 2), Err(DiskError::WriteProtected));
        assert_eq!(disk.write(1, &buf, 0, 2), Err(DiskError::ParamError));
        assert!(disk.device().as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn failed_reinitialize_drops_protect() {
        struct LockedThenGone {
            inits: u32,
        }

        impl BlockDevice for LockedThenGone {
            fn info(&self) -> BlockDeviceInfo {
                BlockDeviceInfo::new(8).read_only()
            }
            fn init(&mut self) -> Result<(), BlockDeviceError> {
                self.inits += 1;
                if self.inits == 1 {
                    Ok(())
                } else {
                    Err(BlockDeviceError::NotReady)
                }
            }
            fn read_block(&mut self, _: u64, _: &mut [u8]) -> Result<(), BlockDeviceError> {
                Ok(())
            }
            fn write_block(&mut self, _: u64, _: &[u8]) -> Result<(), BlockDeviceError> {
                Err(BlockDeviceError::WriteProtected)
            }
        }

        let mut disk = DiskIo::new(Drive::MemoryCard, LockedThenGone { inits: 0 });
        assert_eq!(disk.initialize(0), DiskStatus::PROTECT);
        assert_eq!(disk.initialize(0), DiskStatus::NOINIT);
    }
}
