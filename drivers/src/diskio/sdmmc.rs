//! Bridge from a [`DiskIo`] drive to the `embedded-sdmmc` FAT engine
//!
//! `embedded-sdmmc` drives its storage through `&self`, so the adapter is
//! kept in a [`RefCell`]. The bridge is therefore `!Sync` and must stay on
//! one thread, like the adapter itself.

use core::cell::{Ref, RefCell};

use embedded_sdmmc::{Block, BlockCount, BlockIdx};
use log::trace;

use super::{DiskError, DiskIo};
use crate::hal::block_device::BlockDevice;

/// A [`DiskIo`] drive exposed as an `embedded_sdmmc::BlockDevice`.
///
/// The bridge never initializes the drive. Call
/// [`DiskIo::initialize`] before handing it over; an uninitialized drive
/// makes every filesystem access fail with [`DiskError::NotReady`].
pub struct SdmmcDisk<D> {
    disk: RefCell<DiskIo<D>>,
}

impl<D: BlockDevice> SdmmcDisk<D> {
    pub fn new(disk: DiskIo<D>) -> Self {
        Self {
            disk: RefCell::new(disk),
        }
    }

    pub fn disk(&self) -> Ref<'_, DiskIo<D>> {
        self.disk.borrow()
    }

    pub fn into_inner(self) -> DiskIo<D> {
        self.disk.into_inner()
    }

    fn check_block_size(disk: &DiskIo<D>) -> Result<(), DiskError> {
        if disk.device().info().block_size != Block::LEN {
            return Err(DiskError::ParamError);
        }
        Ok(())
    }
}

impl<D: BlockDevice> embedded_sdmmc::BlockDevice for SdmmcDisk<D> {
    type Error = DiskError;

    fn read(
        &self,
        blocks: &mut [Block],
        start_block_idx: BlockIdx,
        reason: &str,
    ) -> Result<(), Self::Error> {
        let mut disk = self.disk.borrow_mut();
        Self::check_block_size(&disk)?;
        trace!("sdmmc: read {} blocks at {} ({})", blocks.len(), start_block_idx.0, reason);

        let pdrv = disk.drive().number();
        let start = u64::from(start_block_idx.0);
        for (i, block) in blocks.iter_mut().enumerate() {
            disk.read(pdrv, &mut block.contents, start + i as u64, 1)?;
        }
        Ok(())
    }

    fn write(&self, blocks: &[Block], start_block_idx: BlockIdx) -> Result<(), Self::Error> {
        write_blocks(&self.disk, blocks, start_block_idx)
    }

    fn num_blocks(&self) -> Result<BlockCount, Self::Error> {
        let count = self.disk.borrow().device().info().block_count;
        Ok(BlockCount(u32::try_from(count).unwrap_or(u32::MAX)))
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "readonly")] {
        fn write_blocks<D: BlockDevice>(
            _disk: &RefCell<DiskIo<D>>,
            _blocks: &[Block],
            _start_block_idx: BlockIdx,
        ) -> Result<(), DiskError> {
            Err(DiskError::WriteProtected)
        }
    } else {
        fn write_blocks<D: BlockDevice>(
            disk: &RefCell<DiskIo<D>>,
            blocks: &[Block],
            start_block_idx: BlockIdx,
        ) -> Result<(), DiskError> {
            let mut disk = disk.borrow_mut();
            SdmmcDisk::check_block_size(&disk)?;

            let pdrv = disk.drive().number();
            let start = u64::from(start_block_idx.0);
            for (i, block) in blocks.iter().enumerate() {
                disk.write(pdrv, &block.contents, start + i as u64, 1)?;
            }
            Ok(())
        }
    }
}
