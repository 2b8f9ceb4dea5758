//! Device trait definitions
//!
//! A device backend implements [`MtdDevice`] and advertises what it can do
//! through [`DeviceCaps`]. The capability flags are checked once when a
//! writer is opened and cached in the writer, so backends are free to
//! compute them from probed hardware state.

use crate::error::{Error, Result};
use crate::geometry::DeviceGeometry;
use bitflags::bitflags;

bitflags! {
    /// Device capability flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DeviceCaps: u32 {
        /// Supports programming arbitrary byte ranges via
        /// [`MtdDevice::byte_program`].
        ///
        /// Advertising this flag asserts a stronger contract than the
        /// method signature alone: the device must allow byte-level
        /// programming into an erase unit that was previously erased but
        /// is not yet fully written, without an additional erase cycle.
        /// The writer erases each unit exactly once, when the stream
        /// first enters it, and then programs the unit incrementally.
        const BYTE_PROGRAM = 1 << 0;
    }
}

impl Default for DeviceCaps {
    fn default() -> Self {
        DeviceCaps::empty()
    }
}

/// A block-erasable device
///
/// Mandatory operations are `geometry`, `erase`, and `block_program`.
/// `byte_program` is optional and must only be called on devices that
/// advertise [`DeviceCaps::BYTE_PROGRAM`].
///
/// All operations are synchronous and block the caller until the device
/// completes them. Indices are in device units: `erase` addresses erase
/// units, `block_program` addresses program blocks.
pub trait MtdDevice {
    /// Get the capabilities of this device
    fn caps(&self) -> DeviceCaps {
        DeviceCaps::empty()
    }

    /// Query the erase/program geometry of this device
    fn geometry(&self) -> Result<DeviceGeometry>;

    /// Erase `count` erase units starting at unit index `unit`
    fn erase(&mut self, unit: u32, count: u32) -> Result<()>;

    /// Program `count` blocks starting at block index `block`
    ///
    /// `data` must hold exactly `count * block_size` bytes and the target
    /// blocks must have been erased since they were last programmed.
    fn block_program(&mut self, block: u32, count: u32, data: &[u8]) -> Result<()>;

    /// Program an arbitrary byte range at `offset`
    ///
    /// Only available on devices advertising [`DeviceCaps::BYTE_PROGRAM`];
    /// the default implementation rejects the call.
    fn byte_program(&mut self, _offset: u64, _data: &[u8]) -> Result<()> {
        Err(Error::NotSupported)
    }
}

// Blanket impl for boxed devices to allow trait objects
impl MtdDevice for alloc::boxed::Box<dyn MtdDevice + Send> {
    fn caps(&self) -> DeviceCaps {
        (**self).caps()
    }

    fn geometry(&self) -> Result<DeviceGeometry> {
        (**self).geometry()
    }

    fn erase(&mut self, unit: u32, count: u32) -> Result<()> {
        (**self).erase(unit, count)
    }

    fn block_program(&mut self, block: u32, count: u32, data: &[u8]) -> Result<()> {
        (**self).block_program(block, count, data)
    }

    fn byte_program(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        (**self).byte_program(offset, data)
    }
}
