//! Device geometry
//!
//! Geometry is queried once when a writer is opened and is fixed for the
//! lifetime of the stream.

use crate::error::{Error, Result};

/// Erase/program geometry of a block-erasable device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceGeometry {
    /// Minimum programmable unit in bytes
    pub block_size: u32,
    /// Minimum erasable unit in bytes (a multiple of `block_size`)
    pub erase_size: u32,
    /// Number of erase units on the device
    pub n_erase_units: u32,
}

impl DeviceGeometry {
    /// Validate the geometry a device reported.
    ///
    /// All fields must be positive and the erase unit must be a whole
    /// number of blocks.
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 || self.erase_size == 0 || self.n_erase_units == 0 {
            return Err(Error::InvalidDevice);
        }

        if self.erase_size % self.block_size != 0 {
            return Err(Error::InvalidDevice);
        }

        Ok(())
    }

    /// Total device capacity in bytes
    pub fn capacity(&self) -> u64 {
        self.erase_size as u64 * self.n_erase_units as u64
    }

    /// Number of program blocks per erase unit
    pub fn blocks_per_unit(&self) -> u32 {
        self.erase_size / self.block_size
    }
}
