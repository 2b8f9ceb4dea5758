//! Error types for mtdsink-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate. Device implementations return these values
//! directly from erase/program calls; the writer propagates them to the
//! caller verbatim, without retrying and without rolling back partial
//! progress.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Device lacks a mandatory capability or reports invalid geometry
    InvalidDevice,
    /// Cache buffer allocation failed
    OutOfMemory,
    /// Write would exceed total device capacity
    NoSpace,
    /// Operation is not supported by the device
    NotSupported,
    /// Unit, block, or byte range is beyond the device
    OutOfBounds,
    /// Erase operation failed
    EraseFailed,
    /// Program operation failed
    ProgramFailed,
    /// Geometry query or other device I/O failed
    IoFailed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDevice => write!(f, "invalid device or geometry"),
            Self::OutOfMemory => write!(f, "cache allocation failed"),
            Self::NoSpace => write!(f, "write exceeds device capacity"),
            Self::NotSupported => write!(f, "operation not supported by device"),
            Self::OutOfBounds => write!(f, "range is beyond the device"),
            Self::EraseFailed => write!(f, "erase operation failed"),
            Self::ProgramFailed => write!(f, "program operation failed"),
            Self::IoFailed => write!(f, "device I/O failed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
