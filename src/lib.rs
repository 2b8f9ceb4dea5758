//! mtdsink - Sequential byte-stream sink for block-erasable devices
//!
//! This crate is the std-facing entry point: it resolves a device
//! specification string to a backend, opens it, and hands back a ready
//! [`MtdWriter`]. The write-path logic itself lives in `mtdsink-core`
//! and works against any [`MtdDevice`] implementation.
//!
//! # Example
//!
//! ```
//! use mtdsink::ByteSink;
//!
//! let mut writer = mtdsink::open("mem:erase=4096,blocks=512,units=16").unwrap();
//! writer.put_bytes(b"hello").unwrap();
//! writer.flush().unwrap();
//! writer.close();
//! ```
//!
//! Closing (or dropping) a writer does NOT flush; a pending partial
//! erase unit is lost unless the caller flushed it first.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod registry;

pub use mtdsink_core::{
    ByteSink, DeviceCaps, DeviceGeometry, Error, MtdDevice, MtdWriter, Result,
};
pub use registry::{open, open_device, OpenError};
