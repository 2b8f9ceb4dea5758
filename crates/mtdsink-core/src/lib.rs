//! mtdsink-core - Core write-path logic for block-erasable devices
//!
//! This crate translates an unbounded sequence of byte writes into the
//! erase/program operations a block-erasable (MTD-style) device requires.
//! Devices that only support whole-erase-unit programming get a single
//! erase-unit-sized cache for the in-progress tail unit; devices that
//! advertise direct byte programming are written through without buffering.
//!
//! It is designed to be `no_std` compatible (with `alloc`) for use in
//! embedded environments.
//!
//! # Features
//!
//! - `std` - Enable standard library support (`std::error::Error` impls)
//!
//! # Example
//!
//! ```ignore
//! use mtdsink_core::{ByteSink, MtdWriter};
//!
//! let mut writer = MtdWriter::open(device)?;
//! writer.put_bytes(firmware)?;
//! writer.flush()?;
//! writer.close();
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

extern crate alloc;

pub mod device;
pub mod error;
pub mod geometry;
pub mod sink;
pub mod writer;

pub use device::{DeviceCaps, MtdDevice};
pub use error::{Error, Result};
pub use geometry::DeviceGeometry;
pub use sink::ByteSink;
pub use writer::MtdWriter;
