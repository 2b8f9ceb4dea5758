//! Device registry and open-by-name
//!
//! This module resolves a device specification string to a backend and
//! opens a writer over it, hiding the backend types from the public API.
//!
//! Format: `"name"` or `"name:key1=value1,key2=value2"`. The only
//! built-in backend is `mem`, the in-memory emulator; real deployments
//! register their device behind the same [`MtdDevice`] trait and open a
//! writer with [`MtdWriter::open`] directly.

use std::collections::HashMap;

use mtdsink_core::{MtdDevice, MtdWriter};
use mtdsink_mem::{MemConfig, MemDevice};
use thiserror::Error;

/// Errors from resolving and opening a device by name
#[derive(Debug, Error)]
pub enum OpenError {
    /// The device name did not resolve to a known backend
    #[error("device not found: {0}")]
    NotFound(String),

    /// A parameter in the specification string is malformed
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter key
        name: &'static str,
        /// What was wrong with the value
        message: String,
    },

    /// The backend rejected the stream at open
    #[error("device rejected at open: {0}")]
    Device(#[source] mtdsink_core::Error),
}

/// Parsed device specification
struct DeviceParams {
    name: String,
    params: HashMap<String, String>,
}

/// Parse a device specification into name and parameters
fn parse_device_params(s: &str) -> Result<DeviceParams, OpenError> {
    let (name, opts_str) = s.split_once(':').unwrap_or((s, ""));

    let mut params = HashMap::new();
    for opt in opts_str.split(',').filter(|o| !o.is_empty()) {
        match opt.split_once('=') {
            Some((key, value)) => {
                params.insert(key.to_string(), value.to_string());
            }
            None => {
                return Err(OpenError::InvalidParameter {
                    name: "spec",
                    message: format!("expected key=value, got '{}'", opt),
                });
            }
        }
    }

    Ok(DeviceParams {
        name: name.to_string(),
        params,
    })
}

fn parse_u32(
    params: &HashMap<String, String>,
    key: &'static str,
    default: u32,
) -> Result<u32, OpenError> {
    match params.get(key) {
        Some(value) => value.parse().map_err(|_| OpenError::InvalidParameter {
            name: key,
            message: format!("'{}' is not a valid number", value),
        }),
        None => Ok(default),
    }
}

fn parse_bool(
    params: &HashMap<String, String>,
    key: &'static str,
    default: bool,
) -> Result<bool, OpenError> {
    match params.get(key) {
        Some(value) => value.parse().map_err(|_| OpenError::InvalidParameter {
            name: key,
            message: format!("'{}' is not a valid bool", value),
        }),
        None => Ok(default),
    }
}

/// Build the in-memory emulator from specification parameters
///
/// Supported options (all optional):
/// - `erase=N` - erase unit size in bytes
/// - `blocks=N` - program block size in bytes
/// - `units=N` - number of erase units
/// - `bytewrite=BOOL` - advertise direct byte programming
fn open_mem(params: &HashMap<String, String>) -> Result<MemDevice, OpenError> {
    let defaults = MemConfig::default();
    let config = MemConfig {
        erase_size: parse_u32(params, "erase", defaults.erase_size)?,
        block_size: parse_u32(params, "blocks", defaults.block_size)?,
        n_erase_units: parse_u32(params, "units", defaults.n_erase_units)?,
        byte_program: parse_bool(params, "bytewrite", defaults.byte_program)?,
    };

    for key in params.keys() {
        if !matches!(key.as_str(), "erase" | "blocks" | "units" | "bytewrite") {
            log::warn!("unknown mem option: {}", key);
        }
    }

    Ok(MemDevice::new(config))
}

/// Resolve a device specification to a backend handle.
///
/// Fails with [`OpenError::NotFound`] for unknown backend names.
pub fn open_device(spec: &str) -> Result<Box<dyn MtdDevice + Send>, OpenError> {
    let parsed = parse_device_params(spec)?;

    match parsed.name.as_str() {
        "mem" => Ok(Box::new(open_mem(&parsed.params)?)),
        other => Err(OpenError::NotFound(other.to_string())),
    }
}

/// Resolve a device specification and open a writer over it.
///
/// The writer owns the device until [`MtdWriter::close`] or drop. On any
/// failure after the backend was resolved, the handle is released before
/// returning.
pub fn open(spec: &str) -> Result<MtdWriter<Box<dyn MtdDevice + Send>>, OpenError> {
    let device = open_device(spec)?;
    log::debug!("resolved device '{}'", spec);
    MtdWriter::open(device).map_err(OpenError::Device)
}
