//! Device-backed byte-stream writer
//!
//! [`MtdWriter`] accepts an unbounded sequence of bytes and translates it
//! into the erase/program granularity of the underlying device. Devices
//! without [`DeviceCaps::BYTE_PROGRAM`] get a single erase-unit-sized
//! cache holding the in-progress tail unit; a unit is committed (erase,
//! then block-program) when it fills or when the caller flushes.

use alloc::vec::Vec;

use crate::device::{DeviceCaps, MtdDevice};
use crate::error::{Error, Result};
use crate::geometry::DeviceGeometry;
use crate::sink::ByteSink;

/// Bounds-checked cache for one erase unit
///
/// The buffer is exactly one erase unit long and never grows, so every
/// write through `write_at` stays inside the unit boundary.
struct UnitCache {
    buf: Vec<u8>,
}

impl UnitCache {
    fn new(erase_size: usize) -> Result<Self> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(erase_size)
            .map_err(|_| Error::OutOfMemory)?;
        buf.resize(erase_size, 0);
        Ok(Self { buf })
    }

    fn write_at(&mut self, offset: usize, bytes: &[u8]) {
        debug_assert!(offset + bytes.len() <= self.buf.len());
        self.buf[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    fn zero(&mut self) {
        self.buf.fill(0);
    }

    fn as_slice(&self) -> &[u8] {
        &self.buf
    }
}

/// Sequential byte-stream writer over a block-erasable device
///
/// The writer exclusively owns the device handle for its lifetime. All
/// access is through `&mut self`, so a writer confined to one execution
/// context needs no further synchronization.
///
/// # Error contract
///
/// `NoSpace` is reported before any device or cache mutation. All other
/// errors are surfaced verbatim from the device and may leave partial
/// progress behind (bytes merged into the cache, or some but not all
/// units of a bulk write committed); on error the stream state is
/// indeterminate and the writer should be discarded or reopened.
pub struct MtdWriter<D: MtdDevice> {
    device: D,
    geo: DeviceGeometry,
    caps: DeviceCaps,
    position: u64,
    cache: Option<UnitCache>,
}

impl<D: MtdDevice> MtdWriter<D> {
    /// Open a writer over `device`.
    ///
    /// Queries and validates the device geometry, then allocates the
    /// erase-unit cache unless the device supports direct byte
    /// programming. On failure the device is dropped before returning.
    pub fn open(device: D) -> Result<Self> {
        let geo = device.geometry().map_err(|_| Error::InvalidDevice)?;
        geo.validate()?;

        let caps = device.caps();
        let cache = if caps.contains(DeviceCaps::BYTE_PROGRAM) {
            None
        } else {
            Some(UnitCache::new(geo.erase_size as usize)?)
        };

        log::debug!(
            "opened writer: block_size={} erase_size={} units={} caps={:?}",
            geo.block_size,
            geo.erase_size,
            geo.n_erase_units,
            caps
        );

        Ok(Self {
            device,
            geo,
            caps,
            position: 0,
            cache,
        })
    }

    /// Total bytes accepted so far
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Geometry the device reported at open
    pub fn geometry(&self) -> DeviceGeometry {
        self.geo
    }

    /// Total device capacity in bytes
    pub fn capacity(&self) -> u64 {
        self.geo.capacity()
    }

    /// Close the writer, releasing the device handle and the cache.
    ///
    /// Does NOT flush: a pending partial unit that was never flushed is
    /// lost. Call [`ByteSink::flush`] first to keep it.
    pub fn close(self) {}

    /// Consume the writer and hand back the device handle.
    ///
    /// Like [`close`](Self::close), this does not flush.
    pub fn into_device(self) -> D {
        self.device
    }

    /// Borrow the underlying device
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Erase unit index and byte offset within it for the current position
    fn unit_offset(&self) -> (u32, usize) {
        let erase_size = self.geo.erase_size as u64;
        (
            (self.position / erase_size) as u32,
            (self.position % erase_size) as usize,
        )
    }

    /// Erase `count` whole units and program them from `data`
    fn commit_units(
        device: &mut D,
        geo: &DeviceGeometry,
        unit: u32,
        count: u32,
        data: &[u8],
    ) -> Result<()> {
        device.erase(unit, count)?;

        let nblocks = geo.blocks_per_unit();
        log::trace!("committing {} unit(s) at unit {}", count, unit);
        device.block_program(unit * nblocks, count * nblocks, data)
    }

    fn put_bytes_direct(&mut self, buf: &[u8]) -> Result<usize> {
        let erase_size = self.geo.erase_size as u64;
        let end = self.position + buf.len() as u64;

        // Units are erased lazily, each exactly once when the stream
        // first crosses into it. BYTE_PROGRAM guarantees that re-entering
        // an already-erased, partially-programmed unit needs no erase.
        let sunit = self.position.div_ceil(erase_size);
        let eunit = end.div_ceil(erase_size);
        if sunit != eunit {
            self.device.erase(sunit as u32, (eunit - sunit) as u32)?;
        }

        self.device.byte_program(self.position, buf)?;
        self.position = end;
        Ok(buf.len())
    }

    fn put_bytes_buffered(&mut self, buf: &[u8]) -> Result<usize> {
        let erase_size = self.geo.erase_size as usize;
        let mut consumed = 0usize;
        let mut remain = buf.len();

        while remain > 0 {
            let (unit, offset) = self.unit_offset();

            if offset > 0 {
                // Continue the partial unit already in the cache.
                let copyin = remain.min(erase_size - offset);
                let cache = self.cache.as_mut().ok_or(Error::NotSupported)?;
                cache.write_at(offset, &buf[consumed..consumed + copyin]);

                consumed += copyin;
                self.position += copyin as u64;
                remain -= copyin;

                if offset + copyin == erase_size {
                    let cache = self.cache.as_ref().ok_or(Error::NotSupported)?;
                    Self::commit_units(&mut self.device, &self.geo, unit, 1, cache.as_slice())?;
                }
            } else if remain < erase_size {
                // Start a new unit that the input cannot fill. Zero the
                // cache first so a later flush never programs stale bytes
                // from a previously committed unit.
                let cache = self.cache.as_mut().ok_or(Error::NotSupported)?;
                cache.zero();
                cache.write_at(0, &buf[consumed..]);

                self.position += remain as u64;
                remain = 0;
            } else {
                // Whole units straight from the caller's buffer.
                let nunits = (remain / erase_size) as u32;
                let copyin = nunits as usize * erase_size;
                Self::commit_units(
                    &mut self.device,
                    &self.geo,
                    unit,
                    nunits,
                    &buf[consumed..consumed + copyin],
                )?;

                consumed += copyin;
                self.position += copyin as u64;
                remain -= copyin;
            }
        }

        Ok(buf.len())
    }
}

impl<D: MtdDevice> ByteSink for MtdWriter<D> {
    /// Append `buf` to the stream.
    ///
    /// Fails with `NoSpace`, touching neither device nor cache, if the
    /// write would exceed device capacity. Any device error is returned
    /// verbatim; see the type-level error contract for what state the
    /// writer may be left in.
    fn put_bytes(&mut self, buf: &[u8]) -> Result<usize> {
        if self.position + buf.len() as u64 > self.geo.capacity() {
            return Err(Error::NoSpace);
        }

        if buf.is_empty() {
            return Ok(0);
        }

        if self.caps.contains(DeviceCaps::BYTE_PROGRAM) {
            self.put_bytes_direct(buf)
        } else {
            self.put_bytes_buffered(buf)
        }
    }

    /// Commit the pending partial unit, if any.
    ///
    /// A no-op on direct-byte-program devices (every byte is already
    /// committed as written) and on unit boundaries. Idempotent: flushing
    /// again without new writes re-commits the same content.
    fn flush(&mut self) -> Result<()> {
        let (unit, offset) = self.unit_offset();
        if offset == 0 {
            return Ok(());
        }

        let Some(cache) = self.cache.as_ref() else {
            return Ok(());
        };

        Self::commit_units(&mut self.device, &self.geo, unit, 1, cache.as_slice())
    }
}
