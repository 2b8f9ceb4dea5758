//! mtdsink-mem - In-memory block-erasable device emulator
//!
//! This crate provides a device that emulates NOR-style flash in memory.
//! It's useful for testing and development without real hardware: erase
//! sets a unit to 0xFF, programming can only clear bits (1 -> 0), and the
//! device counts erase/program calls so tests can assert on the exact
//! operation sequence the writer issued.

use mtdsink_core::{DeviceCaps, DeviceGeometry, Error, MtdDevice, Result};

/// Configuration for the emulated device
#[derive(Debug, Clone)]
pub struct MemConfig {
    /// Minimum programmable unit in bytes
    pub block_size: u32,
    /// Erase unit size in bytes
    pub erase_size: u32,
    /// Number of erase units
    pub n_erase_units: u32,
    /// Whether the device supports direct byte programming
    pub byte_program: bool,
}

impl Default for MemConfig {
    fn default() -> Self {
        Self {
            block_size: 512,
            erase_size: 4096,
            n_erase_units: 16,
            byte_program: false,
        }
    }
}

/// Emulated block-erasable device
///
/// Backed by a `Vec<u8>` initialized to the erased state (0xFF).
pub struct MemDevice {
    config: MemConfig,
    data: Vec<u8>,
    erase_calls: usize,
    program_calls: usize,
    fail_next_erase: bool,
    fail_next_program: bool,
}

impl MemDevice {
    /// Create a new emulated device with the given configuration
    pub fn new(config: MemConfig) -> Self {
        let size = config.erase_size as usize * config.n_erase_units as usize;
        Self {
            config,
            data: vec![0xFF; size],
            erase_calls: 0,
            program_calls: 0,
            fail_next_erase: false,
            fail_next_program: false,
        }
    }

    /// Create a new emulated device with the default configuration
    pub fn new_default() -> Self {
        Self::new(MemConfig::default())
    }

    /// Get a reference to the device contents
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the configuration
    pub fn config(&self) -> &MemConfig {
        &self.config
    }

    /// Number of erase calls issued so far
    pub fn erase_calls(&self) -> usize {
        self.erase_calls
    }

    /// Number of program calls (block or byte) issued so far
    pub fn program_calls(&self) -> usize {
        self.program_calls
    }

    /// Make the next erase call fail with `EraseFailed`
    pub fn fail_next_erase(&mut self) {
        self.fail_next_erase = true;
    }

    /// Make the next program call fail with `ProgramFailed`
    pub fn fail_next_program(&mut self) {
        self.fail_next_program = true;
    }

    fn program_range(&mut self, start: usize, data: &[u8]) -> Result<()> {
        if start + data.len() > self.data.len() {
            return Err(Error::OutOfBounds);
        }

        // NOR semantics: programming can only clear bits
        for (i, &byte) in data.iter().enumerate() {
            self.data[start + i] &= byte;
        }

        Ok(())
    }
}

impl MtdDevice for MemDevice {
    fn caps(&self) -> DeviceCaps {
        if self.config.byte_program {
            DeviceCaps::BYTE_PROGRAM
        } else {
            DeviceCaps::empty()
        }
    }

    fn geometry(&self) -> Result<DeviceGeometry> {
        Ok(DeviceGeometry {
            block_size: self.config.block_size,
            erase_size: self.config.erase_size,
            n_erase_units: self.config.n_erase_units,
        })
    }

    fn erase(&mut self, unit: u32, count: u32) -> Result<()> {
        self.erase_calls += 1;

        if self.fail_next_erase {
            self.fail_next_erase = false;
            return Err(Error::EraseFailed);
        }

        if unit + count > self.config.n_erase_units {
            return Err(Error::OutOfBounds);
        }

        let erase_size = self.config.erase_size as usize;
        let start = unit as usize * erase_size;
        let end = start + count as usize * erase_size;

        log::trace!("mem: erase units {}..{}", unit, unit + count);
        self.data[start..end].fill(0xFF);
        Ok(())
    }

    fn block_program(&mut self, block: u32, count: u32, data: &[u8]) -> Result<()> {
        self.program_calls += 1;

        if self.fail_next_program {
            self.fail_next_program = false;
            return Err(Error::ProgramFailed);
        }

        let block_size = self.config.block_size as usize;
        if data.len() != count as usize * block_size {
            return Err(Error::OutOfBounds);
        }

        log::trace!("mem: program blocks {}..{}", block, block + count);
        self.program_range(block as usize * block_size, data)
    }

    fn byte_program(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        if !self.config.byte_program {
            return Err(Error::NotSupported);
        }

        self.program_calls += 1;

        if self.fail_next_program {
            self.fail_next_program = false;
            return Err(Error::ProgramFailed);
        }

        log::trace!("mem: byte program {} bytes at {}", data.len(), offset);
        self.program_range(offset as usize, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtdsink_core::{ByteSink, MtdWriter};

    fn buffered_writer() -> MtdWriter<MemDevice> {
        MtdWriter::open(MemDevice::new_default()).unwrap()
    }

    fn direct_writer() -> MtdWriter<MemDevice> {
        MtdWriter::open(MemDevice::new(MemConfig {
            byte_program: true,
            ..MemConfig::default()
        }))
        .unwrap()
    }

    /// Pattern that never repeats within an erase unit
    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn no_space_leaves_device_untouched() {
        let mut writer = buffered_writer();
        let capacity = writer.capacity() as usize;

        let err = writer.put_bytes(&vec![0xAB; capacity + 1]).unwrap_err();
        assert_eq!(err, Error::NoSpace);
        assert_eq!(writer.position(), 0);

        let dev = writer.into_device();
        assert_eq!(dev.erase_calls(), 0);
        assert_eq!(dev.program_calls(), 0);
        assert!(dev.data().iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn no_space_applies_to_direct_devices_too() {
        let mut writer = direct_writer();
        let capacity = writer.capacity() as usize;

        writer.put_bytes(&pattern(100)).unwrap();
        let err = writer.put_bytes(&vec![0; capacity]).unwrap_err();
        assert_eq!(err, Error::NoSpace);
        assert_eq!(writer.position(), 100);
    }

    #[test]
    fn exact_unit_write_commits_once() {
        let mut writer = buffered_writer();
        let input = pattern(4096);

        assert_eq!(writer.put_bytes(&input).unwrap(), 4096);
        assert_eq!(writer.position(), 4096);

        let dev = writer.into_device();
        assert_eq!(dev.erase_calls(), 1);
        assert_eq!(dev.program_calls(), 1);
        assert_eq!(&dev.data()[..4096], &input[..]);
        assert!(dev.data()[4096..].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn sub_unit_write_is_zero_padded_on_flush() {
        let mut writer = buffered_writer();
        let input = pattern(100);

        writer.put_bytes(&input).unwrap();

        // Nothing committed until the flush
        assert_eq!(writer.device().erase_calls(), 0);
        assert_eq!(writer.device().program_calls(), 0);

        writer.flush().unwrap();

        let dev = writer.into_device();
        assert_eq!(&dev.data()[..100], &input[..]);
        assert!(dev.data()[100..4096].iter().all(|&b| b == 0));
        assert!(dev.data()[4096..].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn cross_unit_concatenation() {
        let mut writer = buffered_writer();
        let input = pattern(10000);

        // Several calls with awkward split points
        writer.put_bytes(&input[..1]).unwrap();
        writer.put_bytes(&input[1..4095]).unwrap();
        writer.put_bytes(&input[4095..4097]).unwrap();
        writer.put_bytes(&input[4097..]).unwrap();
        writer.flush().unwrap();

        let dev = writer.into_device();
        assert_eq!(&dev.data()[..10000], &input[..]);
        assert!(dev.data()[10000..3 * 4096].iter().all(|&b| b == 0));
    }

    #[test]
    fn bulk_write_bypasses_cache() {
        let mut writer = buffered_writer();
        let input = pattern(3 * 4096);

        writer.put_bytes(&input).unwrap();

        let dev = writer.into_device();
        // One erase call and one program call for all three units
        assert_eq!(dev.erase_calls(), 1);
        assert_eq!(dev.program_calls(), 1);
        assert_eq!(&dev.data()[..3 * 4096], &input[..]);
    }

    #[test]
    fn close_drops_pending_partial_unit() {
        let mut writer = buffered_writer();
        let input = pattern(4096 + 904);

        writer.put_bytes(&input).unwrap();
        let dev = writer.into_device();

        // First unit committed, the 904-byte tail never reached the device
        assert_eq!(&dev.data()[..4096], &input[..4096]);
        assert!(dev.data()[4096..].iter().all(|&b| b == 0xFF));
        assert_eq!(dev.erase_calls(), 1);
        assert_eq!(dev.program_calls(), 1);
    }

    #[test]
    fn flush_is_idempotent() {
        let mut writer = buffered_writer();
        let input = pattern(904);

        writer.put_bytes(&input).unwrap();
        writer.flush().unwrap();

        let after_first = writer.device().data().to_vec();

        writer.flush().unwrap();
        let dev = writer.into_device();
        assert_eq!(dev.data(), &after_first[..]);
        // The second flush really did re-commit
        assert_eq!(dev.erase_calls(), 2);
        assert_eq!(dev.program_calls(), 2);
    }

    #[test]
    fn flush_is_noop_at_unit_boundary() {
        let mut writer = buffered_writer();
        writer.put_bytes(&pattern(4096)).unwrap();
        writer.flush().unwrap();

        let dev = writer.into_device();
        assert_eq!(dev.erase_calls(), 1);
        assert_eq!(dev.program_calls(), 1);
    }

    #[test]
    fn worked_example_5000_bytes() {
        // eraseUnitSize=4096, blockSize=512, eraseUnitCount=16
        let mut writer = buffered_writer();
        let input = pattern(5000);

        assert_eq!(writer.put_bytes(&input).unwrap(), 5000);
        assert_eq!(writer.position(), 5000);

        // One full-unit commit; 904 bytes buffered and uncommitted
        assert_eq!(&writer.device().data()[..4096], &input[..4096]);
        assert!(writer.device().data()[4096..].iter().all(|&b| b == 0xFF));

        writer.flush().unwrap();
        let dev = writer.into_device();
        assert_eq!(&dev.data()[..5000], &input[..]);
        assert!(dev.data()[5000..2 * 4096].iter().all(|&b| b == 0));
        assert_eq!(dev.erase_calls(), 2);
        assert_eq!(dev.program_calls(), 2);
    }

    #[test]
    fn direct_path_programs_without_padding() {
        let mut writer = direct_writer();
        let input = pattern(100);

        writer.put_bytes(&input).unwrap();

        let dev = writer.into_device();
        assert_eq!(&dev.data()[..100], &input[..]);
        // No zero padding, the rest of the unit stays erased
        assert!(dev.data()[100..].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn direct_path_erases_each_unit_once() {
        let mut writer = direct_writer();

        // First write enters unit 0: one erase
        writer.put_bytes(&pattern(100)).unwrap();
        // Second write stays within unit 0: no erase
        writer.put_bytes(&pattern(100)).unwrap();
        // Third write crosses into unit 1: one erase
        writer.put_bytes(&pattern(4096)).unwrap();

        let dev = writer.into_device();
        assert_eq!(dev.erase_calls(), 2);
    }

    #[test]
    fn direct_path_flush_is_noop() {
        let mut writer = direct_writer();
        writer.put_bytes(&pattern(100)).unwrap();
        writer.flush().unwrap();

        let dev = writer.into_device();
        assert_eq!(dev.erase_calls(), 1);
        assert_eq!(dev.program_calls(), 1);
    }

    #[test]
    fn erase_failure_aborts_the_call() {
        let mut dev = MemDevice::new_default();
        dev.fail_next_erase();

        // Buffer 100 bytes, then fill the unit; the commit's erase fails
        let mut writer = MtdWriter::open(dev).unwrap();
        writer.put_bytes(&pattern(100)).unwrap();
        let err = writer.put_bytes(&pattern(3996)).unwrap_err();
        assert_eq!(err, Error::EraseFailed);

        // Fail-fast, no rollback: position already ran ahead of the
        // failed commit
        assert_eq!(writer.position(), 4096);
    }

    #[test]
    fn program_failure_is_surfaced_verbatim() {
        let mut dev = MemDevice::new_default();
        dev.fail_next_program();

        let mut writer = MtdWriter::open(dev).unwrap();
        let err = writer.put_bytes(&pattern(2 * 4096)).unwrap_err();
        assert_eq!(err, Error::ProgramFailed);
    }

    #[test]
    fn put_byte_is_a_one_byte_write() {
        let mut writer = buffered_writer();
        writer.put_byte(0x42).unwrap();
        writer.put_byte(0x43).unwrap();
        writer.flush().unwrap();

        let dev = writer.into_device();
        assert_eq!(&dev.data()[..2], &[0x42, 0x43]);
        assert!(dev.data()[2..4096].iter().all(|&b| b == 0));
    }

    #[test]
    fn byte_program_rejected_without_capability() {
        let mut dev = MemDevice::new_default();
        assert_eq!(dev.byte_program(0, &[1]), Err(Error::NotSupported));
    }
}
