//! The radio control layer's core: typed bus primitives, chip-select
//! discipline, the initialization sequence, the mode-set state machine,
//! frequency/deviation arithmetic, and the power-level policy.
//!
//! Generic over an injected bus, with `&mut self` methods returning
//! `Result<_, RadioError>`, mode-set and power-level control flow taken
//! from the RP2040 reference driver.

use crate::bus::BusAdapter;
use crate::error::RadioError;
use crate::logging::log_debug;
use crate::radio::format::{
    AddressFilter, DagcSetting, DataMode, DcFreeSetting, PacketFormat, TxStartCondition,
};
use crate::radio::irq::{IrqFlags1, IrqFlags2};
use crate::radio::mode::OperatingMode;
use crate::radio::pa::{PaMode, PowerModuleClass};
use crate::registers;

/// Owns the bus handle and a cache of last-written mode, power level, PA
/// mode, OCP trim, node address, and the most recent operation status.
///
/// Invariant: the cached mode equals the chip's `OpMode` register after
/// any successful `mode_set`. The cache exists to skip redundant writes
/// and to answer "get current" queries without a bus round-trip.
pub struct RadioContext<B: BusAdapter> {
    bus: B,
    module_class: PowerModuleClass,
    mode: OperatingMode,
    pa_level: Option<i8>,
    pa_mode: PaMode,
    ocp_trim: u8,
    node_address: u8,
    last_status: Option<RadioError>,
}

impl<B: BusAdapter> RadioContext<B> {
    /// Probes the version register and programs the sane defaults the
    /// reference driver applies at startup. The chip's reset pulse is a
    /// host responsibility performed before this call; this core has no
    /// reset-pin primitive to issue it with.
    pub fn new(bus: B, module_class: PowerModuleClass) -> Result<Self, RadioError> {
        let mut ctx = RadioContext {
            bus,
            module_class,
            mode: OperatingMode::default(),
            pa_level: None,
            pa_mode: PaMode::Pa0,
            ocp_trim: registers::OCP_TRIM_DEFAULT,
            node_address: 0,
            last_status: None,
        };

        let mut version = [0u8; 1];
        ctx.read(registers::REG_VERSION, &mut version)?;
        if version[0] == 0x00 || version[0] == 0xFF {
            ctx.last_status = Some(RadioError::RegisterTestFail);
            return Err(RadioError::RegisterTestFail);
        }

        ctx.data_mode_set(DataMode::Packet)?;
        // Per the reference driver: leaving this off produces erratic
        // receive behavior.
        ctx.dagc_set(DagcSetting::ImprovedMarginLowBeta0)?;
        ctx.power_level_set(13)?;
        ctx.rssi_threshold_set(0xE4)?;
        ctx.tx_start_condition_set(TxStartCondition::FifoNotEmpty)?;
        ctx.broadcast_address_set(0xFF)?;
        ctx.address_filter_set(AddressFilter::NodeAndBroadcast)?;
        ctx.sync_value_set(&[0x01, 0x01, 0x01])?;

        log_debug("radio context initialized");
        Ok(ctx)
    }

    /// The status of the most recently completed bus operation.
    pub fn last_status(&self) -> Option<RadioError> {
        self.last_status
    }

    // -- Typed bus primitives ------------------------------------------------

    /// Burst write. Sets the high bit of the address byte, clocks it out,
    /// then clocks `bytes` out in one contiguous CS-bracketed transaction.
    pub fn write(&mut self, addr: u8, bytes: &[u8]) -> Result<(), RadioError> {
        self.bus.cs_assert();
        let mut n = self.bus.transfer_write(&[addr | 0x80]).unwrap_or(0);
        n += self.bus.transfer_write(bytes).unwrap_or(0);
        self.bus.cs_deassert();
        self.finish(n, bytes.len() + 1)
    }

    /// Burst read. Clears the high bit, clocks the address out, then clocks
    /// `out.len()` bytes in.
    pub fn read(&mut self, addr: u8, out: &mut [u8]) -> Result<(), RadioError> {
        self.bus.cs_assert();
        let addr_n = self.bus.transfer_write(&[addr & 0x7F]).unwrap_or(0);
        let data_n = self.bus.transfer_read(out).unwrap_or(0);
        self.bus.cs_deassert();
        self.finish(addr_n + data_n, out.len() + 1)
    }

    /// Read-modify-write of a single byte: `reg = (reg & !mask) | (value & mask)`.
    pub fn write_masked(&mut self, addr: u8, value: u8, mask: u8) -> Result<(), RadioError> {
        let mut reg = [0u8; 1];
        self.read(addr, &mut reg)?;
        reg[0] = (reg[0] & !mask) | (value & mask);
        self.write(addr, &reg)
    }

    /// Reads one byte and returns it masked.
    pub fn read_masked(&mut self, addr: u8, mask: u8) -> Result<u8, RadioError> {
        let mut reg = [0u8; 1];
        self.read(addr, &mut reg)?;
        Ok(reg[0] & mask)
    }

    fn finish(&mut self, actual: usize, expected: usize) -> Result<(), RadioError> {
        if actual != expected {
            self.last_status = Some(RadioError::BusUnexpectedReturn);
            return Err(RadioError::BusUnexpectedReturn);
        }
        self.last_status = None;
        Ok(())
    }

    // -- Clock passthrough -----------------------------------------------------

    /// A monotonic instant from the underlying bus adapter's clock.
    pub fn now(&self) -> std::time::Instant {
        self.bus.now()
    }

    /// A monotonic instant `duration` past `self.now()`.
    pub fn deadline(&self, duration: std::time::Duration) -> std::time::Instant {
        self.bus.deadline(duration)
    }

    pub fn sleep_us(&mut self, us: u32) {
        self.bus.sleep_us(us)
    }

    // -- FIFO ----------------------------------------------------------------

    pub fn fifo_write(&mut self, bytes: &[u8]) -> Result<(), RadioError> {
        self.write(registers::REG_FIFO, bytes)
    }

    pub fn fifo_read(&mut self, out: &mut [u8]) -> Result<(), RadioError> {
        self.read(registers::REG_FIFO, out)
    }

    // -- IRQ flags -------------------------------------------------------------

    pub fn irq1(&mut self, flag: IrqFlags1) -> Result<bool, RadioError> {
        Ok(self.read_masked(registers::REG_IRQFLAGS1, flag.bits())? != 0)
    }

    pub fn irq2(&mut self, flag: IrqFlags2) -> Result<bool, RadioError> {
        Ok(self.read_masked(registers::REG_IRQFLAGS2, flag.bits())? != 0)
    }

    /// Spin-polls `IRQFLAGS2::PACKET_SENT` until set, propagating any bus
    /// error encountered along the way.
    pub fn wait_packet_sent(&mut self) -> Result<(), RadioError> {
        while !self.irq2(IrqFlags2::PACKET_SENT)? {}
        Ok(())
    }

    /// Reports whether a packet is ready to be read from the FIFO, without
    /// blocking.
    pub fn payload_ready(&mut self) -> Result<bool, RadioError> {
        self.irq2(IrqFlags2::PAYLOAD_READY)
    }

    // -- Mode-set state machine -----------------------------------------------

    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    /// Target = current is a no-op. Otherwise: slave the high-power PA
    /// path to the transition, write the new mode bits, spin until
    /// `ModeReady`, then update the cache. A bus error at any step leaves
    /// the cache unchanged.
    pub fn mode_set(&mut self, mode: OperatingMode) -> Result<(), RadioError> {
        if self.mode == mode {
            self.last_status = None;
            return Ok(());
        }

        let high_power = self.pa_level.map(|level| level >= 17).unwrap_or(false);
        if mode == OperatingMode::Transmit && high_power {
            self.set_high_power_path(true)?;
        } else if mode == OperatingMode::Receive && high_power {
            self.set_high_power_path(false)?;
        }

        self.write_masked(registers::REG_OPMODE, mode.bits(), registers::OPMODE_MASK)?;

        while !self.irq1(IrqFlags1::MODE_READY)? {}

        self.mode = mode;
        Ok(())
    }

    // -- Frequency / deviation -------------------------------------------------

    /// `N = (freq_hz / Fstep) + 0.5`, split into three big-endian bytes.
    pub fn set_frequency(&mut self, freq_hz: u32) -> Result<(), RadioError> {
        let n = (freq_hz as f64 / registers::FSTEP + 0.5) as u32;
        let bytes = [(n >> 16) as u8, (n >> 8) as u8, n as u8];
        self.write(registers::REG_FRFMSB, &bytes)
    }

    /// Reads back the register-computed frequency in Hz. Preserves exact
    /// round-trip parity with the chip's own formula.
    pub fn frequency(&mut self) -> Result<u32, RadioError> {
        let mut buf = [0u8; 3];
        self.read(registers::REG_FRFMSB, &mut buf)?;
        let n = ((buf[0] as u32) << 16) | ((buf[1] as u32) << 8) | buf[2] as u32;
        Ok((n as f64 * registers::FSTEP) as u32)
    }

    pub fn set_deviation(&mut self, fdev_hz: u32) -> Result<(), RadioError> {
        let n = (fdev_hz as f64 / registers::FSTEP + 0.5) as u32;
        let bytes = [((n >> 8) as u8) & registers::FDEV_MSB_MASK, n as u8];
        self.write(registers::REG_FDEVMSB, &bytes)
    }

    pub fn set_rxbw(&mut self, mantissa: u8, exponent: u8) -> Result<(), RadioError> {
        let mask = registers::RXBW_EXPONENT_MASK | registers::RXBW_MANTISSA_MASK;
        let value = (exponent & registers::RXBW_EXPONENT_MASK) | (mantissa & registers::RXBW_MANTISSA_MASK);
        self.write_masked(registers::REG_RXBW, value, mask)
    }

    pub fn set_bitrate(&mut self, bitrate: u16) -> Result<(), RadioError> {
        let bytes = [(bitrate >> 8) as u8, bitrate as u8];
        self.write(registers::REG_BITRATEMSB, &bytes)
    }

    pub fn bitrate(&mut self) -> Result<u16, RadioError> {
        let mut buf = [0u8; 2];
        self.read(registers::REG_BITRATEMSB, &mut buf)?;
        Ok(((buf[0] as u16) << 8) | buf[1] as u16)
    }

    // -- Power level policy ------------------------------------------------------

    pub fn power_level(&self) -> Option<i8> {
        self.pa_level
    }

    /// Clamps `level` into the module class's legal range, maps it to a
    /// `(PaMode, Pout)` pair, and writes both. Bus errors surface; any
    /// clamped value is still a success.
    pub fn power_level_set(&mut self, level: i8) -> Result<(), RadioError> {
        if self.pa_level == Some(level) {
            self.last_status = None;
            return Ok(());
        }

        let clamped = self.module_class.clamp(level);
        let (pa_mode, pout) = self.module_class.map(clamped);

        self.power_mode_set(pa_mode)?;
        self.write_masked(registers::REG_PALEVEL, pout as u8, registers::PA_OUTPUT_MASK)?;

        self.pa_level = Some(clamped);
        Ok(())
    }

    fn power_mode_set(&mut self, pa_mode: PaMode) -> Result<(), RadioError> {
        if self.pa_mode == pa_mode {
            self.last_status = None;
            return Ok(());
        }
        self.write_masked(registers::REG_PALEVEL, pa_mode.pins(), registers::PA_PINS_MASK)?;
        self.set_high_power_path(pa_mode == PaMode::HighPower)?;
        self.pa_mode = pa_mode;
        Ok(())
    }

    /// Writes TestPa1/TestPa2 to their "high" magic values with OCP
    /// disabled and trim at max when engaging the high-power path, or to
    /// the "low" values with OCP re-enabled otherwise.
    fn set_high_power_path(&mut self, enable: bool) -> Result<(), RadioError> {
        let (pa1, pa2, ocp_enabled, trim) = if enable {
            (registers::TESTPA1_HIGH, registers::TESTPA2_HIGH, false, registers::OCP_TRIM_HIGH)
        } else {
            (registers::TESTPA1_LOW, registers::TESTPA2_LOW, true, self.ocp_trim)
        };

        self.write(registers::REG_TESTPA1, &[pa1])?;
        self.write(registers::REG_TESTPA2, &[pa2])?;
        let ocp_bits = if ocp_enabled { registers::OCP_ENABLE_MASK } else { 0 };
        self.write_masked(registers::REG_OCP, ocp_bits, registers::OCP_ENABLE_MASK)?;
        self.write_masked(registers::REG_OCP, trim, registers::OCP_TRIM_MASK)
    }

    // -- RSSI -----------------------------------------------------------------

    pub fn rssi_threshold_set(&mut self, threshold: u8) -> Result<(), RadioError> {
        self.write(registers::REG_RSSITHRESH, &[threshold])
    }

    pub fn rssi_measurement_start(&mut self) -> Result<(), RadioError> {
        let mut reg = [0u8; 1];
        self.read(registers::REG_RSSICONFIG, &mut reg)?;
        reg[0] |= registers::RSSI_START_BIT;
        self.write(registers::REG_RSSICONFIG, &reg)
    }

    pub fn rssi_measurement(&mut self) -> Result<i16, RadioError> {
        let mut cfg = [0u8; 1];
        self.read(registers::REG_RSSICONFIG, &mut cfg)?;
        if cfg[0] & registers::RSSI_BUSY_BIT != 0 {
            self.last_status = Some(RadioError::RssiBusy);
            return Err(RadioError::RssiBusy);
        }
        let mut val = [0u8; 1];
        self.read(registers::REG_RSSIVALUE, &mut val)?;
        Ok(-((val[0] >> 1) as i16))
    }

    // -- Addressing / packet engine --------------------------------------------

    pub fn node_address_set(&mut self, address: u8) -> Result<(), RadioError> {
        self.write(registers::REG_NODEADRS, &[address])?;
        self.node_address = address;
        Ok(())
    }

    pub fn node_address(&self) -> u8 {
        self.node_address
    }

    pub fn broadcast_address_set(&mut self, address: u8) -> Result<(), RadioError> {
        self.write(registers::REG_BROADCASTADRS, &[address])
    }

    /// Writes the sync word, then the size field (size-1, shifted into its
    /// bit field).
    pub fn sync_value_set(&mut self, value: &[u8]) -> Result<(), RadioError> {
        self.write(registers::REG_SYNCVALUE1, value)?;
        let size_bits = ((value.len() as u8 - 1) << registers::SYNC_SIZE_OFFSET) & registers::SYNC_SIZE_MASK;
        self.write_masked(registers::REG_SYNCCONFIG, size_bits, registers::SYNC_SIZE_MASK)
    }

    pub fn data_mode_set(&mut self, mode: DataMode) -> Result<(), RadioError> {
        self.write_masked(registers::REG_DATAMODUL, mode.bits(), registers::DATA_MODE_MASK)
    }

    pub fn tx_start_condition_set(&mut self, condition: TxStartCondition) -> Result<(), RadioError> {
        self.write_masked(registers::REG_FIFOTHRESH, condition.bits(), registers::TX_START_CONDITION_MASK)
    }

    pub fn payload_length_set(&mut self, length: u8) -> Result<(), RadioError> {
        self.write(registers::REG_PAYLOADLENGTH, &[length])
    }

    pub fn packet_format_set(&mut self, format: PacketFormat) -> Result<(), RadioError> {
        self.write_masked(registers::REG_PACKETCONFIG1, format.bits(), registers::PACKET_FORMAT_MASK)
    }

    pub fn address_filter_set(&mut self, filter: AddressFilter) -> Result<(), RadioError> {
        self.write_masked(registers::REG_PACKETCONFIG1, filter.bits(), registers::ADDRESS_FILTER_MASK)
    }

    pub fn dcfree_set(&mut self, setting: DcFreeSetting) -> Result<(), RadioError> {
        self.write_masked(registers::REG_PACKETCONFIG1, setting.bits(), registers::DCFREE_MASK)
    }

    /// Written directly, not masked. The reference driver never relies on
    /// `REG_TESTDAGC`'s other bits.
    pub fn dagc_set(&mut self, setting: DagcSetting) -> Result<(), RadioError> {
        self.write(registers::REG_TESTDAGC, &[setting.byte()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::MockBus;

    fn ctx() -> RadioContext<MockBus> {
        RadioContext::new(MockBus::new(), PowerModuleClass::LowPower).unwrap()
    }

    #[test]
    fn construction_fails_on_implausible_version() {
        let mut bus = MockBus::new();
        bus.poke_register(registers::REG_VERSION, 0x00);
        let err = RadioContext::new(bus, PowerModuleClass::LowPower).unwrap_err();
        assert_eq!(err, RadioError::RegisterTestFail);
    }

    #[test]
    fn register_write_read_round_trip() {
        let mut ctx = ctx();
        ctx.write(registers::REG_NODEADRS, &[0x2A]).unwrap();
        let mut out = [0u8; 1];
        ctx.read(registers::REG_NODEADRS, &mut out).unwrap();
        assert_eq!(out[0], 0x2A);
    }

    #[test]
    fn masked_write_preserves_other_bits() {
        let mut ctx = ctx();
        ctx.write(registers::REG_PACKETCONFIG1, &[0xFF]).unwrap();
        ctx.write_masked(registers::REG_PACKETCONFIG1, 0x00, registers::PACKET_FORMAT_MASK)
            .unwrap();
        let mut out = [0u8; 1];
        ctx.read(registers::REG_PACKETCONFIG1, &mut out).unwrap();
        assert_eq!(out[0], 0xFF & !registers::PACKET_FORMAT_MASK);
    }

    #[test]
    fn mode_set_is_idempotent_on_repeat() {
        let mut ctx = ctx();
        ctx.mode_set(OperatingMode::Standby).unwrap();
        assert_eq!(ctx.mode(), OperatingMode::Standby);
        ctx.mode_set(OperatingMode::Standby).unwrap();
        assert_eq!(ctx.mode(), OperatingMode::Standby);
    }

    #[test]
    fn mode_set_transitions_and_updates_cache() {
        let mut ctx = ctx();
        ctx.mode_set(OperatingMode::Transmit).unwrap();
        assert_eq!(ctx.mode(), OperatingMode::Transmit);
    }

    #[test]
    fn power_level_clamps_and_caches_boundary() {
        let mut ctx = ctx();
        ctx.power_level_set(100).unwrap();
        assert_eq!(ctx.power_level(), Some(registers::PA_LOW_MAX));
    }

    #[test]
    fn frequency_round_trips_through_chip_formula() {
        let mut ctx = ctx();
        ctx.set_frequency(868_950_000).unwrap();
        let got = ctx.frequency().unwrap();
        assert!((got as i64 - 868_950_000i64).abs() < 100);
    }
}
