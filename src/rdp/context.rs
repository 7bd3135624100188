//! The RDP-layer handle: a borrowed radio context, the active
//! configuration, and the transfer report.
//!
//! Grounded on `rfm69_pico_rudp.h`'s `rudp_context_t` field set
//! (`rfm`, `tx_timeout`, `rx_timeout`, `tx_retries`, `baud`, `report`),
//! as a protocol-level struct borrowing a HAL-generic driver.

use crate::bus::BusAdapter;
use crate::config::RudpConfig;
use crate::error::RadioError;
use crate::radio::context::RadioContext;
use crate::radio::format::{DcFreeSetting, PacketFormat};
use crate::radio::mode::OperatingMode;
use crate::rdp::framing::{BaudProfile, PAYLOAD_MAX};
use crate::rdp::report::TransferReport;

/// Owns the radio for the duration of its borrow; never holds a
/// back-reference the other way. One `RdpContext` per in-flight transfer
/// (or a reused one across sequential transfers on the same radio).
pub struct RdpContext<'r, B: BusAdapter> {
    pub(crate) radio: &'r mut RadioContext<B>,
    pub(crate) config: RudpConfig,
    pub(crate) report: TransferReport,
}

impl<'r, B: BusAdapter> RdpContext<'r, B> {
    pub fn new(radio: &'r mut RadioContext<B>, config: RudpConfig) -> Self {
        RdpContext {
            radio,
            config,
            report: TransferReport::default(),
        }
    }

    pub fn report(&self) -> &TransferReport {
        &self.report
    }

    pub fn tx_timeout_ms(&self) -> u32 {
        self.config.tx_timeout_ms
    }

    pub fn set_tx_timeout_ms(&mut self, ms: u32) {
        self.config.tx_timeout_ms = ms;
    }

    pub fn rx_timeout_ms(&self) -> u32 {
        self.config.rx_timeout_ms
    }

    pub fn set_rx_timeout_ms(&mut self, ms: u32) {
        self.config.rx_timeout_ms = ms;
    }

    pub fn tx_retries(&self) -> u8 {
        self.config.tx_retries
    }

    pub fn set_tx_retries(&mut self, retries: u8) {
        self.config.tx_retries = retries;
    }

    pub fn baud_profile(&self) -> BaudProfile {
        self.config.baud_profile
    }

    /// Drives four chip writes (deviation, bitrate, RX bandwidth; the
    /// fourth, TX/RX sync settings, is fixed at initialization, not
    /// per-profile). If any write fails the context's recorded profile
    /// is left at its previous value.
    pub fn set_baud_profile(&mut self, profile: BaudProfile) -> Result<(), RadioError> {
        let settings = profile.settings();
        self.radio.set_deviation(settings.fdev_hz)?;
        self.radio.set_bitrate(settings.bitrate)?;
        self.radio.set_rxbw(settings.rxbw_mantissa, settings.rxbw_exponent)?;
        self.config.baud_profile = profile;
        Ok(())
    }

    /// The RDP-specific additions atop the radio control layer's base
    /// init sequence: whitening, variable-length packet format, the
    /// per-packet payload cap, and sleep mode between sessions.
    pub fn init(&mut self) -> Result<(), RadioError> {
        let settings = self.config.baud_profile.settings();
        self.radio.set_deviation(settings.fdev_hz)?;
        self.radio.set_bitrate(settings.bitrate)?;
        self.radio.set_rxbw(settings.rxbw_mantissa, settings.rxbw_exponent)?;
        self.radio.dcfree_set(DcFreeSetting::Whitening)?;
        self.radio.packet_format_set(PacketFormat::Variable)?;
        self.radio.payload_length_set(PAYLOAD_MAX as u8)?;
        self.radio.mode_set(OperatingMode::Sleep)
    }
}
