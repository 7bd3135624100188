//! # RFM69 Register Definitions and Constants
//!
//! Register addresses, operating-mode bit patterns, IRQ flag masks, and the
//! PA/OCP magic values the radio control layer programs during
//! initialization and power-level changes. Values come from the RFM69
//! datasheet register map, cross-checked against the RP2040 reference
//! driver this crate's control flow is grounded on.

// =============================================================================
// Register addresses
// =============================================================================

pub const REG_FIFO: u8 = 0x00;
pub const REG_OPMODE: u8 = 0x01;
pub const REG_DATAMODUL: u8 = 0x02;
pub const REG_BITRATEMSB: u8 = 0x03;
pub const REG_BITRATELSB: u8 = 0x04;
pub const REG_FDEVMSB: u8 = 0x05;
pub const REG_FDEVLSB: u8 = 0x06;
pub const REG_FRFMSB: u8 = 0x07;
pub const REG_FRFMID: u8 = 0x08;
pub const REG_FRFLSB: u8 = 0x09;
pub const REG_VERSION: u8 = 0x10;
pub const REG_PALEVEL: u8 = 0x11;
pub const REG_PARAMP: u8 = 0x12;
pub const REG_OCP: u8 = 0x13;
pub const REG_LNA: u8 = 0x18;
pub const REG_RXBW: u8 = 0x19;
pub const REG_AFCBW: u8 = 0x1A;
pub const REG_RSSICONFIG: u8 = 0x23;
pub const REG_RSSIVALUE: u8 = 0x24;
pub const REG_IRQFLAGS1: u8 = 0x27;
pub const REG_IRQFLAGS2: u8 = 0x28;
pub const REG_RSSITHRESH: u8 = 0x29;
pub const REG_SYNCCONFIG: u8 = 0x2E;
pub const REG_SYNCVALUE1: u8 = 0x2F;
pub const REG_PACKETCONFIG1: u8 = 0x37;
pub const REG_PAYLOADLENGTH: u8 = 0x38;
pub const REG_NODEADRS: u8 = 0x39;
pub const REG_BROADCASTADRS: u8 = 0x3A;
pub const REG_FIFOTHRESH: u8 = 0x3C;
pub const REG_PACKETCONFIG2: u8 = 0x3D;
pub const REG_TESTPA1: u8 = 0x5A;
pub const REG_TESTPA2: u8 = 0x5C;
pub const REG_TESTDAGC: u8 = 0x6F;

// =============================================================================
// Operating mode (REG_OPMODE bits 4:2)
// =============================================================================

pub const OPMODE_MASK: u8 = 0x1C;
pub const RF_OPMODE_SLEEP: u8 = 0x00;
pub const RF_OPMODE_STANDBY: u8 = 0x04;
pub const RF_OPMODE_SYNTHESIZER: u8 = 0x08;
pub const RF_OPMODE_TRANSMITTER: u8 = 0x0C;
pub const RF_OPMODE_RECEIVER: u8 = 0x10;

// =============================================================================
// Frequency / deviation arithmetic
// =============================================================================

/// Fstep, in Hz: `Frf = Fstep * N`.
pub const FSTEP: f64 = 61.03515625;
pub const FDEV_MSB_MASK: u8 = 0x3F;

// =============================================================================
// RX bandwidth (REG_RXBW)
// =============================================================================

pub const RXBW_EXPONENT_MASK: u8 = 0x07;
pub const RXBW_MANTISSA_MASK: u8 = 0x18;

// =============================================================================
// Data modulation (REG_DATAMODUL)
// =============================================================================

pub const DATA_MODE_MASK: u8 = 0x60;
pub const DATA_MODE_PACKET: u8 = 0x00;
pub const DATA_MODE_CONTINUOUS: u8 = 0x40;

pub const MODULATION_TYPE_MASK: u8 = 0x18;
pub const MODULATION_TYPE_FSK: u8 = 0x00;
pub const MODULATION_TYPE_OOK: u8 = 0x08;

pub const MODULATION_SHAPING_MASK: u8 = 0x03;

// =============================================================================
// PA / power-level policy
// =============================================================================

pub const PA0_ON: u8 = 0x80;
pub const PA1_ON: u8 = 0x40;
pub const PA2_ON: u8 = 0x20;
pub const PA_PINS_MASK: u8 = 0xE0;
pub const PA_OUTPUT_MASK: u8 = 0x1F;

pub const PA_LOW_MIN: i8 = -18;
pub const PA_LOW_MAX: i8 = 13;
pub const PA_HIGH_MIN: i8 = -2;
pub const PA_HIGH_MAX: i8 = 20;

/// TestPa1/TestPa2 magic values, engaged while the high-power PA path is on.
pub const TESTPA1_HIGH: u8 = 0x5D;
pub const TESTPA1_LOW: u8 = 0x55;
pub const TESTPA2_HIGH: u8 = 0x7C;
pub const TESTPA2_LOW: u8 = 0x70;

pub const OCP_ENABLE_MASK: u8 = 0x10;
pub const OCP_TRIM_MASK: u8 = 0x0F;
pub const OCP_TRIM_HIGH: u8 = 0x0F;
pub const OCP_TRIM_DEFAULT: u8 = 0x0A;

// =============================================================================
// RSSI (REG_RSSICONFIG / REG_RSSIVALUE)
// =============================================================================

pub const RSSI_START_BIT: u8 = 0x01;
pub const RSSI_BUSY_BIT: u8 = 0x02;

// =============================================================================
// Packet engine (REG_PACKETCONFIG1/2, REG_FIFOTHRESH, REG_SYNCCONFIG)
// =============================================================================

pub const PACKET_FORMAT_MASK: u8 = 0x80;
pub const PACKET_FORMAT_FIXED: u8 = 0x00;
pub const PACKET_FORMAT_VARIABLE: u8 = 0x80;

pub const DCFREE_MASK: u8 = 0x60;
pub const DCFREE_NONE: u8 = 0x00;
pub const DCFREE_MANCHESTER: u8 = 0x20;
pub const DCFREE_WHITENING: u8 = 0x40;

pub const ADDRESS_FILTER_MASK: u8 = 0x06;
pub const ADDRESS_FILTER_NONE: u8 = 0x00;
pub const ADDRESS_FILTER_NODE: u8 = 0x02;
pub const ADDRESS_FILTER_NODE_BROADCAST: u8 = 0x04;

pub const TX_START_CONDITION_MASK: u8 = 0x80;
pub const TX_START_CONDITION_FIFO_NOT_EMPTY: u8 = 0x00;
pub const TX_START_CONDITION_FIFO_LEVEL: u8 = 0x80;

pub const SYNC_SIZE_OFFSET: u8 = 3;
pub const SYNC_SIZE_MASK: u8 = 0x38;

// =============================================================================
// IRQ flag masks (REG_IRQFLAGS1 / REG_IRQFLAGS2)
// =============================================================================

pub const IRQFLAGS1_SYNC_ADDRESS_MATCH: u8 = 0x01;
pub const IRQFLAGS1_AUTO_MODE: u8 = 0x02;
pub const IRQFLAGS1_TIMEOUT: u8 = 0x04;
pub const IRQFLAGS1_RSSI: u8 = 0x08;
pub const IRQFLAGS1_PLL_LOCK: u8 = 0x10;
pub const IRQFLAGS1_TX_READY: u8 = 0x20;
pub const IRQFLAGS1_RX_READY: u8 = 0x40;
pub const IRQFLAGS1_MODE_READY: u8 = 0x80;

pub const IRQFLAGS2_LOW_BAT: u8 = 0x01;
pub const IRQFLAGS2_CRC_OK: u8 = 0x02;
pub const IRQFLAGS2_PAYLOAD_READY: u8 = 0x04;
pub const IRQFLAGS2_PACKET_SENT: u8 = 0x08;
pub const IRQFLAGS2_FIFO_OVERRUN: u8 = 0x10;
pub const IRQFLAGS2_FIFO_LEVEL: u8 = 0x20;
pub const IRQFLAGS2_FIFO_NOT_EMPTY: u8 = 0x40;
pub const IRQFLAGS2_FIFO_FULL: u8 = 0x80;

// =============================================================================
// Misc
// =============================================================================

/// Hardware FIFO depth in bytes.
pub const FIFO_SIZE: usize = 66;
