//! IRQ flag sets for `REG_IRQFLAGS1`/`REG_IRQFLAGS2`.
//!
//! Two disjoint bit sets, each masking into one specific status register.
//! Mixing them is a type error by construction.

use bitflags::bitflags;
use crate::registers;

bitflags! {
    /// Flags in `REG_IRQFLAGS1`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct IrqFlags1: u8 {
        const SYNC_ADDRESS_MATCH = registers::IRQFLAGS1_SYNC_ADDRESS_MATCH;
        const AUTO_MODE          = registers::IRQFLAGS1_AUTO_MODE;
        const TIMEOUT            = registers::IRQFLAGS1_TIMEOUT;
        const RSSI               = registers::IRQFLAGS1_RSSI;
        const PLL_LOCK           = registers::IRQFLAGS1_PLL_LOCK;
        const TX_READY           = registers::IRQFLAGS1_TX_READY;
        const RX_READY           = registers::IRQFLAGS1_RX_READY;
        const MODE_READY         = registers::IRQFLAGS1_MODE_READY;
    }
}

bitflags! {
    /// Flags in `REG_IRQFLAGS2`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct IrqFlags2: u8 {
        const LOW_BAT       = registers::IRQFLAGS2_LOW_BAT;
        const CRC_OK        = registers::IRQFLAGS2_CRC_OK;
        const PAYLOAD_READY = registers::IRQFLAGS2_PAYLOAD_READY;
        const PACKET_SENT   = registers::IRQFLAGS2_PACKET_SENT;
        const FIFO_OVERRUN  = registers::IRQFLAGS2_FIFO_OVERRUN;
        const FIFO_LEVEL    = registers::IRQFLAGS2_FIFO_LEVEL;
        const FIFO_NOT_EMPTY = registers::IRQFLAGS2_FIFO_NOT_EMPTY;
        const FIFO_FULL     = registers::IRQFLAGS2_FIFO_FULL;
    }
}
