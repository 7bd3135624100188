//! Packet header layout, flag bits, sequence-numbering constants, and the
//! baud profile table.
//!
//! Grounded on `rfm69_pico_rudp.h`'s `enum HEADER`/`enum FLAG`/
//! `baud_settings_t`, translated from the C "index into a fixed-size
//! array" idiom into a closed Rust struct/enum pair.

use bitflags::bitflags;

/// Bytes on the wire before the payload.
pub const HEADER_SIZE: usize = 5;
/// `HEADER_SIZE` minus the length byte, which doesn't count itself.
pub const HEADER_EFFECTIVE_SIZE: u8 = 4;
/// `FIFO_SIZE (66) - HEADER_SIZE (5) - 1` (the length byte again).
pub const PAYLOAD_MAX: usize = 60;
/// A session's starting sequence number is drawn uniformly from `[0, SEQ_NUM_RAND_LIMIT)`.
pub const SEQ_NUM_RAND_LIMIT: u8 = 25;
/// `256 - SEQ_NUM_RAND_LIMIT - 1`: the most data packets one session can carry.
pub const TX_PACKETS_MAX: usize = 256 - SEQ_NUM_RAND_LIMIT as usize - 1;

bitflags! {
    /// The flag byte's five defined bits.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct HeaderFlags: u8 {
        const RBT  = 0x80;
        const DATA = 0x40;
        const ACK  = 0x20;
        const RACK = 0x10;
        const OK   = 0x08;
    }
}

/// The 5-byte prefix every packet on the wire carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// Count of bytes that follow this field (2..65).
    pub packet_size: u8,
    pub rx_address: u8,
    pub tx_address: u8,
    pub flags: HeaderFlags,
    pub seq_number: u8,
}

impl PacketHeader {
    pub fn to_bytes(self) -> [u8; HEADER_SIZE] {
        [
            self.packet_size,
            self.rx_address,
            self.tx_address,
            self.flags.bits(),
            self.seq_number,
        ]
    }

    pub fn from_bytes(bytes: [u8; HEADER_SIZE]) -> Self {
        PacketHeader {
            packet_size: bytes[0],
            rx_address: bytes[1],
            tx_address: bytes[2],
            flags: HeaderFlags::from_bits_truncate(bytes[3]),
            seq_number: bytes[4],
        }
    }
}

/// One entry of the baud lookup table: the register settings a given
/// throughput profile maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaudSettings {
    pub fdev_hz: u32,
    pub bitrate: u16,
    pub per_packet_delay_us: u32,
    pub rxbw_mantissa: u8,
    pub rxbw_exponent: u8,
}

/// The baud profiles this crate ships. Only one entry is populated (the
/// reference driver's own `BAUD_SETTINGS_LOOKUP` table carries exactly
/// one row), but adding a profile here is a one-line match arm, not a
/// structural change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BaudProfile {
    Baud57600,
}

impl BaudProfile {
    pub fn settings(self) -> BaudSettings {
        match self {
            BaudProfile::Baud57600 => BaudSettings {
                fdev_hz: 70_000,
                bitrate: 57_600,
                per_packet_delay_us: 12_000,
                // RFM69_RXBW_MANTISSA_20 (mantissa value 1, pre-shifted
                // into its register field) at exponent 2.
                rxbw_mantissa: 0x08,
                rxbw_exponent: 2,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips_through_bytes() {
        let header = PacketHeader {
            packet_size: 9,
            rx_address: 0x10,
            tx_address: 0x20,
            flags: HeaderFlags::DATA,
            seq_number: 7,
        };
        assert_eq!(PacketHeader::from_bytes(header.to_bytes()), header);
    }

    #[test]
    fn tx_packets_max_is_230() {
        assert_eq!(TX_PACKETS_MAX, 230);
    }

    #[test]
    fn unknown_flag_bits_are_truncated_not_rejected() {
        let header = PacketHeader::from_bytes([4, 0, 0, 0xFF, 0]);
        assert!(header.flags.contains(HeaderFlags::RBT | HeaderFlags::OK));
    }
}
