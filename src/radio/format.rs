//! Closed enumerations for the packet-engine and modulation fields the
//! initialization sequence and RDP framing program. Bit-field writes go
//! through [`crate::radio::context::RadioContext`]'s masked-write
//! primitive; these types exist so the public API never takes a raw byte.

use crate::registers;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataMode {
    Packet,
    Continuous,
}

impl DataMode {
    pub(crate) fn bits(self) -> u8 {
        match self {
            DataMode::Packet => registers::DATA_MODE_PACKET,
            DataMode::Continuous => registers::DATA_MODE_CONTINUOUS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModulationType {
    Fsk,
    Ook,
}

impl ModulationType {
    pub(crate) fn bits(self) -> u8 {
        match self {
            ModulationType::Fsk => registers::MODULATION_TYPE_FSK,
            ModulationType::Ook => registers::MODULATION_TYPE_OOK,
        }
    }
}

/// Gaussian/Raised-cosine shaping selector; encoding is modulation-type
/// dependent on the real chip. Carried here only as an opaque bit pattern
/// since RDP framing never changes it from its reset value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModulationShaping(pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketFormat {
    Fixed,
    Variable,
}

impl PacketFormat {
    pub(crate) fn bits(self) -> u8 {
        match self {
            PacketFormat::Fixed => registers::PACKET_FORMAT_FIXED,
            PacketFormat::Variable => registers::PACKET_FORMAT_VARIABLE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFilter {
    None,
    Node,
    NodeAndBroadcast,
}

impl AddressFilter {
    pub(crate) fn bits(self) -> u8 {
        match self {
            AddressFilter::None => registers::ADDRESS_FILTER_NONE,
            AddressFilter::Node => registers::ADDRESS_FILTER_NODE,
            AddressFilter::NodeAndBroadcast => registers::ADDRESS_FILTER_NODE_BROADCAST,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DcFreeSetting {
    None,
    Manchester,
    Whitening,
}

impl DcFreeSetting {
    pub(crate) fn bits(self) -> u8 {
        match self {
            DcFreeSetting::None => registers::DCFREE_NONE,
            DcFreeSetting::Manchester => registers::DCFREE_MANCHESTER,
            DcFreeSetting::Whitening => registers::DCFREE_WHITENING,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStartCondition {
    FifoNotEmpty,
    FifoLevel,
}

impl TxStartCondition {
    pub(crate) fn bits(self) -> u8 {
        match self {
            TxStartCondition::FifoNotEmpty => registers::TX_START_CONDITION_FIFO_NOT_EMPTY,
            TxStartCondition::FifoLevel => registers::TX_START_CONDITION_FIFO_LEVEL,
        }
    }
}

/// `REG_TESTDAGC` is written directly (not masked). Its reset value is
/// never relied on elsewhere, so the whole byte is this setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DagcSetting {
    Normal,
    ImprovedMarginLowBeta0,
    ImprovedMarginLowBeta1,
}

impl DagcSetting {
    pub(crate) fn byte(self) -> u8 {
        match self {
            DagcSetting::Normal => 0x00,
            DagcSetting::ImprovedMarginLowBeta0 => 0x20,
            DagcSetting::ImprovedMarginLowBeta1 => 0x30,
        }
    }
}
