//! # Radio control layer (RCL)
//!
//! A register-level driver for an RFM69-class transceiver: typed bus
//! primitives, chip-select discipline, the mode-set state machine,
//! frequency/deviation arithmetic, and the power-amplifier policy.

pub mod context;
pub mod format;
pub mod irq;
pub mod mode;
pub mod pa;

pub use context::RadioContext;
pub use format::{
    AddressFilter, DagcSetting, DataMode, DcFreeSetting, ModulationShaping, ModulationType,
    PacketFormat, TxStartCondition,
};
pub use irq::{IrqFlags1, IrqFlags2};
pub use mode::OperatingMode;
pub use pa::{PaMode, PowerModuleClass};
