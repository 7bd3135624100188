//! # rfm69-rdp
//!
//! A register-level driver for an RFM69-class sub-GHz FSK transceiver
//! (the radio control layer, [`radio`]) plus a stop-and-wait-with-
//! selective-repeat Reliable Datagram Protocol layered over its
//! variable-length packet mode ([`rdp`]).
//!
//! The crate consumes exactly one platform interface from its host: the
//! [`bus::BusAdapter`] trait, a half-duplex byte transfer plus
//! chip-select gating and a monotonic clock. Host pin/bus initialization,
//! the chip reset pulse, and any CLI/example harness are the caller's
//! responsibility.
//!
//! ## Usage
//!
//! ```no_run
//! use rfm69_rdp::bus::BusAdapter;
//! use rfm69_rdp::config::RudpConfig;
//! use rfm69_rdp::radio::context::RadioContext;
//! use rfm69_rdp::radio::pa::PowerModuleClass;
//! use rfm69_rdp::rdp::context::RdpContext;
//!
//! fn run(bus: impl BusAdapter) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut radio = RadioContext::new(bus, PowerModuleClass::LowPower)?;
//!     let mut rdp = RdpContext::new(&mut radio, RudpConfig::default());
//!     rdp.init()?;
//!     rdp.transmit(0x02, b"Hello, World!\n");
//!     Ok(())
//! }
//! ```

pub mod bus;
pub mod config;
pub mod error;
pub mod logging;
pub mod radio;
pub mod rdp;
pub mod registers;

pub use bus::BusAdapter;
pub use config::RudpConfig;
pub use error::{RadioError, RudpReturn};
pub use logging::init_logger;
pub use radio::context::RadioContext;
pub use rdp::{BaudProfile, PacketHeader, RdpContext, TransferReport};
