//! # Error taxonomies
//!
//! Two closed enumerations: [`RadioError`] for failures the radio control
//! layer surfaces as `Result::Err`, and [`RudpReturn`] for protocol-level
//! outcomes recorded in a [`crate::rdp::report::TransferReport`], never an
//! error type, since the protocol treats none of its outcomes as fatal to
//! the context.

use thiserror::Error;

/// Failures surfaced by the radio control layer.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// The version register probe during initialization returned 0x00 or
    /// 0xFF instead of a plausible chip ID.
    #[error("version register probe failed")]
    RegisterTestFail,

    /// A bus transfer returned a byte count other than the expected
    /// `1 + len` (address byte plus payload).
    #[error("bus transfer returned an unexpected byte count")]
    BusUnexpectedReturn,

    /// An RSSI reading was requested while a prior measurement was still
    /// in flight.
    #[error("RSSI measurement already in progress")]
    RssiBusy,
}

/// Outcomes of a transmit or receive call, recorded in the transfer report.
///
/// Deliberately not an `Error`: every variant here is a legitimate result
/// of a call, not a reason to treat the context as broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RudpReturn {
    /// Full delivery, acknowledged by the peer.
    Ok,
    /// Data was sent but no final acknowledgment arrived.
    OkUnconfirmed,
    /// The handshake or session deadline was exceeded.
    Timeout,
    /// The receiver's buffer is smaller than the announced payload size.
    BufferOverflow,
    /// The sender's payload would exceed the 230-packet session limit.
    PayloadOverflow,
}

impl Default for RudpReturn {
    /// Every transmit/receive call clears its report with a pessimistic
    /// default before attempting any I/O.
    fn default() -> Self {
        RudpReturn::Timeout
    }
}
