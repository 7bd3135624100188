//! Runtime configuration for the reliable datagram layer.
//!
//! A small `serde`-derived struct with a hand-written `Default` impl,
//! carrying the RDP timing and baud-profile knobs.

use crate::rdp::framing::BaudProfile;
use serde::{Deserialize, Serialize};

/// Configuration for the reliable datagram transfer layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RudpConfig {
    /// Per-packet retransmission timeout, in milliseconds.
    pub tx_timeout_ms: u32,
    /// How long a receiver waits for the next expected packet before
    /// giving up on the whole transfer, in milliseconds.
    pub rx_timeout_ms: u32,
    /// How many times the transmitter retries the handshake or a RACK
    /// round before surrendering the transfer as a timeout.
    pub tx_retries: u8,
    /// Modulation/bandwidth profile in effect for this transfer.
    pub baud_profile: BaudProfile,
}

impl Default for RudpConfig {
    fn default() -> Self {
        Self {
            tx_timeout_ms: 100,
            rx_timeout_ms: 3000,
            tx_retries: 5,
            baud_profile: BaudProfile::Baud57600,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_driver() {
        let cfg = RudpConfig::default();
        assert_eq!(cfg.tx_timeout_ms, 100);
        assert_eq!(cfg.rx_timeout_ms, 3000);
        assert_eq!(cfg.tx_retries, 5);
    }

    #[test]
    fn config_round_trips_through_json() {
        let cfg = RudpConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: RudpConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.tx_timeout_ms, cfg.tx_timeout_ms);
    }
}
