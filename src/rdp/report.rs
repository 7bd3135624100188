//! The per-transfer accounting struct.

use crate::error::RudpReturn;

/// Counters and outcome for one transmit or receive call.
///
/// Cleared at the start of every transfer; its lifetime equals the
/// owning [`crate::rdp::context::RdpContext`]. Grounded on
/// `rfm69_pico_rudp.h`'s `TrxReport`, with both counter sets the source's
/// two `rudp_context_t` shapes disagreed on (`rbt_sent`/`rbt_received`)
/// included per the resolved Open Question.
#[derive(Debug, Clone, Default)]
pub struct TransferReport {
    pub payload_size: u32,
    pub bytes_sent: u32,
    pub bytes_received: u32,
    pub data_packets_sent: u32,
    pub data_packets_received: u32,
    pub data_packets_retransmitted: u32,
    pub rbt_sent: u32,
    pub rbt_received: u32,
    pub acks_sent: u32,
    pub acks_received: u32,
    pub racks_sent: u32,
    pub racks_received: u32,
    pub rack_requests_sent: u32,
    pub rack_requests_received: u32,
    pub return_status: RudpReturn,
    pub tx_address: u8,
    pub rx_address: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_report_defaults_to_timeout() {
        assert_eq!(TransferReport::default().return_status, RudpReturn::Timeout);
    }
}
