//! The transmit path: three-way handshake, bulk fragment transmit, and
//! the RACK retransmission loop.
//!
//! Grounded line-for-line on `rfm69_rp2040_rudp.c::rfm69_rudp_transmit`
//! plus its private `_rudp_rx_ack`/`_rudp_rx_rack` helpers.

use std::time::Duration;

use rand::Rng;

use crate::bus::BusAdapter;
use crate::error::RudpReturn;
use crate::radio::mode::OperatingMode;
use crate::rdp::context::RdpContext;
use crate::rdp::framing::{
    HeaderFlags, PacketHeader, HEADER_EFFECTIVE_SIZE, HEADER_SIZE, PAYLOAD_MAX, SEQ_NUM_RAND_LIMIT,
    TX_PACKETS_MAX,
};
use crate::rdp::report::TransferReport;

impl<'r, B: BusAdapter> RdpContext<'r, B> {
    /// Sends `payload` to `address`. Returns the same status recorded in
    /// [`RdpContext::report`].
    pub fn transmit(&mut self, address: u8, payload: &[u8]) -> RudpReturn {
        self.report = TransferReport::default();
        self.report.return_status = RudpReturn::Timeout;

        let previous_mode = self.radio.mode();
        let tx_address = self.radio.node_address();
        self.report.tx_address = tx_address;
        self.report.rx_address = address;
        self.report.payload_size = payload.len() as u32;

        if self.radio.mode_set(OperatingMode::Standby).is_err() {
            return self.finish(previous_mode, RudpReturn::Timeout);
        }

        let num_packets = div_ceil(payload.len(), PAYLOAD_MAX);
        if num_packets > TX_PACKETS_MAX {
            self.report.return_status = RudpReturn::PayloadOverflow;
            return RudpReturn::PayloadOverflow;
        }

        let seq = rand::thread_rng().gen_range(0..SEQ_NUM_RAND_LIMIT);
        let timeout_ms = self.config.tx_timeout_ms;
        let retries = self.config.tx_retries;

        if !self.run_handshake(address, tx_address, seq, payload.len() as u32, timeout_ms, retries) {
            return self.finish(previous_mode, RudpReturn::Timeout);
        }

        let data_base = seq.wrapping_add(2);
        let seq_max = data_base.wrapping_add((num_packets as u8).wrapping_sub(1));

        if self
            .send_bulk(address, tx_address, data_base, payload)
            .is_err()
        {
            return self.finish(previous_mode, RudpReturn::Timeout);
        }

        let is_ok = self.run_rack_loop(address, tx_address, data_base, seq_max, payload, timeout_ms, retries);

        let status = if is_ok { RudpReturn::Ok } else { RudpReturn::OkUnconfirmed };
        self.finish(previous_mode, status)
    }

    fn finish(&mut self, previous_mode: OperatingMode, status: RudpReturn) -> RudpReturn {
        self.report.return_status = status;
        let _ = self.radio.mode_set(previous_mode);
        status
    }

    /// Up to `retries + 1` RBT attempts with jittered exponential backoff.
    /// Returns whether an ACK/RBT reply with `seq + 1` arrived in time.
    fn run_handshake(
        &mut self,
        address: u8,
        tx_address: u8,
        seq: u8,
        payload_size: u32,
        timeout_ms: u32,
        retries: u8,
    ) -> bool {
        let size_bytes = payload_size.to_be_bytes();

        for attempt in 0..=retries {
            if self.radio.mode_set(OperatingMode::Standby).is_err() {
                return false;
            }

            let header = PacketHeader {
                packet_size: HEADER_EFFECTIVE_SIZE + size_bytes.len() as u8,
                rx_address: address,
                tx_address,
                flags: HeaderFlags::RBT,
                seq_number: seq,
            };
            if self.write_packet(&header, &size_bytes).is_err() {
                return false;
            }
            self.report.rbt_sent += 1;

            let jitter_ms = rand::thread_rng().gen_range(0..100);
            let next_timeout = timeout_ms + (attempt as u32 * timeout_ms) + jitter_ms;

            if self.wait_for_ack(seq.wrapping_add(1), next_timeout) {
                self.report.acks_received += 1;
                return true;
            }
        }
        false
    }

    fn send_bulk(
        &mut self,
        address: u8,
        tx_address: u8,
        data_base: u8,
        payload: &[u8],
    ) -> Result<(), crate::error::RadioError> {
        let num_packets = div_ceil(payload.len(), PAYLOAD_MAX);
        for i in 0..num_packets {
            let slice = slice_for(payload, i);
            self.radio.mode_set(OperatingMode::Standby)?;
            let header = PacketHeader {
                packet_size: HEADER_EFFECTIVE_SIZE + slice.len() as u8,
                rx_address: address,
                tx_address,
                flags: HeaderFlags::DATA,
                seq_number: data_base.wrapping_add(i as u8),
            };
            self.write_packet(&header, slice)?;
            self.report.bytes_sent += slice.len() as u32;
            self.report.data_packets_sent += 1;
        }
        Ok(())
    }

    /// Repeats until the receiver signals OK or the retry budget is
    /// exhausted. Returns whether the final RACK carried the OK flag.
    ///
    /// Each round of this loop, timeout or a real RACK reception alike,
    /// spends one retry, matching the reference driver's
    /// `while (retries) { retries--; ... }` bound on the whole RACK phase.
    fn run_rack_loop(
        &mut self,
        address: u8,
        tx_address: u8,
        data_base: u8,
        seq_max: u8,
        payload: &[u8],
        timeout_ms: u32,
        retries: u8,
    ) -> bool {
        let mut retries_left = retries;
        while retries_left > 0 {
            retries_left -= 1;

            let (header, missing) = match self.wait_for_rack(seq_max, timeout_ms) {
                Some(packet) => packet,
                None => {
                    if self
                        .send_rack_request(address, tx_address, data_base)
                        .is_err()
                    {
                        return false;
                    }
                    self.report.rack_requests_sent += 1;
                    continue;
                }
            };
            if header.flags.contains(HeaderFlags::OK) {
                return true;
            }

            self.report.racks_received += 1;
            for packet_num in missing {
                let index = packet_num.wrapping_sub(data_base) as usize;
                let slice = slice_for(payload, index);
                if self.radio.mode_set(OperatingMode::Standby).is_err() {
                    return false;
                }
                let header = PacketHeader {
                    packet_size: HEADER_EFFECTIVE_SIZE + slice.len() as u8,
                    rx_address: address,
                    tx_address,
                    flags: HeaderFlags::DATA,
                    seq_number: packet_num,
                };
                if self.write_packet(&header, slice).is_err() {
                    return false;
                }
                self.report.data_packets_retransmitted += 1;
                self.report.data_packets_sent += 1;
            }
        }
        false
    }

    fn send_rack_request(
        &mut self,
        address: u8,
        tx_address: u8,
        data_base: u8,
    ) -> Result<(), crate::error::RadioError> {
        self.radio.mode_set(OperatingMode::Standby)?;
        let header = PacketHeader {
            packet_size: HEADER_EFFECTIVE_SIZE,
            rx_address: address,
            tx_address,
            flags: HeaderFlags::DATA | HeaderFlags::RACK,
            seq_number: data_base,
        };
        self.write_packet(&header, &[])
    }

    fn write_packet(&mut self, header: &PacketHeader, payload: &[u8]) -> Result<(), crate::error::RadioError> {
        self.radio.fifo_write(&header.to_bytes())?;
        if !payload.is_empty() {
            self.radio.fifo_write(payload)?;
        }
        self.radio.mode_set(OperatingMode::Transmit)?;
        self.radio.wait_packet_sent()
    }

    fn wait_for_ack(&mut self, expect_seq: u8, timeout_ms: u32) -> bool {
        if self.radio.mode_set(OperatingMode::Receive).is_err() {
            return false;
        }
        let deadline = self.radio.deadline(Duration::from_millis(timeout_ms as u64));
        loop {
            if self.radio.now() > deadline {
                return false;
            }
            match self.radio.payload_ready() {
                Ok(true) => {}
                Ok(false) => continue,
                Err(_) => return false,
            }
            let mut header_bytes = [0u8; HEADER_SIZE];
            if self.radio.fifo_read(&mut header_bytes).is_err() {
                return false;
            }
            let header = PacketHeader::from_bytes(header_bytes);
            let is_ack = header.flags.intersects(HeaderFlags::ACK | HeaderFlags::RBT);
            if is_ack && header.seq_number == expect_seq {
                return true;
            }
        }
    }

    /// Waits for a RACK packet with sequence `expect_seq`, returning its
    /// header and the missing-sequence-number payload it carries.
    fn wait_for_rack(&mut self, expect_seq: u8, timeout_ms: u32) -> Option<(PacketHeader, Vec<u8>)> {
        if self.radio.mode_set(OperatingMode::Receive).is_err() {
            return None;
        }
        let deadline = self.radio.deadline(Duration::from_millis(timeout_ms as u64));
        loop {
            if self.radio.now() > deadline {
                return None;
            }
            match self.radio.payload_ready() {
                Ok(true) => {}
                Ok(false) => continue,
                Err(_) => return None,
            }
            let mut header_bytes = [0u8; HEADER_SIZE];
            if self.radio.fifo_read(&mut header_bytes).is_err() {
                return None;
            }
            let header = PacketHeader::from_bytes(header_bytes);
            let message_size = header.packet_size.saturating_sub(HEADER_EFFECTIVE_SIZE) as usize;
            let mut payload = vec![0u8; message_size];
            if !payload.is_empty() && self.radio.fifo_read(&mut payload).is_err() {
                return None;
            }
            if !header.flags.contains(HeaderFlags::RACK) || header.seq_number != expect_seq {
                continue;
            }
            return Some((header, payload));
        }
    }
}

fn div_ceil(n: usize, d: usize) -> usize {
    (n + d - 1) / d
}

fn slice_for(payload: &[u8], index: usize) -> &[u8] {
    let start = index * PAYLOAD_MAX;
    let end = (start + PAYLOAD_MAX).min(payload.len());
    &payload[start..end]
}
