//! The receive path: handshake reply, bulk accumulation with a missing-
//! sequence bitmap, and the terminal RACK|OK emission.
//!
//! Grounded line-for-line on `rfm69_rp2040_rudp.c::rfm69_rudp_receive`.

use std::time::Duration;

use crate::bus::BusAdapter;
use crate::error::RudpReturn;
use crate::radio::mode::OperatingMode;
use crate::rdp::context::RdpContext;
use crate::rdp::framing::{HeaderFlags, PacketHeader, HEADER_EFFECTIVE_SIZE, HEADER_SIZE, PAYLOAD_MAX};
use crate::rdp::report::TransferReport;

impl<'r, B: BusAdapter> RdpContext<'r, B> {
    /// Receives one session into `buffer`, returning the same status
    /// recorded in [`RdpContext::report`].
    ///
    /// A stale RBT arriving mid-bulk-receive restarts the handshake wait
    /// without resetting the overall session deadline, matching the
    /// reference driver's `RESTART_RBT_LOOP` label.
    pub fn receive(&mut self, buffer: &mut [u8]) -> RudpReturn {
        self.report = TransferReport::default();
        self.report.return_status = RudpReturn::Timeout;
        self.report.rx_address = self.radio.node_address();

        let previous_mode = self.radio.mode();
        let per_packet_delay_us = self.config.baud_profile.settings().per_packet_delay_us;
        let session_deadline = self
            .radio
            .deadline(Duration::from_millis(self.config.rx_timeout_ms as u64));

        loop {
            let handshake = match self.wait_for_handshake(session_deadline) {
                Some(h) => h,
                None => return self.finish(previous_mode, RudpReturn::Timeout),
            };

            match self.run_bulk_receive(buffer, handshake, session_deadline, per_packet_delay_us) {
                BulkOutcome::Done => return self.finish(previous_mode, RudpReturn::Ok),
                BulkOutcome::RestartHandshake => continue,
                BulkOutcome::BufferOverflow => {
                    return self.finish(previous_mode, RudpReturn::BufferOverflow)
                }
                BulkOutcome::SessionTimeout => return self.finish(previous_mode, RudpReturn::Timeout),
            }
        }
    }

    fn finish(&mut self, previous_mode: OperatingMode, status: RudpReturn) -> RudpReturn {
        self.report.return_status = status;
        let _ = self.radio.mode_set(previous_mode);
        status
    }

    /// Polls for an RBT, discarding anything else, until `session_deadline`.
    fn wait_for_handshake(&mut self, session_deadline: std::time::Instant) -> Option<Handshake> {
        loop {
            if self.radio.now() >= session_deadline {
                return None;
            }
            if self.radio.mode_set(OperatingMode::Receive).is_err() {
                return None;
            }
            match self.radio.payload_ready() {
                Ok(true) => {}
                Ok(false) => {
                    self.radio.sleep_us(1);
                    continue;
                }
                Err(_) => return None,
            }
            if self.radio.mode_set(OperatingMode::Standby).is_err() {
                return None;
            }

            let mut header_bytes = [0u8; HEADER_SIZE];
            if self.radio.fifo_read(&mut header_bytes).is_err() {
                return None;
            }
            let header = PacketHeader::from_bytes(header_bytes);

            if !header.flags.contains(HeaderFlags::RBT) {
                let remainder = header.packet_size.saturating_sub(HEADER_EFFECTIVE_SIZE) as usize;
                let mut discard = vec![0u8; remainder];
                if !discard.is_empty() && self.radio.fifo_read(&mut discard).is_err() {
                    return None;
                }
                continue;
            }

            self.report.rbt_received += 1;

            let mut size_bytes = [0u8; 4];
            if self.radio.fifo_read(&mut size_bytes).is_err() {
                return None;
            }
            let payload_size = u32::from_be_bytes(size_bytes);
            let tx_address = header.tx_address;
            let seq = header.seq_number.wrapping_add(1);

            let rx_address = self.report.rx_address;
            let ack = PacketHeader {
                packet_size: HEADER_EFFECTIVE_SIZE,
                rx_address: tx_address,
                tx_address: rx_address,
                flags: HeaderFlags::RBT | HeaderFlags::ACK,
                seq_number: seq,
            };
            if self.write_packet(&ack, &[]).is_err() {
                return None;
            }
            self.report.payload_size = payload_size;
            self.report.tx_address = tx_address;
            self.report.acks_sent += 1;

            return Some(Handshake {
                tx_address,
                payload_size,
                seq,
            });
        }
    }

    fn run_bulk_receive(
        &mut self,
        buffer: &mut [u8],
        handshake: Handshake,
        session_deadline: std::time::Instant,
        per_packet_delay_us: u32,
    ) -> BulkOutcome {
        let Handshake {
            tx_address,
            payload_size,
            seq: seq_after_ack,
        } = handshake;

        let num_packets_expected = div_ceil(payload_size as usize, PAYLOAD_MAX);
        let seq_max = seq_after_ack.wrapping_add(num_packets_expected as u8);
        let seq = seq_after_ack.wrapping_add(1);

        let mut received = vec![false; num_packets_expected];
        let mut missing = num_packets_expected;
        let mut bytes_received: usize = 0;

        let mut rack_deadline = self
            .radio
            .deadline(Duration::from_micros(per_packet_delay_us as u64 * missing as u64));

        while missing > 0 {
            if self.radio.now() >= session_deadline {
                return BulkOutcome::SessionTimeout;
            }

            if self.radio.now() >= rack_deadline {
                if self.send_rack(tx_address, seq, seq_max, &received, missing).is_err() {
                    return BulkOutcome::SessionTimeout;
                }
                rack_deadline = self
                    .radio
                    .deadline(Duration::from_micros(per_packet_delay_us as u64 * missing as u64));
                self.report.racks_sent += 1;
            }

            if self.radio.mode_set(OperatingMode::Receive).is_err() {
                return BulkOutcome::SessionTimeout;
            }
            match self.radio.payload_ready() {
                Ok(true) => {}
                Ok(false) => {
                    self.radio.sleep_us(1);
                    continue;
                }
                Err(_) => return BulkOutcome::SessionTimeout,
            }

            let mut header_bytes = [0u8; HEADER_SIZE];
            if self.radio.fifo_read(&mut header_bytes).is_err() {
                return BulkOutcome::SessionTimeout;
            }
            let header = PacketHeader::from_bytes(header_bytes);
            let message_size = header.packet_size.saturating_sub(HEADER_EFFECTIVE_SIZE) as usize;
            let mut payload = vec![0u8; message_size];
            if !payload.is_empty() && self.radio.fifo_read(&mut payload).is_err() {
                return BulkOutcome::SessionTimeout;
            }

            if header.tx_address != tx_address {
                continue;
            }
            if header.flags.contains(HeaderFlags::RBT) {
                return BulkOutcome::RestartHandshake;
            }
            if !header.flags.contains(HeaderFlags::DATA) {
                continue;
            }
            let packet_num = header.seq_number;
            if packet_num < seq || packet_num > seq_max {
                continue;
            }

            if header.flags.contains(HeaderFlags::RACK) && packet_num == seq {
                self.report.rack_requests_received += 1;
                rack_deadline = self.radio.now();
                continue;
            }

            let index = packet_num.wrapping_sub(seq) as usize;
            if received[index] {
                continue;
            }

            let offset = PAYLOAD_MAX * index;
            if offset + payload.len() > buffer.len() {
                return BulkOutcome::BufferOverflow;
            }

            received[index] = true;
            missing -= 1;

            bytes_received += message_size;
            self.report.data_packets_received += 1;
            self.report.bytes_received = bytes_received as u32;

            buffer[offset..offset + payload.len()].copy_from_slice(&payload);
        }

        if self.radio.mode_set(OperatingMode::Standby).is_err() {
            return BulkOutcome::SessionTimeout;
        }
        let ok_header = PacketHeader {
            packet_size: HEADER_EFFECTIVE_SIZE,
            rx_address: tx_address,
            tx_address: self.report.rx_address,
            flags: HeaderFlags::RACK | HeaderFlags::OK,
            seq_number: seq_max,
        };
        if self.write_packet(&ok_header, &[]).is_err() {
            return BulkOutcome::SessionTimeout;
        }
        BulkOutcome::Done
    }

    fn send_rack(
        &mut self,
        tx_address: u8,
        seq: u8,
        seq_max: u8,
        received: &[bool],
        missing: usize,
    ) -> Result<(), crate::error::RadioError> {
        self.radio.mode_set(OperatingMode::Standby)?;
        let k = missing.min(PAYLOAD_MAX);
        let header = PacketHeader {
            packet_size: HEADER_EFFECTIVE_SIZE + k as u8,
            rx_address: tx_address,
            tx_address: self.report.rx_address,
            flags: HeaderFlags::RACK,
            seq_number: seq_max,
        };
        let missing_seqs: Vec<u8> = received
            .iter()
            .enumerate()
            .filter(|(_, &got)| !got)
            .take(k)
            .map(|(i, _)| seq.wrapping_add(i as u8))
            .collect();
        self.write_packet(&header, &missing_seqs)
    }

    fn write_packet(&mut self, header: &PacketHeader, payload: &[u8]) -> Result<(), crate::error::RadioError> {
        self.radio.fifo_write(&header.to_bytes())?;
        if !payload.is_empty() {
            self.radio.fifo_write(payload)?;
        }
        self.radio.mode_set(OperatingMode::Transmit)?;
        self.radio.wait_packet_sent()
    }
}

struct Handshake {
    tx_address: u8,
    payload_size: u32,
    seq: u8,
}

enum BulkOutcome {
    Done,
    RestartHandshake,
    BufferOverflow,
    SessionTimeout,
}

fn div_ceil(n: usize, d: usize) -> usize {
    (n + d - 1) / d
}
