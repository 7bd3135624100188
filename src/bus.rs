//! # Bus adapter
//!
//! The one interface the radio control layer consumes from the host
//! platform: a half-duplex byte transfer plus chip-select gating, and a
//! monotonic clock. Modeled as a small capability set and injected at
//! construction, so the core is testable with an in-memory fake.

use std::time::{Duration, Instant};
use thiserror::Error;

/// A transport-level failure from the underlying bus (SPI or equivalent).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("bus transfer failed")]
pub struct BusFailure;

/// Half-duplex byte transfer plus chip-select gating and a monotonic clock.
///
/// `transfer_write`/`transfer_read` report the number of bytes actually
/// clocked; the radio control layer treats a short count as a
/// [`crate::error::RadioError::BusUnexpectedReturn`], so an adapter should
/// only return `Err(BusFailure)` for a transport fault that prevented any
/// clocking at all.
pub trait BusAdapter {
    /// Clocks all of `bytes` out, returning the number actually clocked.
    fn transfer_write(&mut self, bytes: &[u8]) -> Result<usize, BusFailure>;

    /// Clocks `out.len()` dummy bytes out while sampling `out.len()` bytes
    /// in, returning the number actually clocked.
    fn transfer_read(&mut self, out: &mut [u8]) -> Result<usize, BusFailure>;

    /// Asserts chip-select. Idempotent.
    fn cs_assert(&mut self);

    /// De-asserts chip-select. Idempotent.
    fn cs_deassert(&mut self);

    fn sleep_us(&mut self, us: u32);
    fn sleep_ms(&mut self, ms: u32);

    /// A monotonic instant, used to compute and check deadlines.
    fn now(&self) -> Instant;

    /// A monotonic instant `duration` past `self.now()`.
    fn deadline(&self, duration: Duration) -> Instant {
        self.now() + duration
    }
}

/// In-memory fake implementing [`BusAdapter`] over a register file and a
/// FIFO, for unit and integration tests.
///
/// Construction seeds a plausible chip version (`0x24`) and leaves
/// `IRQFLAGS1::MODE_READY`/`IRQFLAGS2::PACKET_SENT` asserted so that spins
/// in [`crate::radio::context::RadioContext`] and the RDP layer terminate
/// immediately unless a test clears them to model a busy chip.
#[cfg(any(test, feature = "test-util"))]
pub struct MockBus {
    registers: [u8; 0x80],
    fifo: std::collections::VecDeque<u8>,
    cs_asserted: bool,
    /// Address last latched by a bus transaction's address phase.
    addr_latch: Option<u8>,
}

#[cfg(any(test, feature = "test-util"))]
impl MockBus {
    pub fn new() -> Self {
        let mut registers = [0u8; 0x80];
        registers[crate::registers::REG_VERSION as usize] = 0x24;
        registers[crate::registers::REG_IRQFLAGS1 as usize] = crate::registers::IRQFLAGS1_MODE_READY;
        registers[crate::registers::REG_IRQFLAGS2 as usize] = crate::registers::IRQFLAGS2_PACKET_SENT;
        MockBus {
            registers,
            fifo: std::collections::VecDeque::new(),
            cs_asserted: false,
            addr_latch: None,
        }
    }

    /// Directly pokes a register, bypassing the write path. Used to set
    /// up fault-injection scenarios (e.g. a stuck busy flag).
    pub fn poke_register(&mut self, addr: u8, value: u8) {
        self.registers[addr as usize] = value;
    }

    pub fn peek_register(&self, addr: u8) -> u8 {
        self.registers[addr as usize]
    }

    /// Pushes bytes directly into the simulated receive FIFO, modeling a
    /// peer's transmission landing in this chip's FIFO.
    pub fn push_fifo(&mut self, bytes: &[u8]) {
        self.fifo.extend(bytes.iter().copied());
    }

    /// Drains everything written into the FIFO by the device under test,
    /// modeling this chip's transmission reaching a peer.
    pub fn drain_fifo(&mut self) -> Vec<u8> {
        self.fifo.drain(..).collect()
    }

    pub fn fifo_is_empty(&self) -> bool {
        self.fifo.is_empty()
    }
}

#[cfg(any(test, feature = "test-util"))]
impl Default for MockBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-util"))]
impl BusAdapter for MockBus {
    fn transfer_write(&mut self, bytes: &[u8]) -> Result<usize, BusFailure> {
        if !self.cs_asserted {
            return Err(BusFailure);
        }
        if self.addr_latch.is_none() {
            let (first, rest) = bytes.split_first().ok_or(BusFailure)?;
            let addr = first & 0x7F;
            self.addr_latch = Some(addr);
            let mut written = 1;
            written += self.write_payload(addr, rest);
            return Ok(written);
        }
        let addr = self.addr_latch.unwrap();
        Ok(self.write_payload(addr, bytes))
    }

    fn transfer_read(&mut self, out: &mut [u8]) -> Result<usize, BusFailure> {
        if !self.cs_asserted {
            return Err(BusFailure);
        }
        let addr = self.addr_latch.ok_or(BusFailure)?;
        if addr == crate::registers::REG_FIFO {
            for slot in out.iter_mut() {
                *slot = self.fifo.pop_front().unwrap_or(0);
            }
        } else {
            for (i, slot) in out.iter_mut().enumerate() {
                *slot = self.registers[(addr as usize + i).min(0x7F)];
            }
        }
        Ok(out.len())
    }

    fn cs_assert(&mut self) {
        self.cs_asserted = true;
        self.addr_latch = None;
    }

    fn cs_deassert(&mut self) {
        self.cs_asserted = false;
        self.addr_latch = None;
    }

    fn sleep_us(&mut self, _us: u32) {}

    fn sleep_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(ms as u64));
    }

    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[cfg(any(test, feature = "test-util"))]
impl MockBus {
    fn write_payload(&mut self, addr: u8, bytes: &[u8]) -> usize {
        if addr == crate::registers::REG_FIFO {
            self.fifo.extend(bytes.iter().copied());
        } else {
            for (i, b) in bytes.iter().enumerate() {
                let slot = (addr as usize + i).min(0x7F);
                self.registers[slot] = *b;
            }
        }
        bytes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_register_round_trips() {
        let mut bus = MockBus::new();
        bus.cs_assert();
        bus.transfer_write(&[0x39 | 0x80, 0x42]).unwrap();
        bus.cs_deassert();

        bus.cs_assert();
        bus.transfer_write(&[0x39]).unwrap();
        let mut out = [0u8; 1];
        bus.transfer_read(&mut out).unwrap();
        bus.cs_deassert();

        assert_eq!(out[0], 0x42);
    }

    #[test]
    fn fifo_write_then_drain() {
        let mut bus = MockBus::new();
        bus.cs_assert();
        bus.transfer_write(&[0x00 | 0x80]).unwrap();
        bus.transfer_write(&[1, 2, 3]).unwrap();
        bus.cs_deassert();

        assert_eq!(bus.drain_fifo(), vec![1, 2, 3]);
    }

    #[test]
    fn transfer_without_cs_fails() {
        let mut bus = MockBus::new();
        assert!(bus.transfer_write(&[0x00]).is_err());
    }
}
