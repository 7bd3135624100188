//! Register-level behavior of the radio control layer against the
//! in-memory `MockBus`: read/write/masked round trips, the mode-set FSM,
//! power-level clamping, and frequency/deviation arithmetic parity.

use rfm69_rdp::bus::MockBus;
use rfm69_rdp::error::RadioError;
use rfm69_rdp::radio::context::RadioContext;
use rfm69_rdp::radio::mode::OperatingMode;
use rfm69_rdp::radio::pa::PowerModuleClass;
use rfm69_rdp::registers;

fn radio(class: PowerModuleClass) -> RadioContext<MockBus> {
    RadioContext::new(MockBus::new(), class).expect("construction against a healthy MockBus")
}

#[test]
fn construction_probes_version_register() {
    let mut bus = MockBus::new();
    bus.poke_register(registers::REG_VERSION, 0xFF);
    let err = RadioContext::new(bus, PowerModuleClass::LowPower).unwrap_err();
    assert_eq!(err, RadioError::RegisterTestFail);
}

#[test]
fn write_read_round_trip_on_a_plain_register() {
    let mut radio = radio(PowerModuleClass::LowPower);
    radio.write(registers::REG_NODEADRS, &[0x7A]).unwrap();
    let mut out = [0u8; 1];
    radio.read(registers::REG_NODEADRS, &mut out).unwrap();
    assert_eq!(out[0], 0x7A);
}

#[test]
fn masked_write_only_touches_masked_bits() {
    let mut radio = radio(PowerModuleClass::LowPower);
    radio.write(registers::REG_PACKETCONFIG1, &[0b1010_1010]).unwrap();
    radio
        .write_masked(registers::REG_PACKETCONFIG1, 0b0000_0000, registers::DCFREE_MASK)
        .unwrap();
    let value = radio.read_masked(registers::REG_PACKETCONFIG1, 0xFF).unwrap();
    assert_eq!(value, 0b1010_1010 & !registers::DCFREE_MASK);
}

#[test]
fn mode_set_is_idempotent_beyond_the_first_call() {
    let mut radio = radio(PowerModuleClass::LowPower);
    radio.mode_set(OperatingMode::Receive).unwrap();
    assert_eq!(radio.mode(), OperatingMode::Receive);
    // second call must not error and must leave the cached mode alone
    radio.mode_set(OperatingMode::Receive).unwrap();
    assert_eq!(radio.mode(), OperatingMode::Receive);
}

#[test]
fn mode_set_slaves_high_power_pa_path_on_tx_entry() {
    let mut radio = radio(PowerModuleClass::HighPower);
    radio.power_level_set(20).unwrap();
    radio.mode_set(OperatingMode::Transmit).unwrap();
    assert_eq!(radio.mode(), OperatingMode::Transmit);
    radio.mode_set(OperatingMode::Receive).unwrap();
    assert_eq!(radio.mode(), OperatingMode::Receive);
}

#[test]
fn power_level_clamps_to_the_module_classs_legal_range() {
    let mut low = radio(PowerModuleClass::LowPower);
    low.power_level_set(-100).unwrap();
    assert_eq!(low.power_level(), Some(registers::PA_LOW_MIN));
    low.power_level_set(100).unwrap();
    assert_eq!(low.power_level(), Some(registers::PA_LOW_MAX));

    let mut high = radio(PowerModuleClass::HighPower);
    high.power_level_set(-100).unwrap();
    assert_eq!(high.power_level(), Some(registers::PA_HIGH_MIN));
    high.power_level_set(100).unwrap();
    assert_eq!(high.power_level(), Some(registers::PA_HIGH_MAX));
}

#[test]
fn frequency_round_trips_preserve_chip_formula_parity() {
    let mut radio = radio(PowerModuleClass::LowPower);
    for freq in [433_000_000u32, 868_300_000, 915_000_000] {
        radio.set_frequency(freq).unwrap();
        let got = radio.frequency().unwrap();
        // Fstep quantizes to ~61 Hz steps; round trip must land within one step.
        assert!((got as i64 - freq as i64).abs() <= 61, "freq {freq} -> {got}");
    }
}

#[test]
fn bitrate_round_trips_exactly() {
    let mut radio = radio(PowerModuleClass::LowPower);
    radio.set_bitrate(57_600).unwrap();
    assert_eq!(radio.bitrate().unwrap(), 57_600);
}

#[test]
fn rssi_busy_surfaces_as_an_error_not_a_panic() {
    let mut radio = radio(PowerModuleClass::LowPower);
    radio
        .write(registers::REG_RSSICONFIG, &[registers::RSSI_BUSY_BIT])
        .unwrap();
    let err = radio.rssi_measurement().unwrap_err();
    assert_eq!(err, RadioError::RssiBusy);
}
