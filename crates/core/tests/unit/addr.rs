//! Address mapping unit tests.
//!
//! Verifies bit-field decode/encode round trips, channel routing, and
//! mapping-string validation.

use dramulator_core::common::{Address, AddressMapper, ConfigError};
use proptest::prelude::*;

use crate::common::harness::ddr4_config;

// ══════════════════════════════════════════════════════════
// 1. Decode / encode round trip
// ══════════════════════════════════════════════════════════

#[test]
fn encode_then_decode_is_identity() {
    let config = ddr4_config();
    let mapper = AddressMapper::new(&config).unwrap();
    let addr = Address::new(0, 1, 1, 0, 0x2A5, 7);
    let hex = mapper.encode(&addr);
    assert_eq!(mapper.decode(hex), addr);
}

#[test]
fn zero_address_decodes_to_origin() {
    let config = ddr4_config();
    let mapper = AddressMapper::new(&config).unwrap();
    assert_eq!(mapper.decode(0), Address::default());
}

#[test]
fn burst_offset_bits_are_discarded() {
    let config = ddr4_config();
    let mapper = AddressMapper::new(&config).unwrap();
    let addr = Address::new(0, 1, 0, 1, 99, 3);
    let hex = mapper.encode(&addr);
    // Anything inside the burst offset maps to the same decoded address.
    let offset_mask = (1u64 << config.shift_bits) - 1;
    assert_eq!(mapper.decode(hex | offset_mask), addr);
}

proptest! {
    #[test]
    fn round_trip_any_in_range_address(
        rank in 0usize..2,
        bankgroup in 0usize..2,
        bank in 0usize..2,
        row in 0u64..(1 << 14),
        column in 0u64..(1 << 5),
    ) {
        let config = ddr4_config();
        let mapper = AddressMapper::new(&config).unwrap();
        let addr = Address::new(0, rank, bankgroup, bank, row, column);
        prop_assert_eq!(mapper.decode(mapper.encode(&addr)), addr);
    }
}

// ══════════════════════════════════════════════════════════
// 2. Channel routing
// ══════════════════════════════════════════════════════════

#[test]
fn channel_of_matches_decode() {
    let mut config = ddr4_config();
    config.system.channels = 4;
    config.finalize().unwrap();
    let mapper = AddressMapper::new(&config).unwrap();
    for channel in 0..4 {
        let addr = Address::new(channel, 0, 0, 0, 5, 1);
        let hex = mapper.encode(&addr);
        assert_eq!(mapper.channel_of(hex), channel);
        assert_eq!(mapper.decode(hex).channel, channel);
    }
}

// ══════════════════════════════════════════════════════════
// 3. Mapping-string validation
// ══════════════════════════════════════════════════════════

#[test]
fn mapping_must_be_twelve_characters() {
    let mut config = ddr4_config();
    config.system.address_mapping = "chroba".to_string();
    assert!(matches!(
        AddressMapper::new(&config),
        Err(ConfigError::MalformedAddressMapping(_))
    ));
}

#[test]
fn unknown_field_token_is_rejected() {
    let mut config = ddr4_config();
    config.system.address_mapping = "chrobabgraxx".to_string();
    assert!(matches!(
        AddressMapper::new(&config),
        Err(ConfigError::UnknownAddressField(token)) if token == "xx"
    ));
}

#[test]
fn duplicate_field_token_is_rejected() {
    let mut config = ddr4_config();
    config.system.address_mapping = "chchrobabgra".to_string();
    assert!(matches!(
        AddressMapper::new(&config),
        Err(ConfigError::DuplicateAddressField(token)) if token == "ch"
    ));
}

#[test]
fn all_permutation_orders_round_trip() {
    for mapping in ["rorababgchco", "chrobabgraco", "robarabgchco"] {
        let mut config = ddr4_config();
        config.system.address_mapping = mapping.to_string();
        let mapper = AddressMapper::new(&config).unwrap();
        let addr = Address::new(0, 1, 1, 1, 1234, 9);
        assert_eq!(mapper.decode(mapper.encode(&addr)), addr, "mapping {mapping}");
    }
}
