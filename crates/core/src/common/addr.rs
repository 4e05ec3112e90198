//! Decoded DRAM addresses and the physical-address bit-field mapper.
//!
//! This module defines the six-field address tuple used by every component of
//! the simulator and the mapper that extracts it from a 64-bit physical
//! address. It provides:
//! 1. **`Address`:** The (channel, rank, bankgroup, bank, row, column) tuple.
//! 2. **`AddressMapper`:** Bit-field decode/encode built from the configured
//!    mapping string (e.g. `"rorababgchco"`).
//!
//! The low `log2(transaction_bytes)` bits of a physical address are burst
//! offset and carry no field; the column field is shortened accordingly.

use crate::common::error::ConfigError;
use crate::config::Config;

/// A fully decoded DRAM address.
///
/// Rows and columns are kept as `u64` so row numbers compare directly against
/// the open-row register of a bank; the four structural coordinates index
/// into per-channel state arrays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Address {
    /// Channel index.
    pub channel: usize,
    /// Rank index within the channel.
    pub rank: usize,
    /// Bank-group index within the rank.
    pub bankgroup: usize,
    /// Bank index within the bank group.
    pub bank: usize,
    /// Row number within the bank.
    pub row: u64,
    /// Column number within the row (burst-granular).
    pub column: u64,
}

impl Address {
    /// Creates an address from its six fields.
    pub const fn new(
        channel: usize,
        rank: usize,
        bankgroup: usize,
        bank: usize,
        row: u64,
        column: u64,
    ) -> Self {
        Self {
            channel,
            rank,
            bankgroup,
            bank,
            row,
            column,
        }
    }
}

/// Order in which field positions are stored: ch, ra, bg, ba, ro, co.
const FIELD_TOKENS: [&str; 6] = ["ch", "ra", "bg", "ba", "ro", "co"];

/// Bit-field mapper from 64-bit physical addresses to [`Address`] tuples.
///
/// Built once from the configuration; the mapping string must be exactly
/// twelve characters forming six two-letter tokens, the rightmost token
/// occupying the least-significant bits above the burst offset.
#[derive(Clone, Copy, Debug)]
pub struct AddressMapper {
    /// Bit position of each field, in `FIELD_TOKENS` order.
    pos: [u32; 6],
    /// Bit width of each field, in `FIELD_TOKENS` order.
    width: [u32; 6],
}

/// Extracts `width` bits of `addr` starting at bit `pos`.
fn slice_bits(addr: u64, width: u32, pos: u32) -> u64 {
    if width >= 64 {
        addr >> pos
    } else {
        (addr >> pos) & ((1u64 << width) - 1)
    }
}

impl AddressMapper {
    /// Builds a mapper from the configured mapping string and field widths.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the mapping string is not twelve
    /// characters, contains an unknown token, or repeats a token.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let mapping = &config.system.address_mapping;
        if mapping.len() != 12 || !mapping.is_ascii() {
            return Err(ConfigError::MalformedAddressMapping(mapping.clone()));
        }

        let widths = [
            config.channel_width,
            config.rank_width,
            config.bankgroup_width,
            config.bank_width,
            config.row_width,
            config.column_width,
        ];
        let mut pos = [0u32; 6];
        let mut seen = [false; 6];

        // Walk tokens right-to-left so the rightmost token lands just above
        // the burst offset.
        let mut bit = config.shift_bits;
        for chunk in (0..12).step_by(2).rev() {
            let token = &mapping[chunk..chunk + 2];
            let field = FIELD_TOKENS
                .iter()
                .position(|t| *t == token)
                .ok_or_else(|| ConfigError::UnknownAddressField(token.to_string()))?;
            if seen[field] {
                return Err(ConfigError::DuplicateAddressField(token.to_string()));
            }
            seen[field] = true;
            pos[field] = bit;
            bit += widths[field];
        }

        Ok(Self { pos, width: widths })
    }

    /// Decodes a physical address into its six fields.
    pub fn decode(&self, hex_addr: u64) -> Address {
        Address {
            channel: slice_bits(hex_addr, self.width[0], self.pos[0]) as usize,
            rank: slice_bits(hex_addr, self.width[1], self.pos[1]) as usize,
            bankgroup: slice_bits(hex_addr, self.width[2], self.pos[2]) as usize,
            bank: slice_bits(hex_addr, self.width[3], self.pos[3]) as usize,
            row: slice_bits(hex_addr, self.width[4], self.pos[4]),
            column: slice_bits(hex_addr, self.width[5], self.pos[5]),
        }
    }

    /// Re-encodes a decoded address into a physical address.
    ///
    /// The burst-offset bits are zero; `decode(encode(a)) == a` for any
    /// address whose fields fit their configured widths.
    pub fn encode(&self, addr: &Address) -> u64 {
        let fields = [
            addr.channel as u64,
            addr.rank as u64,
            addr.bankgroup as u64,
            addr.bank as u64,
            addr.row,
            addr.column,
        ];
        let mut hex_addr = 0u64;
        for ((field, width), pos) in fields.iter().zip(self.width).zip(self.pos) {
            hex_addr |= slice_bits(*field, width, 0) << pos;
        }
        hex_addr
    }

    /// Extracts only the channel field; used for transaction routing.
    pub fn channel_of(&self, hex_addr: u64) -> usize {
        slice_bits(hex_addr, self.width[0], self.pos[0]) as usize
    }
}
