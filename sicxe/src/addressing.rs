//! Addressing mode detection and the n/i/x/b/p/e flag bits

use crate::error::ErrorKind;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AddrMode {
    Simple,
    Immediate,
    Indirect,
}

impl AddrMode {
    /// The n and i bits, already positioned in the opcode byte.
    pub fn ni(self) -> u8 {
        match self {
            AddrMode::Simple => 0b11,
            AddrMode::Immediate => 0b01,
            AddrMode::Indirect => 0b10,
        }
    }
}

// x/b/p/e bits of a format 3 word; format 4 shifts them up by 8.
pub const FLAG_INDEXED: u32 = 0x8000;
pub const FLAG_BASE: u32 = 0x4000;
pub const FLAG_PC: u32 = 0x2000;
pub const FLAG_EXTENDED: u32 = 0x1000;

pub const PC_MIN: i64 = -2048;
pub const PC_MAX: i64 = 2047;
pub const BASE_MAX: i64 = 4095;

/// Split the addressing prefix off an operand.
pub fn parse_addr_mode(operand: &str) -> Result<(&str, AddrMode), ErrorKind> {
    match operand.chars().next() {
        Some('#') => Ok((&operand[1..], AddrMode::Immediate)),
        Some('@') => Ok((&operand[1..], AddrMode::Indirect)),
        Some(c) if !c.is_ascii_alphanumeric() => Err(ErrorKind::UnrecognizedPrefix(c)),
        _ => Ok((operand, AddrMode::Simple)),
    }
}

/// Check if an operand is an indexing suffix
pub fn is_index_suffix(operand: &str) -> bool {
    operand == "X"
}
