//! SIC/XE instruction and register tables

use std::collections::HashMap;

/// Privileged instruction.
pub const FLAG_P: u8 = 0x1;
/// Available on XE only.
pub const FLAG_X: u8 = 0x2;
/// Floating point instruction.
pub const FLAG_F: u8 = 0x4;
/// Sets the condition code.
pub const FLAG_C: u8 = 0x8;

/// What the operand field of an instruction looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandShape {
    /// No operand at all (format 1, RSUB).
    None,
    /// A memory target (format 3/4).
    Memory,
    /// r1
    Register,
    /// r1,r2
    RegisterPair,
    /// r1,n
    RegisterCount,
    /// n
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: u8,
    /// Base format (1, 2 or 3). Format 3 entries also accept format 4.
    pub format: u8,
    pub shape: OperandShape,
    pub flags: u8,
}

impl Instruction {
    pub fn supports_format4(&self) -> bool {
        self.format == 3
    }

    pub fn is_privileged(&self) -> bool {
        self.flags & FLAG_P != 0
    }
}

#[derive(Debug)]
pub struct OpcodeTables {
    pub instructions: HashMap<&'static str, Instruction>,
    pub registers: HashMap<&'static str, u8>,
}

const fn op(opcode: u8, format: u8, shape: OperandShape, flags: u8) -> Instruction {
    Instruction { opcode, format, shape, flags }
}

impl OpcodeTables {
    pub fn new() -> Self {
        let mut tables = Self {
            instructions: HashMap::new(),
            registers: HashMap::new(),
        };
        tables.init_instructions();
        tables.init_registers();
        tables
    }

    fn init_instructions(&mut self) {
        use OperandShape::*;

        self.instructions = HashMap::from([
            ("ADD", op(0x18, 3, Memory, 0)),
            ("ADDF", op(0x58, 3, Memory, FLAG_X | FLAG_F)),
            ("ADDR", op(0x90, 2, RegisterPair, FLAG_X)),
            ("AND", op(0x40, 3, Memory, 0)),
            ("CLEAR", op(0xB4, 2, Register, FLAG_X)),
            ("COMP", op(0x28, 3, Memory, FLAG_C)),
            ("COMPF", op(0x88, 3, Memory, FLAG_X | FLAG_F | FLAG_C)),
            ("COMPR", op(0xA0, 2, RegisterPair, FLAG_X | FLAG_C)),
            ("DIV", op(0x24, 3, Memory, 0)),
            ("DIVF", op(0x64, 3, Memory, FLAG_X | FLAG_F)),
            ("DIVR", op(0x9C, 2, RegisterPair, FLAG_X)),
            ("FIX", op(0xC4, 1, None, FLAG_X | FLAG_F)),
            ("FLOAT", op(0xC0, 1, None, FLAG_X | FLAG_F)),
            ("HIO", op(0xF4, 1, None, FLAG_P | FLAG_X)),
            ("J", op(0x3C, 3, Memory, 0)),
            ("JEQ", op(0x30, 3, Memory, 0)),
            ("JGT", op(0x34, 3, Memory, 0)),
            ("JLT", op(0x38, 3, Memory, 0)),
            ("JSUB", op(0x48, 3, Memory, 0)),
            ("LDA", op(0x00, 3, Memory, 0)),
            ("LDB", op(0x68, 3, Memory, FLAG_X)),
            ("LDCH", op(0x50, 3, Memory, 0)),
            ("LDF", op(0x70, 3, Memory, FLAG_X | FLAG_F)),
            ("LDL", op(0x08, 3, Memory, 0)),
            ("LDS", op(0x6C, 3, Memory, FLAG_X)),
            ("LDT", op(0x74, 3, Memory, FLAG_X)),
            ("LDX", op(0x04, 3, Memory, 0)),
            ("LPS", op(0xD0, 3, Memory, FLAG_P | FLAG_X)),
            ("MUL", op(0x20, 3, Memory, 0)),
            ("MULF", op(0x60, 3, Memory, FLAG_X | FLAG_F)),
            ("MULR", op(0x98, 2, RegisterPair, FLAG_X)),
            ("NORM", op(0xC8, 1, None, FLAG_X | FLAG_F)),
            ("OR", op(0x44, 3, Memory, 0)),
            ("RD", op(0xD8, 3, Memory, FLAG_P)),
            ("RMO", op(0xAC, 2, RegisterPair, FLAG_X)),
            ("RSUB", op(0x4C, 3, None, 0)),
            ("SHIFTL", op(0xA4, 2, RegisterCount, FLAG_X)),
            ("SHIFTR", op(0xA8, 2, RegisterCount, FLAG_X)),
            ("SIO", op(0xF0, 1, None, FLAG_P | FLAG_X)),
            ("SSK", op(0xEC, 3, Memory, FLAG_P | FLAG_X)),
            ("STA", op(0x0C, 3, Memory, 0)),
            ("STB", op(0x78, 3, Memory, FLAG_X)),
            ("STCH", op(0x54, 3, Memory, 0)),
            ("STF", op(0x80, 3, Memory, FLAG_X | FLAG_F)),
            ("STI", op(0xD4, 3, Memory, FLAG_P | FLAG_X)),
            ("STL", op(0x14, 3, Memory, 0)),
            ("STS", op(0x7C, 3, Memory, FLAG_X)),
            ("STSW", op(0xE8, 3, Memory, FLAG_P)),
            ("STT", op(0x84, 3, Memory, FLAG_X)),
            ("STX", op(0x10, 3, Memory, 0)),
            ("SUB", op(0x1C, 3, Memory, 0)),
            ("SUBF", op(0x5C, 3, Memory, FLAG_X | FLAG_F)),
            ("SUBR", op(0x94, 2, RegisterPair, FLAG_X)),
            ("SVC", op(0xB0, 2, Count, FLAG_X)),
            ("TD", op(0xE0, 3, Memory, FLAG_P | FLAG_C)),
            ("TIO", op(0xF8, 1, None, FLAG_P | FLAG_X | FLAG_C)),
            ("TIX", op(0x2C, 3, Memory, FLAG_C)),
            ("TIXR", op(0xB8, 2, Register, FLAG_X | FLAG_C)),
            ("WD", op(0xDC, 3, Memory, FLAG_P)),
        ]);
    }

    fn init_registers(&mut self) {
        self.registers = HashMap::from([
            ("A", 0), ("X", 1), ("L", 2), ("B", 3), ("S", 4),
            ("T", 5), ("F", 6), ("PC", 8), ("SW", 9),
        ]);
    }

    /// Look up a mnemonic token, accepting the `+` extended-format prefix.
    /// Returns the entry and whether format 4 was requested.
    pub fn lookup(&self, token: &str) -> Option<(&'static str, Instruction, bool)> {
        let (name, extended) = match token.strip_prefix('+') {
            Some(rest) => (rest, true),
            None => (token, false),
        };
        self.instructions
            .get_key_value(name)
            .map(|(&k, &v)| (k, v, extended))
    }

    pub fn is_mnemonic(&self, token: &str) -> bool {
        self.lookup(token).is_some()
    }

    pub fn register(&self, name: &str) -> Option<u8> {
        self.registers.get(name).copied()
    }
}

impl Default for OpcodeTables {
    fn default() -> Self {
        Self::new()
    }
}
