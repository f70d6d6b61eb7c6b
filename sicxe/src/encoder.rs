//! Instruction encoding for formats 1 through 4

use tracing::debug;

use crate::addressing::{
    is_index_suffix, parse_addr_mode, AddrMode, FLAG_EXTENDED, FLAG_INDEXED,
};
use crate::assembler::AssemblerSicXe;
use crate::error::{AsmError, ErrorKind};
use crate::line::ObjectCode;
use crate::opcodes::{Instruction, OperandShape};
use crate::parser::{is_symbol, split_operands, NumberParser};
use crate::symbol::Fixup;

impl AssemblerSicXe {
    pub(crate) fn encode_instruction(
        &mut self,
        idx: usize,
        label: Option<String>,
        mnemonic_token: &str,
        operand_tokens: &[String],
    ) -> Result<(), AsmError> {
        let (mnemonic, info, extended) = self
            .opcodes
            .lookup(mnemonic_token)
            .ok_or_else(|| self.error(idx, ErrorKind::UnknownLineForm))?;
        if extended && !info.supports_format4() {
            return Err(self.error(idx, ErrorKind::UnsupportedFormat4(mnemonic.to_string())));
        }
        let format: u32 = if extended { 4 } else { info.format as u32 };
        let operands = split_operands(operand_tokens).map_err(|k| self.error(idx, k))?;

        if let Some(label) = label {
            self.define_symbol(idx, &label)?;
        }

        let location = self.locctr;
        let line = &mut self.lines[idx];
        line.location = Some(location);
        line.width = format;
        line.base = self.base.clone();
        if self.first_exec.is_none() {
            debug!(address = location, "first executable instruction");
            self.first_exec = Some(location);
        }
        if info.is_privileged() {
            debug!(mnemonic, line = idx + 1, "privileged instruction");
        }

        match format {
            1 => {
                if !operands.is_empty() {
                    return Err(self.operand_count(idx, mnemonic, 0));
                }
                self.lines[idx].code = Some(ObjectCode::Word(info.opcode as u32));
            }
            2 => {
                let word = self.encode_registers(idx, mnemonic, info, &operands)?;
                self.lines[idx].code = Some(ObjectCode::Word(word));
            }
            _ => self.encode_memory(idx, mnemonic, info, format == 4, &operands)?,
        }
        self.advance(idx, format as u64)
    }

    /// Format 2: register numbers (or a count) packed into two nibbles.
    fn encode_registers(
        &self,
        idx: usize,
        mnemonic: &str,
        info: Instruction,
        operands: &[String],
    ) -> Result<u32, AsmError> {
        let register = |name: &str| {
            self.opcodes
                .register(name)
                .map(u32::from)
                .ok_or_else(|| self.error(idx, ErrorKind::UnknownRegister(name.to_string())))
        };
        let count = |text: &str, min: i64, max: i64| -> Result<u32, AsmError> {
            let n = NumberParser::parse_decimal(text).map_err(|k| self.error(idx, k))?;
            if !(min..=max).contains(&n) {
                return Err(self.error(
                    idx,
                    ErrorKind::OperandOutOfRange { value: n, limit: max + 1 },
                ));
            }
            Ok(n as u32)
        };

        let nibbles = match (info.shape, operands) {
            (OperandShape::Register, [r1]) => register(r1.as_str())? << 4,
            (OperandShape::RegisterPair, [r1, r2]) => {
                register(r1.as_str())? << 4 | register(r2.as_str())?
            }
            (OperandShape::RegisterCount, [r1, n]) => {
                register(r1.as_str())? << 4 | (count(n.as_str(), 1, 16)? - 1)
            }
            (OperandShape::Count, [n]) => count(n.as_str(), 0, 15)? << 4,
            (OperandShape::RegisterPair | OperandShape::RegisterCount, _) => {
                return Err(self.operand_count(idx, mnemonic, 2));
            }
            _ => return Err(self.operand_count(idx, mnemonic, 1)),
        };
        Ok((info.opcode as u32) << 8 | nibbles)
    }

    /// Format 3/4: n/i/x/b/p/e flags plus a displacement or address.
    fn encode_memory(
        &mut self,
        idx: usize,
        mnemonic: &'static str,
        info: Instruction,
        extended: bool,
        operands: &[String],
    ) -> Result<(), AsmError> {
        let place = |ni: u8, flags: u32| {
            if extended {
                (ni as u32) << 24 | (flags | FLAG_EXTENDED) << 8
            } else {
                (ni as u32) << 16 | flags
            }
        };

        if info.shape == OperandShape::None {
            if !operands.is_empty() {
                return Err(self.operand_count(idx, mnemonic, 0));
            }
            let word = place(info.opcode | AddrMode::Simple.ni(), 0);
            self.lines[idx].code = Some(ObjectCode::Word(word));
            return Ok(());
        }

        let (operand, indexed) = match operands {
            [] => return Err(self.error(idx, ErrorKind::MissingOperand(mnemonic))),
            [operand] => (operand.as_str(), false),
            [operand, suffix] if is_index_suffix(suffix) => (operand.as_str(), true),
            [_, suffix] => {
                return Err(self.error(
                    idx,
                    ErrorKind::OperandCountMismatch(format!(
                        "Only X may follow the operand of {}, found '{}'.",
                        mnemonic, suffix
                    )),
                ));
            }
            _ => return Err(self.operand_count(idx, mnemonic, 1)),
        };

        let (target, mode) = parse_addr_mode(operand).map_err(|k| self.error(idx, k))?;
        if indexed && mode != AddrMode::Simple {
            return Err(self.error(
                idx,
                ErrorKind::OperandCountMismatch(
                    "Indexing cannot be combined with immediate or indirect addressing.".into(),
                ),
            ));
        }
        if target.is_empty() {
            return Err(self.error(idx, ErrorKind::MissingOperand(mnemonic)));
        }

        let flags = if indexed { FLAG_INDEXED } else { 0 };
        let mut word = place(info.opcode | mode.ni(), flags);

        if NumberParser::is_decimal(target) {
            let value = NumberParser::parse_decimal(target).map_err(|k| self.error(idx, k))?;
            let limit: i64 = if extended { 1 << 20 } else { 1 << 12 };
            if !(0..limit).contains(&value) {
                return Err(self.error(idx, ErrorKind::OperandOutOfRange { value, limit }));
            }
            word |= value as u32;
            self.lines[idx].code = Some(ObjectCode::Word(word));
            return Ok(());
        }

        if !is_symbol(target) {
            return Err(self.error(idx, ErrorKind::InvalidSymbol(target.to_string())));
        }

        let line = &mut self.lines[idx];
        line.code = Some(ObjectCode::Word(word));
        line.relocatable = extended && mode != AddrMode::Immediate;
        match self.symbols.reference(target, idx, Fixup::Operand) {
            Some(addr) => self.fix_operand(idx, addr),
            None => {
                debug!(symbol = target, line = idx + 1, "forward reference");
                Ok(())
            }
        }
    }

    fn operand_count(&self, idx: usize, mnemonic: &str, expected: usize) -> AsmError {
        let msg = match expected {
            0 => format!("{} takes no operand.", mnemonic),
            1 => format!("{} takes a single operand.", mnemonic),
            n => format!("{} takes {} operands.", mnemonic, n),
        };
        self.error(idx, ErrorKind::OperandCountMismatch(msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(src: &str) -> Result<AssemblerSicXe, AsmError> {
        let mut asm = AssemblerSicXe::new();
        for line in src.lines() {
            asm.assemble_line(line)?;
        }
        Ok(asm)
    }

    /// Object code of the last line.
    fn code(src: &str) -> String {
        let asm = feed(src).unwrap();
        asm.lines().last().unwrap().object_hex()
    }

    fn kind_of(src: &str) -> ErrorKind {
        feed(src).err().and_then(|e| e.kind().cloned()).unwrap()
    }

    #[test]
    fn test_format1() {
        assert_eq!(code("P START 0\n FIX"), "C4");
        assert_eq!(code("P START 0\n TIO"), "F8");
        assert!(matches!(kind_of("P START 0\n FIX A"), ErrorKind::OperandCountMismatch(_)));
        assert_eq!(
            kind_of("P START 0\n +FLOAT"),
            ErrorKind::UnsupportedFormat4("FLOAT".into())
        );
    }

    #[test]
    fn test_format2() {
        assert_eq!(code("P START 0\n CLEAR X"), "B410");
        assert_eq!(code("P START 0\n COMPR A,S"), "A004");
        assert_eq!(code("P START 0\n RMO S, T"), "AC45");
        assert_eq!(code("P START 0\n TIXR T"), "B850");
        assert_eq!(code("P START 0\n SHIFTL T,4"), "A453");
        assert_eq!(code("P START 0\n SVC 12"), "B0C0");
        assert_eq!(code("P START 0\n ADDR PC,SW"), "9089");
    }

    #[test]
    fn test_format2_errors() {
        assert!(matches!(kind_of("P START 0\n COMPR A"), ErrorKind::OperandCountMismatch(_)));
        assert!(matches!(kind_of("P START 0\n CLEAR A,S"), ErrorKind::OperandCountMismatch(_)));
        assert_eq!(kind_of("P START 0\n CLEAR Q"), ErrorKind::UnknownRegister("Q".into()));
        assert!(matches!(kind_of("P START 0\n SHIFTR A,17"), ErrorKind::OperandOutOfRange { .. }));
        assert!(matches!(kind_of("P START 0\n SVC 16"), ErrorKind::OperandOutOfRange { .. }));
        assert_eq!(kind_of("P START 0\n +CLEAR X"), ErrorKind::UnsupportedFormat4("CLEAR".into()));
    }

    #[test]
    fn test_immediate_and_literals() {
        assert_eq!(code("P START 0\n LDA #0"), "010000");
        assert_eq!(code("P START 0\n LDA #3"), "010003");
        assert_eq!(code("P START 0\n COMP #4095"), "290FFF");
        assert_eq!(code("P START 0\n +LDT #4096"), "75101000");
        assert_eq!(code("P START 0\n LDA 100"), "030064");
        assert_eq!(code("P START 0\n LDA @100"), "020064");
        assert_eq!(
            kind_of("P START 0\n LDA #4096"),
            ErrorKind::OperandOutOfRange { value: 4096, limit: 4096 }
        );
        assert_eq!(
            kind_of("P START 0\n +LDA #1048576"),
            ErrorKind::OperandOutOfRange { value: 1048576, limit: 1048576 }
        );
    }

    #[test]
    fn test_signed_and_malformed_operands() {
        assert_eq!(code("P START 0\n LDA #+5"), "010005");
        assert_eq!(
            kind_of("P START 0\n LDA #-1"),
            ErrorKind::OperandOutOfRange { value: -1, limit: 4096 }
        );
        assert_eq!(
            kind_of("P START 0\n +LDA #-1"),
            ErrorKind::OperandOutOfRange { value: -1, limit: 1048576 }
        );
        assert_eq!(kind_of("P START 0\n LDA 1A"), ErrorKind::InvalidSymbol("1A".into()));
        assert_eq!(kind_of("P START 0\n LDA BUF-1"), ErrorKind::InvalidSymbol("BUF-1".into()));
        assert_eq!(kind_of("P START 0\n- RSUB"), ErrorKind::InvalidSymbol("-".into()));
    }

    #[test]
    fn test_operands_need_commas() {
        let err = AssemblerSicXe::new()
            .assemble("P START 0\n LDA ALPHA BETA\nALPHABETA WORD 1\n END")
            .unwrap_err();
        assert!(matches!(err.kind(), Some(ErrorKind::OperandCountMismatch(_))));
        assert_eq!(err.line(), Some(2));
        assert_eq!(code("P START 0\n COMPR A , S"), "A004");
    }

    #[test]
    fn test_rsub() {
        assert_eq!(code("P START 0\n RSUB"), "4F0000");
        assert_eq!(code("P START 0\n +RSUB"), "4F100000");
        assert!(matches!(kind_of("P START 0\n RSUB X"), ErrorKind::OperandCountMismatch(_)));
    }

    #[test]
    fn test_prefix_and_operand_errors() {
        assert_eq!(kind_of("P START 0\n LDA =X'05'"), ErrorKind::UnrecognizedPrefix('='));
        assert_eq!(kind_of("P START 0\n LDA"), ErrorKind::MissingOperand("LDA"));
        assert_eq!(kind_of("P START 0\n LDA #"), ErrorKind::MissingOperand("LDA"));
        assert!(matches!(kind_of("P START 0\n LDA BUF,A"), ErrorKind::OperandCountMismatch(_)));
        assert!(matches!(kind_of("P START 0\n LDA BUF,X,X"), ErrorKind::OperandCountMismatch(_)));
        assert!(matches!(kind_of("P START 0\n LDA #BUF,X"), ErrorKind::OperandCountMismatch(_)));
    }

    #[test]
    fn test_pc_relative_backward_and_forward() {
        assert_eq!(code("P START 0\nLOOP J LOOP"), "3F2FFD");
        let asm = feed("P START 0\n JEQ DONE\n RSUB\nDONE RSUB").unwrap();
        assert_eq!(asm.lines()[1].object_hex(), "332003");
    }

    #[test]
    fn test_indexed_base_relative() {
        let src = "P START 0\n LDB #TAB\n BASE TAB\nTAB RESB 4000\n STCH TAB,X";
        let asm = feed(src).unwrap();
        // LDB #TAB: TAB is at 3, PC is 3.
        assert_eq!(asm.lines()[1].object_hex(), "692000");
        assert_eq!(asm.lines()[4].location, Some(4003));
        assert_eq!(asm.lines()[4].object_hex(), "57C000");
        assert_eq!(asm.lines()[4].base.as_deref(), Some("TAB"));
    }

    #[test]
    fn test_format4_absolute_and_relocation() {
        let asm = feed("P START 1000\n +JSUB TARGET\n +LDA #TARGET\nTARGET RSUB").unwrap();
        assert_eq!(asm.lines()[1].object_hex(), "4B101008");
        assert!(asm.lines()[1].relocatable);
        assert_eq!(asm.lines()[2].object_hex(), "01101008");
        assert!(!asm.lines()[2].relocatable);
        assert_eq!(asm.lines()[1].width, 4);
    }

    #[test]
    fn test_pc_relative_boundaries() {
        // disp = 2050 - 3 = 2047
        let asm = feed("P START 0\n J FAR\nGAP RESB 2047\nFAR RSUB").unwrap();
        assert_eq!(asm.lines()[1].object_hex(), "3F27FF");
        assert_eq!(
            kind_of("P START 0\n J FAR\nGAP RESB 2048\nFAR RSUB"),
            ErrorKind::DisplacementOverflow { target: 2051 }
        );

        // disp = 0 - 2048
        let asm = feed("P START 0\nBACK RSUB\nGAP RESB 2042\n J BACK").unwrap();
        assert_eq!(asm.lines()[3].object_hex(), "3F2800");
        assert_eq!(
            kind_of("P START 0\nBACK RSUB\nGAP RESB 2043\n J BACK"),
            ErrorKind::DisplacementOverflow { target: 0 }
        );
    }

    #[test]
    fn test_base_out_of_range() {
        let src = "P START 0\n BASE HERE\nHERE RESB 5000\n LDA HERE\n STA AWAY\nAWAY RESB 1";
        // LDA HERE: base disp 0. STA AWAY: PC disp fits.
        let asm = feed(src).unwrap();
        assert_eq!(asm.lines()[3].object_hex(), "034000");
        assert_eq!(asm.lines()[4].object_hex(), "0F2000");

        let far = "P START 0\nHERE RESB 1\n BASE HERE\nGAP RESB 5000\n LDA FAR\nMORE RESB 2100\nFAR RESB 1";
        assert!(matches!(kind_of(far), ErrorKind::DisplacementOverflow { .. }));
    }

    #[test]
    fn test_nobase_disables_base_relative() {
        let src = "P START 0\nHERE RESB 1\n BASE HERE\n NOBASE\nGAP RESB 5000\n LDA HERE";
        assert_eq!(kind_of(src), ErrorKind::DisplacementOverflow { target: 0 });
    }

    #[test]
    fn test_forward_matches_backward_encoding() {
        // Forward: the symbol is defined after the reference.
        let mut fwd = AssemblerSicXe::new();
        fwd.assemble_line("P START 0").unwrap();
        fwd.assemble_line(" JSUB TARGET").unwrap();
        fwd.assemble_line("PAD RESB 97").unwrap();
        fwd.assemble_line("TARGET LDA #0").unwrap();

        // Known: same addresses, symbol bound up front.
        let mut known = AssemblerSicXe::new();
        known.assemble_line("P START 0").unwrap();
        known.symbols.define("TARGET", 100).unwrap();
        known.assemble_line(" JSUB TARGET").unwrap();

        assert_eq!(fwd.lookup("TARGET"), Some(100));
        assert_eq!(fwd.lines()[1].word(), known.lines()[1].word());
        assert_eq!(fwd.lines()[1].object_hex(), "4B2061");
    }

    #[test]
    fn test_redefined_label() {
        assert_eq!(
            kind_of("P START 0\nL1 RSUB\nL1 RSUB"),
            ErrorKind::RedefinedSymbol("L1".into())
        );
        // First definition resolved a forward reference.
        assert_eq!(
            kind_of("P START 0\n J L1\nL1 RSUB\nL1 FIX"),
            ErrorKind::RedefinedSymbol("L1".into())
        );
    }
}
