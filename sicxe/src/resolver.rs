//! Forward-reference resolution
//!
//! A symbol used before its definition leaves the displacement field of the
//! referencing line blank and queues a [`PendingRef`] on the symbol. When the
//! definition arrives the queue is replayed in order. A format 3 line that
//! cannot reach its target PC-relatively falls back to its base register;
//! if that register is itself still undefined, a second reference is queued
//! on it and the line is finished when the base resolves.

use tracing::trace;

use crate::addressing::{BASE_MAX, FLAG_BASE, FLAG_PC, PC_MAX, PC_MIN};
use crate::assembler::AssemblerSicXe;
use crate::error::{AsmError, ErrorKind};
use crate::symbol::{Fixup, PendingRef};

impl AssemblerSicXe {
    pub(crate) fn resolve(&mut self, pending: Vec<PendingRef>, addr: u32) -> Result<(), AsmError> {
        for reference in pending {
            match reference.fixup {
                Fixup::Operand => self.fix_operand(reference.line, addr)?,
                Fixup::Base { target } => self.fix_base(reference.line, target, addr)?,
            }
        }
        Ok(())
    }

    /// Fill in the address field of line `idx` now that its operand is known.
    pub(crate) fn fix_operand(&mut self, idx: usize, target: u32) -> Result<(), AsmError> {
        let line = &self.lines[idx];
        let Some(location) = line.location else {
            return Ok(());
        };

        if line.width == 4 {
            self.lines[idx].or_word(target & 0xF_FFFF);
            return Ok(());
        }

        let disp = target as i64 - (location as i64 + 3);
        if (PC_MIN..=PC_MAX).contains(&disp) {
            trace!(line = idx + 1, disp, "pc-relative");
            self.lines[idx].or_word(FLAG_PC | (disp as u32 & 0xFFF));
            return Ok(());
        }

        let Some(base) = line.base.clone() else {
            return Err(self.error(idx, ErrorKind::DisplacementOverflow { target }));
        };
        match self.symbols.reference(&base, idx, Fixup::Base { target }) {
            Some(base_addr) => self.fix_base(idx, target, base_addr),
            None => {
                trace!(line = idx + 1, base = %base, "waiting for base register");
                Ok(())
            }
        }
    }

    /// Fill in a base-relative displacement for line `idx`.
    pub(crate) fn fix_base(&mut self, idx: usize, target: u32, base: u32) -> Result<(), AsmError> {
        let disp = target as i64 - base as i64;
        if !(0..=BASE_MAX).contains(&disp) {
            return Err(self.error(idx, ErrorKind::DisplacementOverflow { target }));
        }
        trace!(line = idx + 1, disp, "base-relative");
        self.lines[idx].or_word(FLAG_BASE | disp as u32);
        Ok(())
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

    #[test]
    fn test_queue_is_replayed_in_order() {
        let src = "P START 0\n LDA DATA\n STA DATA\n +JSUB DATA\nDATA WORD 7";
        let asm = feed(src).unwrap();
        // DATA is at 10.
        assert_eq!(asm.lines()[1].object_hex(), "032007");
        assert_eq!(asm.lines()[2].object_hex(), "0F2004");
        assert_eq!(asm.lines()[3].object_hex(), "4B10000A");
    }

    #[test]
    fn test_base_fixup_chains_through_pending_base() {
        // FAR and BUF land on the same address, BUF is defined last.
        let src = "P START 0\n BASE BUF\n LDA FAR\nGAP RESB 4000\nFAR RESB 0\nBUF RESB 10";
        let mut asm = AssemblerSicXe::new();
        for line in src.lines().take(5) {
            asm.assemble_line(line).unwrap();
        }
        // FAR resolved, but the base is still pending: displacement blank.
        assert_eq!(asm.lines()[2].object_hex(), "030000");

        asm.assemble_line("BUF RESB 10").unwrap();
        assert_eq!(asm.lines()[2].object_hex(), "034000");
        assert_eq!(asm.lookup("BUF"), Some(4003));
    }

    #[test]
    fn test_base_fixup_overflow() {
        let src = "P START 0\n BASE BUF\n LDA FAR\nGAP RESB 4000\nFAR RESB 1\nBUF RESB 10";
        let err = feed(src).unwrap_err();
        assert_eq!(err.kind(), Some(&ErrorKind::DisplacementOverflow { target: 4003 }));
        // Reported on the instruction, not on the definition.
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn test_base_symbol_defined_by_the_same_definition() {
        // The operand and the base are the same pending symbol.
        let src = "P START 0\n BASE TAB\n LDA TAB\nGAP RESB 3000\nTAB RESB 1";
        let asm = feed(src).unwrap();
        assert_eq!(asm.lines()[2].object_hex(), "034000");
    }

    #[test]
    fn test_unused_pending_base_is_unresolved() {
        let src = "P START 0\n BASE NEVER\n LDA FAR\nGAP RESB 4000\nFAR RESB 1\n END";
        let err = AssemblerSicXe::new().assemble(src).unwrap_err();
        assert_eq!(err.kind(), Some(&ErrorKind::UnresolvedSymbol("NEVER".into())));
    }
}
