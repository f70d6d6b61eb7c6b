//! Main assembler implementation

use tracing::{debug, trace, warn};

use crate::directives::Directive;
use crate::error::{AsmError, ErrorKind};
use crate::line::Line;
use crate::opcodes::OpcodeTables;
use crate::parser::{is_comment, is_symbol, tokenize};
use crate::symbol::SymbolTable;

/// Addresses are 20 bits wide.
pub const MEMORY_SIZE: u64 = 1 << 20;

/// Assembles one module. Feed it source lines in order with
/// [`assemble_line`](Self::assemble_line), then call [`finish`](Self::finish).
#[derive(Debug)]
pub struct AssemblerSicXe {
    pub(crate) opcodes: OpcodeTables,
    pub(crate) symbols: SymbolTable,
    pub(crate) lines: Vec<Line>,
    pub(crate) name: String,
    pub(crate) start_address: u32,
    pub(crate) locctr: u32,
    pub(crate) base: Option<String>,
    pub(crate) first_exec: Option<u32>,
    pub(crate) started: bool,
    pub(crate) ended: bool,
    pub(crate) seen_statement: bool,
}

/// What a line turned out to be.
enum Statement {
    Instruction { label: Option<String>, at: usize },
    Directive { directive: Directive, label: Option<String>, at: usize },
}

impl Default for AssemblerSicXe {
    fn default() -> Self {
        Self::new()
    }
}

impl AssemblerSicXe {
    pub fn new() -> Self {
        Self {
            opcodes: OpcodeTables::new(),
            symbols: SymbolTable::new(),
            lines: Vec::new(),
            name: String::new(),
            start_address: 0,
            locctr: 0,
            base: None,
            first_exec: None,
            started: false,
            ended: false,
            seen_statement: false,
        }
    }

    // ===== Public API =====

    /// Assemble a whole source text.
    pub fn assemble(mut self, src: &str) -> Result<Assembly, AsmError> {
        for line in src.lines() {
            self.assemble_line(line)?;
        }
        self.finish()
    }

    /// Process the next source line.
    pub fn assemble_line(&mut self, text: &str) -> Result<(), AsmError> {
        let number = self.lines.len() + 1;
        let tokens = if is_comment(text) { Vec::new() } else { tokenize(text) };
        let statement = !tokens.is_empty();
        self.lines.push(Line::new(number, text, tokens));

        if !statement {
            return Ok(());
        }
        if self.ended {
            warn!(line = number, "ignoring statement after END");
            return Ok(());
        }

        trace!(line = number, locctr = self.locctr, "{}", text.trim());
        self.dispatch(number - 1)?;
        self.seen_statement = true;
        Ok(())
    }

    /// Check that every referenced symbol was defined and hand back the
    /// finished module.
    pub fn finish(self) -> Result<Assembly, AsmError> {
        if let Some(pending) = self.symbols.first_unresolved() {
            let kind = ErrorKind::UnresolvedSymbol(pending.symbol.clone());
            return Err(self.error(pending.line, kind));
        }
        if !self.ended {
            warn!(program = %self.name, "source ends without END");
        }

        let mut symbols: Vec<(String, u32)> = self
            .symbols
            .labels()
            .map(|(name, addr)| (name.to_string(), addr))
            .collect();
        symbols.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        debug!(
            program = %self.name,
            length = self.locctr - self.start_address,
            symbols = symbols.len(),
            "assembly finished"
        );
        Ok(Assembly {
            name: self.name,
            start_address: self.start_address,
            length: self.locctr - self.start_address,
            first_exec: self.first_exec.unwrap_or(self.start_address),
            lines: self.lines,
            symbols,
        })
    }

    pub fn location_counter(&self) -> u32 {
        self.locctr
    }

    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    pub fn lookup(&self, name: &str) -> Option<u32> {
        self.symbols.get(name)
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    // ===== Dispatch =====

    fn classify(&self, tokens: &[String]) -> Result<Statement, ErrorKind> {
        let first = tokens[0].as_str();
        if self.opcodes.is_mnemonic(first) {
            if let Some(directive) = tokens.get(1).and_then(|t| Directive::lookup(t)) {
                return Err(ErrorKind::MissingOrMisplacedLabel(format!(
                    "'{}' is an instruction and cannot label {}.",
                    first,
                    directive.name()
                )));
            }
            return Ok(Statement::Instruction { label: None, at: 0 });
        }
        if let Some(directive) = Directive::lookup(first) {
            return Ok(Statement::Directive { directive, label: None, at: 0 });
        }
        if let Some(second) = tokens.get(1) {
            let label = Some(first.to_string());
            if self.opcodes.is_mnemonic(second) {
                return Ok(Statement::Instruction { label, at: 1 });
            }
            if let Some(directive) = Directive::lookup(second) {
                return Ok(Statement::Directive { directive, label, at: 1 });
            }
        }
        if let Some(keyword) = tokens[2.min(tokens.len())..]
            .iter()
            .find(|t| Directive::lookup(t).is_some() || self.opcodes.is_mnemonic(t))
        {
            return Err(ErrorKind::MissingOrMisplacedLabel(format!(
                "Multiple tokens were specified before {}.",
                keyword
            )));
        }
        Err(ErrorKind::UnknownLineForm)
    }

    fn dispatch(&mut self, idx: usize) -> Result<(), AsmError> {
        let tokens = self.lines[idx].tokens.clone();
        let statement = self.classify(&tokens).map_err(|k| self.error(idx, k))?;
        match statement {
            Statement::Instruction { label, at } => {
                self.encode_instruction(idx, label, &tokens[at], &tokens[at + 1..])
            }
            Statement::Directive { directive, label, at } => {
                self.process_directive(idx, directive, label, &tokens[at + 1..])
            }
        }
    }

    // ===== Shared helpers =====

    pub(crate) fn error(&self, idx: usize, kind: ErrorKind) -> AsmError {
        let line = &self.lines[idx];
        AsmError::at(line.number, &line.text, kind)
    }

    /// Bind `name` to the current location counter and patch every line
    /// that was waiting for it.
    pub(crate) fn define_symbol(&mut self, idx: usize, name: &str) -> Result<(), AsmError> {
        if !is_symbol(name) {
            return Err(self.error(idx, ErrorKind::InvalidSymbol(name.to_string())));
        }
        let addr = self.locctr;
        let pending = self
            .symbols
            .define(name, addr)
            .map_err(|_| self.error(idx, ErrorKind::RedefinedSymbol(name.to_string())))?;
        debug!(symbol = name, address = addr, pending = pending.len(), "symbol defined");
        self.resolve(pending, addr)
    }

    pub(crate) fn advance(&mut self, idx: usize, bytes: u64) -> Result<(), AsmError> {
        let next = self.locctr as u64 + bytes;
        if next > MEMORY_SIZE {
            return Err(self.error(idx, ErrorKind::ProgramTooLarge));
        }
        self.locctr = next as u32;
        Ok(())
    }
}

/// A fully assembled module, ready for the object emitter.
#[derive(Clone, Debug)]
pub struct Assembly {
    name: String,
    start_address: u32,
    length: u32,
    first_exec: u32,
    lines: Vec<Line>,
    symbols: Vec<(String, u32)>,
}

impl Assembly {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_address(&self) -> u32 {
        self.start_address
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    /// Address of the first instruction, or the start address when the
    /// module has none.
    pub fn first_executable(&self) -> u32 {
        self.first_exec
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Resolved symbols sorted by address.
    pub fn symbols(&self) -> &[(String, u32)] {
        &self.symbols
    }

    pub fn lookup(&self, name: &str) -> Option<u32> {
        self.symbols
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, addr)| *addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(src: &str) -> AssemblerSicXe {
        let mut asm = AssemblerSicXe::new();
        for line in src.lines() {
            asm.assemble_line(line).unwrap();
        }
        asm
    }

    #[test]
    fn test_start_then_instruction() {
        let asm = AssemblerSicXe::new()
            .assemble("COPY START 1000\nFIRST LDA #0\n END\n")
            .unwrap();
        assert_eq!(asm.name(), "COPY");
        assert_eq!(asm.start_address(), 0x1000);
        assert_eq!(asm.length(), 3);
        assert_eq!(asm.lookup("FIRST"), Some(0x1000));
        assert_eq!(asm.first_executable(), 0x1000);
        assert_eq!(asm.lines()[0].location, None);
        assert_eq!(asm.lines()[1].location, Some(0x1000));
        assert_eq!(asm.lines()[2].location, None);
    }

    #[test]
    fn test_comments_carry_nothing() {
        let asm = feed("P START 0\n. a comment\n\n    . indented\n RSUB\n");
        assert_eq!(asm.lines().len(), 5);
        for line in &asm.lines()[1..4] {
            assert_eq!(line.location, None);
            assert_eq!(line.width, 0);
            assert!(line.code.is_none());
        }
        assert_eq!(asm.location_counter(), 3);
    }

    #[test]
    fn test_locctr_never_decreases() {
        let src = "P START 100\nA LDA B\nB RESW 2\nC BYTE C'XYZ'\n CLEAR X\n FIX\n +JSUB A\n END\n";
        let asm = feed(src);
        let mut last = 0;
        for line in asm.lines() {
            if let Some(loc) = line.location {
                assert!(loc >= last);
                last = loc;
            }
        }
        let widths: Vec<u32> = asm.lines().iter().map(|l| l.width).collect();
        assert_eq!(widths, vec![0, 3, 0, 3, 2, 1, 4, 0]);
    }

    #[test]
    fn test_unknown_line_form() {
        let mut asm = AssemblerSicXe::new();
        let err = asm.assemble_line("HELLO WORLD").unwrap_err();
        assert_eq!(err.kind(), Some(&ErrorKind::UnknownLineForm));
        assert_eq!(err.line(), Some(1));

        let err = asm.assemble_line("LONELY").unwrap_err();
        assert_eq!(err.kind(), Some(&ErrorKind::UnknownLineForm));
    }

    #[test]
    fn test_keyword_after_two_tokens() {
        let mut asm = AssemblerSicXe::new();
        let err = asm.assemble_line("ONE TWO RESB 4").unwrap_err();
        assert!(matches!(err.kind(), Some(ErrorKind::MissingOrMisplacedLabel(_))));
    }

    #[test]
    fn test_instruction_in_label_slot() {
        for src in [
            "P START 0\n LDA RESB 4\n END\n",
            "P START 0\n LDA RESB 4\nRESB4 WORD 2\n END\n",
            "P START 0\n RSUB BYTE C'A'\n END\n",
        ] {
            let err = AssemblerSicXe::new().assemble(src).unwrap_err();
            assert!(
                matches!(err.kind(), Some(ErrorKind::MissingOrMisplacedLabel(_))),
                "{}",
                src
            );
            assert_eq!(err.line(), Some(2));
        }
    }

    #[test]
    fn test_unresolved_symbol_reported_at_first_use() {
        let err = AssemblerSicXe::new()
            .assemble("P START 0\n LDA NOWHERE\n STA NOWHERE\n END\n")
            .unwrap_err();
        assert_eq!(
            err.kind(),
            Some(&ErrorKind::UnresolvedSymbol("NOWHERE".into()))
        );
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn test_lines_after_end_are_ignored() {
        let asm = AssemblerSicXe::new()
            .assemble("P START 0\n RSUB\n END\n LDA UNDEFINED\n")
            .unwrap();
        assert_eq!(asm.length(), 3);
        assert_eq!(asm.lines().len(), 4);
        assert_eq!(asm.lines()[3].location, None);
    }

    #[test]
    fn test_symbols_sorted_by_address() {
        let asm = AssemblerSicXe::new()
            .assemble("P START 0\nZED RSUB\nALPHA RESB 1\n END\n")
            .unwrap();
        assert_eq!(
            asm.symbols(),
            &[("ZED".to_string(), 0), ("ALPHA".to_string(), 3)]
        );
    }
}
