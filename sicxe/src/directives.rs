//! Assembler directives: START, END, BYTE, WORD, RESB, RESW, BASE, NOBASE

use tracing::debug;

use crate::assembler::{AssemblerSicXe, MEMORY_SIZE};
use crate::error::{AsmError, ErrorKind};
use crate::line::ObjectCode;
use crate::parser::{operand_text, NumberFormat, NumberParser};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Directive {
    Start,
    End,
    Byte,
    Word,
    Resb,
    Resw,
    Base,
    NoBase,
}

impl Directive {
    pub fn lookup(token: &str) -> Option<Self> {
        match token {
            "START" => Some(Directive::Start),
            "END" => Some(Directive::End),
            "BYTE" => Some(Directive::Byte),
            "WORD" => Some(Directive::Word),
            "RESB" => Some(Directive::Resb),
            "RESW" => Some(Directive::Resw),
            "BASE" => Some(Directive::Base),
            "NOBASE" => Some(Directive::NoBase),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Directive::Start => "START",
            Directive::End => "END",
            Directive::Byte => "BYTE",
            Directive::Word => "WORD",
            Directive::Resb => "RESB",
            Directive::Resw => "RESW",
            Directive::Base => "BASE",
            Directive::NoBase => "NOBASE",
        }
    }
}

/// Largest and smallest values a 3-byte WORD holds.
const WORD_MIN: i64 = -(1 << 23);
const WORD_LIMIT: i64 = 1 << 24;

/// Decode the operand of BYTE: `C'text'` or `X'hex'`.
pub fn parse_byte_literal(operand: &str) -> Result<Vec<u8>, ErrorKind> {
    let quoted = |prefix: &str| {
        operand
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_suffix('\''))
    };

    if let Some(body) = quoted("C'") {
        if body.is_empty() || !body.is_ascii() {
            return Err(ErrorKind::MalformedLiteral(operand.to_string()));
        }
        return Ok(body.bytes().collect());
    }

    if let Some(body) = quoted("X'") {
        let digits: Option<Vec<u8>> = body
            .chars()
            .map(|c| c.to_digit(16).map(|d| d as u8))
            .collect();
        return match digits {
            Some(d) if !d.is_empty() && d.len() % 2 == 0 => {
                Ok(d.chunks(2).map(|pair| (pair[0] << 4) | pair[1]).collect())
            }
            _ => Err(ErrorKind::InvalidHexLiteral(body.to_string())),
        };
    }

    Err(ErrorKind::MalformedLiteral(operand.to_string()))
}

impl AssemblerSicXe {
    pub(crate) fn process_directive(
        &mut self,
        idx: usize,
        directive: Directive,
        label: Option<String>,
        operands: &[String],
    ) -> Result<(), AsmError> {
        match directive {
            Directive::Start => self.handle_start(idx, label, operands),
            Directive::End => self.handle_end(idx, label),
            Directive::Byte => self.handle_byte(idx, label),
            Directive::Word => self.handle_word(idx, label, operands),
            Directive::Resb => self.handle_reserve(idx, directive, label, operands, 1),
            Directive::Resw => self.handle_reserve(idx, directive, label, operands, 3),
            Directive::Base => self.handle_base(idx, label, operands),
            Directive::NoBase => self.handle_nobase(idx, label, operands),
        }
    }

    fn handle_start(
        &mut self,
        idx: usize,
        label: Option<String>,
        operands: &[String],
    ) -> Result<(), AsmError> {
        if self.started {
            return Err(self.error(idx, ErrorKind::MultipleStart));
        }
        if self.seen_statement {
            return Err(self.error(idx, ErrorKind::MisplacedStart));
        }
        let name = label.ok_or_else(|| {
            self.error(
                idx,
                ErrorKind::MissingOrMisplacedLabel(
                    "Must specify a name for program before START.".into(),
                ),
            )
        })?;
        if name.chars().count() > 6 {
            return Err(self.error(idx, ErrorKind::NameTooLong(name)));
        }
        let operand = self.single_operand(idx, Directive::Start, operands)?;
        let addr = NumberParser::parse(&operand, NumberFormat::Hexadecimal)
            .map_err(|k| self.error(idx, k))?;
        if addr >= MEMORY_SIZE as i64 {
            return Err(self.error(
                idx,
                ErrorKind::OperandOutOfRange { value: addr, limit: MEMORY_SIZE as i64 },
            ));
        }

        debug!(program = %name, start = addr, "program started");
        self.name = name;
        self.start_address = addr as u32;
        self.locctr = addr as u32;
        self.started = true;
        Ok(())
    }

    fn handle_end(&mut self, idx: usize, label: Option<String>) -> Result<(), AsmError> {
        self.reject_label(idx, Directive::End, label)?;
        if let Some(entry) = operand_text(&self.lines[idx].text, 1) {
            debug!(entry = %entry, "END operand ignored, entry is the first instruction");
        }
        self.ended = true;
        Ok(())
    }

    fn handle_byte(&mut self, idx: usize, label: Option<String>) -> Result<(), AsmError> {
        let label = self.require_label(idx, label)?;
        // Raw text: spacing inside C'..' is significant.
        let operand = operand_text(&self.lines[idx].text, 2)
            .ok_or_else(|| self.error(idx, ErrorKind::MissingOperand("BYTE")))?;
        let bytes = parse_byte_literal(operand).map_err(|k| self.error(idx, k))?;

        self.define_symbol(idx, &label)?;
        let width = bytes.len() as u32;
        let line = &mut self.lines[idx];
        line.location = Some(self.locctr);
        line.width = width;
        line.code = Some(ObjectCode::Bytes(bytes));
        self.advance(idx, width as u64)
    }

    fn handle_word(
        &mut self,
        idx: usize,
        label: Option<String>,
        operands: &[String],
    ) -> Result<(), AsmError> {
        let label = self.require_label(idx, label)?;
        let operand = self.single_operand(idx, Directive::Word, operands)?;
        let value = NumberParser::parse(&operand, NumberFormat::Decimal)
            .map_err(|k| self.error(idx, k))?;
        if !(WORD_MIN..WORD_LIMIT).contains(&value) {
            return Err(self.error(
                idx,
                ErrorKind::OperandOutOfRange { value, limit: WORD_LIMIT },
            ));
        }

        self.define_symbol(idx, &label)?;
        let line = &mut self.lines[idx];
        line.location = Some(self.locctr);
        line.width = 3;
        line.code = Some(ObjectCode::Word(value as u32 & 0xFF_FFFF));
        self.advance(idx, 3)
    }

    fn handle_reserve(
        &mut self,
        idx: usize,
        directive: Directive,
        label: Option<String>,
        operands: &[String],
        unit: u64,
    ) -> Result<(), AsmError> {
        let label = self.require_label(idx, label)?;
        let operand = self.single_operand(idx, directive, operands)?;
        let count = NumberParser::parse_decimal(&operand).map_err(|k| self.error(idx, k))?;
        if !(0..MEMORY_SIZE as i64).contains(&count) {
            return Err(self.error(
                idx,
                ErrorKind::OperandOutOfRange { value: count, limit: MEMORY_SIZE as i64 },
            ));
        }

        self.define_symbol(idx, &label)?;
        self.lines[idx].location = Some(self.locctr);
        self.advance(idx, count as u64 * unit)
    }

    fn handle_base(
        &mut self,
        idx: usize,
        label: Option<String>,
        operands: &[String],
    ) -> Result<(), AsmError> {
        self.reject_label(idx, Directive::Base, label)?;
        let symbol = self.single_operand(idx, Directive::Base, operands)?;
        debug!(base = %symbol, "base register bound");
        self.base = Some(symbol);
        Ok(())
    }

    fn handle_nobase(
        &mut self,
        idx: usize,
        label: Option<String>,
        operands: &[String],
    ) -> Result<(), AsmError> {
        self.reject_label(idx, Directive::NoBase, label)?;
        if !operands.is_empty() {
            return Err(self.error(
                idx,
                ErrorKind::OperandCountMismatch("NOBASE takes no operand.".into()),
            ));
        }
        self.base = None;
        Ok(())
    }

    // ===== Helpers =====

    fn require_label(&self, idx: usize, label: Option<String>) -> Result<String, AsmError> {
        label.ok_or_else(|| {
            self.error(
                idx,
                ErrorKind::MissingOrMisplacedLabel(
                    "Must specify a label for the allocated space.".into(),
                ),
            )
        })
    }

    fn reject_label(
        &self,
        idx: usize,
        directive: Directive,
        label: Option<String>,
    ) -> Result<(), AsmError> {
        match label {
            None => Ok(()),
            Some(label) => Err(self.error(
                idx,
                ErrorKind::MissingOrMisplacedLabel(format!(
                    "{} does not take a label, found '{}'.",
                    directive.name(),
                    label
                )),
            )),
        }
    }

    fn single_operand(
        &self,
        idx: usize,
        directive: Directive,
        operands: &[String],
    ) -> Result<String, AsmError> {
        match operands {
            [] => Err(self.error(idx, ErrorKind::MissingOperand(directive.name()))),
            [operand] => Ok(operand.clone()),
            _ => Err(self.error(
                idx,
                ErrorKind::OperandCountMismatch(format!(
                    "{} takes a single operand.",
                    directive.name()
                )),
            )),
        }
    }
}
