//! Error types for the assembler

use thiserror::Error;

/// Why a module failed to assemble.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("Multiple START detected.")]
    MultipleStart,
    #[error("START must precede every other statement.")]
    MisplacedStart,
    #[error("{0}")]
    MissingOrMisplacedLabel(String),
    #[error("Program name '{0}' is longer than 6 characters.")]
    NameTooLong(String),
    #[error("{0} is an invalid hexadecimal value.")]
    InvalidHexLiteral(String),
    #[error("{0} is an invalid decimal value.")]
    InvalidDecimal(String),
    #[error("Malformed literal {0}.")]
    MalformedLiteral(String),
    #[error("{0} requires an operand.")]
    MissingOperand(&'static str),
    #[error("Symbol '{0}' is already defined.")]
    RedefinedSymbol(String),
    #[error("Symbol '{0}' is never defined.")]
    UnresolvedSymbol(String),
    #[error("'{0}' is neither a decimal literal nor a valid symbol name.")]
    InvalidSymbol(String),
    #[error("Unrecognized addressing prefix '{0}'.")]
    UnrecognizedPrefix(char),
    #[error("{0} does not support format 4.")]
    UnsupportedFormat4(String),
    #[error("{0}")]
    OperandCountMismatch(String),
    #[error("Unknown register '{0}'.")]
    UnknownRegister(String),
    #[error(
        "Displacement to {target:05X} fits neither PC-relative nor base-relative addressing, use format 4 (+) instead."
    )]
    DisplacementOverflow { target: u32 },
    #[error("Operand {value} is out of range (limit {limit}).")]
    OperandOutOfRange { value: i64, limit: i64 },
    #[error("Location counter exceeds the 20-bit address space.")]
    ProgramTooLarge,
    #[error("Expect a directive, opcode or label.")]
    UnknownLineForm,
}

#[derive(Debug, Error)]
pub enum AsmError {
    #[error("Assembly error at line {line}: {kind}\n    {text}")]
    Asm {
        line: usize,
        text: String,
        kind: ErrorKind,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AsmError {
    pub(crate) fn at(line: usize, text: &str, kind: ErrorKind) -> Self {
        AsmError::Asm {
            line,
            text: text.to_string(),
            kind,
        }
    }

    /// The assembly failure, if this is not an I/O error.
    pub fn kind(&self) -> Option<&ErrorKind> {
        match self {
            AsmError::Asm { kind, .. } => Some(kind),
            AsmError::Io(_) => None,
        }
    }

    /// File-relative line number of the offending source line.
    pub fn line(&self) -> Option<usize> {
        match self {
            AsmError::Asm { line, .. } => Some(*line),
            AsmError::Io(_) => None,
        }
    }
}
