//! Parser module for assembly source

pub mod lexer;
pub mod number;

pub use lexer::{is_comment, is_symbol, operand_text, split_operands, tokenize};
pub use number::{NumberFormat, NumberParser};
