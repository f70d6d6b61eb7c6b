//! Line tokenizer for assembly source

use crate::error::ErrorKind;

/// Blank lines and lines starting with `.` carry no code.
pub fn is_comment(line: &str) -> bool {
    let l = line.trim_start();
    l.is_empty() || l.starts_with('.')
}

/// Whitespace-separated tokens of a line
pub fn tokenize(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

/// Split the operand tokens of an instruction on commas.
/// `A,S`, `A, S` and `A ,S` all give `["A", "S"]`. Tokens are only merged
/// across a comma; `ALPHA BETA` is two operands with no separator and fails.
pub fn split_operands(tokens: &[String]) -> Result<Vec<String>, ErrorKind> {
    let Some((first, rest)) = tokens.split_first() else {
        return Ok(Vec::new());
    };
    let mut joined = first.clone();
    for token in rest {
        if !joined.ends_with(',') && !token.starts_with(',') {
            return Err(ErrorKind::OperandCountMismatch(format!(
                "Unexpected '{}' after '{}', operands are separated by commas.",
                token, joined
            )));
        }
        joined.push_str(token);
    }
    let operands: Vec<String> = joined.split(',').map(str::to_string).collect();
    if operands.iter().any(|o| o.is_empty()) {
        return Err(ErrorKind::OperandCountMismatch(format!(
            "Empty operand in '{}'.",
            joined
        )));
    }
    Ok(operands)
}

/// Raw text of a line after its first `skip` tokens, trimmed at both ends.
/// Whitespace inside the operand (`C'A  B'`) is kept as written.
pub fn operand_text(line: &str, skip: usize) -> Option<&str> {
    let mut rest = line;
    for _ in 0..skip {
        rest = rest.trim_start();
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        rest = &rest[end..];
    }
    let rest = rest.trim();
    (!rest.is_empty()).then_some(rest)
}

/// Symbol names start with a letter and continue with letters or digits.
pub fn is_symbol(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric())
}
