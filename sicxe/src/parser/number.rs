//! Number parsing for directive and instruction operands

use crate::error::ErrorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberFormat {
    Hexadecimal, // START address, X'..' bodies
    Decimal,     // everything else
}

pub struct NumberParser;

impl NumberParser {
    /// Parse a number in the given format. Decimal accepts a leading sign.
    pub fn parse(s: &str, format: NumberFormat) -> Result<i64, ErrorKind> {
        match format {
            NumberFormat::Hexadecimal => Self::parse_hex(s),
            NumberFormat::Decimal => Self::parse_decimal(s),
        }
    }

    /// Parse hexadecimal (no prefix)
    pub fn parse_hex(s: &str) -> Result<i64, ErrorKind> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ErrorKind::InvalidHexLiteral(trimmed.to_string()));
        }
        i64::from_str_radix(trimmed, 16).map_err(|_| ErrorKind::InvalidHexLiteral(trimmed.to_string()))
    }

    /// Parse decimal
    pub fn parse_decimal(s: &str) -> Result<i64, ErrorKind> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix(['-', '+']).unwrap_or(trimmed);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(ErrorKind::InvalidDecimal(trimmed.to_string()));
        }
        trimmed
            .parse::<i64>()
            .map_err(|_| ErrorKind::InvalidDecimal(trimmed.to_string()))
    }

    /// Whether an operand is a decimal literal (optionally signed) rather
    /// than a symbol.
    pub fn is_decimal(s: &str) -> bool {
        let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
        !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex() {
        assert_eq!(NumberParser::parse("1000", NumberFormat::Hexadecimal), Ok(0x1000));
        assert_eq!(NumberParser::parse_hex("ff"), Ok(255));
        assert_eq!(NumberParser::parse_hex("FFFFF"), Ok(0xFFFFF));
        assert_eq!(
            NumberParser::parse_hex("10G0"),
            Err(ErrorKind::InvalidHexLiteral("10G0".into()))
        );
        assert!(NumberParser::parse_hex("").is_err());
        assert!(NumberParser::parse_hex("-1").is_err());
    }

    #[test]
    fn test_decimal() {
        assert_eq!(NumberParser::parse("4096", NumberFormat::Decimal), Ok(4096));
        assert_eq!(NumberParser::parse_decimal("-1"), Ok(-1));
        assert_eq!(NumberParser::parse_decimal("+7"), Ok(7));
        assert_eq!(
            NumberParser::parse_decimal("12A"),
            Err(ErrorKind::InvalidDecimal("12A".into()))
        );
        assert!(NumberParser::parse_decimal("-").is_err());
    }

    #[test]
    fn test_decimal_detection() {
        assert!(NumberParser::is_decimal("0"));
        assert!(NumberParser::is_decimal("4096"));
        assert!(!NumberParser::is_decimal("LENGTH"));
        assert!(!NumberParser::is_decimal("1A"));
        assert!(!NumberParser::is_decimal(""));
        assert!(NumberParser::is_decimal("-1"));
        assert!(NumberParser::is_decimal("+12"));
        assert!(!NumberParser::is_decimal("-"));
    }
}
