//! One source line and the code assembled for it

/// Object code of a line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ObjectCode {
    /// An instruction or WORD value, right-aligned in `width` bytes.
    Word(u32),
    /// Raw data from BYTE.
    Bytes(Vec<u8>),
}

#[derive(Clone, Debug)]
pub struct Line {
    /// File-relative line number, starting at 1.
    pub number: usize,
    pub text: String,
    pub tokens: Vec<String>,
    /// None for comments and non-allocating directives.
    pub location: Option<u32>,
    pub code: Option<ObjectCode>,
    /// Bytes of object code, 0 for lines without code.
    pub width: u32,
    /// Base symbol in effect when the line was assembled.
    pub base: Option<String>,
    /// Needs a modification record.
    pub relocatable: bool,
}

impl Line {
    pub fn new(number: usize, text: &str, tokens: Vec<String>) -> Self {
        Self {
            number,
            text: text.to_string(),
            tokens,
            location: None,
            code: None,
            width: 0,
            base: None,
            relocatable: false,
        }
    }

    /// The instruction word, for lines whose code is a `Word`.
    pub fn word(&self) -> Option<u32> {
        match self.code {
            Some(ObjectCode::Word(w)) => Some(w),
            _ => None,
        }
    }

    pub(crate) fn or_word(&mut self, bits: u32) {
        if let Some(ObjectCode::Word(w)) = self.code.as_mut() {
            *w |= bits;
        }
    }

    /// Object code as big-endian bytes.
    pub fn object_bytes(&self) -> Vec<u8> {
        match &self.code {
            Some(ObjectCode::Word(w)) => {
                let width = self.width.min(4) as usize;
                w.to_be_bytes()[4 - width..].to_vec()
            }
            Some(ObjectCode::Bytes(b)) => b.clone(),
            None => Vec::new(),
        }
    }

    /// Object code as upper-case hex, empty when the line has none.
    pub fn object_hex(&self) -> String {
        self.object_bytes().iter().map(|b| format!("{:02X}", b)).collect()
    }
}
