//! SIC/XE assembler producing relocatable object programs, with optional
//! human-readable listing (feature: "listing")
//! - Single pass: symbols used before their definition are queued and patched
//!   the moment the definition is seen
//! - Formats 1 to 4, with `+` requesting the extended format
//! - Addressing: simple, immediate (`#`), indirect (`@`), indexed (`,X`);
//!   format 3 targets are encoded PC-relative, or base-relative after `BASE`
//!
//! ## Features
//! - **Directives**:
//!   - `name START addr`: program name and hexadecimal load address.
//!   - `END`: end of source.
//!   - `label BYTE C'text'` / `label BYTE X'hex'`: define bytes.
//!   - `label WORD n`: define a 3-byte word.
//!   - `label RESB n` / `label RESW n`: reserve bytes / words.
//!   - `BASE sym` / `NOBASE`: bind or clear the base register.
//! - **Object records**: header, text, modification and end records in the
//!   classic SIC/XE loader format.
//!
//! ## Optional Features
//! - `listing`: enables functions to print and save human-readable assembly listings.
//!
//! ## Basic Usage
//! ```rust
//! use sicxe::{assemble, ObjectProgram};
//!
//! fn main() -> Result<(), sicxe::AsmError> {
//!     let src = "COPY  START 1000\nFIRST LDA   #0\n      END   FIRST\n";
//!
//!     let assembly = assemble(src)?;
//!     let object = ObjectProgram::from_assembly(&assembly);
//!     assert_eq!(object.to_string(), "HCOPY  001000000003\nT00100003010000\nE001000\n");
//!     Ok(())
//! }
//! ```
//!
//! ## License
//! This project is released under [The Unlicense](https://unlicense.org/).
//! You are free to use it for any purpose, without restriction.

mod addressing;
mod assembler;
mod directives;
mod encoder;
mod error;
mod line;
#[cfg(feature = "listing")]
mod listing;
mod object;
mod opcodes;
mod parser;
mod resolver;
mod symbol;

// Public exports
pub use assembler::{AssemblerSicXe, Assembly};
pub use error::{AsmError, ErrorKind};
pub use line::{Line, ObjectCode};
pub use object::{ObjectProgram, Record, MAX_TEXT_BYTES};

/// Assemble one module from its full source text.
pub fn assemble(src: &str) -> Result<Assembly, AsmError> {
    AssemblerSicXe::new().assemble(src)
}
