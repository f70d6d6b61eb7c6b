//! Object program records (H/T/M/E)

use std::fmt;
use std::io::{self, Write};

use crate::assembler::Assembly;

/// Most bytes of object code a single text record holds.
pub const MAX_TEXT_BYTES: usize = 30;

/// Half-bytes patched by a format 4 modification record.
const FORMAT4_HALF_BYTES: u8 = 5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Record {
    Header { name: String, start: u32, length: u32 },
    Text { start: u32, bytes: Vec<u8> },
    Modification { address: u32, half_bytes: u8 },
    End { first: u32 },
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Record::Header { name, start, length } => {
                let name: String = name.chars().take(6).collect();
                write!(f, "H{:<6}{:06X}{:06X}", name, start, length)
            }
            Record::Text { start, bytes } => {
                write!(f, "T{:06X}{:02X}", start, bytes.len())?;
                bytes.iter().try_for_each(|b| write!(f, "{:02X}", b))
            }
            Record::Modification { address, half_bytes } => {
                write!(f, "M{:06X}{:02X}", address, half_bytes)
            }
            Record::End { first } => write!(f, "E{:06X}", first),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectProgram {
    records: Vec<Record>,
}

impl ObjectProgram {
    /// Lay out the records of a finished module.
    pub fn from_assembly(assembly: &Assembly) -> Self {
        let mut records = vec![Record::Header {
            name: assembly.name().to_string(),
            start: assembly.start_address(),
            length: assembly.length(),
        }];

        let mut text: Option<(u32, Vec<u8>)> = None;
        for line in assembly.lines() {
            let Some(mut addr) = line.location else { continue };
            let bytes = line.object_bytes();
            let mut rest = bytes.as_slice();
            while !rest.is_empty() {
                let fits = match &text {
                    Some((start, run)) => {
                        *start + run.len() as u32 == addr && run.len() < MAX_TEXT_BYTES
                            && (run.len() + rest.len() <= MAX_TEXT_BYTES
                                || rest.len() > MAX_TEXT_BYTES)
                    }
                    None => false,
                };
                if !fits {
                    if let Some((start, run)) = text.take() {
                        records.push(Record::Text { start, bytes: run });
                    }
                    text = Some((addr, Vec::new()));
                }
                if let Some((_, run)) = text.as_mut() {
                    let take = rest.len().min(MAX_TEXT_BYTES - run.len());
                    run.extend_from_slice(&rest[..take]);
                    rest = &rest[take..];
                    addr += take as u32;
                }
            }
        }
        if let Some((start, run)) = text {
            records.push(Record::Text { start, bytes: run });
        }

        records.extend(
            assembly
                .lines()
                .iter()
                .filter(|line| line.relocatable)
                .filter_map(|line| line.location)
                .map(|location| Record::Modification {
                    address: location + 1,
                    half_bytes: FORMAT4_HALF_BYTES,
                }),
        );
        records.push(Record::End { first: assembly.first_executable() });

        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn write_to<W: Write>(&self, mut w: W) -> io::Result<()> {
        write!(w, "{}", self)
    }
}

impl fmt::Display for ObjectProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for record in &self.records {
            writeln!(f, "{}", record)?;
        }
        Ok(())
    }
}
