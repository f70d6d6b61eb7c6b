//! Human-readable assembly listing (feature: "listing")

use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, Write};

use crate::assembler::Assembly;

impl Assembly {
    /// One row per source line: number, location, source, object code.
    pub fn listing(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Line  Loc    {:<40}  Object code", "Source");
        let _ = writeln!(out, "{}", "-".repeat(70));
        for line in self.lines() {
            let loc = line
                .location
                .map(|l| format!("{:05X}", l))
                .unwrap_or_default();
            let row = format!(
                "{:>4}  {:<5}  {:<40}  {}",
                line.number,
                loc,
                line.text.replace('\t', "    "),
                line.object_hex()
            );
            let _ = writeln!(out, "{}", row.trim_end());
        }
        out
    }

    pub fn print_assembly_listing(&self) {
        println!("\nAssembly Listing:");
        print!("{}", self.listing());
    }

    pub fn save_listing(&self, filename: &str) -> io::Result<()> {
        let mut f = File::create(filename)?;
        f.write_all(self.listing().as_bytes())
    }
}
