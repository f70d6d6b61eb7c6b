//! Symbol table with forward-reference bookkeeping

use std::collections::HashMap;

/// How a deferred reference patches its line once the symbol resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixup {
    /// The symbol is the line's operand target.
    Operand,
    /// The symbol is the base register the line needs; `target` is the
    /// operand address the displacement is computed for.
    Base { target: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRef {
    /// Index of the referencing line.
    pub line: usize,
    pub symbol: String,
    pub fixup: Fixup,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolState {
    Resolved(u32),
    Pending(Vec<PendingRef>),
}

/// The symbol was already resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redefined;

#[derive(Debug)]
pub struct SymbolTable {
    entries: HashMap<String, SymbolState>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Bind `name` to `addr`. Any references queued while the name was
    /// pending are handed back in insertion order for the caller to patch.
    pub fn define(&mut self, name: &str, addr: u32) -> Result<Vec<PendingRef>, Redefined> {
        match self.entries.insert(name.to_string(), SymbolState::Resolved(addr)) {
            None => Ok(Vec::new()),
            Some(SymbolState::Pending(refs)) => Ok(refs),
            Some(previous @ SymbolState::Resolved(_)) => {
                self.entries.insert(name.to_string(), previous);
                Err(Redefined)
            }
        }
    }

    /// Resolve `name` for `line`, or queue the reference if the name is not
    /// defined yet.
    pub fn reference(&mut self, name: &str, line: usize, fixup: Fixup) -> Option<u32> {
        let pending = PendingRef {
            line,
            symbol: name.to_string(),
            fixup,
        };
        match self.entries.get_mut(name) {
            Some(SymbolState::Resolved(addr)) => Some(*addr),
            Some(SymbolState::Pending(refs)) => {
                refs.push(pending);
                None
            }
            None => {
                self.entries
                    .insert(name.to_string(), SymbolState::Pending(vec![pending]));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        match self.entries.get(name) {
            Some(SymbolState::Resolved(addr)) => Some(*addr),
            _ => None,
        }
    }

    /// The pending reference with the lowest line index, if any name is
    /// still unresolved.
    pub fn first_unresolved(&self) -> Option<&PendingRef> {
        self.entries
            .values()
            .filter_map(|state| match state {
                SymbolState::Pending(refs) => refs.first(),
                SymbolState::Resolved(_) => None,
            })
            .min_by(|a, b| a.line.cmp(&b.line).then_with(|| a.symbol.cmp(&b.symbol)))
    }

    /// Every resolved symbol.
    pub fn labels(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().filter_map(|(name, state)| match state {
            SymbolState::Resolved(addr) => Some((name.as_str(), *addr)),
            SymbolState::Pending(_) => None,
        })
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
