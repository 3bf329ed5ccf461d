//! Symbol tables mapping tech/module keys to single-character codes.
//!
//! Codes are handed out in first-seen order while the encoder walks the grid.
//! The table travels with the token as `key:code` pairs so the decoder can
//! invert it without prior knowledge.

use rustc_hash::FxHashMap;

use crate::error::EncodeError;
use crate::limits::{
    is_reserved_code, FIELD_DELIMITER, MODULE_CODE_START, TABLE_ENTRY_DELIMITER,
    TABLE_PAIR_DELIMITER, TECH_CODE_START,
};

/// Which code space a table allocates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolSpace {
    /// Tech keys, starting at U+0003.
    Tech,
    /// Module keys, starting at `A`.
    Module,
}

impl SymbolSpace {
    /// First code point of this space.
    pub fn first_code(self) -> u32 {
        match self {
            SymbolSpace::Tech => TECH_CODE_START,
            SymbolSpace::Module => MODULE_CODE_START,
        }
    }

    /// Field name used in errors and logs.
    pub fn name(self) -> &'static str {
        match self {
            SymbolSpace::Tech => "tech",
            SymbolSpace::Module => "module",
        }
    }
}

/// Allocates codes for keys during encoding.
#[derive(Debug, Clone)]
pub struct SymbolTableBuilder {
    space: SymbolSpace,
    next: u32,
    entries: Vec<(String, char)>,
    codes: FxHashMap<String, char>,
}

impl SymbolTableBuilder {
    /// Creates an empty builder for the given space.
    pub fn new(space: SymbolSpace) -> Self {
        Self {
            space,
            next: space.first_code(),
            entries: Vec::new(),
            codes: FxHashMap::default(),
        }
    }

    /// Returns the code for `key`, allocating the next free one if the key
    /// has not been seen yet.
    ///
    /// Keys must be non-empty and free of `|` and `,`; anything else would
    /// not survive the table's wire form.
    pub fn code_for(&mut self, key: &str) -> Result<char, EncodeError> {
        if let Some(&code) = self.codes.get(key) {
            return Ok(code);
        }
        if !is_valid_key(key) {
            return Err(EncodeError::InvalidKey {
                space: self.space.name(),
                key: key.to_string(),
            });
        }
        let code = self.allocate()?;
        self.entries.push((key.to_string(), code));
        self.codes.insert(key.to_string(), code);
        Ok(code)
    }

    /// Finishes the table (consumes the builder).
    pub fn build(self) -> SymbolTable {
        SymbolTable::from_entries(self.entries)
    }

    fn allocate(&mut self) -> Result<char, EncodeError> {
        while self.next <= char::MAX as u32 {
            let candidate = char::from_u32(self.next);
            self.next += 1;
            // from_u32 rejects the surrogate block; skip it like a reserved code.
            if let Some(c) = candidate.filter(|&c| !is_reserved_code(c)) {
                return Ok(c);
            }
        }
        Err(EncodeError::CodesExhausted {
            space: self.space.name(),
        })
    }
}

/// Returns true if `key` can be written as the key half of a table entry.
///
/// A `:` inside the key is fine since entries split at their last `:`.
fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && !key.contains([FIELD_DELIMITER, TABLE_ENTRY_DELIMITER])
}

/// A finished symbol table with lookups in both directions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolTable {
    entries: Vec<(String, char)>,
    keys: FxHashMap<char, usize>,
}

impl SymbolTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    fn from_entries(entries: Vec<(String, char)>) -> Self {
        let keys = entries
            .iter()
            .enumerate()
            .map(|(i, (_, code))| (*code, i))
            .collect();
        Self { entries, keys }
    }

    /// Parses the wire form `key:code,key:code,...`.
    ///
    /// Entries without a separator, with an empty key, or whose code is not
    /// exactly one character are skipped. When a code repeats, the first
    /// entry wins.
    pub fn parse(wire: &str) -> Self {
        let mut entries = Vec::new();
        let mut keys = FxHashMap::default();
        for entry in wire.split(TABLE_ENTRY_DELIMITER).filter(|e| !e.is_empty()) {
            let Some((key, code)) = entry.rsplit_once(TABLE_PAIR_DELIMITER) else {
                log::debug!("skipping symbol table entry without separator: {entry:?}");
                continue;
            };
            let mut chars = code.chars();
            let (Some(code), None) = (chars.next(), chars.next()) else {
                log::debug!("skipping symbol table entry with bad code: {entry:?}");
                continue;
            };
            if key.is_empty() || keys.contains_key(&code) {
                log::debug!("skipping symbol table entry: {entry:?}");
                continue;
            }
            keys.insert(code, entries.len());
            entries.push((key.to_string(), code));
        }
        Self { entries, keys }
    }

    /// Serializes to the wire form. An empty table yields an empty string.
    pub fn to_wire(&self) -> String {
        let mut out = String::new();
        for (i, (key, code)) in self.entries.iter().enumerate() {
            if i > 0 {
                out.push(TABLE_ENTRY_DELIMITER);
            }
            out.push_str(key);
            out.push(TABLE_PAIR_DELIMITER);
            out.push(*code);
        }
        out
    }

    /// Looks up the key for a code.
    pub fn key(&self, code: char) -> Option<&str> {
        self.keys
            .get(&code)
            .map(|&i| self.entries[i].0.as_str())
    }

    /// Looks up the code for a key.
    pub fn code(&self, key: &str) -> Option<char> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, code)| *code)
    }

    /// Entries in allocation order.
    pub fn entries(&self) -> &[(String, char)] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
