//! Model symbol table and phoneme id encoding.

use std::collections::HashMap;

use crate::config::ModelConfig;

/// Id placed before every real symbol id.
pub const BLANK_ID: i64 = 0;

/// Ordered model vocabulary. A symbol's id is its position in the
/// configured `symbols` list.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: Vec<String>,
    ids: HashMap<char, i64>,
}

impl SymbolTable {
    /// Build the lookup from an ordered symbol list.
    ///
    /// Only single-character symbols can ever match input text; longer
    /// entries still occupy their index. A repeated symbol maps to its
    /// last position.
    pub fn new(symbols: Vec<String>) -> Self {
        let mut ids = HashMap::with_capacity(symbols.len());
        for (index, symbol) in symbols.iter().enumerate() {
            let mut chars = symbol.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => {
                    if ids.insert(ch, index as i64).is_some() {
                        log::debug!("Symbol {symbol:?} listed more than once, using id {index}");
                    }
                }
                _ => log::debug!("Symbol {symbol:?} at {index} is not a single character"),
            }
        }
        Self { symbols, ids }
    }

    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(config.symbols.clone())
    }

    pub fn id(&self, ch: char) -> Option<i64> {
        self.ids.get(&ch).copied()
    }

    pub fn symbol(&self, id: i64) -> Option<&str> {
        usize::try_from(id)
            .ok()
            .and_then(|index| self.symbols.get(index))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Map each character of normalized text to its id.
    ///
    /// Characters missing from the table are silently dropped.
    pub fn to_ids(&self, text: &str) -> Vec<i64> {
        let mut ids = Vec::with_capacity(text.len());
        for ch in text.chars() {
            match self.id(ch) {
                Some(id) => ids.push(id),
                None => log::trace!("Dropping {ch:?}: not in symbol table"),
            }
        }
        ids
    }

    /// Encode normalized text into the model's input id sequence.
    ///
    /// The result is always blank-interleaved, twice as long as the
    /// number of mapped characters.
    pub fn encode(&self, text: &str) -> Vec<i64> {
        intersperse_blank(&self.to_ids(text))
    }
}

/// Place [`BLANK_ID`] before every id: `[0, a, 0, b, 0, c]`.
pub fn intersperse_blank(ids: &[i64]) -> Vec<i64> {
    let mut padded = Vec::with_capacity(ids.len() * 2);
    for &id in ids {
        padded.push(BLANK_ID);
        padded.push(id);
    }
    padded
}
