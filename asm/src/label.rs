use indexmap::IndexMap;
use serde::Serialize;

/// A named address derived from a label. The address stays `None` until
/// the defining `name:` line is reached in pass one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Symbol {
    pub name: String,
    pub address: Option<u64>,
}

/// Label table. Insertion order is kept so dumps read in source order.
#[derive(Debug, Default)]
pub struct Labels {
    map: IndexMap<String, Symbol>,
}

impl Labels {
    pub fn new() -> Self {
        Labels {
            map: IndexMap::new(),
        }
    }

    /// Make sure a symbol exists, without giving it an address. Used when
    /// a jump references a label ahead of its definition.
    pub fn declare(&mut self, name: &str) {
        if !self.map.contains_key(name) {
            self.map.insert(
                name.to_string(),
                Symbol {
                    name: name.to_string(),
                    address: None,
                },
            );
        }
    }

    pub fn define(&mut self, name: &str, address: u64) {
        self.map
            .entry(name.to_string())
            .or_insert_with(|| Symbol {
                name: name.to_string(),
                address: None,
            })
            .address = Some(address);
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.map.get(name)
    }

    pub fn address_of(&self, name: &str) -> Option<u64> {
        self.map.get(name).and_then(|s| s.address)
    }

    /// Shift every resolved symbol at or past `from` down by `delta`.
    /// Branch tightening moves everything behind a shrunk reservation.
    pub fn shift_down(&mut self, from: u64, delta: u64) {
        for symbol in self.map.values_mut() {
            if let Some(addr) = symbol.address {
                if addr >= from {
                    symbol.address = Some(addr - delta);
                }
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.map.values()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Serializable view of the resolved label table for the symbol dump.
#[derive(Debug, Serialize)]
pub struct SymbolMap {
    pub labels: IndexMap<String, SymbolEntry>,
}

#[derive(Debug, Serialize)]
pub struct SymbolEntry {
    pub addr: u64,
}

impl SymbolMap {
    pub fn generate(labels: &Labels) -> Self {
        let mut map = IndexMap::new();
        for symbol in labels.iter() {
            if let Some(addr) = symbol.address {
                map.insert(symbol.name.clone(), SymbolEntry { addr });
            }
        }
        SymbolMap { labels: map }
    }
}
