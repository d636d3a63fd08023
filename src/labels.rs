use std::fmt;

use fxhash::FxBuildHasher;
use indexmap::IndexMap;

use crate::{error::LabelError, symbol::Addr};

// Symbol table of label -> statement address
type FxMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Label table built by the translator. Bindings are never overwritten or removed, except by
/// [`LabelTable::reset`] at the start of a new translation.
#[derive(Clone, Default, Debug)]
pub struct LabelTable {
    labels: FxMap<String, Addr>,
}

impl LabelTable {
    pub fn new() -> Self {
        LabelTable {
            labels: IndexMap::with_hasher(FxBuildHasher::default()),
        }
    }

    /// Bind `name` to `addr`. Error if the name is already bound, whatever its address.
    pub fn add_label(&mut self, name: &str, addr: Addr) -> Result<(), LabelError> {
        if self.labels.contains_key(name) {
            return Err(LabelError::Duplicate {
                name: name.to_string(),
            });
        }
        self.labels.insert(name.to_string(), addr);
        Ok(())
    }

    pub fn get_address(&self, name: &str) -> Result<Addr, LabelError> {
        self.labels
            .get(name)
            .copied()
            .ok_or_else(|| LabelError::Unknown {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.labels.contains_key(name)
    }

    pub fn reset(&mut self) {
        self.labels.clear();
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Bindings in the order they were added.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Addr)> {
        self.labels.iter().map(|(name, addr)| (name.as_str(), *addr))
    }
}

impl PartialEq for LabelTable {
    fn eq(&self, other: &Self) -> bool {
        self.labels == other.labels
    }
}

impl Eq for LabelTable {}

impl fmt::Display for LabelTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, addr)) in self.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{name} -> {addr}")?;
        }
        Ok(())
    }
}
