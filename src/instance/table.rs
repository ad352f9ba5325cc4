//! Immutable parameter tables keyed by index tuples.
use anyhow::{Result, bail};
use indexmap::IndexMap;
use std::fmt::Debug;
use std::hash::Hash;

/// A named parameter table.
///
/// Lookups of keys which are not present fail with an error naming the table and the key, so that
/// mismatched index sets are caught as soon as the model is formulated.
#[derive(Debug, Clone)]
pub struct Table<K, V> {
    name: &'static str,
    values: IndexMap<K, V>,
}

impl<K, V> Table<K, V>
where
    K: Hash + Eq + Debug,
    V: Copy,
{
    /// Create an empty table with the given name
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            values: IndexMap::new(),
        }
    }

    /// Add a value to the table. Each key may only be added once.
    pub fn insert(&mut self, key: K, value: V) -> Result<()> {
        if self.values.contains_key(&key) {
            bail!("Duplicate entry in `{}` for key {key:?}", self.name);
        }
        self.values.insert(key, value);

        Ok(())
    }

    /// Look up the value for `key`
    pub fn get(&self, key: &K) -> Result<V> {
        match self.values.get(key) {
            Some(value) => Ok(*value),
            None => bail!("No entry in `{}` for key {key:?}", self.name),
        }
    }

    /// Iterate over entries in insertion order
    pub fn iter(&self) -> indexmap::map::Iter<'_, K, V> {
        self.values.iter()
    }

    /// The number of entries
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the table has no entries
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> PartialEq for Table<K, V>
where
    K: Hash + Eq,
    V: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.values == other.values
    }
}

impl<'a, K, V> IntoIterator for &'a Table<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = indexmap::map::Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut table = Table::new("price");
        table.insert(("a", 1), 2.0).unwrap();
        table.insert(("a", 2), 3.0).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&("a", 2)).unwrap(), 3.0);
    }

    #[test]
    fn test_eq() {
        let mut table1 = Table::new("price");
        table1.insert(("a", 1), 2.0).unwrap();
        let mut table2 = Table::new("price");
        table2.insert(("a", 1), 2.0).unwrap();
        assert_eq!(table1, table2);

        table2.insert(("a", 2), 2.0).unwrap();
        assert_ne!(table1, table2);

        let mut table3 = Table::new("cost");
        table3.insert(("a", 1), 2.0).unwrap();
        assert_ne!(table1, table3);
    }

    #[test]
    fn test_duplicate_key() {
        let mut table = Table::new("price");
        table.insert("a", 1.0).unwrap();
        assert_eq!(
            table.insert("a", 2.0).unwrap_err().to_string(),
            "Duplicate entry in `price` for key \"a\""
        );
    }

    #[test]
    fn test_missing_key() {
        let table: Table<(&str, usize), f64> = Table::new("demand");
        assert_eq!(
            table.get(&("x", 3)).unwrap_err().to_string(),
            "No entry in `demand` for key (\"x\", 3)"
        );
    }
}
