//! Case-insensitive, order-preserving map.
use std::collections::HashMap;

fn fold(key: &str) -> String {
    key.to_lowercase()
}

/// A map from field names to values.
///
/// Lookups and assignments ignore case. The spelling a key was first inserted
/// with is the one returned by [`Deb822Dict::keys`], and iteration follows
/// insertion order.
#[derive(Debug, Clone)]
pub struct Deb822Dict<V> {
    entries: Vec<(String, V)>,
    index: HashMap<String, usize>,
}

impl<V> Default for Deb822Dict<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<V> Deb822Dict<V> {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value for a key.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.index.get(&fold(key)).map(|&i| &self.entries[i].1)
    }

    /// Get a mutable reference to the value for a key.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        match self.index.get(&fold(key)) {
            Some(&i) => Some(&mut self.entries[i].1),
            None => None,
        }
    }

    /// Whether the map has a value for this key.
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(&fold(key))
    }

    /// Set the value for a key, returning the previous value.
    ///
    /// If the key is already present its original spelling and position are
    /// kept.
    pub fn insert(&mut self, key: &str, value: V) -> Option<V> {
        let folded = fold(key);
        if let Some(&i) = self.index.get(&folded) {
            return Some(std::mem::replace(&mut self.entries[i].1, value));
        }
        self.index.insert(folded, self.entries.len());
        self.entries.push((key.to_string(), value));
        None
    }

    /// Remove a key, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let i = self.index.remove(&fold(key))?;
        let (_, value) = self.entries.remove(i);
        for pos in self.index.values_mut() {
            if *pos > i {
                *pos -= 1;
            }
        }
        Some(value)
    }

    /// Keys in insertion order, with their original spelling.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Key/value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Two maps are equal when they hold the same keys, compared without case,
/// mapped to equal values. Order does not matter.
impl<V: PartialEq> PartialEq for Deb822Dict<V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|o| o == v))
    }
}

impl<V: Eq> Eq for Deb822Dict<V> {}

impl<K: AsRef<str>, V> FromIterator<(K, V)> for Deb822Dict<V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut dict = Self::new();
        for (k, v) in iter {
            dict.insert(k.as_ref(), v);
        }
        dict
    }
}

impl<V> IntoIterator for Deb822Dict<V> {
    type Item = (String, V);
    type IntoIter = std::vec::IntoIter<(String, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_dict() -> Deb822Dict<i32> {
        let mut d = Deb822Dict::new();
        d.insert("TestKey", 1);
        d.insert("another_key", 2);
        d
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let d = make_dict();
        assert_eq!(d.get("testkey"), Some(&1));
        assert_eq!(d.get("Another_keY"), Some(&2));
        assert!(d.contains_key("TESTKEY"));
        assert_eq!(d.get("missing"), None);
    }

    #[test]
    fn test_case_insensitive_assignment() {
        let mut d = make_dict();
        assert_eq!(d.insert("testkey", 3), Some(1));
        assert_eq!(d.get("TestKey"), Some(&3));
        assert_eq!(d.get("testkey"), Some(&3));
        assert_eq!(d.len(), 2);
    }

    #[test]
    fn test_first_spelling_kept() {
        let mut d = make_dict();
        d.insert("TESTKEY", 5);
        assert_eq!(d.keys().collect::<Vec<_>>(), vec!["TestKey", "another_key"]);
    }

    #[test]
    fn test_order_preserved() {
        let mut d = make_dict();
        d.insert("Third_key", 3);
        d.insert("another_Key", 4);

        assert_eq!(
            d.keys().collect::<Vec<_>>(),
            vec!["TestKey", "another_key", "Third_key"]
        );
        assert_eq!(d.values().copied().collect::<Vec<_>>(), vec![1, 4, 3]);
        assert_eq!(
            d.iter().collect::<Vec<_>>(),
            vec![("TestKey", &1), ("another_key", &4), ("Third_key", &3)]
        );
    }

    #[test]
    fn test_remove() {
        let mut d = make_dict();
        d.insert("Third", 3);
        assert_eq!(d.remove("testKEY"), Some(1));
        assert_eq!(d.remove("testkey"), None);
        assert_eq!(d.keys().collect::<Vec<_>>(), vec!["another_key", "Third"]);
        assert_eq!(d.get("third"), Some(&3));
        assert_eq!(d.get("Another_Key"), Some(&2));

        // Re-adding after removal takes the new spelling and goes last.
        d.insert("TESTKEY", 9);
        assert_eq!(
            d.keys().collect::<Vec<_>>(),
            vec!["another_key", "Third", "TESTKEY"]
        );
    }

    #[test]
    fn test_equality() {
        let d1 = make_dict();
        let d2: Deb822Dict<i32> = vec![("ANOTHER_KEY", 2), ("testkey", 1)].into_iter().collect();
        assert_eq!(d1, d2);

        let d3: Deb822Dict<i32> = vec![("testkey", 1)].into_iter().collect();
        assert_ne!(d1, d3);

        let d4: Deb822Dict<i32> = vec![("testkey", 1), ("another_key", 7)].into_iter().collect();
        assert_ne!(d1, d4);
    }

    #[test]
    fn test_get_mut() {
        let mut d = make_dict();
        *d.get_mut("TESTKEY").unwrap() += 10;
        assert_eq!(d.get("testkey"), Some(&11));
        assert!(d.get_mut("nope").is_none());
    }
}
