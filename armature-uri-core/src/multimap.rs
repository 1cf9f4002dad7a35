//! Ordered multimap for matrix and query parameters
//!
//! Keys keep the order in which they were first inserted and values keep
//! insertion order per key. Replacing a key keeps its position, so
//! rebuilding `a=1&b=2` after replacing `a` still yields `a` first.

use smallvec::SmallVec;

/// Values stored under a single parameter name.
pub type ParamValues = SmallVec<[String; 1]>;

/// An insertion-ordered multimap of parameter names to values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamMap {
    entries: Vec<(String, ParamValues)>,
}

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(key, _)| key == name)
    }

    /// Append a value under `name`.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        match self.position(&name) {
            Some(idx) => self.entries[idx].1.push(value.into()),
            None => {
                let mut values = ParamValues::new();
                values.push(value.into());
                self.entries.push((name, values));
            }
        }
    }

    /// Replace every value under `name`, keeping the key's position.
    ///
    /// An empty `values` list removes the key.
    pub fn put<I, V>(&mut self, name: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let name = name.into();
        let values: ParamValues = values.into_iter().map(Into::into).collect();

        match (self.position(&name), values.is_empty()) {
            (Some(idx), true) => {
                self.entries.remove(idx);
            }
            (Some(idx), false) => self.entries[idx].1 = values,
            (None, true) => {}
            (None, false) => self.entries.push((name, values)),
        }
    }

    /// Remove every value under `name`, returning them.
    pub fn remove(&mut self, name: &str) -> Option<ParamValues> {
        self.position(name).map(|idx| self.entries.remove(idx).1)
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, values)| values.as_slice())
    }

    pub fn get_first(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Iterate `(name, values)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    /// Iterate every `(name, value)` pair, flattening multi-valued keys.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().flat_map(|(key, values)| {
            values
                .iter()
                .map(move |value| (key.as_str(), value.as_str()))
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<K, V> FromIterator<(K, V)> for ParamMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = ParamMap::new();
        for (key, value) in iter {
            map.add(key, value);
        }
        map
    }
}
