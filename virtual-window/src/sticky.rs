use indexmap::IndexMap;

use crate::key::KeyCacheKey;

/// How an item sticks to the viewport edge while scrolled past.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Stickiness {
    #[default]
    None,
    /// Pins at the leading edge once scrolled past it.
    Start,
    /// Pins at the trailing edge until scrolled into view.
    End,
}

impl Stickiness {
    /// Converts the `0 / 1 / 2` encoding. Anything else is treated as not sticky.
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            1 => Self::Start,
            2 => Self::End,
            _ => Self::None,
        }
    }

    pub fn as_raw(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Start => 1,
            Self::End => 2,
        }
    }

    pub fn is_sticky(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Insertion-ordered `key → stickiness` map.
///
/// Only sticky entries are stored; inserting [`Stickiness::None`] removes the key.
#[derive(Clone, Debug)]
pub struct StickyMap<K> {
    entries: IndexMap<K, Stickiness>,
}

impl<K> Default for StickyMap<K> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<K: KeyCacheKey> StickyMap<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the stickiness of `key` and returns the previous value.
    pub fn insert(&mut self, key: K, stickiness: Stickiness) -> Stickiness {
        let prev = if stickiness.is_sticky() {
            self.entries.insert(key, stickiness)
        } else {
            self.entries.shift_remove(&key)
        };
        prev.unwrap_or_default()
    }

    /// Same as [`Self::insert`] with the raw `0 / 1 / 2` encoding.
    pub fn insert_raw(&mut self, key: K, raw: i64) -> Stickiness {
        self.insert(key, Stickiness::from_raw(raw))
    }

    pub fn remove(&mut self, key: &K) -> Stickiness {
        self.entries.shift_remove(key).unwrap_or_default()
    }

    pub fn get(&self, key: &K) -> Stickiness {
        self.entries.get(key).copied().unwrap_or_default()
    }

    /// Whether any entry has the given stickiness.
    pub fn contains_kind(&self, stickiness: Stickiness) -> bool {
        self.entries.values().any(|&s| s == stickiness)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, Stickiness)> {
        self.entries.iter().map(|(k, &s)| (k, s))
    }
}

impl<K: KeyCacheKey> FromIterator<(K, Stickiness)> for StickyMap<K> {
    fn from_iter<I: IntoIterator<Item = (K, Stickiness)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: KeyCacheKey> Extend<(K, Stickiness)> for StickyMap<K> {
    fn extend<I: IntoIterator<Item = (K, Stickiness)>>(&mut self, iter: I) {
        for (key, stickiness) in iter {
            self.insert(key, stickiness);
        }
    }
}
