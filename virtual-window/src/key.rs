use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::WindowError;

pub(crate) type KeyMap<K, V> = HashMap<K, V>;

#[doc(hidden)]
pub trait KeyCacheKey: core::hash::Hash + Eq {}
impl<K: core::hash::Hash + Eq> KeyCacheKey for K {}

/// A collection element with a stable identity.
///
/// Keys must be unique within one collection. Measurements, sticky flags and slot assignments all
/// follow the key, so an item keeps its measured size when the collection is reordered.
pub trait Keyed {
    type Key: KeyCacheKey + Clone;

    fn key(&self) -> Self::Key;
}

impl<T: Keyed + ?Sized> Keyed for &T {
    type Key = T::Key;

    fn key(&self) -> Self::Key {
        (**self).key()
    }
}

impl<T: Keyed + ?Sized> Keyed for Arc<T> {
    type Key = T::Key;

    fn key(&self) -> Self::Key {
        (**self).key()
    }
}

/// A string-or-integer item identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ItemId {
    Int(i64),
    Str(Arc<str>),
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ItemId {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for ItemId {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self::Str(Arc::from(s))
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self::Str(Arc::from(s))
    }
}

impl Keyed for ItemId {
    type Key = ItemId;

    fn key(&self) -> Self::Key {
        self.clone()
    }
}

macro_rules! keyed_by_value {
    ($($t:ty),*) => {
        $(
            impl Keyed for $t {
                type Key = $t;

                fn key(&self) -> Self::Key {
                    *self
                }
            }
        )*
    };
}

keyed_by_value!(u32, u64, i32, i64, usize);

/// Maps every key of `items` to its index.
///
/// Fails on the first key that appears twice: identity-keyed state would silently merge those
/// items.
pub fn index_by_key<T: Keyed>(items: &[T]) -> Result<HashMap<T::Key, usize>, WindowError> {
    let mut out = HashMap::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        if let Some(first) = out.insert(item.key(), index) {
            vwarn!(first, index, "duplicate item key");
            return Err(WindowError::DuplicateKey { first, index });
        }
    }
    Ok(out)
}

/// Like [`index_by_key`], without keeping the map.
pub fn ensure_unique_keys<T: Keyed>(items: &[T]) -> Result<(), WindowError> {
    index_by_key(items).map(|_| ())
}
