//! Provide hash containers, re-exports *hashbrown*, *indexmap* and *foldhash*.
//!
//! Every container here is keyed by [`FixedHashState`], so two runs over the
//! same input hash identically. Insertion-ordered containers ([`IndexMap`],
//! [`IndexSet`]) are used wherever iteration order is observable, e.g. the
//! field order of a serialized node.

// -----------------------------------------------------------------------------
// Modules

mod hasher;

// -----------------------------------------------------------------------------
// Exports

pub use hasher::{FixedHashState, FixedHasher};

/// A [`hashbrown::HashMap`] using [`FixedHashState`] by default.
pub type HashMap<K, V, S = FixedHashState> = hashbrown::HashMap<K, V, S>;

/// A [`hashbrown::HashSet`] using [`FixedHashState`] by default.
pub type HashSet<T, S = FixedHashState> = hashbrown::HashSet<T, S>;

/// An insertion-ordered map using [`FixedHashState`] by default.
///
/// # Examples
///
/// ```
/// use og_utils::IndexMap;
///
/// let mut map: IndexMap<&str, u32> = IndexMap::default();
/// map.insert("b", 2);
/// map.insert("a", 1);
///
/// let keys: Vec<_> = map.keys().copied().collect();
/// assert_eq!(keys, ["b", "a"]);
/// ```
pub type IndexMap<K, V, S = FixedHashState> = indexmap::IndexMap<K, V, S>;

/// An insertion-ordered set using [`FixedHashState`] by default.
pub type IndexSet<T, S = FixedHashState> = indexmap::IndexSet<T, S>;

// -----------------------------------------------------------------------------
// Re-export crates

pub use foldhash;
pub use hashbrown;
pub use indexmap;

#[cfg(test)]
mod tests {
    use super::{HashMap, IndexMap};

    #[test]
    fn index_map_keeps_insertion_order() {
        let mut map: IndexMap<u32, u32> = IndexMap::default();
        for key in [5, 1, 9, 3] {
            map.insert(key, key * 2);
        }
        map.shift_remove(&1);

        let order: [u32; 3] = [5, 9, 3];
        assert!(map.keys().copied().eq(order));
        assert_eq!(map[&9], 18);
    }

    #[test]
    fn hash_map_default() {
        let mut map: HashMap<&str, usize> = HashMap::default();
        map.insert("one", 1);
        assert_eq!(map.get("one"), Some(&1));
        assert!(map.get("two").is_none());
    }
}
