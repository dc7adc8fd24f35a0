//! Merging record lists by identifier.
//!
//! Used by every storage upsert and by restore-and-merge, where a remote
//! backup is combined with the records already on this device.

use core::hash::Hash;
use std::collections::{HashMap, HashSet};

/// Merges `incoming` into `existing` by key.
///
/// Items of `incoming` replace items of `existing` with the same key in
/// place; items with new keys are appended in `incoming` order. If
/// `incoming` repeats a key, its last occurrence wins.
///
/// ```
/// use gracewise::merge::upsert_by_key;
///
/// let remote = vec![(1, "remote-a"), (2, "remote-b")];
/// let local = vec![(2, "local-b"), (3, "local-c")];
/// let merged = upsert_by_key(remote, local, |item| item.0);
/// assert_eq!(merged, vec![(1, "remote-a"), (2, "local-b"), (3, "local-c")]);
/// ```
#[must_use]
pub fn upsert_by_key<T, K, F>(existing: Vec<T>, incoming: Vec<T>, key_fn: F) -> Vec<T>
where
    K: Hash + Eq,
    F: Fn(&T) -> K,
{
    let mut merged = existing;
    let mut positions: HashMap<K, usize> = HashMap::with_capacity(merged.len() + incoming.len());
    for (index, item) in merged.iter().enumerate() {
        let _previous = positions.insert(key_fn(item), index);
    }
    for item in incoming {
        let key = key_fn(&item);
        match positions.get(&key).copied() {
            Some(index) => {
                if let Some(slot) = merged.get_mut(index) {
                    *slot = item;
                }
            }
            None => {
                let _previous = positions.insert(key, merged.len());
                merged.push(item);
            }
        }
    }
    merged
}

/// Removes items whose key is in `ids`, keeping the order of the rest.
#[must_use]
pub fn remove_by_key<T, K, F>(existing: Vec<T>, ids: &[K], key_fn: F) -> Vec<T>
where
    K: Hash + Eq,
    F: Fn(&T) -> K,
{
    let id_set: HashSet<&K> = ids.iter().collect();
    existing
        .into_iter()
        .filter(|item| !id_set.contains(&key_fn(item)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_replaces_in_place_and_appends() {
        let existing = vec![("a", 1), ("b", 2), ("c", 3)];
        let incoming = vec![("d", 4), ("b", 20)];
        let merged = upsert_by_key(existing, incoming, |item| item.0);
        assert_eq!(merged, vec![("a", 1), ("b", 20), ("c", 3), ("d", 4)]);
    }

    #[test]
    fn upsert_into_empty() {
        let merged = upsert_by_key(Vec::new(), vec![("x", 1)], |item: &(&str, i32)| item.0);
        assert_eq!(merged, vec![("x", 1)]);
    }

    #[test]
    fn repeated_incoming_key_last_wins() {
        let merged = upsert_by_key(vec![("a", 1)], vec![("n", 1), ("n", 2)], |item| item.0);
        assert_eq!(merged, vec![("a", 1), ("n", 2)]);
    }

    #[test]
    fn remove_keeps_order() {
        let existing = vec![("a", 1), ("b", 2), ("c", 3)];
        let kept = remove_by_key(existing, &["b", "zzz"], |item| item.0);
        assert_eq!(kept, vec![("a", 1), ("c", 3)]);
    }

    #[test]
    fn remove_nothing() {
        let kept = remove_by_key(vec![("a", 1)], &[], |item: &(&str, i32)| item.0);
        assert_eq!(kept.len(), 1);
    }
}
