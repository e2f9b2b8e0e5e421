//! Maps keyed by time ranges.
//!
//! A [`TimeMap`] looks values up by containment rather than equality: a
//! query matches a key when the key's [`TimeRanges`] contains it. Keys are
//! scanned in insertion order and the first match wins, so a key that
//! overlaps an earlier one is shadowed wherever the two overlap.
//!
//! Overlapping keys are neither detected nor merged on insert.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::time_range::{TimeQuery, TimeRanges};

/// An insertion-ordered map from [`TimeRanges`] to values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeMap<V> {
    entries: Vec<(TimeRanges, V)>,
}

impl<V> TimeMap<V> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Number of keys (not of underlying ranges).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts a value under `key`.
    ///
    /// A structurally equal key keeps its position and has its value
    /// replaced; the old value is returned. Any other key is appended.
    pub fn insert(&mut self, key: TimeRanges, value: V) -> Option<V> {
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Like [`TimeMap::insert`], for a key of unknown kind.
    ///
    /// Only a [`TimeQuery::Ranges`] key is accepted; a bare time or a
    /// single range is rejected rather than promoted.
    pub fn try_insert<'a>(
        &mut self,
        key: impl Into<TimeQuery<'a>>,
        value: V,
    ) -> Result<Option<V>> {
        match key.into() {
            TimeQuery::Ranges(ranges) => Ok(self.insert(ranges.clone(), value)),
            other => Err(Error::TypeMismatch {
                expected: "TimeRanges",
                found: other.kind(),
            }),
        }
    }

    fn position(&self, query: TimeQuery<'_>) -> Option<usize> {
        self.entries.iter().position(|(key, _)| key.contains(query))
    }

    /// Value of the first key containing `query`.
    pub fn get<'a>(&self, query: impl Into<TimeQuery<'a>>) -> Result<&V> {
        let query = query.into();
        self.position(query)
            .map(|i| &self.entries[i].1)
            .ok_or_else(|| Error::KeyNotFound(query.to_string()))
    }

    pub fn get_mut<'a>(&mut self, query: impl Into<TimeQuery<'a>>) -> Result<&mut V> {
        let query = query.into();
        match self.position(query) {
            Some(i) => Ok(&mut self.entries[i].1),
            None => Err(Error::KeyNotFound(query.to_string())),
        }
    }

    /// Returns true if some key contains `query`.
    pub fn contains_key<'a>(&self, query: impl Into<TimeQuery<'a>>) -> bool {
        self.position(query.into()).is_some()
    }

    /// Removes the first key containing `query` and returns its value.
    pub fn remove<'a>(&mut self, query: impl Into<TimeQuery<'a>>) -> Result<V> {
        let query = query.into();
        let i = self
            .position(query)
            .ok_or_else(|| Error::KeyNotFound(query.to_string()))?;
        Ok(self.entries.remove(i).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &TimeRanges> {
        self.entries.iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, value)| value)
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&TimeRanges, &V)> {
        self.entries.iter().map(|(key, value)| (key, value))
    }
}

impl<V> Default for TimeMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FromIterator<(K, V)> for TimeMap<V>
where
    K: Into<TimeRanges>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key.into(), value);
        }
        map
    }
}

impl<V> IntoIterator for TimeMap<V> {
    type Item = (TimeRanges, V);
    type IntoIter = std::vec::IntoIter<(TimeRanges, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_range::TimeRange;
    use chrono::NaiveTime;

    fn t(hour: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, 0, 0).unwrap()
    }

    fn range(start: u32, end: u32) -> TimeRange {
        TimeRange::from_hours(start, end).unwrap()
    }

    fn sample() -> TimeMap<i32> {
        TimeMap::from_iter([
            (TimeRanges::new(vec![range(5, 10), range(22, 23)]), 0),
            (TimeRanges::from(range(15, 20)), 1),
        ])
    }

    #[test]
    fn lookup_by_containment() {
        let map = sample();
        assert_eq!(map.len(), 2);
        assert_eq!(map.values().copied().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(*map.get(t(6)).unwrap(), 0);
        assert_eq!(*map.get(t(16)).unwrap(), 1);
        assert_eq!(*map.get(t(22)).unwrap(), 0);
        assert_eq!(*map.get(range(6, 8)).unwrap(), 0);
        assert!(matches!(map.get(t(0)), Err(Error::KeyNotFound(_))));
        // Spans two keys, fits in neither.
        assert!(map.get(range(9, 16)).is_err());
    }

    #[test]
    fn insert_and_remove_keep_order() {
        let mut map = sample();
        assert_eq!(map.insert(TimeRanges::from(range(0, 1)), 2), None);
        assert_eq!(map.len(), 3);
        assert_eq!(map.values().copied().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(*map.get(t(0)).unwrap(), 2);

        assert_eq!(map.remove(t(7)).unwrap(), 0);
        assert_eq!(map.len(), 2);
        assert_eq!(map.values().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert!(map.get(t(6)).is_err());
        assert!(matches!(map.remove(t(6)), Err(Error::KeyNotFound(_))));
    }

    #[test]
    fn insert_equal_key_replaces_value_in_place() {
        let mut map = sample();
        let old = map.insert(TimeRanges::from(range(15, 20)), 7);
        assert_eq!(old, Some(1));
        assert_eq!(map.len(), 2);
        assert_eq!(map.values().copied().collect::<Vec<_>>(), vec![0, 7]);
    }

    #[test]
    fn first_match_shadows_later_keys() {
        let mut map = sample();
        map.insert(TimeRanges::from(range(8, 16)), 9);
        // Points already covered keep resolving to the earlier keys.
        assert_eq!(*map.get(t(9)).unwrap(), 0);
        assert_eq!(*map.get(t(15)).unwrap(), 1);
        // Only the uncovered part reaches the new key.
        assert_eq!(*map.get(t(12)).unwrap(), 9);
    }

    #[test]
    fn try_insert_rejects_non_ranges_keys() {
        let mut map = sample();
        let result = map.try_insert(range(0, 1), 2);
        assert!(matches!(
            result,
            Err(Error::TypeMismatch {
                expected: "TimeRanges",
                found: "TimeRange"
            })
        ));
        assert!(map.try_insert(t(1), 2).is_err());
        assert_eq!(map.len(), 2);

        let key = TimeRanges::from(range(0, 1));
        assert_eq!(map.try_insert(&key, 2).unwrap(), None);
        assert!(map.contains_key(t(0)));
    }

    #[test]
    fn get_mut_updates_first_match() {
        let mut map = sample();
        *map.get_mut(t(16)).unwrap() += 10;
        assert_eq!(*map.get(t(17)).unwrap(), 11);
    }

    #[test]
    fn keys_in_insertion_order() {
        let map = sample();
        let keys: Vec<_> = map.keys().cloned().collect();
        let from_iter: Vec<_> = map.iter().map(|(key, _)| key.clone()).collect();
        assert_eq!(keys, from_iter);
        assert_eq!(keys[1], TimeRanges::from(range(15, 20)));
    }

    #[test]
    fn time_map_serialization() {
        let map = sample();
        let json = serde_json::to_string(&map).unwrap();
        let back: TimeMap<i32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }
}
