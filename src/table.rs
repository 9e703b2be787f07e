//! Table: fixed bucket array with separate chaining.

use crate::capacity::Capacity;
use crate::chain::{Chain, Entry};
use crate::error::{InvalidCapacity, KeyNotFound};
use crate::reentrancy::ProbeGuard;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;
use tracing::trace;

/// Buckets allocated per pair when `from_mapping` picks the capacity.
pub const DEFAULT_BUCKETS_PER_ENTRY: usize = 10;

pub struct Table<K, V, S = RandomState> {
    hasher: S,
    buckets: Box<[Chain<K, V>]>,
    len: usize,
    probe: ProbeGuard,
}

impl<K, V> Table<K, V>
where
    K: Eq + Hash,
{
    /// Create a table with `capacity` buckets and a random digest seed.
    pub fn new<C>(capacity: C) -> Result<Self, InvalidCapacity>
    where
        C: TryInto<Capacity, Error = InvalidCapacity>,
    {
        Self::with_hasher(capacity, RandomState::new())
    }

    /// Build a table from existing pairs. Without an explicit capacity,
    /// `DEFAULT_BUCKETS_PER_ENTRY` buckets are allocated per pair.
    pub fn from_mapping<I>(mapping: I, capacity: Option<usize>) -> Result<Self, InvalidCapacity>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        Self::from_mapping_with_hasher(mapping, capacity, RandomState::new())
    }
}

impl<K, V, S> Table<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher<C>(capacity: C, hasher: S) -> Result<Self, InvalidCapacity>
    where
        C: TryInto<Capacity, Error = InvalidCapacity>,
    {
        Ok(Self::with_capacity_and_hasher(capacity.try_into()?, hasher))
    }

    pub fn with_capacity_and_hasher(capacity: Capacity, hasher: S) -> Self {
        trace!(capacity = capacity.get(), "table created");
        Self {
            hasher,
            buckets: (0..capacity.get()).map(|_| Chain::new()).collect(),
            len: 0,
            probe: ProbeGuard::new(),
        }
    }

    pub fn from_mapping_with_hasher<I>(
        mapping: I,
        capacity: Option<usize>,
        hasher: S,
    ) -> Result<Self, InvalidCapacity>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let pairs: Vec<(K, V)> = mapping.into_iter().collect();
        let capacity = match capacity {
            Some(n) => Capacity::try_from(n)?,
            None => Capacity::for_entries(pairs.len(), DEFAULT_BUCKETS_PER_ENTRY),
        };
        trace!(
            pairs = pairs.len(),
            capacity = capacity.get(),
            "table built from mapping"
        );
        let mut table = Self::with_capacity_and_hasher(capacity, hasher);
        table.extend(pairs);
        Ok(table)
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    #[inline]
    fn bucket_index(&self, hash: u64) -> usize {
        // Lossless: the remainder is below `buckets.len()`, itself a usize.
        (hash % self.buckets.len() as u64) as usize
    }

    fn find_entry<Q>(&self, q: &Q) -> Option<&Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.probe.enter();
        let hash = self.make_hash(q);
        self.buckets[self.bucket_index(hash)].find(hash, q)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bucket count fixed at construction.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Entries per bucket. Informational; nothing resizes on it.
    pub fn load_factor(&self) -> f64 {
        self.len as f64 / self.buckets.len() as f64
    }

    /// Insert `key -> value`, replacing and returning the value stored
    /// under an equal key if there was one.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let _g = self.probe.enter();
        let hash = self.make_hash(&key);
        let idx = self.bucket_index(hash);
        let prev = self.buckets[idx].upsert(hash, key, value);
        if prev.is_none() {
            self.len += 1;
        }
        prev
    }

    pub fn get<Q>(&self, q: &Q) -> Result<&V, KeyNotFound<Q::Owned>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq + ToOwned,
    {
        self.try_get(q)
            .ok_or_else(|| KeyNotFound::new(q.to_owned()))
    }

    pub fn try_get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find_entry(q).map(|e| &e.value)
    }

    pub fn try_get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.probe.enter();
        let hash = self.make_hash(q);
        let idx = self.bucket_index(hash);
        self.buckets[idx].find_mut(hash, q).map(|e| &mut e.value)
    }

    /// Value under `q`, or `default` when absent.
    pub fn get_or<'a, Q>(&'a self, q: &Q, default: &'a V) -> &'a V
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.try_get(q).unwrap_or(default)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find_entry(q).is_some()
    }

    /// Remove the entry under `q` and return its value. On a miss the
    /// table is left untouched.
    pub fn remove<Q>(&mut self, q: &Q) -> Result<V, KeyNotFound<Q::Owned>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq + ToOwned,
    {
        let removed = {
            let _g = self.probe.enter();
            let hash = self.make_hash(q);
            let idx = self.bucket_index(hash);
            self.buckets[idx].remove(hash, q)
        };
        match removed {
            Some(e) => {
                self.len -= 1;
                Ok(e.value)
            }
            None => Err(KeyNotFound::new(q.to_owned())),
        }
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: self.buckets.iter(),
            chain: (&[]).iter(),
            remaining: self.len,
        }
    }

    /// Fresh snapshot of the stored keys.
    pub fn keys_view(&self) -> hashbrown::HashSet<K>
    where
        K: Clone,
    {
        self.iter().map(|(k, _)| k.clone()).collect()
    }

    /// Fresh snapshot of the stored values, one per entry, in no particular order.
    pub fn values_view(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.iter().map(|(_, v)| v.clone()).collect()
    }

    /// Fresh snapshot of the stored pairs.
    pub fn pairs_view(&self) -> hashbrown::HashSet<(K, V)>
    where
        K: Clone,
        V: Clone + Eq + Hash,
    {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    #[cfg(test)]
    pub(crate) fn chain_len_of<Q>(&self, q: &Q) -> usize
    where
        Q: ?Sized + Hash,
    {
        self.buckets[self.bucket_index(self.make_hash(q))].len()
    }
}

/// Borrowed iterator over the pairs of a `Table`, in bucket order.
pub struct Iter<'a, K, V> {
    buckets: core::slice::Iter<'a, Chain<K, V>>,
    chain: core::slice::Iter<'a, Entry<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(e) = self.chain.next() {
                self.remaining -= 1;
                return Some((&e.key, &e.value));
            }
            self.chain = self.buckets.next()?.entries().iter();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<'a, K, V, S> IntoIterator for &'a Table<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, S> Extend<(K, V)> for Table<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for Table<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let pairs: Vec<(K, V)> = iter.into_iter().collect();
        let capacity = Capacity::for_entries(pairs.len(), DEFAULT_BUCKETS_PER_ENTRY);
        let mut table = Self::with_capacity_and_hasher(capacity, S::default());
        table.extend(pairs);
        table
    }
}

/// Equal iff both hold the same pairs; capacity and digest do not matter.
impl<K, V, S1, S2> PartialEq<Table<K, V, S2>> for Table<K, V, S1>
where
    K: Eq + Hash,
    V: PartialEq,
    S1: BuildHasher,
    S2: BuildHasher,
{
    fn eq(&self, other: &Table<K, V, S2>) -> bool {
        // Keys are unique on both sides, so equal lengths plus inclusion
        // is set equality.
        self.len() == other.len() && self.iter().all(|(k, v)| other.try_get(k) == Some(v))
    }
}

impl<K, V, S> Eq for Table<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S> Clone for Table<K, V, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        trace!(
            len = self.len,
            capacity = self.buckets.len(),
            "table cloned"
        );
        Self {
            hasher: self.hasher.clone(),
            buckets: self.buckets.clone(),
            len: self.len,
            probe: ProbeGuard::new(),
        }
    }
}

impl<K, V, S> fmt::Debug for Table<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.buckets
                    .iter()
                    .flat_map(|c| c.entries())
                    .map(|e| (&e.key, &e.value)),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::hash::Hasher;

    #[derive(Clone, Default)]
    struct ConstBuildHasher;
    struct ConstHasher;
    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    impl Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            0
        } // every key shares one chain
    }

    fn sample() -> Table<String, i32> {
        let mut t = Table::new(8).unwrap();
        for (i, k) in ["a", "b", "c"].iter().enumerate() {
            t.insert((*k).to_string(), i as i32);
        }
        t
    }

    /// Invariant: new tables are empty and report the requested bucket count.
    #[test]
    fn new_table_is_empty() {
        let t: Table<String, i32> = Table::new(100).unwrap();
        assert!(t.is_empty());
        assert_eq!(t.len(), 0);
        assert_eq!(t.capacity(), 100);
        assert_eq!(t.iter().count(), 0);
    }

    /// Invariant: non-positive capacities are rejected at construction.
    #[test]
    fn invalid_capacity_rejected() {
        assert_eq!(
            Table::<String, i32>::new(0).map(|_| ()),
            Err(InvalidCapacity { requested: 0 })
        );
        assert_eq!(
            Table::<String, i32>::new(-5).map(|_| ()),
            Err(InvalidCapacity { requested: -5 })
        );
        assert!(Table::<String, i32>::new(1).is_ok());
    }

    /// Invariant: re-inserting an equal key replaces the value and keeps `len`.
    #[test]
    fn insert_replaces_existing_value() {
        let mut t = sample();
        assert_eq!(t.insert("a".to_string(), 10), Some(0));
        assert_eq!(t.len(), 3);
        assert_eq!(t.get("a"), Ok(&10));
    }

    /// Invariant: `get` fails with the looked-up key; `try_get` and `get_or` never fail.
    #[test]
    fn lookup_variants_agree() {
        let t = sample();
        assert_eq!(t.get("b"), Ok(&1));
        assert_eq!(t.try_get("b"), Some(&1));
        let err = t.get("zzz").unwrap_err();
        assert_eq!(err.key(), "zzz");
        assert_eq!(t.try_get("zzz"), None);
        assert_eq!(*t.get_or("zzz", &-1), -1);
        assert_eq!(*t.get_or("c", &-1), 2);
    }

    /// Invariant: `try_get_mut` edits the stored value in place.
    #[test]
    fn try_get_mut_updates_value() {
        let mut t = sample();
        if let Some(v) = t.try_get_mut("c") {
            *v += 40;
        }
        assert_eq!(t.get("c"), Ok(&42));
        assert!(t.try_get_mut("nope").is_none());
    }

    /// Invariant: with a constant digest every key shares one chain and all
    /// operations still resolve the right entry.
    #[test]
    fn collisions_resolved_by_equality() {
        let mut t: Table<String, i32, ConstBuildHasher> =
            Table::with_hasher(4, ConstBuildHasher).unwrap();
        t.insert("a".to_string(), 1);
        t.insert("b".to_string(), 2);
        t.insert("c".to_string(), 3);
        assert_eq!(t.chain_len_of("a"), 3);
        assert_eq!(t.get("a"), Ok(&1));
        assert_eq!(t.get("b"), Ok(&2));

        assert_eq!(t.remove("b"), Ok(2));
        assert_eq!(t.chain_len_of("a"), 2);
        assert_eq!(t.get("a"), Ok(&1));
        assert_eq!(t.get("c"), Ok(&3));
        assert!(!t.contains_key("b"));
    }

    /// Invariant: a failed remove leaves contents and length untouched.
    #[test]
    fn remove_missing_is_noop() {
        let mut t = sample();
        let before = t.clone();
        let err = t.remove("missing").unwrap_err();
        assert_eq!(err.into_key(), "missing");
        assert_eq!(t.len(), 3);
        assert_eq!(t, before);
    }

    /// Invariant: the iterator yields each pair once and reports an exact length.
    #[test]
    fn iter_is_exact_and_complete() {
        let t = sample();
        let mut it = t.iter();
        assert_eq!(it.len(), 3);
        it.next();
        assert_eq!(it.len(), 2);
        let seen: BTreeSet<(String, i32)> =
            (&t).into_iter().map(|(k, v)| (k.clone(), *v)).collect();
        let expected: BTreeSet<(String, i32)> = [("a", 0), ("b", 1), ("c", 2)]
            .iter()
            .map(|(k, v)| ((*k).to_string(), *v))
            .collect();
        assert_eq!(seen, expected);
    }

    /// Invariant: load factor is `len / capacity` and may exceed one.
    #[test]
    fn load_factor_tracks_len() {
        let mut t: Table<u32, u32> = Table::new(2).unwrap();
        assert_eq!(t.load_factor(), 0.0);
        t.extend((0..5).map(|i| (i, i)));
        assert_eq!(t.load_factor(), 2.5);
        assert_eq!(t.capacity(), 2);
    }

    /// Invariant: clones are independent and compare equal at the time of cloning.
    #[test]
    fn clone_is_independent() {
        let t = sample();
        let mut c = t.clone();
        assert_eq!(c, t);
        assert_eq!(c.capacity(), t.capacity());
        c.insert("d".to_string(), 3);
        assert_ne!(c, t);
        assert!(!t.contains_key("d"));
    }

    /// Invariant: equality ignores capacity and digest.
    #[test]
    fn equality_across_layouts() {
        let a = sample();
        let mut b: Table<String, i32, ConstBuildHasher> =
            Table::with_hasher(1, ConstBuildHasher).unwrap();
        for (k, v) in [("c", 2), ("a", 0), ("b", 1)] {
            b.insert(k.to_string(), v);
        }
        assert!(a == b);
        b.insert("a".to_string(), 99);
        assert!(a != b);
    }

    /// Invariant: Debug renders the table as a map.
    #[test]
    fn debug_formats_as_map() {
        let mut t: Table<&str, i32> = Table::new(3).unwrap();
        assert_eq!(format!("{:?}", t), "{}");
        t.insert("hello", 1);
        assert_eq!(format!("{:?}", t), "{\"hello\": 1}");
    }

    /// Invariant: `FromIterator` sizes the table from the pair count.
    #[test]
    fn from_iter_uses_default_capacity() {
        let t: Table<u8, u8> = (0..4).map(|i| (i, i)).collect();
        assert_eq!(t.len(), 4);
        assert_eq!(t.capacity(), 4 * DEFAULT_BUCKETS_PER_ENTRY);
        let empty: Table<u8, u8> = core::iter::empty().collect();
        assert_eq!(empty.capacity(), 1);
    }

    /// Invariant (debug-only): reentering the table from `K: Eq` during a probe panics.
    #[cfg(debug_assertions)]
    #[test]
    fn reentrancy_panics_from_eq_during_lookup() {
        use std::cell::Cell;

        thread_local! {
            static TABLE: Cell<*const Table<ReentryKey, i32, ConstBuildHasher>> =
                const { Cell::new(core::ptr::null()) };
        }

        #[derive(Debug)]
        struct ReentryKey(&'static str);
        impl PartialEq for ReentryKey {
            fn eq(&self, other: &Self) -> bool {
                let t = TABLE.with(|c| c.get());
                if !t.is_null() {
                    // Attempt to re-enter the same table during probing.
                    unsafe {
                        let _ = (*t).contains_key(&ReentryKey("x"));
                    }
                }
                self.0 == other.0
            }
        }
        impl Eq for ReentryKey {}
        impl Hash for ReentryKey {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.0.hash(state);
            }
        }

        let mut t: Table<ReentryKey, i32, ConstBuildHasher> =
            Table::with_hasher(1, ConstBuildHasher).unwrap();
        t.insert(ReentryKey("a"), 1);
        TABLE.with(|c| c.set(&t as *const _));
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = t.contains_key(&ReentryKey("b"));
        }));
        TABLE.with(|c| c.set(core::ptr::null()));
        assert!(res.is_err(), "expected reentrancy to panic in debug builds");
        assert!(t.contains_key(&ReentryKey("a")));
    }
}
