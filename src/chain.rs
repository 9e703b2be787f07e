//! Chain: the entries of one bucket, in insertion order.

use core::borrow::Borrow;

#[derive(Debug, Clone)]
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    // Digest computed once on insert; compared before `Eq` runs.
    pub(crate) hash: u64,
}

/// Entries whose digests map to the same bucket. Keys are pairwise distinct.
#[derive(Debug, Clone)]
pub(crate) struct Chain<K, V> {
    entries: Vec<Entry<K, V>>,
}

impl<K, V> Chain<K, V> {
    pub(crate) const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn entries(&self) -> &[Entry<K, V>] {
        &self.entries
    }

    fn position<Q>(&self, hash: u64, q: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        self.entries
            .iter()
            .position(|e| e.hash == hash && e.key.borrow() == q)
    }

    pub(crate) fn find<Q>(&self, hash: u64, q: &Q) -> Option<&Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        self.position(hash, q).map(|i| &self.entries[i])
    }

    pub(crate) fn find_mut<Q>(&mut self, hash: u64, q: &Q) -> Option<&mut Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let i = self.position(hash, q)?;
        Some(&mut self.entries[i])
    }

    /// Replace the value under an equal key, or append a new entry.
    /// Returns the previous value when one was replaced.
    pub(crate) fn upsert(&mut self, hash: u64, key: K, value: V) -> Option<V>
    where
        K: Eq,
    {
        match self.find_mut(hash, &key) {
            Some(e) => Some(core::mem::replace(&mut e.value, value)),
            None => {
                self.entries.push(Entry { key, value, hash });
                None
            }
        }
    }

    /// Unlink the entry with an equal key; the rest keep their order.
    pub(crate) fn remove<Q>(&mut self, hash: u64, q: &Q) -> Option<Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let i = self.position(hash, q)?;
        Some(self.entries.remove(i))
    }
}
