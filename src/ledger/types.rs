use std::collections::BTreeMap;

/// Keyed table of rows. Iterates in id order so reports and output are deterministic.
#[derive(Debug, Clone)]
pub struct Table<K, V>(BTreeMap<K, V>);

impl<K: Ord + Copy, V> Default for Table<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Copy, V> Table<K, V> {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }
    pub fn as_map(&self) -> &BTreeMap<K, V> {
        &self.0
    }
    pub fn get(&self, key: &K) -> Option<&V> {
        self.0.get(key)
    }
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.0.values()
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn insert(&mut self, key: K, value: V) {
        self.0.insert(key, value);
    }
    pub(crate) fn remove(&mut self, key: &K) -> Option<V> {
        self.0.remove(key)
    }
    pub(crate) fn get_or_insert_with(&mut self, key: K, default: impl FnOnce() -> V) -> &mut V {
        self.0.entry(key).or_insert_with(default)
    }
}

/// Rows that can only ever be appended. No removal or mutation API exists.
#[derive(Debug, Clone)]
pub struct AppendOnly<T>(Vec<T>);

impl<T> Default for AppendOnly<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> AppendOnly<T> {
    pub fn new() -> Self {
        Self(Vec::new())
    }
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }
    pub fn as_slice(&self) -> &[T] {
        &self.0
    }
    pub fn last(&self) -> Option<&T> {
        self.0.last()
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn push(&mut self, row: T) {
        self.0.push(row);
    }
}

impl<'a, T> IntoIterator for &'a AppendOnly<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Monotonic id source for one table. Ids start at 1.
#[derive(Debug, Clone, Default)]
pub(crate) struct Sequence(u64);

impl Sequence {
    pub(crate) fn next<I: From<u64>>(&mut self) -> I {
        self.0 += 1;
        I::from(self.0)
    }
    /// The id `next` will hand out, without taking it.
    pub(crate) fn peek<I: From<u64>>(&self) -> I {
        I::from(self.0 + 1)
    }
    /// Make sure ids handed out later never collide with `id`, e.g. after loading stored rows.
    pub(crate) fn observe(&mut self, id: u64) {
        self.0 = self.0.max(id);
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Sequences {
    pub transactions: Sequence,
    pub fund_locks: Sequence,
    pub withdrawals: Sequence,
    pub products: Sequence,
    pub bulk_purchases: Sequence,
    pub allocations: Sequence,
    pub ledger_entries: Sequence,
    pub companies: Sequence,
    pub disclosures: Sequence,
    pub audit_log: Sequence,
    pub alerts: Sequence,
}
