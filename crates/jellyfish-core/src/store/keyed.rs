// ── Keyed cache ──
//
// String-keyed map of `EntryCache`s behind one mutex. The mutex guards the
// map structure only: readers clone the entry's `Arc` under the lock and
// copy the value outside it. Removed keys keep their (empty) entry so a
// waiter that starts after the removal can still see that it happened.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::entry::EntryCache;
use crate::signal::TimedSignal;

/// Key used by caches that hold a single value (name, firmware, schedules).
pub const SINGLE_ENTRY_KEY: &str = "__single_entry__";

type EntryMap<T> = HashMap<String, Arc<EntryCache<T>>>;

/// A concurrent map of individually signalled entries, plus a cache-wide
/// signal fired after each batch update.
///
/// Entries are never dropped from the map. `delete`, `replace_all` and
/// `clear` only empty them, so the map holds one entry per key ever set,
/// awaited or removed for the life of the cache. Emptied entries are
/// invisible to `get`, `keys`, `len` and friends.
#[derive(Debug)]
pub struct KeyedCache<T> {
    entries: Mutex<EntryMap<T>>,
    finalized: TimedSignal,
}

impl<T> Default for KeyedCache<T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            finalized: TimedSignal::new(),
        }
    }
}

impl<T: Clone> KeyedCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry_or_insert(entries: &mut EntryMap<T>, key: &str) -> Arc<EntryCache<T>> {
        if let Some(entry) = entries.get(key) {
            return Arc::clone(entry);
        }
        let entry = Arc::new(EntryCache::new());
        entries.insert(key.to_owned(), Arc::clone(&entry));
        entry
    }

    fn entry(&self, key: &str) -> Option<Arc<EntryCache<T>>> {
        self.entries.lock().get(key).cloned()
    }

    fn snapshot(&self) -> Vec<(String, Arc<EntryCache<T>>)> {
        self.entries
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), Arc::clone(v)))
            .collect()
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn get(&self, key: &str) -> Option<T> {
        self.entry(key)?.get()
    }

    pub fn get_single(&self) -> Option<T> {
        self.get(SINGLE_ENTRY_KEY)
    }

    /// Copies of every populated entry.
    pub fn get_all(&self) -> BTreeMap<String, T> {
        self.snapshot()
            .into_iter()
            .filter_map(|(key, entry)| entry.get().map(|value| (key, value)))
            .collect()
    }

    /// Keys of populated entries, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .snapshot()
            .into_iter()
            .filter(|(_, entry)| entry.is_populated())
            .map(|(key, _)| key)
            .collect();
        keys.sort();
        keys
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entry(key).is_some_and(|entry| entry.is_populated())
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .values()
            .filter(|entry| entry.is_populated())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Replace one entry (creating it if needed) and fire its signal.
    pub fn set(&self, key: &str, value: T) {
        let mut entries = self.entries.lock();
        Self::entry_or_insert(&mut entries, key).set(value);
    }

    pub fn set_single(&self, value: T) {
        self.set(SINGLE_ENTRY_KEY, value);
    }

    /// Replace several entries in one critical section, then fire the
    /// cache-wide finalization signal once.
    pub fn set_many<I>(&self, values: I)
    where
        I: IntoIterator<Item = (String, T)>,
    {
        {
            let mut entries = self.entries.lock();
            for (key, value) in values {
                Self::entry_or_insert(&mut entries, &key).set(value);
            }
        }
        self.finalized.trigger();
    }

    /// Treat `values` as the complete collection: replace every entry it
    /// names and remove every populated entry it does not. Fires the
    /// finalization signal after both steps. Returns the removed keys.
    pub fn replace_all<I>(&self, values: I) -> Vec<String>
    where
        I: IntoIterator<Item = (String, T)>,
    {
        let removed = {
            let mut entries = self.entries.lock();
            let mut incoming = HashSet::new();
            for (key, value) in values {
                Self::entry_or_insert(&mut entries, &key).set(value);
                incoming.insert(key);
            }

            let mut removed = Vec::new();
            for (key, entry) in entries.iter() {
                if !incoming.contains(key) && entry.is_populated() {
                    entry.remove();
                    removed.push(key.clone());
                }
            }
            removed
        };
        self.finalized.trigger();
        removed
    }

    /// Remove one entry and fire its signal. Returns whether a value was
    /// present.
    pub fn delete(&self, key: &str) -> bool {
        let entries = self.entries.lock();
        entries
            .get(key)
            .is_some_and(|entry| entry.remove().is_some())
    }

    /// Drop every value without firing any signal. Entries stay registered
    /// so in-flight waiters are still woken by the next update.
    pub fn clear(&self) {
        for entry in self.entries.lock().values() {
            entry.reset();
        }
    }

    // ── Waits ────────────────────────────────────────────────────────

    /// Wait until every key in `keys` has been updated after `since`,
    /// sharing one `timeout` budget across all of them.
    ///
    /// Keys are visited in order; each wait gets whatever budget is left.
    /// Because an update that landed after `since` satisfies its wait at
    /// once, keys updated while an earlier key was being waited on are not
    /// missed. An empty `keys` slice means the single-value entry.
    ///
    /// Returns the keys still outstanding when the budget ran out (empty on
    /// success).
    pub async fn await_keys(&self, since: Instant, timeout: Duration, keys: &[String]) -> Vec<String> {
        let start = Instant::now();
        let single = [SINGLE_ENTRY_KEY.to_owned()];
        let keys = if keys.is_empty() { &single[..] } else { keys };

        let entries: Vec<Arc<EntryCache<T>>> = {
            let mut map = self.entries.lock();
            keys.iter()
                .map(|key| Self::entry_or_insert(&mut map, key))
                .collect()
        };

        for (idx, (key, entry)) in keys.iter().zip(&entries).enumerate() {
            let remaining = timeout.saturating_sub(start.elapsed());
            if !entry.signal().wait(remaining, Some(since)).await {
                let later = keys
                    .iter()
                    .zip(&entries)
                    .skip(idx + 1)
                    .filter(|(_, entry)| !entry.signal().fired_since(Some(since)))
                    .map(|(key, _)| key.clone());
                return std::iter::once(key.clone()).chain(later).collect();
            }
        }
        Vec::new()
    }

    /// [`await_keys`](Self::await_keys) measured from now.
    pub async fn await_update(&self, timeout: Duration, keys: &[String]) -> bool {
        self.await_keys(Instant::now(), timeout, keys).await.is_empty()
    }

    /// Wait for the next batch update (`set_many` / `replace_all`).
    pub async fn await_finalization(&self, timeout: Duration) -> bool {
        self.finalized.wait(timeout, None).await
    }

    /// Wait for a batch update that happened after `since`.
    pub async fn await_finalization_since(&self, since: Instant, timeout: Duration) -> bool {
        self.finalized.wait(timeout, Some(since)).await
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;

    fn pairs(items: &[(&str, i32)]) -> Vec<(String, i32)> {
        items.iter().map(|(k, v)| ((*k).to_owned(), *v)).collect()
    }

    fn keys(items: &[&str]) -> Vec<String> {
        items.iter().map(|k| (*k).to_owned()).collect()
    }

    fn mark() -> Instant {
        let mark = Instant::now();
        std::thread::sleep(Duration::from_millis(1));
        mark
    }

    #[test]
    fn get_all_returns_copies() {
        let cache = KeyedCache::new();
        cache.set("a", vec![1]);

        let mut all = cache.get_all();
        all.get_mut("a").unwrap().push(2);
        all.insert("b".into(), vec![3]);

        assert_eq!(cache.get("a").unwrap(), vec![1]);
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn single_entry_helpers() {
        let cache = KeyedCache::new();
        assert_eq!(cache.get_single(), None::<String>);
        cache.set_single("porch".to_owned());
        assert_eq!(cache.get_single().as_deref(), Some("porch"));
        assert_eq!(cache.keys(), vec![SINGLE_ENTRY_KEY.to_owned()]);
    }

    #[test]
    fn replace_all_deletes_by_absence() {
        let cache = KeyedCache::new();
        cache.set_many(pairs(&[("A", 1), ("B", 2), ("C", 3)]));
        assert_eq!(cache.len(), 3);

        let removed = cache.replace_all(pairs(&[("A", 10), ("B", 20)]));

        assert_eq!(removed, keys(&["C"]));
        assert_eq!(cache.keys(), keys(&["A", "B"]));
        assert_eq!(cache.get("A"), Some(10));
        assert!(!cache.contains_key("C"));
    }

    #[test]
    fn clear_hides_values_but_keeps_waiters_attached() {
        let cache = KeyedCache::new();
        cache.set_many(pairs(&[("A", 1), ("B", 2)]));
        cache.clear();

        assert!(cache.is_empty());
        assert!(cache.get_all().is_empty());
        assert_eq!(cache.get("A"), None);
    }

    #[test]
    fn removed_keys_keep_an_empty_entry() {
        let cache = KeyedCache::new();
        cache.set_many(pairs(&[("A", 1), ("B", 2)]));
        cache.delete("A");
        cache.replace_all(pairs(&[("C", 3)]));

        assert_eq!(cache.keys(), keys(&["C"]));
        assert_eq!(cache.entries.lock().len(), 3);
    }

    #[test]
    fn delete_reports_presence() {
        let cache = KeyedCache::new();
        cache.set("A", 1);
        assert!(cache.delete("A"));
        assert!(!cache.delete("A"));
        assert!(!cache.delete("never"));
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn update_before_wait_is_seen() {
        let cache = KeyedCache::new();
        let since = mark();
        cache.set("A", 1);
        assert!(cache.await_keys(since, Duration::ZERO, &keys(&["A"])).await.is_empty());
    }

    #[tokio::test]
    async fn wait_can_start_before_key_exists() {
        let cache = Arc::new(KeyedCache::new());
        let writer = Arc::clone(&cache);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            writer.set("new", 7);
        });

        assert!(cache.await_update(Duration::from_secs(5), &keys(&["new"])).await);
        assert_eq!(cache.get("new"), Some(7));
    }

    #[tokio::test]
    async fn out_of_order_updates_satisfy_multi_key_wait() {
        let cache = Arc::new(KeyedCache::new());
        let writer = Arc::clone(&cache);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            writer.set("B", 2);
            tokio::time::sleep(Duration::from_millis(10)).await;
            writer.set("A", 1);
        });

        assert!(cache.await_update(Duration::from_secs(5), &keys(&["A", "B"])).await);
    }

    #[tokio::test]
    async fn multi_key_wait_shares_one_budget() {
        let budget = Duration::from_millis(300);
        let cache = Arc::new(KeyedCache::new());
        let writer = Arc::clone(&cache);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            writer.set("K", 1);
        });

        let start = Instant::now();
        let outstanding = cache.await_keys(start, budget, &keys(&["K", "K2"])).await;
        let elapsed = start.elapsed();

        assert_eq!(outstanding, keys(&["K2"]));
        assert!(elapsed >= budget, "returned early after {elapsed:?}");
        assert!(
            elapsed < budget + Duration::from_millis(150),
            "wait overran its budget: {elapsed:?}"
        );
    }

    #[tokio::test]
    async fn timeout_reports_every_outstanding_key() {
        let cache = KeyedCache::new();
        let since = mark();
        cache.set("B", 2);
        let outstanding = cache
            .await_keys(since, Duration::from_millis(30), &keys(&["A", "B", "C"]))
            .await;
        assert_eq!(outstanding, keys(&["A", "C"]));
    }

    #[tokio::test]
    async fn delete_unblocks_waiter() {
        let cache = Arc::new(KeyedCache::new());
        cache.set("A", 1);

        let since = mark();
        let writer = Arc::clone(&cache);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            writer.delete("A");
        });

        assert!(cache.await_keys(since, Duration::from_secs(5), &keys(&["A"])).await.is_empty());
        assert_eq!(cache.get("A"), None);
    }

    #[tokio::test]
    async fn delete_before_wait_is_seen() {
        let cache = KeyedCache::new();
        cache.set("A", 1);
        let since = mark();
        cache.delete("A");
        assert!(cache.await_keys(since, Duration::ZERO, &keys(&["A"])).await.is_empty());
    }

    #[tokio::test]
    async fn finalization_follows_batch_updates() {
        let cache = KeyedCache::new();
        let since = mark();
        cache.set("solo", 1);
        assert!(!cache.await_finalization_since(since, Duration::from_millis(20)).await);

        cache.replace_all(pairs(&[("A", 1)]));
        assert!(cache.await_finalization_since(since, Duration::ZERO).await);
    }

    #[tokio::test]
    async fn await_finalization_waits_for_next_batch() {
        let cache = Arc::new(KeyedCache::new());
        cache.set_many(pairs(&[("old", 0)]));

        let writer = Arc::clone(&cache);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            writer.set_many(pairs(&[("new", 1)]));
        });

        assert!(cache.await_finalization(Duration::from_secs(5)).await);
        assert_eq!(cache.get("new"), Some(1));
    }
}
