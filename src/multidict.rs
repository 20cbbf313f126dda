//! Ordered multi-valued dictionary
//!
//! `MultiDict` keeps a flat list of `(key, value)` pairs. Keys may repeat,
//! insertion order is always preserved, and entries only disappear when
//! explicitly removed. It backs request headers, response headers and query
//! parameters throughout the crate.
//!
//! Single-value lookups (`get`) see the **last** value stored for a key, while
//! `pop` and `set_default` act on the **first** one. Both behaviours are kept
//! on purpose; code relying on either ordering keeps working.
//!
//! ```rust
//! use restkit::MultiDict;
//!
//! let mut params = MultiDict::new();
//! params.add("tag", "a");
//! params.add("page", "1");
//! params.add("tag", "b");
//!
//! assert_eq!(params.len(), 3);
//! assert_eq!(params.get("tag").unwrap(), &"b");
//! assert_eq!(params.get_all("tag"), vec![&"a", &"b"]);
//! ```

use std::borrow::{Borrow, BorrowMut, Cow};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;

use tracing::warn;

use crate::error::{Error, Result};

/// How keys are compared on lookup and removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyMatch {
    /// Byte-for-byte equality
    #[default]
    Exact,
    /// Equality of the lowercased forms
    IgnoreCase,
}

impl KeyMatch {
    /// Check whether a stored key matches the wanted one under this policy
    pub fn matches(self, stored: &str, wanted: &str) -> bool {
        KeyMatcher::new(self, wanted).is_match(stored)
    }
}

struct KeyMatcher<'k> {
    policy: KeyMatch,
    wanted: Cow<'k, str>,
}

impl<'k> KeyMatcher<'k> {
    fn new(policy: KeyMatch, wanted: &'k str) -> Self {
        let wanted = match policy {
            KeyMatch::Exact => Cow::Borrowed(wanted),
            KeyMatch::IgnoreCase => Cow::Owned(wanted.to_lowercase()),
        };
        Self { policy, wanted }
    }

    fn is_match(&self, stored: &str) -> bool {
        match self.policy {
            KeyMatch::Exact => stored == self.wanted,
            KeyMatch::IgnoreCase => stored.to_lowercase() == self.wanted,
        }
    }
}

/// A value of the map returned by [`MultiDict::mixed`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MixedValue<V> {
    /// The key appeared once
    One(V),
    /// The key appeared several times, values in insertion order
    Many(Vec<V>),
}

/// An ordered dictionary that can hold several values per key
///
/// The storage parameter `S` is the pair list itself. It is an owned
/// `Vec` for ordinary maps, or a `&mut Vec` for a view created with
/// [`MultiDict::view_list`].
#[derive(Clone)]
pub struct MultiDict<V, S = Vec<(String, V)>> {
    items: S,
    _value: PhantomData<V>,
}

/// A `MultiDict` operating directly on a borrowed pair list
pub type MultiDictView<'a, V> = MultiDict<V, &'a mut Vec<(String, V)>>;

impl<V> MultiDict<V> {
    /// Create an empty dictionary
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Create an empty dictionary with room for `capacity` pairs
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_vec(Vec::with_capacity(capacity))
    }

    /// Create a dictionary from a sequence of pairs, repeats included
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
    {
        Self::from_vec(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Create a dictionary from a single-valued mapping
    ///
    /// Entries are taken in the mapping's iteration order.
    pub fn from_mapping<M, K>(mapping: M) -> Self
    where
        M: IntoIterator<Item = (K, V)>,
        K: Into<String>,
    {
        Self::from_pairs(mapping)
    }

    /// Copy another multi-valued dictionary, keeping order and repeats
    pub fn from_multi<S>(other: &MultiDict<V, S>) -> Self
    where
        V: Clone,
        S: Borrow<Vec<(String, V)>>,
    {
        Self::from_vec(other.pairs().to_vec())
    }

    /// Operate on an existing pair list without copying it
    ///
    /// Every change made through the view lands in `list`, and whatever
    /// `list` held beforehand is visible through the view.
    pub fn view_list(list: &mut Vec<(String, V)>) -> MultiDictView<'_, V> {
        MultiDict {
            items: list,
            _value: PhantomData,
        }
    }

    /// Consume the dictionary, returning its pairs
    pub fn into_pairs(self) -> Vec<(String, V)> {
        self.items
    }

    fn from_vec(items: Vec<(String, V)>) -> Self {
        Self {
            items,
            _value: PhantomData,
        }
    }
}

impl<V, S> MultiDict<V, S>
where
    S: Borrow<Vec<(String, V)>>,
{
    /// Get the underlying pairs in insertion order
    pub fn pairs(&self) -> &[(String, V)] {
        self.items.borrow()
    }

    /// Total number of pairs, repeated keys counted each time
    pub fn len(&self) -> usize {
        self.pairs().len()
    }

    /// Check if the dictionary holds no pairs
    pub fn is_empty(&self) -> bool {
        self.pairs().is_empty()
    }

    /// Iterate over pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> + '_ {
        self.pairs().iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate over keys in insertion order; repeated keys are yielded each time
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.pairs().iter().map(|(k, _)| k.as_str())
    }

    /// Iterate over values in insertion order
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.pairs().iter().map(|(_, v)| v)
    }

    /// Get the last value stored for `key`
    pub fn get(&self, key: &str) -> Result<&V> {
        self.get_matching(key, KeyMatch::Exact)
    }

    /// Case-insensitive [`get`](Self::get)
    pub fn iget(&self, key: &str) -> Result<&V> {
        self.get_matching(key, KeyMatch::IgnoreCase)
    }

    /// Get the last value whose key matches under `policy`
    pub fn get_matching(&self, key: &str, policy: KeyMatch) -> Result<&V> {
        let matcher = KeyMatcher::new(policy, key);
        self.pairs()
            .iter()
            .rev()
            .find(|(k, _)| matcher.is_match(k))
            .map(|(_, v)| v)
            .ok_or_else(|| Error::key_not_found(key))
    }

    /// Get every value stored for `key`, in insertion order
    pub fn get_all(&self, key: &str) -> Vec<&V> {
        self.get_all_matching(key, KeyMatch::Exact)
    }

    /// Get every value whose key matches under `policy`
    pub fn get_all_matching(&self, key: &str, policy: KeyMatch) -> Vec<&V> {
        let matcher = KeyMatcher::new(policy, key);
        self.pairs()
            .iter()
            .filter(|(k, _)| matcher.is_match(k))
            .map(|(_, v)| v)
            .collect()
    }

    /// Get the only value stored for `key`
    ///
    /// Fails with `KeyNotFound` when there is none and with `AmbiguousKey`
    /// when there is more than one.
    pub fn get_one(&self, key: &str) -> Result<&V> {
        let mut values = self.get_all(key);
        match values.len() {
            0 => Err(Error::key_not_found(key)),
            1 => Ok(values.remove(0)),
            count => Err(Error::AmbiguousKey {
                key: key.to_string(),
                count,
            }),
        }
    }

    /// Check if at least one pair has this key
    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs().iter().any(|(k, _)| k == key)
    }

    /// Collapse into a plain map
    ///
    /// Keys seen once map to their value, keys seen several times map to
    /// the list of their values.
    pub fn mixed(&self) -> HashMap<String, MixedValue<V>>
    where
        V: Clone,
    {
        let mut result: HashMap<String, MixedValue<V>> = HashMap::new();
        for (key, value) in self.pairs() {
            match result.remove(key) {
                None => {
                    result.insert(key.clone(), MixedValue::One(value.clone()));
                }
                Some(MixedValue::One(first)) => {
                    result.insert(key.clone(), MixedValue::Many(vec![first, value.clone()]));
                }
                Some(MixedValue::Many(mut values)) => {
                    values.push(value.clone());
                    result.insert(key.clone(), MixedValue::Many(values));
                }
            }
        }
        result
    }

    /// Collapse into a map of value lists
    pub fn dict_of_lists(&self) -> HashMap<String, Vec<V>>
    where
        V: Clone,
    {
        let mut result: HashMap<String, Vec<V>> = HashMap::new();
        for (key, value) in self.pairs() {
            result.entry(key.clone()).or_default().push(value.clone());
        }
        result
    }
}

impl<V, S> MultiDict<V, S>
where
    S: BorrowMut<Vec<(String, V)>>,
{
    fn pairs_mut(&mut self) -> &mut Vec<(String, V)> {
        self.items.borrow_mut()
    }

    /// Append a pair, never touching existing ones
    pub fn add(&mut self, key: impl Into<String>, value: V) {
        self.pairs_mut().push((key.into(), value));
    }

    /// Replace every value of `key` with a single `value`
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        self.pairs_mut().retain(|(k, _)| *k != key);
        self.pairs_mut().push((key, value));
    }

    /// Remove every pair with this key
    pub fn delete(&mut self, key: &str) -> Result<()> {
        self.delete_matching(key, KeyMatch::Exact)
    }

    /// Remove every pair whose key matches under `policy`
    pub fn delete_matching(&mut self, key: &str, policy: KeyMatch) -> Result<()> {
        let matcher = KeyMatcher::new(policy, key);
        let before = self.len();
        self.pairs_mut().retain(|(k, _)| !matcher.is_match(k));
        if self.len() == before {
            return Err(Error::key_not_found(key));
        }
        Ok(())
    }

    /// Get the first value for `key`, inserting `default` if there is none
    pub fn set_default(&mut self, key: impl Into<String>, default: V) -> &mut V {
        let key = key.into();
        let index = match self.pairs().iter().position(|(k, _)| *k == key) {
            Some(index) => index,
            None => {
                self.pairs_mut().push((key, default));
                self.len() - 1
            }
        };
        &mut self.pairs_mut()[index].1
    }

    /// Remove and return the **first** value stored for `key`
    pub fn pop(&mut self, key: &str) -> Result<V> {
        self.pop_matching(key, KeyMatch::Exact)
    }

    /// Like [`pop`](Self::pop), returning `default` when the key is absent
    pub fn pop_or(&mut self, key: &str, default: V) -> V {
        self.pop(key).unwrap_or(default)
    }

    /// Case-insensitive [`pop`](Self::pop)
    pub fn ipop(&mut self, key: &str) -> Result<V> {
        self.pop_matching(key, KeyMatch::IgnoreCase)
    }

    /// Case-insensitive [`pop_or`](Self::pop_or)
    pub fn ipop_or(&mut self, key: &str, default: V) -> V {
        self.ipop(key).unwrap_or(default)
    }

    /// Remove and return the first value whose key matches under `policy`
    pub fn pop_matching(&mut self, key: &str, policy: KeyMatch) -> Result<V> {
        let matcher = KeyMatcher::new(policy, key);
        let index = self
            .pairs()
            .iter()
            .position(|(k, _)| matcher.is_match(k))
            .ok_or_else(|| Error::key_not_found(key))?;
        Ok(self.pairs_mut().remove(index).1)
    }

    /// Remove and return the most recently added pair
    pub fn pop_last(&mut self) -> Option<(String, V)> {
        self.pairs_mut().pop()
    }

    /// Remove all pairs
    pub fn clear(&mut self) {
        self.pairs_mut().clear();
    }

    /// Merge pairs with single-value semantics
    ///
    /// Each source pair replaces every existing value of its key, so
    /// repeated keys in the source collapse to their last value. Use
    /// `extend` to keep every value.
    pub fn update<I, K>(&mut self, source: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
    {
        let source: Vec<(String, V)> = source.into_iter().map(|(k, v)| (k.into(), v)).collect();

        let mut seen = HashSet::new();
        let duplicates: Vec<&str> = source
            .iter()
            .filter(|(k, _)| !seen.insert(k.as_str()))
            .map(|(k, _)| k.as_str())
            .collect();
        if !duplicates.is_empty() {
            warn!(
                keys = ?duplicates,
                "MultiDict::update overwrites duplicate keys; consider extend()"
            );
        }

        for (key, value) in source {
            self.set(key, value);
        }
    }
}

impl<V> Default for MultiDict<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, S, K> Extend<(K, V)> for MultiDict<V, S>
where
    S: BorrowMut<Vec<(String, V)>>,
    K: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.pairs_mut()
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v)));
    }
}

impl<V, K: Into<String>> FromIterator<(K, V)> for MultiDict<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

impl<V, K: Into<String>> From<Vec<(K, V)>> for MultiDict<V> {
    fn from(pairs: Vec<(K, V)>) -> Self {
        Self::from_pairs(pairs)
    }
}

impl<V, K: Into<String>, const N: usize> From<[(K, V); N]> for MultiDict<V> {
    fn from(pairs: [(K, V); N]) -> Self {
        Self::from_pairs(pairs)
    }
}

impl<V, K: Into<String>, H> From<HashMap<K, V, H>> for MultiDict<V> {
    fn from(mapping: HashMap<K, V, H>) -> Self {
        Self::from_mapping(mapping)
    }
}

impl<V, K: Into<String>> From<BTreeMap<K, V>> for MultiDict<V> {
    fn from(mapping: BTreeMap<K, V>) -> Self {
        Self::from_mapping(mapping)
    }
}

impl<V> IntoIterator for MultiDict<V> {
    type Item = (String, V);
    type IntoIter = std::vec::IntoIter<(String, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_pairs().into_iter()
    }
}

impl<V, S, S2> PartialEq<MultiDict<V, S2>> for MultiDict<V, S>
where
    V: PartialEq,
    S: Borrow<Vec<(String, V)>>,
    S2: Borrow<Vec<(String, V)>>,
{
    fn eq(&self, other: &MultiDict<V, S2>) -> bool {
        self.pairs() == other.pairs()
    }
}

impl<V: Eq> Eq for MultiDict<V> {}

impl<V, S> fmt::Debug for MultiDict<V, S>
where
    V: fmt::Debug,
    S: Borrow<Vec<(String, V)>>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MultiDict(")?;
        f.debug_list().entries(self.pairs().iter()).finish()?;
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MultiDict<i32> {
        MultiDict::from_pairs([("a", 1), ("b", 2), ("a", 3)])
    }

    #[test]
    fn test_add_keeps_every_value() {
        let mut dict = MultiDict::new();
        dict.add("k1", "first");
        dict.add("k2", "other");
        dict.add("k1", "second");

        assert_eq!(dict.get_all("k1"), vec![&"first", &"second"]);
        assert_eq!(dict.get("k1").unwrap(), &"second");
        assert_eq!(dict.len(), 3);
    }

    #[test]
    fn test_set_replaces_all_values() {
        let mut dict = sample();
        dict.set("a", 10);

        assert_eq!(dict.get_all("a"), vec![&10]);
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.keys().collect::<Vec<_>>(), vec!["b", "a"]);

        dict.set("fresh", 7);
        assert_eq!(dict.get_all("fresh"), vec![&7]);
    }

    #[test]
    fn test_delete_removes_every_entry() {
        let mut dict = sample();
        dict.delete("a").unwrap();

        assert!(!dict.contains_key("a"));
        assert_eq!(dict.len(), 1);
        assert!(matches!(dict.delete("a"), Err(Error::KeyNotFound(k)) if k == "a"));
    }

    #[test]
    fn test_get_missing_key() {
        let dict = sample();
        assert!(matches!(dict.get("zzz"), Err(Error::KeyNotFound(_))));
        assert!(dict.get_all("zzz").is_empty());
    }

    #[test]
    fn test_get_one() {
        let dict = sample();
        assert_eq!(dict.get_one("b").unwrap(), &2);
        assert!(matches!(
            dict.get_one("a"),
            Err(Error::AmbiguousKey { count: 2, .. })
        ));
        assert!(matches!(dict.get_one("c"), Err(Error::KeyNotFound(_))));
    }

    #[test]
    fn test_pop_takes_first_match() {
        let mut dict = sample();
        assert_eq!(dict.pop("a").unwrap(), 1);
        assert_eq!(dict.get_all("a"), vec![&3]);
        assert_eq!(dict.pop_or("missing", 42), 42);
        assert!(dict.pop("missing").is_err());
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let mut headers = MultiDict::new();
        headers.add("Content-Type", "text/plain".to_string());
        headers.add("X-Trace", "1".to_string());
        headers.add("content-type", "application/json".to_string());

        assert_eq!(headers.iget("CONTENT-TYPE").unwrap(), "application/json");
        assert!(headers.get("CONTENT-TYPE").is_err());
        assert_eq!(
            headers.get_all_matching("content-TYPE", KeyMatch::IgnoreCase).len(),
            2
        );

        assert_eq!(headers.ipop("CONTENT-type").unwrap(), "text/plain");
        assert_eq!(headers.keys().collect::<Vec<_>>(), vec!["X-Trace", "content-type"]);
        assert_eq!(headers.ipop_or("nope", "dflt".to_string()), "dflt");

        headers.delete_matching("X-TRACE", KeyMatch::IgnoreCase).unwrap();
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_set_default() {
        let mut dict = sample();
        assert_eq!(*dict.set_default("a", 99), 1);
        assert_eq!(*dict.set_default("z", 5), 5);
        assert_eq!(dict.len(), 4);
        assert_eq!(dict.pairs().last(), Some(&("z".to_string(), 5)));
    }

    #[test]
    fn test_mixed_and_dict_of_lists() {
        let dict = sample();

        let mixed = dict.mixed();
        assert_eq!(mixed.len(), 2);
        assert_eq!(mixed["a"], MixedValue::Many(vec![1, 3]));
        assert_eq!(mixed["b"], MixedValue::One(2));

        let lists = dict.dict_of_lists();
        assert_eq!(lists["a"], vec![1, 3]);
        assert_eq!(lists["b"], vec![2]);
    }

    #[test]
    fn test_extend_preserves_multiplicity() {
        let mut dict = sample();
        dict.extend(vec![("a", 4), ("c", 5)]);

        assert_eq!(dict.get_all("a"), vec![&1, &3, &4]);
        assert_eq!(dict.len(), 5);
    }

    #[test]
    fn test_update_overwrites() {
        let mut dict = sample();
        dict.update(vec![("a", 7), ("b", 8), ("b", 9)]);

        assert_eq!(dict.get_all("a"), vec![&7]);
        assert_eq!(dict.get_all("b"), vec![&9]);
        assert_eq!(dict.len(), 2);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn update_logging(source: Vec<(&str, i32)>) -> String {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut dict = sample();
            dict.update(source);
        });
        logs.contents()
    }

    #[test]
    fn test_update_warns_on_duplicate_source_keys() {
        let output = update_logging(vec![("a", 7), ("b", 8), ("b", 9)]);
        assert!(output.contains("WARN"), "no warning in {:?}", output);
        assert!(output.contains("overwrites duplicate keys"));
        assert!(output.contains(r#"["b"]"#));

        let output = update_logging(vec![("a", 7), ("b", 8)]);
        assert!(output.is_empty(), "unexpected output {:?}", output);
    }

    #[test]
    fn test_key_match_policy() {
        assert!(KeyMatch::Exact.matches("Accept", "Accept"));
        assert!(!KeyMatch::Exact.matches("accept", "Accept"));
        assert!(KeyMatch::IgnoreCase.matches("accept", "ACCEPT"));
        assert!(!KeyMatch::IgnoreCase.matches("accept-language", "accept"));
        assert_eq!(KeyMatch::default(), KeyMatch::Exact);
    }

    #[test]
    fn test_into_pairs_keeps_order() {
        let dict = sample();
        assert_eq!(
            dict.clone().into_pairs(),
            vec![("a".to_string(), 1), ("b".to_string(), 2), ("a".to_string(), 3)]
        );
        let keys: Vec<String> = dict.into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b", "a"]);
    }

    #[test]
    fn test_round_trip_through_pairs() {
        let source = sample();
        let copy = MultiDict::from_pairs(source.pairs().to_vec());
        assert_eq!(copy, source);
        assert_eq!(MultiDict::from_multi(&source), source);
        assert_eq!(
            copy.iter().collect::<Vec<_>>(),
            vec![("a", &1), ("b", &2), ("a", &3)]
        );
    }

    #[test]
    fn test_view_list_aliases_vector() {
        let mut backing = vec![("a".to_string(), 1)];
        {
            let mut view = MultiDict::view_list(&mut backing);
            assert_eq!(view.get("a").unwrap(), &1);
            view.add("b", 2);
            view.set("a", 3);
        }
        assert_eq!(backing, vec![("b".to_string(), 2), ("a".to_string(), 3)]);

        backing.push(("c".to_string(), 4));
        let view = MultiDict::view_list(&mut backing);
        assert!(view.contains_key("c"));
        assert_eq!(view.len(), 3);
    }

    #[test]
    fn test_from_mapping_and_pop_last() {
        let mut mapping = BTreeMap::new();
        mapping.insert("x", 1);
        mapping.insert("y", 2);

        let mut dict = MultiDict::from_mapping(mapping);
        assert_eq!(dict.keys().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(dict.pop_last(), Some(("y".to_string(), 2)));

        dict.clear();
        assert!(dict.is_empty());
        assert_eq!(dict.pop_last(), None);
    }

    #[test]
    fn test_debug_format() {
        let dict = MultiDict::from_pairs([("a", 1), ("a", 2)]);
        assert_eq!(format!("{:?}", dict), r#"MultiDict([("a", 1), ("a", 2)])"#);
    }
}
