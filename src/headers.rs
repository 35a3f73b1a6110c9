//! Multi-value header container used to build responses layer by layer.
//!
//! Keys are stored exactly as given: `Content-Type` and `content-type` are two
//! different entries. Normalisation is left to the transport, which folds
//! names case-insensitively when the reply is written. Each key is cleared on
//! the transport before its values are added, so when two keys differ only by
//! case, the one written last replaces the other. Which one that is follows
//! the unspecified key order.

use std::collections::HashMap;
use std::collections::hash_map;

/// A string-keyed mapping from header name to an ordered list of values.
///
/// Enumeration order of the keys is unspecified. The order of the values
/// under one key is always the order in which they were added.
///
/// ```rust
/// use stackable::Headers;
///
/// let mut headers = Headers::new();
/// headers.set("Vary", "Origin");
/// headers.add("Vary", "Accept-Encoding");
///
/// assert_eq!(headers.get("Vary"), ["Origin", "Accept-Encoding"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    inner: HashMap<String, Vec<String>>,
}

impl Headers {
    pub fn new() -> Self {
        Self { inner: HashMap::new() }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// Replaces every value stored under `key` with the single `value`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.insert(key.into(), vec![value.into()]);
    }

    /// Appends `value` under `key`, creating the entry if it is absent.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.entry(key.into()).or_default().push(value.into());
    }

    /// Values stored under `key`; an empty slice when there are none.
    pub fn get(&self, key: &str) -> &[String] {
        self.inner.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Removes `key` and hands back whatever was stored under it.
    pub fn delete(&mut self, key: &str) -> Vec<String> {
        self.inner.remove(key).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterates over every `(name, values)` pair.
    ///
    /// The iterator borrows the container, so it cannot be mutated while an
    /// enumeration is in progress.
    pub fn entries(&self) -> Entries<'_> {
        Entries { inner: self.inner.iter() }
    }
}

/// Iterator returned by [`Headers::entries`].
pub struct Entries<'a> {
    inner: hash_map::Iter<'a, String, Vec<String>>,
}

impl<'a> Iterator for Entries<'a> {
    type Item = (&'a str, &'a [String]);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = (&'a str, &'a [String]);
    type IntoIter = Entries<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries()
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut headers = Headers::new();
        for (k, v) in iter {
            headers.add(k, v);
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::Headers;

    #[test]
    fn add_after_set_appends_in_call_order() {
        let mut headers = Headers::new();
        headers.add("X-Trace", "stale");
        headers.set("X-Trace", "a");
        headers.add("X-Trace", "b");
        headers.add("X-Trace", "c");

        assert_eq!(headers.get("X-Trace"), ["a", "b", "c"]);
    }

    #[test]
    fn add_on_missing_key_creates_single_value() {
        let mut headers = Headers::new();
        headers.add("Allow", "GET");

        assert!(headers.contains("Allow"));
        assert_eq!(headers.get("Allow"), ["GET"]);
    }

    #[test]
    fn set_replaces_every_value() {
        let mut headers = Headers::new();
        headers.add("Allow", "GET");
        headers.add("Allow", "POST");
        headers.set("Allow", "PUT");

        assert_eq!(headers.get("Allow"), ["PUT"]);
    }

    #[test]
    fn delete_returns_removed_values() {
        let mut headers = Headers::new();
        headers.add("Vary", "Origin");
        headers.add("Vary", "Accept");

        assert_eq!(headers.delete("Vary"), vec!["Origin", "Accept"]);
        assert!(!headers.contains("Vary"));
        assert!(headers.get("Vary").is_empty());
    }

    #[test]
    fn delete_on_absent_key_is_a_noop() {
        let mut headers = Headers::new();
        headers.set("Content-Type", "text/plain");
        let before = headers.clone();

        assert!(headers.delete("Location").is_empty());
        assert_eq!(headers, before);
    }

    #[test]
    fn keys_are_case_sensitive() {
        let mut headers = Headers::new();
        headers.set("Content-Type", "text/plain");

        assert!(!headers.contains("content-type"));
        assert!(headers.get("content-type").is_empty());
    }

    #[test]
    fn entries_visits_every_key_once() {
        let headers: Headers = [("A", "1"), ("B", "2"), ("A", "3")].into_iter().collect();

        let mut seen: Vec<_> = headers
            .entries()
            .map(|(k, v)| (k.to_owned(), v.to_vec()))
            .collect();
        seen.sort();

        assert_eq!(
            seen,
            vec![
                ("A".to_owned(), vec!["1".to_owned(), "3".to_owned()]),
                ("B".to_owned(), vec!["2".to_owned()]),
            ]
        );
    }
}
