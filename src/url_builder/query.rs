use serde::{Deserialize, Serialize};
use tracing::trace;
use url::form_urlencoded;
use urlencoding::encode;

/// A single query-string value: either a scalar or a list of repeated values.
///
/// Lists arise from `name[]=a&name[]=b` style query strings and from callers
/// storing a `Vec<String>` directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    Single(String),
    List(Vec<String>),
}

impl QueryValue {
    /// Returns the scalar value, or `None` for a list.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            QueryValue::Single(value) => Some(value),
            QueryValue::List(_) => None,
        }
    }

    /// Returns the list items, or `None` for a scalar.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            QueryValue::Single(_) => None,
            QueryValue::List(items) => Some(items),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Single(value.to_owned())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Single(value)
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(items: Vec<String>) -> Self {
        QueryValue::List(items)
    }
}

impl From<Vec<&str>> for QueryValue {
    fn from(items: Vec<&str>) -> Self {
        QueryValue::List(items.into_iter().map(str::to_owned).collect())
    }
}

/// An insertion-ordered map of query-string keys to values.
///
/// Backed by a `Vec` of pairs so that iteration and serialization reproduce
/// the order in which keys first appeared. Re-inserting an existing key
/// replaces its value in place without moving it to the back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryMap {
    entries: Vec<(String, QueryValue)>,
}

impl QueryMap {
    /// Creates an empty query map.
    pub fn new() -> Self {
        QueryMap::default()
    }

    /// Parses a query string (`a=1&b=2`) into a map.
    ///
    /// Pairs are split on `&` and percent-decoded (`+` decodes to a space).
    /// A key written `name[]` is stripped of the suffix and appended to a
    /// list value under `name`; a repeated plain key overwrites the earlier
    /// value, last one wins.
    pub fn parse(query: &str) -> Self {
        let mut map = QueryMap::new();

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let value = value.into_owned();
            trace!("Parsed query pair: {}={}", key, value);

            if let Some(list_key) = key.strip_suffix("[]") {
                match map.get_mut(list_key) {
                    Some(QueryValue::List(items)) => items.push(value),
                    _ => map.insert(list_key, QueryValue::List(vec![value])),
                }
            } else {
                map.insert(&key, QueryValue::Single(value));
            }
        }

        map
    }

    /// Builds the query-string form of this map.
    ///
    /// Scalar values serialize as `key=value`; list values repeat the key
    /// with a numeric index, brackets percent-encoded
    /// (`key%5B0%5D=a&key%5B1%5D=b`). Keys and values are percent-encoded
    /// per RFC 3986, so a space becomes `%20` rather than `+`.
    pub fn to_query_string(&self) -> String {
        let mut pairs = Vec::with_capacity(self.entries.len());

        for (key, value) in &self.entries {
            match value {
                QueryValue::Single(value) => {
                    pairs.push(format!("{}={}", encode(key), encode(value)));
                }
                QueryValue::List(items) => {
                    for (index, item) in items.iter().enumerate() {
                        pairs.push(format!("{}%5B{}%5D={}", encode(key), index, encode(item)));
                    }
                }
            }
        }

        pairs.join("&")
    }

    /// Returns the value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.entries
            .iter()
            .find(|(entry_key, _)| entry_key == key)
            .map(|(_, value)| value)
    }

    /// Returns a mutable reference to the value stored under `key`, if any.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut QueryValue> {
        self.entries
            .iter_mut()
            .find(|(entry_key, _)| entry_key == key)
            .map(|(_, value)| value)
    }

    /// Stores `value` under `key`.
    ///
    /// An existing key keeps its position in the map; a new key is appended.
    pub fn insert<V: Into<QueryValue>>(&mut self, key: &str, value: V) {
        let value = value.into();
        match self.get_mut(key) {
            Some(existing) => *existing = value,
            None => self.entries.push((key.to_owned(), value)),
        }
    }

    /// Removes `key` from the map, returning its value if it was present.
    pub fn remove(&mut self, key: &str) -> Option<QueryValue> {
        let position = self
            .entries
            .iter()
            .position(|(entry_key, _)| entry_key == key)?;
        Some(self.entries.remove(position).1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterates over the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value))
    }
}

impl<K: Into<String>, V: Into<QueryValue>> FromIterator<(K, V)> for QueryMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = QueryMap::new();
        for (key, value) in iter {
            let key = key.into();
            map.insert(&key, value);
        }
        map
    }
}

impl IntoIterator for QueryMap {
    type Item = (String, QueryValue);
    type IntoIter = std::vec::IntoIter<(String, QueryValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for QueryMap {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_pairs() {
        let map = QueryMap::parse("x=1&y=2");
        assert_eq!(map.get("x"), Some(&QueryValue::from("1")));
        assert_eq!(map.get("y"), Some(&QueryValue::from("2")));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn parse_decodes_values() {
        let map = QueryMap::parse("q=hello%20world&plus=a+b");
        assert_eq!(map.get("q"), Some(&QueryValue::from("hello world")));
        assert_eq!(map.get("plus"), Some(&QueryValue::from("a b")));
    }

    #[test]
    fn parse_bracket_keys_accumulate() {
        let map = QueryMap::parse("tag[]=a&tag[]=b");
        assert_eq!(map.get("tag"), Some(&QueryValue::from(vec!["a", "b"])));
    }

    #[test]
    fn parse_repeated_plain_key_last_wins() {
        let map = QueryMap::parse("a=1&a=2");
        assert_eq!(map.get("a"), Some(&QueryValue::from("2")));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn parse_key_without_value() {
        let map = QueryMap::parse("flag");
        assert_eq!(map.get("flag"), Some(&QueryValue::from("")));
    }

    #[test]
    fn parse_empty_string_gives_empty_map() {
        assert!(QueryMap::parse("").is_empty());
    }

    #[test]
    fn build_scalar_pairs() {
        let map = QueryMap::parse("x=1&y=2");
        assert_eq!(map.to_query_string(), "x=1&y=2");
    }

    #[test]
    fn build_encodes_reserved_characters() {
        let mut map = QueryMap::new();
        map.insert("q", "a&b=c");
        assert_eq!(map.to_query_string(), "q=a%26b%3Dc");
    }

    #[test]
    fn build_list_uses_indexed_keys() {
        let mut map = QueryMap::new();
        map.insert("tag", vec!["a", "b"]);
        assert_eq!(map.to_query_string(), "tag%5B0%5D=a&tag%5B1%5D=b");
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut map = QueryMap::parse("a=1&b=2&c=3");
        map.insert("b", "9");

        let keys: Vec<&str> = map.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(map.get("b"), Some(&QueryValue::from("9")));
    }

    #[test]
    fn remove_returns_value() {
        let mut map = QueryMap::parse("a=1&b=2");
        assert_eq!(map.remove("a"), Some(QueryValue::from("1")));
        assert_eq!(map.remove("a"), None);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn iteration_preserves_insertion_order() {
        let map = QueryMap::parse("z=1&a=2&m=3");
        let keys: Vec<&str> = map.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn serializes_as_ordered_json_object() {
        let mut map = QueryMap::new();
        map.insert("b", "1");
        map.insert("a", vec!["x", "y"]);

        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"b":"1","a":["x","y"]}"#);
    }
}
