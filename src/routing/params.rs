//! Ordered string maps for route parameters and query strings.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// An insertion-ordered `name -> value` map.
///
/// Route parameters keep leftmost-first capture order. For query strings a
/// repeated key overwrites the earlier value in place, which keeps the map
/// flat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `application/x-www-form-urlencoded` string (`a=1&b=2`).
    pub fn from_urlencoded(input: &str) -> Self {
        url::form_urlencoded::parse(input.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Insert a value, replacing an existing entry without moving it.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

impl Serialize for Params {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_preserved() {
        let params: Params = [("userId", "1"), ("boardId", "123")].into_iter().collect();
        let names: Vec<&str> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["userId", "boardId"]);
        assert_eq!(
            serde_json::to_string(&params).unwrap(),
            r#"{"userId":"1","boardId":"123"}"#
        );
    }

    #[test]
    fn test_urlencoded_decoding_and_repeats() {
        let query = Params::from_urlencoded("name=sub_bong&age=20&tag=a&msg=hello+world%21&tag=b");
        assert_eq!(query.get("name"), Some("sub_bong"));
        assert_eq!(query.get("msg"), Some("hello world!"));
        assert_eq!(query.get("tag"), Some("b"));
        assert_eq!(query.len(), 4);
    }
}
