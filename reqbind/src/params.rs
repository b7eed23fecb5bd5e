use indexmap::IndexMap;

/// An ordered multi-map of request parameters: each key keeps every value it
/// was given, in input order, and keys keep their first-seen order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParamMap {
    inner: IndexMap<String, Vec<String>>,
}

impl ParamMap {
    /// Creates an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `application/x-www-form-urlencoded` input, such as a query string
    pub fn from_urlencoded(input: &[u8]) -> Self {
        form_urlencoded::parse(input).collect()
    }

    /// Adds a value under `key`, after any existing ones
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.entry(key.into()).or_default().push(value.into());
    }

    /// Returns the first value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_all(key).first().map(String::as_str)
    }

    /// Returns every value for `key`, empty if absent
    pub fn get_all(&self, key: &str) -> &[String] {
        self.inner.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Iterates over keys and their values
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.inner
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParamMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for ParamMap {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.append(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[reqbind_testhelpers::test]
    fn keeps_repeated_values_in_order() {
        let params = ParamMap::from_urlencoded(b"data=1&other=x&data=2&data=3");
        assert_eq!(params.get_all("data"), ["1", "2", "3"]);
        assert_eq!(params.get("data"), Some("1"));
        assert_eq!(params.iter().map(|(k, _)| k).collect::<Vec<_>>(), ["data", "other"]);
    }

    #[reqbind_testhelpers::test]
    fn decodes_percent_and_plus() {
        let params = ParamMap::from_urlencoded(b"name=Omri+Siniver&city=Tel%20Aviv");
        assert_eq!(params.get("name"), Some("Omri Siniver"));
        assert_eq!(params.get("city"), Some("Tel Aviv"));
        assert!(params.get_all("missing").is_empty());
    }
}
