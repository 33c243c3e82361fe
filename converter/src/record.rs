use std::slice;

/// Ordered tag mapping of a single measurement
///
/// Iteration follows insertion order. Inserting an existing key replaces its
/// value in place, so the key keeps the position of its first insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    tags: Vec<(String, String)>,
}

impl TagSet {
    pub fn new() -> Self {
        Self { tags: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tags: Vec::with_capacity(capacity),
        }
    }

    /// insert a tag, returning the value it replaced if the key was already present
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();

        match self.tags.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.tags.push((key, value));

                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> Tags<'_> {
        Tags {
            inner: self.tags.iter(),
        }
    }
}

/// Borrowing iterator over the entries of a `TagSet`
pub struct Tags<'a> {
    inner: slice::Iter<'a, (String, String)>,
}

impl<'a> Iterator for Tags<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a> IntoIterator for &'a TagSet {
    type Item = (&'a str, &'a str);
    type IntoIter = Tags<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TagSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tags = TagSet::new();

        for (key, value) in iter {
            tags.insert(key, value);
        }

        tags
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A single benchmark score, as read from one row of a result file
pub struct MeasurementRecord {
    /// raw text of the score cell
    pub value: String,
    /// seconds since the unix epoch, shared by all records of a file
    pub timestamp: i64,
    pub tags: TagSet,
}

#[cfg(test)]
mod tests {
    use super::TagSet;

    #[test]
    fn overwrite_keeps_position() {
        let mut tags = TagSet::new();
        tags.insert("algo", "PageRank");
        tags.insert("test", "run");
        tags.insert("build", "3.4");

        assert_eq!(tags.insert("algo", "Louvain"), Some("PageRank".to_owned()));
        assert_eq!(
            tags.iter().collect::<Vec<_>>(),
            vec![("algo", "Louvain"), ("test", "run"), ("build", "3.4")]
        );
    }

    #[test]
    fn collects_in_insertion_order() {
        let tags: TagSet = [("b", "1"), ("a", "2"), ("b", "3")].into_iter().collect();

        assert_eq!(tags.len(), 2);
        assert_eq!(tags.get("b"), Some("3"));
        assert!(tags.contains_key("a"));
        assert!(!tags.contains_key("c"));
        assert_eq!(tags.iter().map(|(key, _)| key).collect::<Vec<_>>(), ["b", "a"]);
    }
}
