use indexmap::IndexMap;
use std::fmt;

use super::{write_quoted, QNum, QObject};
use crate::types::{Error, Result};

/// String-keyed map of QObjects. Keys are unique; insertion order is kept
/// for display and encoding but does not affect equality.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QDict {
    entries: IndexMap<String, QObject>,
}

impl QDict {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Insert or overwrite `key`. The key is stored in its string form.
    pub fn put(&mut self, key: impl ToString, val: impl Into<QObject>) {
        self.entries.insert(key.to_string(), val.into());
    }

    pub fn put_int(&mut self, key: impl ToString, num: i64) {
        self.put(key, QNum::I64(num));
    }

    pub fn put_uint(&mut self, key: impl ToString, num: u64) {
        self.put(key, QNum::U64(num));
    }

    pub fn put_double(&mut self, key: impl ToString, num: f64) {
        self.put(key, QNum::Double(num));
    }

    pub fn put_str(&mut self, key: impl ToString, s: impl Into<String>) {
        self.put(key, QObject::String(s.into()));
    }

    pub fn put_bool(&mut self, key: impl ToString, b: bool) {
        self.put(key, QObject::Bool(b));
    }

    pub fn put_null(&mut self, key: impl ToString) {
        self.put(key, QObject::Null);
    }

    /// Same as [`QDict::put`]; mirrors item assignment.
    pub fn set(&mut self, key: impl ToString, val: impl Into<QObject>) {
        self.put(key, val);
    }

    pub fn get(&self, key: &str) -> Result<&QObject> {
        self.entries
            .get(key)
            .ok_or_else(|| Error::key_not_found(key))
    }

    pub fn get_mut(&mut self, key: &str) -> Result<&mut QObject> {
        self.entries
            .get_mut(key)
            .ok_or_else(|| Error::key_not_found(key))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove `key`, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Result<QObject> {
        self.entries
            .shift_remove(key)
            .ok_or_else(|| Error::key_not_found(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &QObject> + '_ {
        self.entries.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QObject)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<'a> IntoIterator for &'a QDict {
    type Item = (&'a String, &'a QObject);
    type IntoIter = indexmap::map::Iter<'a, String, QObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<K: ToString, V: Into<QObject>> FromIterator<(K, V)> for QDict {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dict = QDict::new();
        for (k, v) in iter {
            dict.put(k, v);
        }
        dict
    }
}

impl fmt::Display for QDict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write_quoted(f, k)?;
            f.write_str(": ")?;
            fmt::Display::fmt(v, f)?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_put_wraps_primitives() {
        let mut d = QDict::new();
        d.put_int("count", 5);
        d.put_str("name", "tracer");

        assert_eq!(d.len(), 2);
        assert_eq!(d.get("count").unwrap().as_num().unwrap().to_i64(), Some(5));
        assert_eq!(d.get("name").unwrap().to_string(), "tracer");
    }

    #[test]
    fn test_reput_keeps_length() {
        let mut d = QDict::new();
        d.put_int("a", 1);
        d.put_bool("a", true);
        assert_eq!(d.len(), 1);
        assert_eq!(d.get("a").unwrap(), &QObject::Bool(true));
    }

    #[test]
    fn test_key_coerced_to_string() {
        let mut d = QDict::new();
        d.put_null(42);
        assert!(d.contains_key("42"));
        assert!(d.get("42").unwrap().is_null());
    }

    #[test]
    fn test_missing_key() {
        let d = QDict::new();
        let err = d.get("nope").unwrap_err();
        assert!(matches!(err, Error::KeyNotFound(ref k) if k == "nope"));
    }

    #[test]
    fn test_get_mut_updates_nested() {
        let mut d = QDict::new();
        d.put("inner", QDict::new());
        d.get_mut("inner")
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .put_int("x", 1);

        let inner = d.get("inner").unwrap().as_dict().unwrap();
        assert_eq!(inner.len(), 1);
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut d: QDict = [("a", 1i64), ("b", 2), ("c", 3)].into_iter().collect();
        d.remove("b").unwrap();
        assert_eq!(d.keys().collect::<Vec<_>>(), vec!["a", "c"]);
        assert!(d.remove("b").is_err());
    }

    #[test]
    fn test_iteration_reflects_current_state() {
        let mut d = QDict::new();
        d.put_int("a", 1);
        assert_eq!(d.keys().count(), 1);
        d.put_int("b", 2);
        assert_eq!(d.keys().count(), 2);
        assert_eq!(d.iter().map(|(k, _)| k).collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_display() {
        let mut d = QDict::new();
        d.put_int("count", 5);
        d.put_str("name", "tracer");
        d.put_bool("ok", false);
        assert_eq!(d.to_string(), "{'count': 5, 'name': tracer, 'ok': False}");
    }

    #[test]
    fn test_equality_ignores_order() {
        let a: QDict = [("x", 1i64), ("y", 2)].into_iter().collect();
        let b: QDict = [("y", 2i64), ("x", 1)].into_iter().collect();
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn prop_len_counts_distinct_keys(keys in proptest::collection::vec("[a-d]{1,2}", 0..32)) {
            let mut d = QDict::new();
            for (i, k) in keys.iter().enumerate() {
                d.put_int(k, i as i64);
            }
            let distinct: std::collections::HashSet<_> = keys.iter().collect();
            prop_assert_eq!(d.len(), distinct.len());
        }
    }
}
