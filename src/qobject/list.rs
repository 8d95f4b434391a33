use std::fmt;

use super::{QNum, QObject};
use crate::types::{Error, Result};

/// Ordered sequence of QObjects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QList {
    items: Vec<QObject>,
}

impl QList {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn append(&mut self, val: impl Into<QObject>) {
        self.items.push(val.into());
    }

    pub fn append_int(&mut self, num: i64) {
        self.append(QNum::I64(num));
    }

    pub fn append_uint(&mut self, num: u64) {
        self.append(QNum::U64(num));
    }

    pub fn append_double(&mut self, num: f64) {
        self.append(QNum::Double(num));
    }

    pub fn append_str(&mut self, s: impl Into<String>) {
        self.append(QObject::String(s.into()));
    }

    pub fn append_bool(&mut self, b: bool) {
        self.append(QObject::Bool(b));
    }

    pub fn append_null(&mut self) {
        self.append(QObject::Null);
    }

    pub fn get(&self, index: usize) -> Result<&QObject> {
        let len = self.items.len();
        self.items
            .get(index)
            .ok_or(Error::IndexOutOfRange { index, len })
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut QObject> {
        let len = self.items.len();
        self.items
            .get_mut(index)
            .ok_or(Error::IndexOutOfRange { index, len })
    }

    /// Replace the element at `index`. Does not grow the list.
    pub fn set(&mut self, index: usize, val: impl Into<QObject>) -> Result<()> {
        *self.get_mut(index)? = val.into();
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QObject> {
        self.items.iter()
    }
}

impl<'a> IntoIterator for &'a QList {
    type Item = &'a QObject;
    type IntoIter = std::slice::Iter<'a, QObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl IntoIterator for QList {
    type Item = QObject;
    type IntoIter = std::vec::IntoIter<QObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<V: Into<QObject>> FromIterator<V> for QList {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for QList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            fmt::Display::fmt(item, f)?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_append_bool_and_null() {
        let mut l = QList::new();
        l.append_bool(true);
        l.append_null();

        assert_eq!(l.len(), 2);
        assert!(l.get(0).unwrap().is_truthy());
        assert!(!l.get(1).unwrap().is_truthy());
    }

    #[test]
    fn test_index_out_of_range() {
        let mut l = QList::new();
        l.append_int(1);
        assert!(matches!(
            l.get(1),
            Err(Error::IndexOutOfRange { index: 1, len: 1 })
        ));
        assert!(l.set(5, true).is_err());
        assert_eq!(l.len(), 1);
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut l: QList = [1i64, 2, 3].into_iter().collect();
        l.set(1, "two").unwrap();
        assert_eq!(l.get(1).unwrap().as_str(), Some("two"));
        assert_eq!(l.len(), 3);
    }

    #[test]
    fn test_display_leaves_strings_bare() {
        let mut l = QList::new();
        l.append_str("it's");
        l.append_double(0.5);
        l.append_null();
        assert_eq!(l.to_string(), "[it's, 0.5, None]");
    }

    proptest! {
        #[test]
        fn prop_append_grows_by_one(seed in proptest::collection::vec(any::<i64>(), 0..16), v in any::<i64>()) {
            let mut l: QList = seed.into_iter().collect();
            let before = l.len();
            l.append_int(v);
            prop_assert_eq!(l.len(), before + 1);
            prop_assert_eq!(l.get(before).unwrap(), &QObject::Num(QNum::I64(v)));
        }
    }
}
