//! JSON wire form for QObjects.
//!
//! Null ↔ `null`, Num ↔ number, String ↔ string, Bool ↔ bool, Dict ↔ object,
//! List ↔ array. Integers decode to `I64` when they fit and `U64` otherwise.
//! serde_json writes non-finite doubles as `null`.

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::{QDict, QList, QNum, QObject};
use crate::types::Result;

impl QObject {
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn to_json_pretty_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

impl Serialize for QNum {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match *self {
            QNum::I64(v) => serializer.serialize_i64(v),
            QNum::U64(v) => serializer.serialize_u64(v),
            QNum::Double(d) => serializer.serialize_f64(d),
        }
    }
}

impl Serialize for QObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            QObject::Null => serializer.serialize_unit(),
            QObject::Num(n) => n.serialize(serializer),
            QObject::String(s) => serializer.serialize_str(s),
            QObject::Dict(d) => d.serialize(serializer),
            QObject::List(l) => l.serialize(serializer),
            QObject::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}

impl Serialize for QDict {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl Serialize for QList {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for item in self.iter() {
            seq.serialize_element(item)?;
        }
        seq.end()
    }
}

struct QObjectVisitor;

impl<'de> Visitor<'de> for QObjectVisitor {
    type Value = QObject;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON value")
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<QObject, E> {
        Ok(QObject::Null)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<QObject, E> {
        Ok(QObject::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> std::result::Result<QObject, D::Error> {
        QObject::deserialize(d)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<QObject, E> {
        Ok(QObject::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<QObject, E> {
        Ok(QObject::Num(QNum::I64(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<QObject, E> {
        Ok(QObject::Num(match i64::try_from(v) {
            Ok(signed) => QNum::I64(signed),
            Err(_) => QNum::U64(v),
        }))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<QObject, E> {
        Ok(QObject::Num(QNum::Double(v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<QObject, E> {
        Ok(QObject::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<QObject, E> {
        Ok(QObject::String(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<QObject, A::Error> {
        let mut list = QList::new();
        while let Some(item) = seq.next_element::<QObject>()? {
            list.append(item);
        }
        Ok(QObject::List(list))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<QObject, A::Error> {
        let mut dict = QDict::new();
        while let Some((k, v)) = map.next_entry::<String, QObject>()? {
            dict.put(k, v);
        }
        Ok(QObject::Dict(dict))
    }
}

impl<'de> Deserialize<'de> for QObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(QObjectVisitor)
    }
}
