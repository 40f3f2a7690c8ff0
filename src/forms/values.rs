// src/forms/values.rs

use chrono::NaiveDate;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A value destined for one AcroForm field.
///
/// `Bool` targets checkboxes; every other kind is rendered to text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FormValue {
    Text(String),
    Bool(bool),
    Integer(i64),
    Number(f64),
    Date(NaiveDate),
}

impl FormValue {
    /// Text written into a text field. Dates render as `YYYY-MM-DD`.
    pub fn to_text(&self) -> String {
        match self {
            FormValue::Text(s) => s.clone(),
            FormValue::Bool(b) => b.to_string(),
            FormValue::Integer(n) => n.to_string(),
            FormValue::Number(n) => n.to_string(),
            FormValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

impl From<&str> for FormValue {
    fn from(s: &str) -> Self {
        FormValue::Text(s.to_string())
    }
}

impl From<String> for FormValue {
    fn from(s: String) -> Self {
        FormValue::Text(s)
    }
}

impl From<bool> for FormValue {
    fn from(b: bool) -> Self {
        FormValue::Bool(b)
    }
}

impl From<i64> for FormValue {
    fn from(n: i64) -> Self {
        FormValue::Integer(n)
    }
}

impl From<f64> for FormValue {
    fn from(n: f64) -> Self {
        FormValue::Number(n)
    }
}

impl From<NaiveDate> for FormValue {
    fn from(d: NaiveDate) -> Self {
        FormValue::Date(d)
    }
}

impl<'de> Deserialize<'de> for FormValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bool(bool),
            Integer(i64),
            Number(f64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Bool(b) => FormValue::Bool(b),
            Raw::Integer(n) => FormValue::Integer(n),
            Raw::Number(n) => FormValue::Number(n),
            Raw::Text(s) => FormValue::Text(s),
        })
    }
}

/// Field name -> value, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldValues {
    entries: Vec<(String, FormValue)>,
}

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field; an existing name keeps its position.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FormValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FormValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<FormValue>> FromIterator<(K, V)> for FieldValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = FieldValues::new();
        for (k, v) in iter {
            values.set(k, v);
        }
        values
    }
}

// JSON objects are visited in document order, so this keeps the caller's order.
impl<'de> Deserialize<'de> for FieldValues {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldValuesVisitor;

        impl<'de> Visitor<'de> for FieldValuesVisitor {
            type Value = FieldValues;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object of field names to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<FieldValues, A::Error> {
                let mut values = FieldValues::new();
                while let Some((name, value)) = map.next_entry::<String, FormValue>()? {
                    values.set(name, value);
                }
                Ok(values)
            }
        }

        deserializer.deserialize_map(FieldValuesVisitor)
    }
}
