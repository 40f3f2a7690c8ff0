// src/domain/item.rs

use crate::domain::fields::DomainField;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Status written when an asset leaves the shelf.
pub const STATUS_DEPLOYED: &str = "Deployed";
/// Status written when an asset comes back.
pub const STATUS_READY: &str = "Ready to Deploy";

/// One inventory record, flattened out of whatever the backend returned.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub asset: Option<String>,
    pub serial: Option<String>,
    pub model: Option<String>,
    pub user_location: Option<String>,
    pub status: Option<String>,
    pub asset_image: Option<String>,
    pub notes: Option<String>,
    pub modified: Option<String>,
    pub modified_by: Option<String>,
}

/// A historical record of an item's raw column values.
///
/// Backends hand these out newest-first. Values are kept raw (as JSON) so the
/// history engine decides what counts as empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSnapshot {
    pub modified: String,
    pub modified_by: Option<String>,
    pub fields: Map<String, Value>,
}

impl InventoryItem {
    /// Builds an item from a column map keyed by storage keys.
    pub fn from_fields(
        id: impl Into<String>,
        fields: &Map<String, Value>,
        modified: Option<String>,
        modified_by: Option<String>,
    ) -> Self {
        let text = |field: DomainField| value_text(fields.get(field.storage_key()));

        Self {
            id: id.into(),
            asset: text(DomainField::Asset),
            serial: text(DomainField::Serial),
            model: text(DomainField::Model),
            user_location: text(DomainField::UserLocation),
            status: text(DomainField::Status),
            asset_image: text(DomainField::AssetImage),
            notes: text(DomainField::Notes),
            modified,
            modified_by,
        }
    }

    pub fn get(&self, field: DomainField) -> Option<&str> {
        let value = match field {
            DomainField::Asset => &self.asset,
            DomainField::Serial => &self.serial,
            DomainField::Model => &self.model,
            DomainField::UserLocation => &self.user_location,
            DomainField::Status => &self.status,
            DomainField::AssetImage => &self.asset_image,
            DomainField::Notes => &self.notes,
        };
        value.as_deref()
    }

    pub fn set(&mut self, field: DomainField, value: Option<String>) {
        let slot = match field {
            DomainField::Asset => &mut self.asset,
            DomainField::Serial => &mut self.serial,
            DomainField::Model => &mut self.model,
            DomainField::UserLocation => &mut self.user_location,
            DomainField::Status => &mut self.status,
            DomainField::AssetImage => &mut self.asset_image,
            DomainField::Notes => &mut self.notes,
        };
        *slot = value.filter(|v| !v.trim().is_empty());
    }

    /// Case-insensitive substring match on asset, serial and model.
    /// A blank query matches everything.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [&self.asset, &self.serial, &self.model]
            .into_iter()
            .flatten()
            .any(|v| v.to_lowercase().contains(&needle))
    }

    /// Column map keyed by storage keys; empty fields are written as null.
    pub fn to_fields(&self) -> Map<String, Value> {
        DomainField::ALL
            .iter()
            .map(|field| {
                let value = self
                    .get(*field)
                    .map(|v| Value::String(v.to_string()))
                    .unwrap_or(Value::Null);
                (field.storage_key().to_string(), value)
            })
            .collect()
    }
}

/// Normalizes a raw column value to text.
///
/// Null, missing and blank strings are `None`. Scalars use their natural text
/// and structured values (image columns, lookups) their compact JSON.
pub fn value_text(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    };

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn value_text_treats_blank_as_empty() {
        assert_eq!(value_text(None), None);
        assert_eq!(value_text(Some(&Value::Null)), None);
        assert_eq!(value_text(Some(&json!(""))), None);
        assert_eq!(value_text(Some(&json!("   \t"))), None);
        assert_eq!(value_text(Some(&json!(" x "))), Some(" x ".to_string()));
        assert_eq!(value_text(Some(&json!(42))), Some("42".to_string()));
        assert_eq!(value_text(Some(&json!(false))), Some("false".to_string()));
    }

    #[test]
    fn from_fields_reads_storage_keys() {
        let fields = json!({
            "Title": "A-100",
            "SerialNumber": "SN1",
            "Model": "Latitude 7440",
            "Status": "Ready to Deploy",
            "Notes": "  ",
            "UnrelatedColumn": "ignored"
        });
        let item = InventoryItem::from_fields("7", fields.as_object().unwrap(), None, None);

        assert_eq!(item.id, "7");
        assert_eq!(item.asset.as_deref(), Some("A-100"));
        assert_eq!(item.serial.as_deref(), Some("SN1"));
        assert_eq!(item.get(DomainField::Model), Some("Latitude 7440"));
        assert_eq!(item.notes, None);
        assert_eq!(item.user_location, None);
    }

    #[test]
    fn matches_searches_identifying_fields() {
        let item = InventoryItem {
            id: "1".into(),
            asset: Some("LAP-001".into()),
            model: Some("Latitude 7440".into()),
            notes: Some("spare charger".into()),
            ..Default::default()
        };
        assert!(item.matches(""));
        assert!(item.matches("lap-0"));
        assert!(item.matches("LATITUDE"));
        assert!(!item.matches("charger"));
    }

    #[test]
    fn to_fields_round_trips_through_storage_keys() {
        let mut item = InventoryItem {
            id: "1".into(),
            ..Default::default()
        };
        item.set(DomainField::Status, Some(STATUS_DEPLOYED.to_string()));
        item.set(DomainField::UserLocation, Some("Bldg 4".to_string()));
        item.set(DomainField::Notes, Some("".to_string()));

        let fields = item.to_fields();
        assert_eq!(fields.len(), 7);
        assert_eq!(fields["Status"], json!("Deployed"));
        assert_eq!(fields["Notes"], Value::Null);

        let back = InventoryItem::from_fields("1", &fields, None, None);
        assert_eq!(back, item);
    }
}
