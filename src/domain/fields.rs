// src/domain/fields.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// The business attributes of an inventory item that are tracked for history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DomainField {
    Asset,
    Serial,
    Model,
    UserLocation,
    Status,
    AssetImage,
    Notes,
}

/// Domain field -> SharePoint column (internal name).
/// Every domain field appears exactly once.
pub const FIELD_KEYS: [(DomainField, &str); 7] = [
    (DomainField::Asset, "Title"),
    (DomainField::Serial, "SerialNumber"),
    (DomainField::Model, "Model"),
    (DomainField::UserLocation, "UserLocation"),
    (DomainField::Status, "Status"),
    (DomainField::AssetImage, "AssetImage"),
    (DomainField::Notes, "Notes"),
];

impl DomainField {
    pub const ALL: [DomainField; 7] = [
        DomainField::Asset,
        DomainField::Serial,
        DomainField::Model,
        DomainField::UserLocation,
        DomainField::Status,
        DomainField::AssetImage,
        DomainField::Notes,
    ];

    /// The internal storage key this field is persisted under.
    pub fn storage_key(self) -> &'static str {
        // FIELD_KEYS is listed in declaration order.
        FIELD_KEYS[self as usize].1
    }

    pub fn from_storage_key(key: &str) -> Option<Self> {
        FIELD_KEYS
            .iter()
            .find(|(_, k)| *k == key)
            .map(|(field, _)| *field)
    }

    /// Name used in JSON payloads and URLs.
    pub fn as_str(self) -> &'static str {
        match self {
            DomainField::Asset => "asset",
            DomainField::Serial => "serial",
            DomainField::Model => "model",
            DomainField::UserLocation => "userLocation",
            DomainField::Status => "status",
            DomainField::AssetImage => "assetImage",
            DomainField::Notes => "notes",
        }
    }

    /// Column heading for pages and exports.
    pub fn label(self) -> &'static str {
        match self {
            DomainField::Asset => "Asset",
            DomainField::Serial => "Serial",
            DomainField::Model => "Model",
            DomainField::UserLocation => "User / Location",
            DomainField::Status => "Status",
            DomainField::AssetImage => "Image",
            DomainField::Notes => "Notes",
        }
    }
}

impl fmt::Display for DomainField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn table_is_complete_and_bidirectional() {
        let keys: HashSet<&str> = FIELD_KEYS.iter().map(|(_, k)| *k).collect();
        assert_eq!(keys.len(), DomainField::ALL.len());

        for field in DomainField::ALL {
            let key = field.storage_key();
            assert!(FIELD_KEYS.contains(&(field, key)));
            assert_eq!(DomainField::from_storage_key(key), Some(field));
        }
    }

    #[test]
    fn table_rows_follow_declaration_order() {
        for (i, (field, key)) in FIELD_KEYS.iter().enumerate() {
            assert_eq!(*field as usize, i);
            assert_eq!(field.storage_key(), *key);
        }
        assert_eq!(DomainField::Serial.storage_key(), "SerialNumber");
    }

    #[test]
    fn unknown_storage_key_maps_to_none() {
        assert_eq!(DomainField::from_storage_key("title"), None);
        assert_eq!(DomainField::from_storage_key("Created"), None);
    }

    #[test]
    fn serializes_as_camel_case() {
        let json = serde_json::to_string(&DomainField::UserLocation).unwrap();
        assert_eq!(json, "\"userLocation\"");
    }
}
