//! Shared wire types for the datacenter inventory REST service.
//!
//! This crate is the **single source of truth** for request/response shapes.
//! Field names follow the server's JSON exactly; Rust-side names are only
//! renamed where the wire name reads poorly.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ─── Search fields ───────────────────────────────────────────────────────────

/// Equipment column the inventory can be filtered on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    ServiceTag,
    LicenseType,
    EquipmentType,
}

impl SearchField {
    pub const ALL: [SearchField; 3] = [
        SearchField::ServiceTag,
        SearchField::LicenseType,
        SearchField::EquipmentType,
    ];

    /// Query-parameter name understood by the equipment list endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ServiceTag => "service_tag",
            Self::LicenseType => "license_type",
            Self::EquipmentType => "equipment_type",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ServiceTag => "Service Tag",
            Self::LicenseType => "License Type",
            Self::EquipmentType => "Equipment Type",
        }
    }

    /// Read this field's value off a record.
    pub fn value_of<'a>(&self, record: &'a EquipmentRecord) -> &'a str {
        match self {
            Self::ServiceTag => &record.service_tag,
            Self::LicenseType => &record.license_type,
            Self::EquipmentType => &record.equipment_type,
        }
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known [`SearchField`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSearchField(pub String);

impl fmt::Display for UnknownSearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown search field '{}' (expected service_tag, license_type or equipment_type)",
            self.0
        )
    }
}

impl std::error::Error for UnknownSearchField {}

impl FromStr for SearchField {
    type Err = UnknownSearchField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "service_tag" | "tag" => Ok(Self::ServiceTag),
            "license_type" | "license" => Ok(Self::LicenseType),
            "equipment_type" | "type" => Ok(Self::EquipmentType),
            _ => Err(UnknownSearchField(s.to_string())),
        }
    }
}

// ─── Auth ────────────────────────────────────────────────────────────────────

/// Username + password login (`POST /token/`).
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Access/refresh pair issued at login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Body of `POST /token/refresh/`.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// A rotated `refresh` is only present when the server rotates tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

/// Generic `{message}` acknowledgement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

// ─── Datacenters ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Datacenter {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

// ─── Equipment ───────────────────────────────────────────────────────────────

/// One inventoried asset as returned by the equipment list endpoints.
///
/// `is_expired` is computed by the server and never recomputed locally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EquipmentRecord {
    pub id: i64,
    pub equipment_type: String,
    pub service_tag: String,
    pub license_type: String,
    pub serial_number: String,
    #[serde(rename = "license_expired_date", default)]
    pub license_expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_expired: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datacenter: Option<String>,
}

/// Writable equipment fields for add/modify.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EquipmentDraft {
    pub equipment_type: String,
    pub service_tag: String,
    pub license_type: String,
    pub serial_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_expired_date: Option<NaiveDate>,
}

impl From<&EquipmentRecord> for EquipmentDraft {
    fn from(record: &EquipmentRecord) -> Self {
        Self {
            equipment_type: record.equipment_type.clone(),
            service_tag: record.service_tag.clone(),
            license_type: record.license_type.clone(),
            serial_number: record.serial_number.clone(),
            license_expired_date: record.license_expiry_date,
        }
    }
}

/// Server-side equipment filter. Empty fields are omitted from the query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EquipmentQuery {
    pub service_tag: Option<String>,
    pub license_type: Option<String>,
    pub equipment_type: Option<String>,
}

impl EquipmentQuery {
    /// Query matching a single field exactly.
    pub fn single(field: SearchField, value: impl Into<String>) -> Self {
        let mut query = Self::default();
        query.set(field, Some(value.into()));
        query
    }

    pub fn get(&self, field: SearchField) -> Option<&str> {
        match field {
            SearchField::ServiceTag => self.service_tag.as_deref(),
            SearchField::LicenseType => self.license_type.as_deref(),
            SearchField::EquipmentType => self.equipment_type.as_deref(),
        }
    }

    pub fn set(&mut self, field: SearchField, value: Option<String>) {
        let value = value.filter(|v| !v.trim().is_empty());
        match field {
            SearchField::ServiceTag => self.service_tag = value,
            SearchField::LicenseType => self.license_type = value,
            SearchField::EquipmentType => self.equipment_type = value,
        }
    }

    pub fn is_empty(&self) -> bool {
        SearchField::ALL.iter().all(|f| self.get(*f).is_none())
    }

    /// `(name, value)` pairs for the non-empty fields, in declaration order.
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        SearchField::ALL
            .iter()
            .filter_map(|f| self.get(*f).map(|v| (f.as_str(), v)))
            .collect()
    }
}

// ─── Bulk operations ─────────────────────────────────────────────────────────

/// Raw body returned by `POST .../import-excel/`.
///
/// Older servers only send `message`, `total_rows_processed` and `errors`;
/// newer ones send explicit counts and `warnings`. `errors` is either a flat
/// list or a field-keyed map and is normalized by the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportReport {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub imported_count: Option<u64>,
    #[serde(default)]
    pub updated_count: Option<u64>,
    #[serde(default)]
    pub error_count: Option<u64>,
    #[serde(default)]
    pub total_rows_processed: Option<u64>,
    #[serde(default)]
    pub errors: serde_json::Value,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ImportReport {
    /// Whether a JSON body has the shape of an import report rather than a
    /// plain error body.
    pub fn looks_like_report(body: &serde_json::Value) -> bool {
        let Some(obj) = body.as_object() else {
            return false;
        };
        obj.contains_key("errors")
            && ["message", "imported_count", "error_count", "total_rows_processed"]
                .iter()
                .any(|key| obj.contains_key(*key))
            && !obj.contains_key("error")
    }
}

/// Body of `POST .../send-pdf/`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SendPdfRequest {
    pub email: String,
}
