//! Wire models for the lookup API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Record types requested on every search.
pub const SEARCH_TYPES: [&str; 7] = [
    "email", "phone", "name", "ip", "vehicle", "username", "password",
];

/// Request body sent to the lookup API.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub query: String,
    pub types: Vec<String>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            types: SEARCH_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Response body returned by the lookup API.
///
/// Every field is optional so a partially-shaped body still formats.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Option<Vec<Entry>>,
}

impl SearchResponse {
    /// Entries in API order, empty when the field is absent or null.
    pub fn entries(&self) -> &[Entry] {
        self.results.as_deref().unwrap_or(&[])
    }
}

/// One typed result item.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Entry {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub details: Option<Map<String, Value>>,
}

impl Entry {
    pub fn entry_type(&self) -> EntryType {
        EntryType::parse(self.kind.as_deref())
    }

    /// Displayed value, `N/A` when missing.
    pub fn display_value(&self) -> String {
        render_value(self.value.as_ref())
    }

    /// Displayed detail field, `N/A` when missing or null.
    pub fn detail(&self, key: &str) -> String {
        render_value(self.details.as_ref().and_then(|d| d.get(key)))
    }
}

/// Placeholder for any absent field.
pub const MISSING: &str = "N/A";

fn render_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => MISSING.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Known entry types. Anything else keeps its raw name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryType {
    Email,
    Phone,
    Ip,
    Name,
    Vehicle,
    Other(String),
}

/// One declared detail field: JSON key, label, and icon.
#[derive(Debug, Clone, Copy)]
pub struct DetailField {
    pub key: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
}

const fn field(key: &'static str, label: &'static str, icon: &'static str) -> DetailField {
    DetailField { key, label, icon }
}

const EMAIL_FIELDS: &[DetailField] = &[
    field("breaches", "Breaches", "📈"),
    field("suspicious", "Suspicious", "⚠️"),
];
const PHONE_FIELDS: &[DetailField] = &[
    field("carrier", "Carrier", "🏢"),
    field("region", "Region", "🌍"),
];
const IP_FIELDS: &[DetailField] = &[
    field("country", "Country", "🌍"),
    field("city", "City", "🏙️"),
    field("isp", "ISP", "🏢"),
];
const NAME_FIELDS: &[DetailField] = &[
    field("profiles", "Profiles", "📊"),
    field("social_media", "Social Media", "🔗"),
];
const VEHICLE_FIELDS: &[DetailField] = &[
    field("make", "Make", "🏭"),
    field("model", "Model", "🎨"),
    field("year", "Year", "📅"),
];

impl EntryType {
    pub fn parse(kind: Option<&str>) -> Self {
        match kind {
            Some("email") => EntryType::Email,
            Some("phone") => EntryType::Phone,
            Some("ip") => EntryType::Ip,
            Some("name") => EntryType::Name,
            Some("vehicle") => EntryType::Vehicle,
            Some(other) => EntryType::Other(other.to_string()),
            None => EntryType::Other("Unknown".to_string()),
        }
    }

    /// Uppercased type name for the block header.
    pub fn display_name(&self) -> String {
        match self {
            EntryType::Email => "EMAIL".to_string(),
            EntryType::Phone => "PHONE".to_string(),
            EntryType::Ip => "IP".to_string(),
            EntryType::Name => "NAME".to_string(),
            EntryType::Vehicle => "VEHICLE".to_string(),
            EntryType::Other(raw) => raw.to_uppercase(),
        }
    }

    /// Icon and label for the headline line, `None` for unknown types.
    pub fn headline(&self) -> Option<(&'static str, &'static str)> {
        match self {
            EntryType::Email => Some(("📧", "Email")),
            EntryType::Phone => Some(("📱", "Phone")),
            EntryType::Ip => Some(("📍", "IP")),
            EntryType::Name => Some(("👤", "Name")),
            EntryType::Vehicle => Some(("🚗", "Vehicle")),
            EntryType::Other(_) => None,
        }
    }

    /// Detail schema for the type. Unknown types have none.
    pub fn detail_fields(&self) -> &'static [DetailField] {
        match self {
            EntryType::Email => EMAIL_FIELDS,
            EntryType::Phone => PHONE_FIELDS,
            EntryType::Ip => IP_FIELDS,
            EntryType::Name => NAME_FIELDS,
            EntryType::Vehicle => VEHICLE_FIELDS,
            EntryType::Other(_) => &[],
        }
    }
}
