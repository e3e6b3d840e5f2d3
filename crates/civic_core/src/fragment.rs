use crate::error::AssemblyError;
use schemars::JsonSchema;
use serde::de::{Deserializer, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// Scrapers are sloppy about types: ids arrive as numbers, text nodes as
// lists, flags as "1". Decoding accepts all of that and fails only on shapes
// that carry no text at all, attributing the failure to the offending key.

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(default)]
pub struct RawFragment {
    /// Portal-internal meeting identifier.
    pub meeting_id: Option<String>,
    /// Fallback identifier; ignored when `meeting_id` yields a key.
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub start: Option<String>,
    /// Start date alone; joined with `time` when `start` is absent.
    pub date: Option<String>,
    pub time: Option<String>,
    pub end: Option<String>,
    /// End time of day on the start date.
    pub end_time: Option<String>,
    pub all_day: bool,
    pub time_notes: Option<String>,
    pub status_text: Option<String>,
    pub location: Option<RawLocation>,
    pub links: Vec<RawLink>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(default)]
pub struct RawLocation {
    pub name: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(default)]
pub struct RawLink {
    pub href: Option<String>,
    pub title: Option<String>,
}

impl RawLink {
    pub fn new(href: &str, title: &str) -> Self {
        Self {
            href: Some(href.to_string()),
            title: Some(title.to_string()),
        }
    }
}

impl RawFragment {
    pub fn from_value(value: &Value) -> Result<Self, AssemblyError> {
        let Value::Object(map) = value else {
            return Err(AssemblyError::MalformedField {
                field: "fragment",
                reason: format!("expected an object, found {}", kind(value)),
            });
        };
        Ok(Self {
            meeting_id: text(map, "meeting_id")?,
            id: text(map, "id")?,
            title: text(map, "title")?,
            description: text(map, "description")?,
            start: date_text(map, "start", "start")?,
            date: date_text(map, "date", "start")?,
            time: date_text(map, "time", "start")?,
            end: date_text(map, "end", "end")?,
            end_time: date_text(map, "end_time", "end")?,
            all_day: map.get("all_day").is_some_and(flag),
            time_notes: text(map, "time_notes")?,
            status_text: text(map, "status_text")?,
            location: location(map.get("location"))?,
            links: links(map.get("links"))?,
            source: text(map, "source")?,
        })
    }
}

impl<'de> Deserialize<'de> for RawFragment {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(D::Error::custom)
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn value_to_text(value: &Value) -> Result<Option<String>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Array(items) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                if let Some(part) = value_to_text(item)? {
                    parts.push(part);
                }
            }
            Ok(if parts.is_empty() { None } else { Some(parts.join(" ")) })
        }
        Value::Object(_) => Err("expected text, found an object".to_string()),
    }
}

fn text(map: &Map<String, Value>, key: &'static str) -> Result<Option<String>, AssemblyError> {
    map.get(key).map_or(Ok(None), |value| {
        value_to_text(value).map_err(|reason| AssemblyError::MalformedField { field: key, reason })
    })
}

fn date_text(
    map: &Map<String, Value>,
    key: &str,
    field: &'static str,
) -> Result<Option<String>, AssemblyError> {
    map.get(key).map_or(Ok(None), |value| {
        value_to_text(value).map_err(|_| AssemblyError::MalformedDate {
            field,
            raw: value.to_string(),
        })
    })
}

fn flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1"),
        _ => false,
    }
}

fn location(value: Option<&Value>) -> Result<Option<RawLocation>, AssemblyError> {
    let invalid = |key: &str, reason: String| AssemblyError::InvalidLocation {
        reason: format!("`{key}`: {reason}"),
    };
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => {
            let field = |key: &str| {
                map.get(key)
                    .map_or(Ok(None), |v| value_to_text(v).map_err(|reason| invalid(key, reason)))
            };
            Ok(Some(RawLocation {
                name: field("name")?,
                address: field("address")?,
            }))
        }
        // A bare string is the address line.
        Some(other) => Ok(Some(RawLocation {
            name: None,
            address: value_to_text(other).map_err(|reason| invalid("location", reason))?,
        })),
    }
}

fn link(index: usize, value: &Value) -> Result<RawLink, AssemblyError> {
    let invalid = |reason: String| AssemblyError::InvalidLink { index, reason };
    let Value::Object(map) = value else {
        return Err(invalid(format!("expected an object, found {}", kind(value))));
    };
    let field = |key: &str| {
        map.get(key).map_or(Ok(None), |v| {
            value_to_text(v).map_err(|reason| invalid(format!("`{key}`: {reason}")))
        })
    };
    Ok(RawLink {
        href: field("href")?,
        title: field("title")?,
    })
}

fn links(value: Option<&Value>) -> Result<Vec<RawLink>, AssemblyError> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(index, item)| link(index, item))
            .collect(),
        // A lone object is a one-element list.
        Some(single @ Value::Object(_)) => Ok(vec![link(0, single)?]),
        Some(other) => Err(AssemblyError::InvalidLink {
            index: 0,
            reason: format!("links must be an array of objects, found {}", kind(other)),
        }),
    }
}
