use crate::config::SpiderConfig;
use crate::output::load_output;
use crate::schema::{Classification, Status, TIMESTAMP_LEN};
use anyhow::Result;
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;

pub const REQUIRED_FIELDS: [&str; 12] = [
    "title",
    "description",
    "classification",
    "start",
    "end",
    "all_day",
    "time_notes",
    "location",
    "links",
    "source",
    "status",
    "id",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Check {
    ItemsScraped,
    RequiredFields,
    FieldTypes,
    Classification,
    LocationStructure,
    LinksStructure,
    StartFormat,
    EndFormat,
    StatusValues,
    IdFormat,
    SourceUrl,
}

impl Check {
    pub const ALL: [Check; 11] = [
        Check::ItemsScraped,
        Check::RequiredFields,
        Check::FieldTypes,
        Check::Classification,
        Check::LocationStructure,
        Check::LinksStructure,
        Check::StartFormat,
        Check::EndFormat,
        Check::StatusValues,
        Check::IdFormat,
        Check::SourceUrl,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Check::ItemsScraped => "items_scraped",
            Check::RequiredFields => "required_fields",
            Check::FieldTypes => "field_types",
            Check::Classification => "classification",
            Check::LocationStructure => "location_structure",
            Check::LinksStructure => "links_structure",
            Check::StartFormat => "start_format",
            Check::EndFormat => "end_format",
            Check::StatusValues => "status_values",
            Check::IdFormat => "id_format",
            Check::SourceUrl => "source_url",
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordRef {
    Id(String),
    Position(usize),
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordRef::Id(id) => write!(f, "id {id}"),
            RecordRef::Position(pos) => write!(f, "record #{pos}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub check: Check,
    pub record: Option<RecordRef>, // None for collection-level failures
    pub field: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.record {
            Some(record) => write!(f, "[{}] {record}: {}: {}", self.check, self.field, self.message),
            None => write!(f, "[{}] {}", self.check, self.message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectations {
    pub id_prefix: String,
    pub source_prefix: String,
    pub classification: Classification,
}

impl From<&SpiderConfig> for Expectations {
    fn from(config: &SpiderConfig) -> Self {
        Self {
            id_prefix: config.id_prefix(),
            source_prefix: config.origin().to_string(),
            classification: config.classification,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub records: usize,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn first(&self, check: Check) -> Option<&Violation> {
        self.violations.iter().find(|v| v.check == check)
    }

    pub fn count(&self, check: Check) -> usize {
        self.violations.iter().filter(|v| v.check == check).count()
    }

    /// Per-category result lines, first violation shown for each failure.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        for check in Check::ALL {
            match self.first(check) {
                None => lines.push(format!("PASS {check}")),
                Some(first) => lines.push(format!(
                    "FAIL {check} ({} violation(s)); first: {first}",
                    self.count(check)
                )),
            }
        }
        let verdict = if self.passed() { "PASSED" } else { "FAILED" };
        lines.push(format!(
            "{verdict}: {} record(s), {} violation(s)",
            self.records,
            self.violations.len()
        ));
        lines.join("\n")
    }
}

/// Checks every record; never stops at the first problem.
pub fn validate(records: &[Value], expect: &Expectations) -> ValidationReport {
    let mut report = ValidationReport {
        records: records.len(),
        violations: Vec::new(),
    };
    if records.is_empty() {
        report.violations.push(Violation {
            check: Check::ItemsScraped,
            record: None,
            field: String::new(),
            message: "No items scraped".to_string(),
        });
        return report;
    }

    for (position, value) in records.iter().enumerate() {
        let record = match value.get("id").and_then(Value::as_str) {
            Some(id) => RecordRef::Id(id.to_string()),
            None => RecordRef::Position(position),
        };
        let mut sink = Sink {
            record,
            out: &mut report.violations,
        };
        match value.as_object() {
            Some(item) => check_item(item, expect, &mut sink),
            None => sink.push(Check::RequiredFields, "", "record is not a JSON object"),
        }
    }
    report
}

/// `load → validate-all → report`.
pub fn load_and_validate(path: &Path, expect: &Expectations) -> Result<ValidationReport> {
    let records = load_output(path)?;
    Ok(validate(&records, expect))
}

struct Sink<'a> {
    record: RecordRef,
    out: &'a mut Vec<Violation>,
}

impl Sink<'_> {
    fn push(&mut self, check: Check, field: &str, message: impl Into<String>) {
        self.out.push(Violation {
            check,
            record: Some(self.record.clone()),
            field: field.to_string(),
            message: message.into(),
        });
    }
}

fn check_item(item: &Map<String, Value>, expect: &Expectations, sink: &mut Sink<'_>) {
    for field in REQUIRED_FIELDS {
        if !item.contains_key(field) {
            sink.push(Check::RequiredFields, field, format!("Missing field: {field}"));
        }
    }

    for field in ["title", "description", "time_notes"] {
        if let Some(value) = item.get(field) {
            if !value.is_string() {
                sink.push(Check::FieldTypes, field, format!("expected a string, got {value}"));
            }
        }
    }
    if item.get("title").and_then(Value::as_str) == Some("") {
        sink.push(Check::FieldTypes, "title", "title is empty");
    }
    if let Some(value) = item.get("all_day") {
        if !value.is_boolean() {
            sink.push(Check::FieldTypes, "all_day", format!("expected a boolean, got {value}"));
        }
    }

    if let Some(value) = item.get("classification") {
        if value.as_str() != Some(expect.classification.as_str()) {
            sink.push(
                Check::Classification,
                "classification",
                format!("expected {:?}, got {value}", expect.classification.as_str()),
            );
        }
    }

    if let Some(location) = item.get("location") {
        check_location(location, sink);
    }
    if let Some(links) = item.get("links") {
        check_links(links, sink);
    }

    if let Some(start) = item.get("start") {
        match start.as_str() {
            _ if start.is_null() => sink.push(Check::StartFormat, "start", "start is null"),
            Some(text) if text.chars().count() == TIMESTAMP_LEN => {}
            _ => sink.push(
                Check::StartFormat,
                "start",
                format!("expected a {TIMESTAMP_LEN}-character timestamp, got {start}"),
            ),
        }
    }
    if let Some(end) = item.get("end") {
        match end.as_str() {
            _ if end.is_null() => {}
            Some(text) if text.chars().count() == TIMESTAMP_LEN => {}
            _ => sink.push(
                Check::EndFormat,
                "end",
                format!("expected null or a {TIMESTAMP_LEN}-character timestamp, got {end}"),
            ),
        }
    }

    if let Some(status) = item.get("status") {
        let valid = status
            .as_str()
            .is_some_and(|s| Status::ALL.iter().any(|known| known.as_str() == s));
        if !valid {
            sink.push(Check::StatusValues, "status", format!("invalid status {status}"));
        }
    }

    if let Some(id) = item.get("id") {
        if !id.as_str().is_some_and(|s| s.starts_with(&expect.id_prefix)) {
            sink.push(
                Check::IdFormat,
                "id",
                format!("{id} does not start with {:?}", expect.id_prefix),
            );
        }
    }

    if let Some(source) = item.get("source") {
        if !source.as_str().is_some_and(|s| s.starts_with(&expect.source_prefix)) {
            sink.push(
                Check::SourceUrl,
                "source",
                format!("{source} does not start with {:?}", expect.source_prefix),
            );
        }
    }
}

fn check_location(location: &Value, sink: &mut Sink<'_>) {
    let Some(location) = location.as_object() else {
        sink.push(Check::LocationStructure, "location", "location is not an object");
        return;
    };
    if !location.contains_key("name") {
        sink.push(Check::LocationStructure, "location.name", "missing key");
    }
    match location.get("address") {
        None => sink.push(Check::LocationStructure, "location.address", "missing key"),
        Some(Value::String(address)) if address.is_empty() => {
            sink.push(Check::LocationStructure, "location.address", "address is empty")
        }
        Some(Value::String(_)) => {}
        Some(other) => sink.push(
            Check::LocationStructure,
            "location.address",
            format!("expected a string, got {other}"),
        ),
    }
}

fn check_links(links: &Value, sink: &mut Sink<'_>) {
    let Some(links) = links.as_array() else {
        sink.push(Check::LinksStructure, "links", "links is not a list");
        return;
    };
    for (index, link) in links.iter().enumerate() {
        for key in ["href", "title"] {
            if link.get(key).is_none() {
                sink.push(
                    Check::LinksStructure,
                    &format!("links[{index}].{key}"),
                    "missing key",
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn expect() -> Expectations {
        Expectations {
            id_prefix: "tulok_boed/".to_string(),
            source_prefix: "https://tulsaschools.diligent.community/".to_string(),
            classification: Classification::Board,
        }
    }

    fn record() -> Value {
        json!({
            "title": "Regular Meeting",
            "description": "",
            "classification": "Board",
            "start": "2025-12-08 17:30:00",
            "end": null,
            "all_day": false,
            "time_notes": "",
            "location": { "name": "", "address": "3027 S New Haven Ave" },
            "links": [{ "href": "https://tulsaschools.diligent.community/document/1", "title": "" }],
            "source": "https://tulsaschools.diligent.community/Portal/MeetingInformation.aspx?Org=Cal&Id=1234",
            "status": "confirmed",
            "id": "tulok_boed/1234"
        })
    }

    #[test]
    fn conformant_record_passes() {
        let report = validate(&[record()], &expect());
        assert!(report.passed(), "{}", report.summary());
        assert!(report.summary().ends_with("PASSED: 1 record(s), 0 violation(s)"));
    }

    #[test]
    fn empty_collection_fails() {
        let report = validate(&[], &expect());
        assert!(!report.passed());
        let first = report.first(Check::ItemsScraped).unwrap();
        assert_eq!(first.message, "No items scraped");
        assert_eq!(first.to_string(), "[items_scraped] No items scraped");
    }

    #[test]
    fn missing_fields_are_each_reported() {
        let mut item = record();
        let obj = item.as_object_mut().unwrap();
        obj.remove("end");
        obj.remove("links");
        let report = validate(&[item], &expect());
        assert_eq!(report.count(Check::RequiredFields), 2);
        assert_eq!(
            report.first(Check::RequiredFields).unwrap().to_string(),
            "[required_fields] id tulok_boed/1234: end: Missing field: end"
        );
    }

    #[test]
    fn every_category_is_detected() {
        let bad = json!({
            "title": 5,
            "description": "",
            "classification": "Committee",
            "start": "2025-12-08T17:30",
            "end": "soon",
            "all_day": "no",
            "time_notes": "",
            "location": { "name": "x", "address": "" },
            "links": [{ "href": "/doc" }],
            "source": "https://elsewhere.org/x",
            "status": "postponed",
            "id": "other/1"
        });
        let report = validate(&[record(), bad], &expect());
        for check in Check::ALL.into_iter().filter(|c| !matches!(c, Check::ItemsScraped | Check::RequiredFields)) {
            assert_eq!(report.count(check), if check == Check::FieldTypes { 2 } else { 1 }, "{check}");
            let violation = report.first(check).unwrap();
            assert_eq!(violation.record, Some(RecordRef::Id("other/1".to_string())));
        }
        assert!(!report.passed());
    }

    #[test]
    fn null_start_and_positional_refs() {
        let mut item = record();
        let obj = item.as_object_mut().unwrap();
        obj.insert("start".to_string(), Value::Null);
        obj.remove("id");
        let report = validate(&[record(), item, json!("junk")], &expect());
        let start = report.first(Check::StartFormat).unwrap();
        assert_eq!(start.record, Some(RecordRef::Position(1)));
        assert_eq!(start.message, "start is null");
        assert_eq!(report.count(Check::RequiredFields), 2);
        assert!(report
            .violations
            .iter()
            .any(|v| v.record == Some(RecordRef::Position(2)) && v.message == "record is not a JSON object"));
    }
}
